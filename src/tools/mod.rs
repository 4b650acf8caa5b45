//! The tool layer: descriptors, validation, and the registry.
//!
//! A tool is one named, schema-validated operation corresponding to one
//! external-program invocation pattern. Descriptors bind a schema to a
//! marshaling rule; the registry maps request names to descriptors and is
//! immutable once startup registration completes.

pub mod descriptor;
pub mod registry;
pub mod validate;

pub use descriptor::{JSON_FLAG, PostProcess, ToolDescriptor, ToolKind};
pub use registry::{ToolDefinition, ToolRegistry};
