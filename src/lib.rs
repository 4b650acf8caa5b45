//! Para Gateway - protocol gateway for the para CLI.
//!
//! Exposes the para command-line tool as a set of schema-validated tools
//! served over two transports: a stdio line channel and an HTTP/SSE channel.
//!
//! Request flow:
//!
//! ```text
//! channel ─▶ protocol ─▶ gateway dispatch
//!                          ├─ registry lookup + payload validation
//!                          ├─ argument marshaling (per-tool, deterministic)
//!                          ├─ process invoker (timeout, captured output)
//!                          ├─ result normalizer (JSON or raw fallback)
//!                          └─ post-processing hook
//! ```
//!
//! The registry is built once at startup and shared immutably with every
//! transport; the invoker is the only component with side effects.

pub mod channels;
pub mod config;
pub mod error;
pub mod gateway;
pub mod invoker;
pub mod normalize;
pub mod tools;

pub use config::Config;
pub use error::{Error, Result};
pub use gateway::Gateway;
