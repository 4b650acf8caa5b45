//! Tool registry: the immutable name → descriptor mapping.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::ToolError;
use crate::tools::descriptor::{ToolDescriptor, ToolKind};
use crate::tools::validate::validate_registration_schema;

/// Tool metadata advertised to callers.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Registry of the tools the gateway serves.
///
/// Built once at startup, then shared immutably (by reference or `Arc`) with
/// every transport; nothing mutates it after registration.
pub struct ToolRegistry {
    descriptors: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Registry with every built-in tool registered.
    ///
    /// Iterates [`ToolKind::ALL`], so a new variant cannot be forgotten here
    /// without also failing the exhaustive match in its descriptor.
    pub fn builtin() -> Result<Self, ToolError> {
        let mut registry = Self::new();
        for kind in ToolKind::ALL {
            registry.register(kind.descriptor())?;
        }
        tracing::info!("Registered {} tools", registry.len());
        Ok(registry)
    }

    /// Register a descriptor.
    ///
    /// Fails with [`ToolError::DuplicateTool`] on a name collision and with
    /// [`ToolError::InvalidSchema`] when the strict schema check rejects the
    /// descriptor.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<(), ToolError> {
        if self.index.contains_key(descriptor.name) {
            return Err(ToolError::DuplicateTool {
                name: descriptor.name.to_string(),
            });
        }
        validate_registration_schema(&descriptor.schema, descriptor.name)?;
        tracing::debug!(tool = descriptor.name, "registered tool");
        self.index
            .insert(descriptor.name.to_string(), self.descriptors.len());
        self.descriptors.push(descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Definitions in registration order, for `tools/list`.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.descriptors
            .iter()
            .map(|d| ToolDefinition {
                name: d.name.to_string(),
                description: d.description.to_string(),
                input_schema: d.schema.clone(),
            })
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
