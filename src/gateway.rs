//! The dispatch pipeline: validate → marshal → invoke → normalize → post.

use serde_json::{Map, Value};
use tokio::sync::Semaphore;

use crate::error::ToolError;
use crate::invoker::Invoker;
use crate::normalize::{NormalizedResult, normalize};
use crate::tools::ToolRegistry;
use crate::tools::validate::validate_payload;

/// The gateway: one registry, one invoker, one admission gate.
///
/// Dispatch holds no mutable state, so any number of calls may be in flight
/// concurrently; the semaphore bounds how many of them run an external
/// process at once.
pub struct Gateway {
    registry: ToolRegistry,
    invoker: Invoker,
    permits: Semaphore,
}

impl Gateway {
    pub fn new(registry: ToolRegistry, invoker: Invoker, max_concurrency: usize) -> Self {
        Self {
            registry,
            invoker,
            permits: Semaphore::new(max_concurrency.max(1)),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Dispatch one invocation request.
    ///
    /// Validation failures surface before any process is launched. Errors are
    /// returned as [`ToolError`]; the protocol layer converts them into
    /// structured error results for the caller.
    pub async fn dispatch(
        &self,
        name: &str,
        payload: Map<String, Value>,
    ) -> Result<NormalizedResult, ToolError> {
        let descriptor = self
            .registry
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool {
                name: name.to_string(),
            })?;

        let payload = validate_payload(name, &descriptor.schema, &payload)?;
        let argv = descriptor.argv(&payload)?;

        // Bursts queue here instead of spawning processes without bound.
        let _permit = self
            .permits
            .acquire()
            .await
            .expect("admission semaphore is never closed");

        let outcome = self.invoker.invoke(name, &argv).await?;
        let mut result = normalize(&outcome.stdout);
        if let Some(post) = descriptor.post {
            result = post.apply(result);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    /// A gateway whose invoker points at a program that must never run;
    /// everything these tests exercise fails before launch.
    fn unlaunchable_gateway() -> Gateway {
        Gateway::new(
            ToolRegistry::builtin().unwrap(),
            Invoker::new("/nonexistent/para-binary"),
            2,
        )
    }

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected() {
        let gateway = unlaunchable_gateway();
        let err = gateway
            .dispatch("para_frobnicate", Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool { .. }));
    }

    #[tokio::test]
    async fn missing_required_field_fails_before_launch() {
        let gateway = unlaunchable_gateway();
        let err = gateway
            .dispatch("para_read", payload(json!({"type": "project"})))
            .await
            .unwrap_err();
        // MissingField, not Launch: the nonexistent binary was never reached.
        assert!(matches!(err, ToolError::MissingField { ref field, .. } if field == "name"));
    }

    #[tokio::test]
    async fn scope_conditional_name_fails_before_launch() {
        let gateway = unlaunchable_gateway();
        let err = gateway
            .dispatch(
                "para_search",
                payload(json!({"scope": "project", "query": "x"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::MissingField { ref field, .. } if field == "name"));
    }

    #[tokio::test]
    async fn enum_violation_fails_before_launch() {
        let gateway = unlaunchable_gateway();
        let err = gateway
            .dispatch(
                "para_list",
                payload(json!({"type": "everything"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidValue { .. }));
    }

    #[tokio::test]
    async fn valid_request_reaches_the_invoker() {
        let gateway = unlaunchable_gateway();
        let err = gateway
            .dispatch(
                "para_create",
                payload(json!({"type": "project", "name": "alpha"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Launch { .. }));
    }
}
