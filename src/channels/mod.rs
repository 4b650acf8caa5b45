//! Transport adapters binding the gateway to its channels.
//!
//! Adapters own framing and session bookkeeping only; every request is
//! delegated to [`protocol::handle_request`], so business logic never leaks
//! into a transport.

pub mod protocol;

mod http;
mod stdio;

pub use http::HttpChannel;
pub use stdio::StdioChannel;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::gateway::Gateway;

/// Trait for transports serving the gateway.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name (e.g. "stdio", "http").
    fn name(&self) -> &str;

    /// Serve requests until the peer disconnects or the process is stopped.
    async fn serve(&self, gateway: Arc<Gateway>) -> Result<(), ChannelError>;
}
