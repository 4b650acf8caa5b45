//! Stdio channel: newline-delimited JSON over stdin/stdout.
//!
//! One session per process lifetime, one counterpart. Each line is one
//! request; each response is one line. Requests are handled concurrently so
//! a call awaiting the external process never blocks its siblings; responses
//! are serialized through a single writer task. Logs go to stderr — stdout
//! belongs to the protocol.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::channels::Channel;
use crate::channels::protocol::{self, PARSE_ERROR, Request, Response};
use crate::error::ChannelError;
use crate::gateway::Gateway;

pub struct StdioChannel;

impl StdioChannel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StdioChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for StdioChannel {
    fn name(&self) -> &str {
        "stdio"
    }

    async fn serve(&self, gateway: Arc<Gateway>) -> Result<(), ChannelError> {
        let (tx, mut rx) = mpsc::channel::<Response>(64);

        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(response) = rx.recv().await {
                let mut payload = match serde_json::to_vec(&response) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to serialize response");
                        continue;
                    }
                };
                payload.push(b'\n');
                if stdout.write_all(&payload).await.is_err() {
                    break;
                }
                let _ = stdout.flush().await;
            }
        });

        tracing::info!("stdio channel ready");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| ChannelError::Disconnected {
                name: "stdio".to_string(),
                reason: e.to_string(),
            })?
        {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Request>(&line) {
                Ok(request) => {
                    let gateway = Arc::clone(&gateway);
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let response = protocol::handle_request(&gateway, request).await;
                        let _ = tx.send(response).await;
                    });
                }
                Err(e) => {
                    // Malformed input answers with a parse error; the session
                    // stays up.
                    let response =
                        Response::failure(None, PARSE_ERROR, format!("invalid request: {e}"));
                    let _ = tx.send(response).await;
                }
            }
        }

        // EOF from the counterpart: let in-flight responses drain, then stop.
        drop(tx);
        let _ = writer.await;
        tracing::info!("stdio channel closed by peer");
        Ok(())
    }
}
