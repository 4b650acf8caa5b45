//! HTTP channel: liveness endpoint, SSE push streams, message submission.
//!
//! A session is established by `GET /sse`: the subscriber receives an
//! `endpoint` event naming the submission URL for its session, then responses
//! arrive as `message` events on the same stream. `POST /messages` accepts a
//! request for an established session and returns 202 immediately. `GET /`
//! serves a fixed status document and never touches the registry.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response as AxumResponse},
    routing::{get, post},
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::channels::Channel;
use crate::channels::protocol::{self, PARSE_ERROR, Request, Response};
use crate::config::HttpConfig;
use crate::error::ChannelError;
use crate::gateway::Gateway;

/// HTTP/SSE channel.
pub struct HttpChannel {
    config: HttpConfig,
}

struct HttpState {
    gateway: Arc<Gateway>,
    /// Push channels of the currently established sessions.
    sessions: Mutex<HashMap<Uuid, mpsc::Sender<Event>>>,
}

impl HttpChannel {
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Build the router; exposed separately so tests can drive it in-process.
    pub fn router(gateway: Arc<Gateway>) -> Router {
        let state = Arc::new(HttpState {
            gateway,
            sessions: Mutex::new(HashMap::new()),
        });
        Router::new()
            .route("/", get(status_handler))
            .route("/sse", get(sse_handler))
            .route("/messages", post(messages_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

#[derive(Debug, Serialize)]
struct StatusDoc {
    status: &'static str,
    service: &'static str,
    transport: &'static str,
    sse_endpoint: &'static str,
    messages_endpoint: &'static str,
}

async fn status_handler() -> Json<StatusDoc> {
    Json(StatusDoc {
        status: "ok",
        service: "para-gateway",
        transport: "sse",
        sse_endpoint: "/sse",
        messages_endpoint: "/messages",
    })
}

/// Removes the session entry when its subscriber stream is dropped.
struct SessionGuard {
    id: Uuid,
    state: Arc<HttpState>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Ok(mut sessions) = self.state.sessions.lock() {
            sessions.remove(&self.id);
        }
        tracing::debug!(session_id = %self.id, "SSE session closed");
    }
}

async fn sse_handler(
    State(state): State<Arc<HttpState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session_id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel::<Event>(64);
    state
        .sessions
        .lock()
        .expect("sessions lock poisoned")
        .insert(session_id, tx);
    tracing::debug!(%session_id, "SSE session established");

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/messages?session_id={session_id}"));

    let guard = SessionGuard {
        id: session_id,
        state: Arc::clone(&state),
    };
    let stream = futures::stream::once(std::future::ready(endpoint))
        .chain(ReceiverStream::new(rx))
        .map(move |event| {
            let _session = &guard;
            Ok::<_, Infallible>(event)
        });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
struct MessagesQuery {
    session_id: Uuid,
}

async fn messages_handler(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<MessagesQuery>,
    Json(body): Json<serde_json::Value>,
) -> AxumResponse {
    let tx = {
        let sessions = state.sessions.lock().expect("sessions lock poisoned");
        sessions.get(&query.session_id).cloned()
    };
    let Some(tx) = tx else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "unknown session" })),
        )
            .into_response();
    };

    let request: Request = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(Response::failure(
                    None,
                    PARSE_ERROR,
                    format!("invalid request: {e}"),
                )),
            )
                .into_response();
        }
    };

    let session_id = query.session_id;
    let state = Arc::clone(&state);
    tokio::spawn(async move {
        let response = protocol::handle_request(&state.gateway, request).await;
        let event = match Event::default().event("message").json_data(&response) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode SSE event");
                return;
            }
        };
        if tx.send(event).await.is_err() {
            // Subscriber went away between lookup and delivery.
            if let Ok(mut sessions) = state.sessions.lock() {
                sessions.remove(&session_id);
            }
        }
    });

    (StatusCode::ACCEPTED, Json(json!({ "status": "accepted" }))).into_response()
}

#[async_trait]
impl Channel for HttpChannel {
    fn name(&self) -> &str {
        "http"
    }

    async fn serve(&self, gateway: Arc<Gateway>) -> Result<(), ChannelError> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| ChannelError::StartupFailed {
                name: "http".to_string(),
                reason: format!(
                    "Invalid address '{}:{}': {}",
                    self.config.host, self.config.port, e
                ),
            })?;

        let listener =
            tokio::net::TcpListener::bind(addr)
                .await
                .map_err(|e| ChannelError::StartupFailed {
                    name: "http".to_string(),
                    reason: format!("Failed to bind to {addr}: {e}"),
                })?;

        tracing::info!("HTTP channel listening on {addr}");
        tracing::info!("SSE endpoint: http://{addr}/sse");

        let app = Self::router(gateway);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ChannelError::Http(e.to_string()))?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("HTTP channel shutting down");
}
