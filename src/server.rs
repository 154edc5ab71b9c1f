//! WebSocket transport.
//!
//! Clients connect to `/ws`, receive the current snapshot on a fixed cadence,
//! and send camera frames as base64 JPEG inside `{"image": "..."}` text
//! messages. Malformed frames are discarded here, before they reach the
//! intake queue. `/health` answers liveness probes.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::frame::{Frame, FrameSender};
use crate::state::SharedState;
use crate::types::StateUpdate;

/// Transport configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub publish_interval_ms: u64,
}

/// Shared state for the transport handlers
#[derive(Clone)]
pub struct AppState {
    state: SharedState,
    frames: FrameSender,
    session_id: Uuid,
    publish_interval: Duration,
    started: Instant,
}

/// Run the WebSocket/health server until it fails or the task is dropped.
pub async fn run_server(
    config: ServerConfig,
    state: SharedState,
    frames: FrameSender,
    session_id: Uuid,
    started: Instant,
) -> anyhow::Result<()> {
    let app_state = AppState {
        state,
        frames,
        session_id,
        publish_interval: Duration::from_millis(config.publish_interval_ms),
        started,
    };

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_endpoint))
        .with_state(app_state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Transport listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}

/// Liveness probe with the session id and current status
async fn health_endpoint(State(app): State<AppState>) -> Json<Value> {
    let snapshot = app.state.snapshot();
    Json(serde_json::json!({
        "healthy": true,
        "session_id": app.session_id.to_string(),
        "status": snapshot.status.as_wire(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn ws_handler(State(app): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app))
}

async fn handle_socket(socket: WebSocket, app: AppState) {
    info!("Transport client connected");
    let (mut sink, mut stream) = socket.split();

    // Outbound: snapshot on the publish cadence, independent of inbound traffic
    let publisher = {
        let state = app.state.clone();
        let interval = app.publish_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let update = StateUpdate::from_snapshot(&state.snapshot());
                let payload = match serde_json::to_string(&update) {
                    Ok(payload) => payload,
                    Err(e) => {
                        error!("Failed to serialize state update: {}", e);
                        continue;
                    }
                };
                if sink.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
        })
    };

    // Inbound: frames into the intake queue
    while let Some(Ok(message)) = stream.next().await {
        if let Message::Text(text) = message {
            let received_ms = app.started.elapsed().as_millis() as u64;
            if let Some(frame) = decode_frame(&text, received_ms) {
                app.frames.push(frame);
            }
        }
    }

    publisher.abort();
    info!("Transport client disconnected");
}

#[derive(Debug, Deserialize)]
struct InboundMessage {
    image: Option<String>,
}

/// Decode an inbound text message into a frame. Anything malformed is
/// discarded with a debug log; the pipeline never sees it.
fn decode_frame(text: &str, received_ms: u64) -> Option<Frame> {
    let message: InboundMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            debug!("Ignoring unparseable message: {}", e);
            return None;
        }
    };

    let image_b64 = message.image?;

    let bytes = match BASE64.decode(image_b64.as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Discarding malformed frame (base64): {}", e);
            return None;
        }
    };

    match image::load_from_memory(&bytes) {
        Ok(decoded) => Some(Frame {
            image: decoded.to_rgb8(),
            received_ms,
        }),
        Err(e) => {
            debug!("Discarding malformed frame (decode): {}", e);
            None
        }
    }
}
