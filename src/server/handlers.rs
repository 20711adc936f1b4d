//! HTTP and WebSocket handlers

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use super::messages::{GenerateRequest, ServerMessage};
use crate::constants::messages::{API_RUNNING, MISSING_REPO_URL};
use crate::pipeline::{DocPipeline, ProgressEmitter};

/// State shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: DocPipeline,
}

impl AppState {
    pub fn new(pipeline: DocPipeline) -> Self {
        Self { pipeline }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/ws/generate", get(generate_socket))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - liveness check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: API_RUNNING,
    })
}

/// GET /ws/generate - one run per connection
pub async fn generate_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

type Sink = SplitSink<WebSocket, Message>;

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();

    let Some(frame) = next_text(&mut stream).await else {
        debug!("Socket closed before a request arrived");
        return;
    };

    let request = match serde_json::from_str::<GenerateRequest>(&frame) {
        Ok(request) => request,
        Err(e) => {
            warn!("Malformed generate request: {}", e);
            send(&mut sink, &ServerMessage::error(format!("Invalid request: {}", e))).await;
            close(&mut sink).await;
            return;
        }
    };

    let Some(repo_url) = request.repo_url().map(str::to_string) else {
        send(&mut sink, &ServerMessage::rejected(MISSING_REPO_URL)).await;
        close(&mut sink).await;
        return;
    };

    info!("Generate request for {}", repo_url);
    forward_run(&mut sink, state.pipeline, repo_url).await;
    close(&mut sink).await;
}

/// Run the pipeline in its own task and relay its events in order
async fn forward_run(sink: &mut Sink, pipeline: DocPipeline, repo_url: String) {
    let (emitter, mut events) = ProgressEmitter::channel();
    let task = tokio::spawn(async move { pipeline.run(&repo_url, &emitter).await });

    let mut connected = true;
    while let Some(event) = events.recv().await {
        if !send(sink, &ServerMessage::from(event)).await {
            connected = false;
            break;
        }
    }
    // Closing the receiver lets the emitter discard the rest; the run itself
    // carries on to its terminal state.
    drop(events);

    match task.await {
        Ok(report) => info!(
            run_id = %report.run_id,
            terminal = %report.stage,
            delivered = connected,
            "Run finished"
        ),
        Err(e) => {
            error!("Pipeline task aborted: {}", e);
            if connected {
                send(sink, &ServerMessage::error(format!("Internal error: {}", e))).await;
            }
        }
    }
}

/// First text payload from the client; `None` once the socket closes
async fn next_text(stream: &mut SplitStream<WebSocket>) -> Option<String> {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => return Some(text),
            Ok(Message::Binary(bytes)) => return Some(String::from_utf8_lossy(&bytes).into_owned()),
            Ok(Message::Close(_)) => return None,
            Ok(_) => continue,
            Err(e) => {
                debug!("Socket read failed: {}", e);
                return None;
            }
        }
    }
    None
}

async fn send(sink: &mut Sink, message: &ServerMessage) -> bool {
    match sink.send(Message::Text(message.to_json())).await {
        Ok(()) => true,
        Err(e) => {
            debug!("Socket write failed: {}", e);
            false
        }
    }
}

async fn close(sink: &mut Sink) {
    if let Err(e) = sink.send(Message::Close(None)).await {
        debug!("Socket close failed: {}", e);
    }
}
