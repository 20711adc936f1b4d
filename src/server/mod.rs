//! HTTP/WebSocket surface
//!
//! - `GET /` answers a fixed liveness payload
//! - `GET /ws/generate` upgrades to a socket; the first frame names a
//!   repository and the connection then streams that run's progress until a
//!   terminal message

pub mod handlers;
pub mod messages;

pub use handlers::{AppState, create_router};
pub use messages::{GenerateRequest, ServerMessage, Status};

use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::pipeline::DocPipeline;
use crate::types::{DocError, Result};

pub struct DocServer {
    config: ServerConfig,
    state: AppState,
}

impl DocServer {
    pub fn new(config: ServerConfig, pipeline: DocPipeline) -> Self {
        Self {
            config,
            state: AppState::new(pipeline),
        }
    }

    pub async fn bind(&self) -> Result<TcpListener> {
        let host = self.config.host.as_str();
        TcpListener::bind((host, self.config.port))
            .await
            .map_err(|e| {
                DocError::Server(format!(
                    "Failed to bind to {}:{}: {}",
                    host, self.config.port, e
                ))
            })
    }

    /// Bind the configured address and serve until Ctrl-C or SIGTERM
    pub async fn serve(self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve_on(listener, shutdown_signal()).await
    }

    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = listener.local_addr()?;
        info!("Server listening on: http://{}", addr);
        info!("WebSocket endpoint: ws://{}/ws/generate", addr);

        axum::serve(listener, create_router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| DocError::Server(format!("Server error: {}", e)))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("Received TERM signal");
            }
            Err(e) => {
                error!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
