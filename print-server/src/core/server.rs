//! Server Implementation
//!
//! HTTP server startup and shutdown. The bridge binds to localhost only:
//! it fronts a physical printer on the same machine and is not meant to be
//! reachable from the network.

use std::net::SocketAddr;

use crate::api;
use crate::core::{Config, ServerState};

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (tests share a prepared state)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config),
        };

        let app = api::build_app(&state).with_state(state);

        let addr = SocketAddr::from(([127, 0, 0, 1], self.config.http_port));
        tracing::info!("🖨️  Print bridge listening on http://{}", addr);
        tracing::info!("Waiting for print jobs...");

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await?;

        Ok(())
    }
}
