mod routes;
mod schemas;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;
use crate::generator::backend::routes::api_routes;
use crate::generator::backend::state::GenState;
use crate::generator::JobManager;

pub use schemas::{JobCreateResponse, JobStatusResponse, JobView, StatusQuery};

/// HTTP boundary in front of the job manager
pub struct GenBackend {
    addr: SocketAddr,
    manager: Arc<JobManager>,
}

impl GenBackend {
    pub fn new(port: u16, manager: Arc<JobManager>) -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            manager,
        }
    }

    pub fn router(manager: Arc<JobManager>) -> Router {
        Router::new()
            .merge(api_routes())
            .with_state(Arc::new(GenState::new(manager)))
    }

    /// Serves until ctrl-c
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        info!("Starting backend server on {}", listener.local_addr()?);

        axum::serve(listener, Self::router(self.manager))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Backend server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
