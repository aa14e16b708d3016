use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod pagination;
pub mod routes;
pub mod serializers;
pub mod state;

pub use config::WebConfig;
pub use error::ApiError;
pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    routes::create_router(state)
}

/// Serve `app` on `addr` until ctrl-c.
pub async fn serve(addr: SocketAddr, app: Router) -> nr_core::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("🌐 Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

pub mod prelude {
    pub use crate::{create_app, serve, ApiError, AppState, WebConfig};
    pub use nr_core::{Article, Comment, Error, Result};
}
