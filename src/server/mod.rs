//! HTTP backend: background removal proxy plus upload and save endpoints.

mod config;
mod error;
mod remove_bg;
mod routes;
mod storage;

pub use config::ServerConfig;
pub use error::ApiError;
pub use remove_bg::RemoveBgClient;
pub use routes::{AppState, router};
pub use storage::ImageStore;

/// Bind the configured address and serve until the process exits
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    log::info!("Listening on {}", listener.local_addr()?);
    let app = router(AppState::new(config));
    axum::serve(listener, app).await
}
