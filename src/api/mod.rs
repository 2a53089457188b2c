//! HTTP API server for Aikya
//!
//! Exposes the dialog, reveal and speech state to a browser view layer.

pub mod dialog;
mod error;
pub mod health;
pub mod image;
pub mod speech;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

use crate::Result;
use crate::config::Config;
use crate::dialog::DialogOrchestrator;
use crate::ocr::OcrClient;

/// Shared state for API handlers
#[derive(Debug)]
pub struct AppState {
    /// Dialog orchestrator (owns reveal and speech)
    pub dialog: Arc<DialogOrchestrator>,
    /// Image text extraction client
    pub ocr: OcrClient,
}

impl AppState {
    /// Create state from its parts
    #[must_use]
    pub const fn new(dialog: Arc<DialogOrchestrator>, ocr: OcrClient) -> Self {
        Self { dialog, ocr }
    }

    /// Create state with the services named by `config`
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(DialogOrchestrator::from_config(config)),
            OcrClient::new(&config.ocr),
        )
    }
}

/// API server
pub struct ApiServer {
    state: Arc<AppState>,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Create a server for `state` on `port`
    #[must_use]
    pub const fn new(state: Arc<AppState>, port: u16) -> Self {
        Self {
            state,
            port,
            static_dir: None,
        }
    }

    /// Serve a web UI from `dir` for unmatched paths
    #[must_use]
    pub fn with_static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(health::router())
            .merge(dialog::router(Arc::clone(&self.state)))
            .merge(speech::router(Arc::clone(&self.state)))
            .merge(image::router(Arc::clone(&self.state)));

        // Serve static files if configured
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir =
                ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        }

        // CORS layer for cross-origin requests from frontend
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(
            port = self.port,
            tts = self.state.dialog.speech().backend_name().unwrap_or("none"),
            "API server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        self.state.dialog.speech().stop().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
