//! API server for Wiki Tutor

use anyhow::Result;
use axum::{
    routing::{delete, get},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use wikitutor_kb::Resolver;

use super::routes::{get_summary, get_topic, health_check, home, invalidate_cache, AppState};

/// Configuration for the API server
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    resolver: Arc<Resolver>,
}

impl ApiServer {
    /// Create a new API server with configuration
    pub fn new(config: ApiServerConfig, resolver: Arc<Resolver>) -> Self {
        Self { config, resolver }
    }

    /// Create a new API server with default configuration
    pub fn with_defaults(resolver: Arc<Resolver>) -> Self {
        Self::new(ApiServerConfig::default(), resolver)
    }

    /// Build the application router
    pub fn router(resolver: Arc<Resolver>) -> Router {
        let app_state = Arc::new(AppState { resolver });

        Router::new()
            .route("/", get(home))
            .route("/health", get(health_check))
            .route("/topic/:topic", get(get_topic))
            .route("/summary/:topic", get(get_summary))
            .route("/cache/:topic", delete(invalidate_cache))
            .with_state(app_state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(CorsLayer::permissive()),
            )
    }

    /// Start the API server
    pub async fn start(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        info!("Starting API server on {}", listener.local_addr()?);

        let app = Self::router(self.resolver);
        axum::serve(listener, app).await?;

        Ok(())
    }
}
