//! HTTP transport for the HITL MCP gateway.
//!
//! Serves MCP over JSON-RPC 2.0 at `POST /mcp` and a liveness probe at
//! `GET /health`. Tool calls are authenticated with a bearer credential and
//! dispatched through a [`hitl_tools::ToolRegistry`].
//!
//! # Example
//!
//! ```ignore
//! use hitl_server::{Server, ServerConfig};
//!
//! let server = Server::new(registry, authenticator, ServerConfig::new());
//! server.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{BEARER_CHALLENGE, Result, RpcFailure, ServerError};
pub use logging::{RpcMethod, request_logging_middleware};
pub use state::AppState;

use std::future::Future;

use axum::{Router, extract::DefaultBodyLimit, http::HeaderValue, middleware};
use hitl_auth::Authenticator;
use hitl_tools::ToolRegistry;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// The gateway HTTP server.
pub struct Server {
    state: AppState,
}

impl Server {
    pub fn new(registry: ToolRegistry, authenticator: Authenticator, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(registry, authenticator, config),
        }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let config = &self.state.config;

        let mut router = Router::new()
            .merge(routes::health_routes())
            .merge(routes::mcp_routes())
            .layer(DefaultBodyLimit::max(config.max_body_size))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http());

        if let Some(cors) = cors_layer(&config.cors_origins) {
            router = router.layer(cors);
        }

        router.with_state(self.state.clone())
    }

    /// Run the server until the process is stopped.
    pub async fn run(self) -> Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Run the server until `shutdown` resolves, then drain connections.
    pub async fn run_with_shutdown(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let addr = self.state.config.bind_address;
        let router = self.router();

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        info!(
            addr = %local_addr,
            strategy = self.state.authenticator.strategy(),
            tools = self.state.registry.len(),
            "Starting server"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }
    if origins.iter().any(|o| o == "*") {
        return Some(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(allowed)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}
