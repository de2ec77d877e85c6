//! # Tweetlens Library
//!
//! A small web service that forwards user and keyword searches to the
//! Twitter/X API v2 and returns simplified tweet records.
//!
//! ## Features
//!
//! - Credentials set at runtime: bearer token, OAuth 1.0a or app-only key pair
//! - Optional upstream proxy (first configured entry)
//! - Batch search by username or keyword, one upstream call per item
//! - Tweets flattened into a fixed record shape with a derived tweet type
//! - Structured logging
//!
//! ## Configuration
//!
//! - `HOST` / `PORT`: Bind address (defaults to `0.0.0.0:8000`)
//! - `TWITTER_API_BASE_URL`: Upstream base URL (defaults to `https://api.twitter.com`)
//! - `TWITTER_BEARER_TOKEN`, `TWITTER_API_KEY`, `TWITTER_API_SECRET_KEY`,
//!   `TWITTER_ACCESS_TOKEN`, `TWITTER_ACCESS_TOKEN_SECRET`: Initial credentials,
//!   replaced by the first `/account_manage` call
//!
//! ## API Endpoints
//!
//! - `POST /account_manage`: Replaces the credentials
//! - `POST /proxy_config`: Replaces the proxy list
//! - `POST /users_search`, `GET /users_search`: Latest tweets per username
//! - `POST /keywords_search`, `GET /keywords_search`: Recent tweets per keyword
//! - `GET /health`: Returns service health status

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod oauth;
pub mod search;
pub mod state;
pub mod twitter;

// Re-export commonly used types and functions
pub use config::{get_api_base_url, get_server_host, get_server_port, Credentials};
pub use error::ApiError;
pub use handlers::{
    handle_account_manage, handle_health, handle_keywords_search, handle_keywords_search_query,
    handle_proxy_config, handle_users_search, handle_users_search_query,
};
pub use oauth::build_bearer_auth_header;
pub use search::{run_batch, BatchResults, ItemResult, SearchKind};
pub use state::{AppState, ConfigSnapshot, ConfigStore};

/// Builds the router without middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/account_manage", post(handle_account_manage))
        .route("/proxy_config", post(handle_proxy_config))
        .route(
            "/users_search",
            post(handle_users_search).get(handle_users_search_query),
        )
        .route(
            "/keywords_search",
            post(handle_keywords_search).get(handle_keywords_search_query),
        )
        .with_state(state)
}

/// Builds the full application: all routes plus request tracing.
pub fn create_app(state: AppState) -> Router {
    create_router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
