//! # Tweetlens
//!
//! Entry point of the tweetlens web service. See the library documentation
//! for endpoints and environment variables.

use log::{error, info};

use tweetlens::{create_app, get_server_host, get_server_port, AppState};

/// Main entry point for the tweetlens web service.
///
/// Initializes logging, seeds the configuration from the environment, and
/// serves the HTTP API until Ctrl-C is received.
///
/// # Example Usage
///
/// ```bash
/// # Run with default address 0.0.0.0:8000
/// cargo run
///
/// # Run on a custom port with debug logging
/// PORT=8080 RUST_LOG=debug cargo run
/// ```
#[tokio::main]
async fn main() {
    // Initialize the logging system
    env_logger::init();

    let state = AppState::from_env();
    let app = create_app(state);

    let host = get_server_host();
    let port = get_server_port();

    info!("Starting tweetlens server on {}:{}", host, port);

    let listener = match tokio::net::TcpListener::bind((host.as_str(), port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}:{}: {}", host, port, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("HTTP server error: {}", e);
    }
    info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
