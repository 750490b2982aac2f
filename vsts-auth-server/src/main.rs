//! VSTS OAuth bridge server
//!
//! Resolves configuration from flags and environment, then serves the
//! authorization page, the OAuth callback and the token refresh endpoint.

mod cli;

use clap::Parser;
use cli::Cli;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};
use vsts_auth::{
    ConfigError, HtmlViews, HttpTokenClient, OAuthState, TransportError, ViewError, oauth_router,
};
use vsts_logging::LoggingError;

/// Startup and serving failures
#[derive(Debug, Error)]
pub enum ServerError {
    /// Invalid or missing configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Layout could not be loaded
    #[error("Failed to load views: {0}")]
    View(#[from] ViewError),

    /// HTTP client could not be built
    #[error("Failed to build token client: {0}")]
    Transport(#[from] TransportError),

    /// Subscriber could not be installed
    #[error("Failed to initialize logging: {0}")]
    Logging(#[from] LoggingError),

    /// Listener could not be bound
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        /// Address that was tried
        addr: String,
        /// I/O error from the bind
        #[source]
        source: std::io::Error,
    },

    /// Serving stopped with an error
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let cli = Cli::parse().with_legacy_fallback(|name| std::env::var(name).ok());

    cli.logging_config().initialize()?;

    if let Err(e) = run(cli).await {
        match &e {
            ServerError::Config(config_error) => {
                error!(field = config_error.field(), "{}", e)
            }
            _ => error!("{}", e),
        }
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), ServerError> {
    let bind_address = cli.bind_address.clone();
    let config = cli.into_inputs().resolve()?;

    let views = HtmlViews::new(config.layouts_dir.as_deref())?;
    let client = HttpTokenClient::new()?;
    let port = config.port;

    info!(
        oauth_route = %config.oauth_route,
        token_refresh_route = %config.token_refresh_route,
        render_route = %config.render_route,
        callback_uri = %config.callback_uri,
        "Routes configured"
    );

    let app = oauth_router(OAuthState::new(
        config,
        Arc::new(client),
        Arc::new(views),
    ));

    let addr = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!("app listening on port {}!", port);

    axum::serve(listener, app).await.map_err(ServerError::Serve)
}
