//! Azure DevOps OAuth JWT-bearer flow
//!
//! Three GET endpoints, at configurable paths:
//! - render route (`/`): authorization page linking to the provider
//! - oauth route (`/oauth-callback`): exchanges the authorization code, shows the refresh token
//! - token refresh route (`/token-refresh`): exchanges a refresh token, returns the provider JSON
//!
//! Reference: https://learn.microsoft.com/en-us/azure/devops/integrate/get-started/authentication/oauth

pub mod authorize;
pub mod callback;
pub mod client;
pub mod exchange;
pub mod flow;
pub mod models;
pub mod refresh;

pub use authorize::render_welcome;
pub use callback::oauth_callback;
pub use client::{HttpTokenClient, TokenClient, TransportError};
pub use exchange::{ExchangeEngine, ExchangeError};
pub use flow::{FlowError, FlowState, GrantFlow};
pub use models::{GrantRequest, GrantType, ProviderResult};
pub use refresh::token_refresh;

use crate::config::OAuthConfig;
use crate::context::attach_request_context;
use crate::views::ViewRenderer;
use axum::{Router, middleware, routing::get};
use std::sync::Arc;

/// Shared, read-only state of the OAuth routes
#[derive(Clone)]
pub struct OAuthState {
    /// Resolved configuration
    pub config: Arc<OAuthConfig>,
    /// Grant exchange engine
    pub engine: Arc<ExchangeEngine>,
    /// Page renderer
    pub views: Arc<dyn ViewRenderer>,
}

impl OAuthState {
    /// Build the state, wiring an exchange engine to `client`
    pub fn new(
        config: OAuthConfig,
        client: Arc<dyn TokenClient>,
        views: Arc<dyn ViewRenderer>,
    ) -> Self {
        let engine = ExchangeEngine::new(&config, client);
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            views,
        }
    }
}

/// Create the OAuth router with all three endpoints
pub fn oauth_router(state: OAuthState) -> Router {
    let config = state.config.clone();

    Router::new()
        .route(&config.oauth_route, get(oauth_callback))
        .route(&config.token_refresh_route, get(token_refresh))
        .route(&config.render_route, get(render_welcome))
        // Runs before every handler so each request starts with an empty bag
        .layer(middleware::from_fn(attach_request_context))
        .with_state(state)
}
