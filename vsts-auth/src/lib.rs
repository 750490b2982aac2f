//! # VSTS OAuth bridge
//!
//! Browser-facing Azure DevOps (VSTS) OAuth 2.0 JWT-bearer flow, served as an
//! axum [`Router`](axum::Router).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vsts_auth::{ConfigInputs, HtmlViews, HttpTokenClient, OAuthState, oauth_router};
//!
//! let config = ConfigInputs {
//!     client_secret: Some("...".into()),
//!     port: Some("3000".into()),
//!     host: Some("auth.example.com".into()),
//!     ..Default::default()
//! }
//! .resolve()?;
//!
//! let views = HtmlViews::new(config.layouts_dir.as_deref())?;
//! let state = OAuthState::new(config, Arc::new(HttpTokenClient::new()?), Arc::new(views));
//! let app = oauth_router(state);
//! ```
//!
//! ## Flow
//!
//! 1. `GET /` renders a page linking to the provider's authorize endpoint with the
//!    client id, a fresh `state` value and the callback URI.
//! 2. The provider redirects to `GET /oauth-callback?code=...`; the code is exchanged
//!    with the JWT-bearer grant and the refresh token is displayed.
//! 3. `GET /token-refresh?code=<refresh_token>` exchanges a refresh token and returns
//!    the provider's JSON.
//!
//! Every failure ends the request with a `400` and a plain-text body; nothing is
//! retried and nothing is persisted.

pub mod config;
pub mod context;
pub mod oauth;
pub mod views;

pub use config::{ConfigError, ConfigInputs, OAuthConfig};
pub use context::{PropertyBag, RequestContext};
pub use oauth::{
    ExchangeEngine, ExchangeError, FlowError, FlowState, GrantFlow, GrantRequest, GrantType,
    HttpTokenClient, OAuthState, ProviderResult, TokenClient, TransportError, oauth_router,
};
pub use views::{HtmlViews, View, ViewError, ViewRenderer};
