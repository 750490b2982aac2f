//! Bridge configuration
//!
//! [`ConfigInputs`] collects raw, possibly missing values (typically from the
//! environment or command line) and [`ConfigInputs::resolve`] turns them into an
//! immutable [`OAuthConfig`] that is built once at startup and shared read-only.

use std::path::PathBuf;
use thiserror::Error;
use tracing::info;
use url::Url;

/// Client id registered for the bridge when none is supplied
pub const DEFAULT_CLIENT_ID: &str = "DE516D90-B63E-4994-BA64-881EA988A9D2";

/// Default path of the OAuth redirect callback
pub const DEFAULT_OAUTH_ROUTE: &str = "/oauth-callback";

/// Default path of the token refresh endpoint
pub const DEFAULT_TOKEN_REFRESH_ROUTE: &str = "/token-refresh";

/// Default path of the authorization page
pub const DEFAULT_RENDER_ROUTE: &str = "/";

/// Configuration errors, fatal at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No client secret was provided
    #[error("Missing CLIENT_SECRET variable!")]
    MissingClientSecret,

    /// No port was provided
    #[error("Missing PORT variable!")]
    MissingPort,

    /// No host was provided
    #[error("Missing HOST variable!")]
    MissingHost,

    /// Port is not a valid `u16`
    #[error("Invalid PORT variable: '{0}' is not a valid port number")]
    InvalidPort(String),

    /// Route path that cannot be registered
    #[error(
        "Invalid route '{0}': routes must start with '/', be distinct and contain none of ':', '*', '?', '#' or whitespace"
    )]
    InvalidRoute(String),

    /// Host or route does not form a valid callback URL
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        /// URL that failed to parse
        url: String,
        /// Parser error
        #[source]
        source: url::ParseError,
    },
}

impl ConfigError {
    /// Name of the configuration field the error refers to
    pub fn field(&self) -> &'static str {
        match self {
            ConfigError::MissingClientSecret => "clientSecret",
            ConfigError::MissingPort | ConfigError::InvalidPort(_) => "port",
            ConfigError::MissingHost | ConfigError::InvalidUrl { .. } => "host",
            ConfigError::InvalidRoute(_) => "route",
        }
    }
}

/// Raw configuration values before validation
#[derive(Debug, Clone, Default)]
pub struct ConfigInputs {
    /// Application id; the built-in default is used when absent
    pub client_id: Option<String>,
    /// Client secret sent as the client assertion (required)
    pub client_secret: Option<String>,
    /// Listening port (required)
    pub port: Option<String>,
    /// Public host name of the bridge (required)
    pub host: Option<String>,
    /// Development mode: the port is appended to the host
    pub dev: bool,
    /// Path of the OAuth callback route
    pub oauth_route: Option<String>,
    /// Path of the token refresh route
    pub token_refresh_route: Option<String>,
    /// Path of the authorization page
    pub render_route: Option<String>,
    /// Directory holding `main.html`
    pub layouts_dir: Option<PathBuf>,
    /// Scopes requested on the authorization link
    pub scope: Option<String>,
}

/// Validated, immutable bridge configuration
#[derive(Clone)]
pub struct OAuthConfig {
    /// Application id shown on the authorization page
    pub client_id: String,
    /// Sent as `client_assertion` on every grant
    pub client_secret: String,
    /// Public host name, including `:<port>` in development mode
    pub host: String,
    /// Listening port
    pub port: u16,
    /// Path of the OAuth callback route
    pub oauth_route: String,
    /// Path of the token refresh route
    pub token_refresh_route: String,
    /// Path of the authorization page
    pub render_route: String,
    /// Absolute redirect URI, `oauth_route` resolved against `https://<host>/`
    pub callback_uri: Url,
    /// Directory holding `main.html`
    pub layouts_dir: Option<PathBuf>,
    /// Scopes requested on the authorization link
    pub scope: Option<String>,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("oauth_route", &self.oauth_route)
            .field("token_refresh_route", &self.token_refresh_route)
            .field("render_route", &self.render_route)
            .field("callback_uri", &self.callback_uri.as_str())
            .field("layouts_dir", &self.layouts_dir)
            .field("scope", &self.scope)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ConfigInputs {
    /// Validate the inputs and derive the callback URI.
    ///
    /// Required values are checked in the order `clientSecret`, `port`, `host`;
    /// the first missing one is reported.
    pub fn resolve(self) -> Result<OAuthConfig, ConfigError> {
        let client_secret = non_empty(self.client_secret).ok_or(ConfigError::MissingClientSecret)?;
        let port_raw = non_empty(self.port).ok_or(ConfigError::MissingPort)?;
        let host = non_empty(self.host).ok_or(ConfigError::MissingHost)?;

        let port: u16 = port_raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidPort(port_raw.clone()))?;

        let host = if self.dev {
            format!("{host}:{port}")
        } else {
            host
        };
        info!("set \"host\" to {}", host);

        let oauth_route = self.oauth_route.unwrap_or_else(|| DEFAULT_OAUTH_ROUTE.to_string());
        let token_refresh_route = self
            .token_refresh_route
            .unwrap_or_else(|| DEFAULT_TOKEN_REFRESH_ROUTE.to_string());
        let render_route = self
            .render_route
            .unwrap_or_else(|| DEFAULT_RENDER_ROUTE.to_string());
        validate_routes(&[&oauth_route, &token_refresh_route, &render_route])?;

        let host_uri = format!("https://{host}/");
        let base = Url::parse(&host_uri).map_err(|source| ConfigError::InvalidUrl {
            url: host_uri.clone(),
            source,
        })?;
        let callback_uri = base
            .join(&oauth_route)
            .map_err(|source| ConfigError::InvalidUrl {
                url: format!("{host_uri}{oauth_route}"),
                source,
            })?;

        Ok(OAuthConfig {
            client_id: non_empty(self.client_id).unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
            client_secret,
            host,
            port,
            oauth_route,
            token_refresh_route,
            render_route,
            callback_uri,
            layouts_dir: self.layouts_dir,
            scope: non_empty(self.scope),
        })
    }
}

/// Route paths are registered verbatim, so router capture syntax is not allowed
fn is_valid_route(route: &str) -> bool {
    route.starts_with('/')
        && !route
            .chars()
            .any(|c| matches!(c, ':' | '*' | '?' | '#') || c.is_whitespace())
}

fn validate_routes(routes: &[&String]) -> Result<(), ConfigError> {
    for (i, route) in routes.iter().enumerate() {
        if !is_valid_route(route) || routes[..i].contains(route) {
            return Err(ConfigError::InvalidRoute(route.to_string()));
        }
    }
    Ok(())
}
