//! Command line and environment parsing

use clap::{ArgAction, Parser, builder::FalseyValueParser};
use std::path::PathBuf;
use vsts_auth::ConfigInputs;
use vsts_auth::config::{
    DEFAULT_CLIENT_ID, DEFAULT_OAUTH_ROUTE, DEFAULT_RENDER_ROUTE, DEFAULT_TOKEN_REFRESH_ROUTE,
};
use vsts_logging::{LogFormat, LoggingConfig};

/// Older deployments set these lower-case variables instead
const LEGACY_CLIENT_SECRET: &str = "clientSecret";
const LEGACY_PORT: &str = "port";
const LEGACY_HOST: &str = "host";

#[derive(Debug, Parser)]
#[command(name = "vsts-auth-server")]
#[command(about = "Serve the Azure DevOps OAuth JWT-bearer authorization flow")]
#[command(version)]
pub struct Cli {
    /// Application (client) id registered with the provider
    #[arg(long, env = "CLIENT_ID", default_value = DEFAULT_CLIENT_ID)]
    pub client_id: String,

    /// Client secret, sent as the client assertion
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Port to listen on
    #[arg(long, env = "SERVER_PORT")]
    pub port: Option<String>,

    /// Public host name used to build the callback URI
    #[arg(long, env = "WEBSITE_HOSTNAME")]
    pub host: Option<String>,

    /// Append the port to the host (local development)
    #[arg(long, env = "DEV", action = ArgAction::SetTrue, value_parser = FalseyValueParser::new())]
    pub dev: bool,

    #[arg(long, default_value = DEFAULT_OAUTH_ROUTE)]
    pub oauth_route: String,

    #[arg(long, default_value = DEFAULT_TOKEN_REFRESH_ROUTE)]
    pub token_refresh_route: String,

    #[arg(long, default_value = DEFAULT_RENDER_ROUTE)]
    pub render_route: String,

    /// Directory holding the `main.html` layout
    #[arg(long, env = "LAYOUTS_DIR")]
    pub layouts_dir: Option<PathBuf>,

    /// Scope requested on the authorize link
    #[arg(long, env = "OAUTH_SCOPE")]
    pub scope: Option<String>,

    /// Interface to bind
    #[arg(long = "bind", env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// json, pretty or compact
    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            format: self.log_format,
        }
    }

    /// Fill values clap did not find from the legacy variable names
    pub fn with_legacy_fallback<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.client_secret.is_none() {
            self.client_secret = lookup(LEGACY_CLIENT_SECRET);
        }
        if self.port.is_none() {
            self.port = lookup(LEGACY_PORT);
        }
        if self.host.is_none() {
            self.host = lookup(LEGACY_HOST);
        }
        self
    }

    pub fn into_inputs(self) -> ConfigInputs {
        ConfigInputs {
            client_id: Some(self.client_id),
            client_secret: self.client_secret,
            port: self.port,
            host: self.host,
            dev: self.dev,
            oauth_route: Some(self.oauth_route),
            token_refresh_route: Some(self.token_refresh_route),
            render_route: Some(self.render_route),
            layouts_dir: self.layouts_dir,
            scope: self.scope,
        }
    }
}
