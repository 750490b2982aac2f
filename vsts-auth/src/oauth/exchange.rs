//! OAuth exchange engine
//!
//! Builds the grant body, performs the single outbound call and classifies the
//! provider's answer. There are no retries: every failure ends the request.

use crate::config::OAuthConfig;
use crate::oauth::client::{TokenClient, TransportError};
use crate::oauth::models::{GrantRequest, GrantType, ProviderResult};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;
use vsts_logging::LogSanitizer;

/// Body of the missing-code response
pub const E_NO_CODE: &str = "Bad Request: no code parameter in the request!";

/// Body of the unparseable-result response
pub const E_UNABLE_TO_PARSE: &str = "Bad Request: unable to parse result.";

/// Exchange failures. Each one's `Display` is the response body sent to the client.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Request had no usable `code` parameter
    #[error("Bad Request: no code parameter in the request!")]
    MissingCode,

    /// Token endpoint could not be reached
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// Response was not JSON, or was a falsy JSON value
    #[error("Bad Request: unable to parse result.")]
    UnableToParse,

    /// Provider reported an error; carries the raw response body
    #[error("{0}")]
    Provider(String),
}

/// Return the code if present and non-empty
pub fn require_code(code: Option<&str>) -> Result<&str, ExchangeError> {
    code.filter(|c| !c.is_empty()).ok_or(ExchangeError::MissingCode)
}

/// JavaScript-style falsiness of a JSON value
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Classify a token endpoint response body
pub fn classify(body: &str) -> Result<ProviderResult, ExchangeError> {
    let value: Value = serde_json::from_str(body).map_err(|_| ExchangeError::UnableToParse)?;

    if is_falsy(&value) {
        return Err(ExchangeError::UnableToParse);
    }

    if value.get("Error").is_some_and(|error| !is_falsy(error)) {
        return Err(ExchangeError::Provider(body.to_string()));
    }

    Ok(ProviderResult::new(body.to_string(), value))
}

/// Performs grant exchanges against the token endpoint
pub struct ExchangeEngine {
    client: Arc<dyn TokenClient>,
    client_secret: String,
    callback_uri: Url,
    sanitizer: LogSanitizer,
}

impl ExchangeEngine {
    /// Engine posting grants for `config` through `client`
    pub fn new(config: &OAuthConfig, client: Arc<dyn TokenClient>) -> Self {
        Self {
            client,
            client_secret: config.client_secret.clone(),
            callback_uri: config.callback_uri.clone(),
            sanitizer: LogSanitizer::new(),
        }
    }

    /// Build the grant body for `assertion` (an authorization code or refresh token)
    pub fn grant_request(&self, assertion: &str, grant_type: GrantType) -> GrantRequest {
        GrantRequest::new(
            self.client_secret.as_str(),
            grant_type,
            assertion,
            self.callback_uri.as_str(),
        )
    }

    /// Exchange `code` for tokens using `grant_type`
    pub async fn exchange(
        &self,
        code: &str,
        grant_type: GrantType,
    ) -> Result<ProviderResult, ExchangeError> {
        let code = require_code(Some(code))?;
        let grant = self.grant_request(code, grant_type);
        self.submit(&grant).await
    }

    /// Send a prepared grant and classify the response
    pub async fn submit(&self, grant: &GrantRequest) -> Result<ProviderResult, ExchangeError> {
        let body = self.client.post_form(grant).await.map_err(|e| {
            warn!(error = %self.sanitizer.sanitize(&e.to_string()), "Token endpoint unreachable");
            ExchangeError::Transport(e)
        })?;

        match classify(&body) {
            Ok(result) => {
                debug!(
                    grant_type = grant.grant_type(),
                    result = %self.sanitizer.sanitize_context(result.as_json()),
                    "Token exchange succeeded"
                );
                Ok(result)
            }
            Err(e) => {
                let reason = if matches!(e, ExchangeError::Provider(_)) {
                    "provider reported an error"
                } else {
                    "unable to parse result"
                };
                warn!(
                    grant_type = grant.grant_type(),
                    body = %self.sanitizer.sanitize(&body),
                    "Token exchange rejected: {}",
                    reason
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigInputs;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a fixed body and remembers the grants it was sent
    struct StaticClient {
        body: String,
        seen: Mutex<Vec<GrantRequest>>,
    }

    #[async_trait]
    impl TokenClient for StaticClient {
        async fn post_form(&self, grant: &GrantRequest) -> Result<String, TransportError> {
            self.seen.lock().unwrap().push(grant.clone());
            Ok(self.body.clone())
        }
    }

    fn config() -> OAuthConfig {
        ConfigInputs {
            client_secret: Some("s3cr3t".to_string()),
            port: Some("3000".to_string()),
            host: Some("auth.example.com".to_string()),
            ..Default::default()
        }
        .resolve()
        .unwrap()
    }

    #[test]
    fn test_require_code() {
        assert_eq!(require_code(Some("abc")).unwrap(), "abc");
        assert!(matches!(require_code(None), Err(ExchangeError::MissingCode)));
        assert!(matches!(require_code(Some("")), Err(ExchangeError::MissingCode)));
    }

    #[test]
    fn test_error_bodies() {
        assert_eq!(ExchangeError::MissingCode.to_string(), E_NO_CODE);
        assert_eq!(ExchangeError::UnableToParse.to_string(), E_UNABLE_TO_PARSE);
        assert_eq!(
            ExchangeError::Transport(TransportError::Other("connection refused".into())).to_string(),
            "connection refused"
        );
    }

    #[test]
    fn test_classify_success() {
        let body = r#"{"refresh_token": "abc123", "access_token": "xyz"}"#;
        let result = classify(body).unwrap();
        assert_eq!(result.refresh_token(), Some("abc123"));
        assert_eq!(result.raw(), body);
    }

    #[test]
    fn test_classify_not_json() {
        assert!(matches!(classify("not json"), Err(ExchangeError::UnableToParse)));
        assert!(matches!(classify(""), Err(ExchangeError::UnableToParse)));
    }

    #[test]
    fn test_classify_falsy_json() {
        for body in ["null", "false", "0", "\"\""] {
            assert!(
                matches!(classify(body), Err(ExchangeError::UnableToParse)),
                "{body} should not parse as a result"
            );
        }
    }

    #[test]
    fn test_classify_provider_error_passes_raw_body() {
        let body = r#"{"Error": "invalid_grant"}"#;
        match classify(body) {
            Err(ExchangeError::Provider(raw)) => assert_eq!(raw, body),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_empty_error_field_is_success() {
        let result = classify(r#"{"Error": "", "refresh_token": "abc"}"#).unwrap();
        assert_eq!(result.refresh_token(), Some("abc"));
    }

    #[test]
    fn test_grant_request_uses_config() {
        let client = Arc::new(StaticClient {
            body: "{}".to_string(),
            seen: Mutex::new(vec![]),
        });
        let engine = ExchangeEngine::new(&config(), client);

        let grant = engine.grant_request("the-code", GrantType::JwtBearer);
        assert_eq!(grant.client_assertion(), "s3cr3t");
        assert_eq!(grant.assertion(), "the-code");
        assert_eq!(grant.redirect_uri(), "https://auth.example.com/oauth-callback");
        assert_eq!(grant.grant_type(), GrantType::JwtBearer.as_str());
    }

    #[tokio::test]
    async fn test_exchange_sends_refresh_grant() {
        let client = Arc::new(StaticClient {
            body: r#"{"refresh_token":"new","access_token":"xyz"}"#.to_string(),
            seen: Mutex::new(vec![]),
        });
        let engine = ExchangeEngine::new(&config(), client.clone());

        let result = engine.exchange("old", GrantType::RefreshToken).await.unwrap();
        assert_eq!(result.refresh_token(), Some("new"));

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].grant_type(), "refresh_token");
        assert_eq!(seen[0].assertion(), "old");
    }

    #[tokio::test]
    async fn test_exchange_rejects_empty_code_without_calling_provider() {
        let client = Arc::new(StaticClient {
            body: "{}".to_string(),
            seen: Mutex::new(vec![]),
        });
        let engine = ExchangeEngine::new(&config(), client.clone());

        let err = engine.exchange("", GrantType::JwtBearer).await.unwrap_err();
        assert!(matches!(err, ExchangeError::MissingCode));
        assert!(client.seen.lock().unwrap().is_empty());
    }
}
