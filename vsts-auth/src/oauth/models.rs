//! OAuth data models
//!
//! Grant request bodies sent to the token endpoint and the results it returns.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use serde_json::Value;
use std::convert::Infallible;

/// `client_assertion_type` sent with every grant request
pub const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Grant types accepted by the token endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantType {
    /// Exchange an authorization code for tokens
    JwtBearer,
    /// Exchange a refresh token for new tokens
    RefreshToken,
}

impl GrantType {
    /// Value of the `grant_type` form field
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::JwtBearer => "urn:ietf:params:oauth:grant-type:jwt-bearer",
            GrantType::RefreshToken => "refresh_token",
        }
    }
}

impl std::fmt::Display for GrantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// URL-form-encoded body of a token request
///
/// Field order matches the wire order of the form body.
#[derive(Clone, Serialize)]
pub struct GrantRequest {
    client_assertion_type: &'static str,
    client_assertion: String,
    grant_type: &'static str,
    assertion: String,
    redirect_uri: String,
}

impl GrantRequest {
    /// Build a grant body. `client_secret` becomes the `client_assertion`,
    /// `assertion` is the authorization code or refresh token.
    pub fn new(
        client_secret: impl Into<String>,
        grant_type: GrantType,
        assertion: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_assertion_type: CLIENT_ASSERTION_TYPE,
            client_assertion: client_secret.into(),
            grant_type: grant_type.as_str(),
            assertion: assertion.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Always [`CLIENT_ASSERTION_TYPE`]
    pub fn client_assertion_type(&self) -> &str {
        self.client_assertion_type
    }

    /// The client secret
    pub fn client_assertion(&self) -> &str {
        &self.client_assertion
    }

    /// Wire value of the grant type
    pub fn grant_type(&self) -> &str {
        self.grant_type
    }

    /// Authorization code or refresh token
    pub fn assertion(&self) -> &str {
        &self.assertion
    }

    /// Callback URI
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }
}

impl std::fmt::Debug for GrantRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantRequest")
            .field("client_assertion_type", &self.client_assertion_type)
            .field("client_assertion", &"[REDACTED]")
            .field("grant_type", &self.grant_type)
            .field("assertion", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Successful token endpoint response
///
/// Keeps the raw body next to the parsed value so it can be passed on unmodified.
#[derive(Debug, Clone)]
pub struct ProviderResult {
    raw: String,
    value: Value,
}

impl ProviderResult {
    pub(crate) fn new(raw: String, value: Value) -> Self {
        Self { raw, value }
    }

    /// Response body exactly as the provider sent it
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parsed response body
    pub fn as_json(&self) -> &Value {
        &self.value
    }

    /// `refresh_token` field, if present and a string
    pub fn refresh_token(&self) -> Option<&str> {
        self.value.get("refresh_token").and_then(Value::as_str)
    }

    /// `access_token` field, if present and a string
    pub fn access_token(&self) -> Option<&str> {
        self.value.get("access_token").and_then(Value::as_str)
    }
}

/// Query parameters of the callback and refresh routes
///
/// On the refresh route `code` carries the refresh token. A repeated `code`
/// parameter is joined with `,`. Extraction never rejects a request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CodeQuery {
    /// Authorization code or refresh token, if the parameter was sent
    pub code: Option<String>,
}

impl CodeQuery {
    /// Collect the `code` values of a raw query string
    pub fn from_query(query: &str) -> Self {
        let codes: Vec<String> = url::form_urlencoded::parse(query.as_bytes())
            .filter(|(key, _)| key == "code")
            .map(|(_, value)| value.into_owned())
            .collect();

        Self {
            code: (!codes.is_empty()).then(|| codes.join(",")),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CodeQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.uri.query().map(Self::from_query).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_type_strings() {
        assert_eq!(
            GrantType::JwtBearer.as_str(),
            "urn:ietf:params:oauth:grant-type:jwt-bearer"
        );
        assert_eq!(GrantType::RefreshToken.to_string(), "refresh_token");
    }

    #[test]
    fn test_grant_request_fields() {
        let grant = GrantRequest::new(
            "s3cr3t",
            GrantType::JwtBearer,
            "auth-code",
            "https://auth.example.com/oauth-callback",
        );

        assert_eq!(grant.client_assertion_type(), CLIENT_ASSERTION_TYPE);
        assert_eq!(grant.client_assertion(), "s3cr3t");
        assert_eq!(grant.grant_type(), "urn:ietf:params:oauth:grant-type:jwt-bearer");
        assert_eq!(grant.assertion(), "auth-code");
        assert_eq!(grant.redirect_uri(), "https://auth.example.com/oauth-callback");
    }

    #[test]
    fn test_grant_request_debug_redacts_credentials() {
        let grant = GrantRequest::new("s3cr3t", GrantType::RefreshToken, "r3fr3sh", "https://x/");
        let debug = format!("{grant:?}");
        assert!(!debug.contains("s3cr3t"));
        assert!(!debug.contains("r3fr3sh"));
        assert!(debug.contains("refresh_token"));
    }

    #[test]
    fn test_provider_result_accessors() {
        let raw = r#"{"refresh_token":"abc123","access_token":"xyz"}"#.to_string();
        let value = serde_json::from_str(&raw).unwrap();
        let result = ProviderResult::new(raw.clone(), value);

        assert_eq!(result.refresh_token(), Some("abc123"));
        assert_eq!(result.access_token(), Some("xyz"));
        assert_eq!(result.raw(), raw);
    }

    #[test]
    fn test_code_query_single_value() {
        let query = CodeQuery::from_query("state=xyz&code=auth%2Bcode");
        assert_eq!(query.code.as_deref(), Some("auth+code"));
    }

    #[test]
    fn test_code_query_repeated_values_are_joined() {
        let query = CodeQuery::from_query("code=a&code=b");
        assert_eq!(query.code.as_deref(), Some("a,b"));
    }

    #[test]
    fn test_code_query_absent_or_empty() {
        assert_eq!(CodeQuery::from_query("state=xyz").code, None);
        assert_eq!(CodeQuery::from_query("").code, None);
        assert_eq!(CodeQuery::from_query("code=").code.as_deref(), Some(""));
    }
}
