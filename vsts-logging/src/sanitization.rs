//! Log sanitization
//!
//! Grant request bodies carry the client secret as `client_assertion` and the
//! user's authorization code or refresh token as `assertion`; provider results
//! carry access and refresh tokens. None of these may be written to logs.

use regex::Regex;
use std::sync::OnceLock;

/// Matches `key=value` and `"key": "value"` pairs for credential-bearing keys
static CREDENTIAL_PAIR_REGEX: OnceLock<Regex> = OnceLock::new();

/// Matches `Bearer <token>`
static BEARER_REGEX: OnceLock<Regex> = OnceLock::new();

fn credential_pair_regex() -> &'static Regex {
    CREDENTIAL_PAIR_REGEX.get_or_init(|| {
        Regex::new(
            r#"(?i)\b(client_assertion|assertion|client_secret|refresh_token|access_token|id_token|code)(["']?\s*[=:]\s*["']?)([^&"'\s,}]+)"#,
        )
        .expect("Invalid credential regex")
    })
}

fn bearer_regex() -> &'static Regex {
    BEARER_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\b(bearer)(\s+)([a-zA-Z0-9._~+/=-]+)").expect("Invalid bearer regex")
    })
}

/// Sanitization configuration
#[derive(Debug, Clone)]
pub struct SanitizationConfig {
    /// Enable sanitization
    pub enabled: bool,

    /// Replacement string for sensitive data
    pub replacement: String,
}

impl Default for SanitizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            replacement: "[REDACTED]".to_string(),
        }
    }
}

/// Log sanitizer for removing credentials from log output
#[derive(Debug, Clone, Default)]
pub struct LogSanitizer {
    config: SanitizationConfig,
}

impl LogSanitizer {
    /// Create a new log sanitizer with default configuration
    pub fn new() -> Self {
        Self::with_config(SanitizationConfig::default())
    }

    /// Create a new log sanitizer with custom configuration
    pub fn with_config(config: SanitizationConfig) -> Self {
        Self { config }
    }

    /// Redact credential values in a free-form message or form body
    pub fn sanitize(&self, message: &str) -> String {
        if !self.config.enabled {
            return message.to_string();
        }

        let replacement = self.config.replacement.as_str();
        let sanitized = credential_pair_regex().replace_all(message, |caps: &regex::Captures| {
            format!("{}{}{}", &caps[1], &caps[2], replacement)
        });
        bearer_regex()
            .replace_all(&sanitized, |caps: &regex::Captures| {
                format!("{}{}{}", &caps[1], &caps[2], replacement)
            })
            .into_owned()
    }

    /// Redact sensitive fields of a JSON value, recursively
    pub fn sanitize_context(&self, context: &serde_json::Value) -> serde_json::Value {
        if !self.config.enabled {
            return context.clone();
        }

        match context {
            serde_json::Value::Object(map) => {
                let sanitized_map = map
                    .iter()
                    .map(|(key, value)| {
                        let value = if Self::is_sensitive_field(key) {
                            serde_json::Value::String(self.config.replacement.clone())
                        } else {
                            self.sanitize_context(value)
                        };
                        (key.clone(), value)
                    })
                    .collect();

                serde_json::Value::Object(sanitized_map)
            }
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(|v| self.sanitize_context(v)).collect())
            }
            serde_json::Value::String(s) => serde_json::Value::String(self.sanitize(s)),
            other => other.clone(),
        }
    }

    /// Check if a field name indicates sensitive data
    fn is_sensitive_field(field_name: &str) -> bool {
        let lower_name = field_name.to_lowercase();
        if matches!(
            lower_name.as_str(),
            "assertion" | "client_assertion" | "code" | "authorization"
        ) {
            return true;
        }

        lower_name.contains("token") || lower_name.contains("secret") || lower_name.contains("password")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_grant_body_is_redacted() {
        let sanitizer = LogSanitizer::new();
        let body = "client_assertion_type=urn:ietf:params:oauth:client-assertion-type:jwt-bearer\
                    &client_assertion=s3cr3t&grant_type=refresh_token&assertion=r3fr3sh\
                    &redirect_uri=https://example.com/oauth-callback";

        let sanitized = sanitizer.sanitize(body);

        assert!(!sanitized.contains("s3cr3t"));
        assert!(!sanitized.contains("r3fr3sh"));
        assert!(sanitized.contains("client_assertion=[REDACTED]"));
        assert!(sanitized.contains("&assertion=[REDACTED]"));
        assert!(sanitized.contains(
            "client_assertion_type=urn:ietf:params:oauth:client-assertion-type:jwt-bearer"
        ));
        assert!(sanitized.contains("grant_type=refresh_token"));
        assert!(sanitized.contains("redirect_uri=https://example.com/oauth-callback"));
    }

    #[test]
    fn test_json_text_is_redacted() {
        let sanitizer = LogSanitizer::new();
        let text = r#"{"access_token":"xyz","refresh_token": "abc123","expires_in":"3599"}"#;

        let sanitized = sanitizer.sanitize(text);

        assert!(!sanitized.contains("xyz"));
        assert!(!sanitized.contains("abc123"));
        assert!(sanitized.contains(r#""expires_in":"3599""#));
    }

    #[test]
    fn test_bearer_is_redacted() {
        let sanitizer = LogSanitizer::new();
        assert_eq!(
            sanitizer.sanitize("Authorization: Bearer eyJ0eXAi.abc.def"),
            "Authorization: Bearer [REDACTED]"
        );
    }

    #[test]
    fn test_disabled_sanitizer_passes_through() {
        let sanitizer = LogSanitizer::with_config(SanitizationConfig {
            enabled: false,
            ..Default::default()
        });
        assert_eq!(sanitizer.sanitize("assertion=abc"), "assertion=abc");
    }

    #[test]
    fn test_sanitize_context() {
        let sanitizer = LogSanitizer::with_config(SanitizationConfig {
            enabled: true,
            replacement: "***".to_string(),
        });
        let value = json!({
            "access_token": "xyz",
            "refresh_token": "abc123",
            "token_type": "jwt-bearer",
            "expires_in": "3599",
            "scope": "vso.code",
            "nested": [{ "client_secret": "hidden" }]
        });

        let sanitized = sanitizer.sanitize_context(&value);

        assert_eq!(sanitized["access_token"], "***");
        assert_eq!(sanitized["refresh_token"], "***");
        assert_eq!(sanitized["token_type"], "***");
        assert_eq!(sanitized["expires_in"], "3599");
        assert_eq!(sanitized["scope"], "vso.code");
        assert_eq!(sanitized["nested"][0]["client_secret"], "***");
    }
}
