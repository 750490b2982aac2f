//! Tests for the reqwest-backed token endpoint client
//!
//! A wiremock server stands in for the identity provider.

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;
use url::Url;
use vsts_auth::{
    ConfigInputs, GrantRequest, GrantType, HtmlViews, HttpTokenClient, OAuthState, TokenClient,
    TransportError, oauth_router,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, header as header_matcher, method, path},
};

const SUCCESS_BODY: &str = r#"{"access_token":"xyz","token_type":"jwt-bearer","expires_in":"3599","refresh_token":"abc123"}"#;

fn client_for(server: &MockServer) -> HttpTokenClient {
    let endpoint = Url::parse(&format!("{}/oauth2/token", server.uri())).unwrap();
    HttpTokenClient::new().unwrap().with_endpoint(endpoint)
}

fn refresh_grant() -> GrantRequest {
    GrantRequest::new(
        "s3cr3t",
        GrantType::RefreshToken,
        "old-token",
        "https://auth.example.com/oauth-callback",
    )
}

#[test]
fn test_default_endpoint() {
    let client = HttpTokenClient::new().unwrap();
    assert_eq!(
        client.endpoint().as_str(),
        "https://app.vssps.visualstudio.com/oauth2/token"
    );
}

#[tokio::test]
async fn test_posts_form_encoded_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(header_matcher(
            "content-type",
            "application/x-www-form-urlencoded",
        ))
        .and(body_string_contains(
            "client_assertion_type=urn%3Aietf%3Aparams%3Aoauth%3Aclient-assertion-type%3Ajwt-bearer",
        ))
        .and(body_string_contains("&client_assertion=s3cr3t&"))
        .and(body_string_contains("&grant_type=refresh_token&"))
        .and(body_string_contains("&assertion=old-token&"))
        .and(body_string_contains(
            "&redirect_uri=https%3A%2F%2Fauth.example.com%2Foauth-callback",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(SUCCESS_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let body = client_for(&server).post_form(&refresh_grant()).await.unwrap();

    assert_eq!(body, SUCCESS_BODY);
}

#[tokio::test]
async fn test_jwt_bearer_grant_type_is_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(SUCCESS_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let grant = GrantRequest::new(
        "s3cr3t",
        GrantType::JwtBearer,
        "auth-code",
        "https://auth.example.com/oauth-callback",
    );
    client_for(&server).post_form(&grant).await.unwrap();
}

#[tokio::test]
async fn test_error_status_still_returns_body() {
    let server = MockServer::start().await;
    let error_body = r#"{"Error":"invalid_grant","ErrorDescription":"expired"}"#;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string(error_body))
        .mount(&server)
        .await;

    let body = client_for(&server).post_form(&refresh_grant()).await.unwrap();

    assert_eq!(body, error_body);
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    let endpoint = Url::parse("http://127.0.0.1:1/oauth2/token").unwrap();
    let client = HttpTokenClient::new().unwrap().with_endpoint(endpoint);

    let err = client.post_form(&refresh_grant()).await.unwrap_err();

    assert!(matches!(err, TransportError::Http(_)));
    assert!(!err.to_string().is_empty());
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(SUCCESS_BODY)
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server)
        .with_timeout(Duration::from_millis(100))
        .unwrap();
    let err = client.post_form(&refresh_grant()).await.unwrap_err();

    assert!(matches!(err, TransportError::Http(ref e) if e.is_timeout()));
}

#[tokio::test]
async fn test_refresh_route_against_mock_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("&assertion=old-token&"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SUCCESS_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let config = ConfigInputs {
        client_secret: Some("s3cr3t".to_string()),
        port: Some("3000".to_string()),
        host: Some("auth.example.com".to_string()),
        ..Default::default()
    }
    .resolve()
    .unwrap();
    let app = oauth_router(OAuthState::new(
        config,
        Arc::new(client_for(&server)),
        Arc::new(HtmlViews::default()),
    ));

    let request = Request::builder()
        .uri("/token-refresh?code=old-token")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(body, SUCCESS_BODY.as_bytes());
}
