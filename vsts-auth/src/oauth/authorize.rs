//! Authorization page
//!
//! Renders the `welcome` view with a link to the provider's authorize endpoint.

use crate::config::OAuthConfig;
use crate::context::RequestContext;
use crate::oauth::OAuthState;
use crate::oauth::flow::FlowError;
use crate::views::View;
use axum::{extract::State, response::Html};
use tracing::debug;
use uuid::Uuid;

/// Authorize endpoint of the identity provider
pub const AUTHORIZE_ENDPOINT: &str = "https://app.vssps.visualstudio.com/oauth2/authorize";

/// Build the provider authorization link for `state`
pub fn authorize_url(config: &OAuthConfig, state: &str) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query
        .append_pair("client_id", &config.client_id)
        .append_pair("response_type", "Assertion")
        .append_pair("state", state);
    if let Some(scope) = &config.scope {
        query.append_pair("scope", scope);
    }
    query.append_pair("redirect_uri", config.callback_uri.as_str());

    format!("{AUTHORIZE_ENDPOINT}?{}", query.finish())
}

/// GET render route - Display the authorization page
///
/// A fresh opaque `state` value is generated for every page. The callback does
/// not verify it.
pub async fn render_welcome(
    State(state): State<OAuthState>,
    context: RequestContext,
) -> Result<Html<String>, FlowError> {
    let config = &state.config;
    let csrf_state = Uuid::new_v4().to_string();
    debug!(request_id = %context.request_id, "Rendering authorization page");

    let view = View::Welcome {
        client_id: config.client_id.clone(),
        authorize_url: authorize_url(config, &csrf_state),
        state: csrf_state,
        redirect_uri: config.callback_uri.to_string(),
    };

    Ok(Html(state.views.render(&view)?))
}
