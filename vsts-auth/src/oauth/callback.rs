//! OAuth redirect callback
//!
//! Exchanges the authorization code for tokens with the JWT-bearer grant and
//! renders the `token` view with the refresh token.

use crate::context::RequestContext;
use crate::oauth::OAuthState;
use crate::oauth::flow::{FlowError, GrantFlow};
use crate::oauth::models::{CodeQuery, GrantType};
use crate::views::View;
use axum::{
    extract::State,
    response::Html,
};
use tracing::info;

/// GET oauth route - Exchange an authorization code for tokens
///
/// # Query Parameters
/// - `code`: Authorization code issued by the provider
///
/// # Responses
/// - `200`: token page showing the refresh token
/// - `400`: missing code, transport failure, unparseable or provider error body
pub async fn oauth_callback(
    State(state): State<OAuthState>,
    context: RequestContext,
    query: CodeQuery,
) -> Result<Html<String>, FlowError> {
    let request_id = context.request_id;

    let html = GrantFlow::new(&state.engine, GrantType::JwtBearer, context)
        .run(query.code.as_deref(), |result| {
            let view = View::Token {
                refresh_token: result.refresh_token().map(str::to_string),
            };
            Ok(state.views.render(&view)?)
        })
        .await?;

    info!(request_id = %request_id, "Authorization code exchanged");
    Ok(Html(html))
}
