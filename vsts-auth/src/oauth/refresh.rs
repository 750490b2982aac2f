//! Token refresh endpoint
//!
//! Exchanges a refresh token, passed as the `code` query parameter, for new
//! tokens and returns the provider's JSON unmodified.

use crate::context::RequestContext;
use crate::oauth::OAuthState;
use crate::oauth::flow::{FlowError, GrantFlow};
use crate::oauth::models::{CodeQuery, GrantType};
use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::info;

/// GET token refresh route - Exchange a refresh token for new tokens
///
/// # Query Parameters
/// - `code`: The refresh token to exchange
///
/// # Responses
/// - `200`: provider result as `application/json`, byte-for-byte
/// - `400`: missing code, transport failure, unparseable or provider error body
pub async fn token_refresh(
    State(state): State<OAuthState>,
    context: RequestContext,
    query: CodeQuery,
) -> Result<Response, FlowError> {
    let request_id = context.request_id;

    let response = GrantFlow::new(&state.engine, GrantType::RefreshToken, context)
        .run(query.code.as_deref(), |result| {
            Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                result.raw().to_string(),
            )
                .into_response())
        })
        .await?;

    info!(request_id = %request_id, "Refresh token exchanged");
    Ok(response)
}
