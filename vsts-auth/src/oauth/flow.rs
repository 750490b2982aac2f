//! Grant flow state machine
//!
//! The callback and refresh routes run the same sequence of stages:
//!
//! ```text
//! Start --validate--> Validated --exchange--> Exchanged --render--> Rendered
//!   \                    \                       \
//!    +--------------------+-----------------------+--> Failed
//! ```
//!
//! The [`RequestContext`] property bag carries state between stages: `validate`
//! stores the grant body under [`FORM_DATA`], `exchange` stores the provider
//! result under [`OAUTH_RESULT`]. A failing stage moves the flow to `Failed`
//! and no later stage runs.

use crate::context::{FORM_DATA, OAUTH_RESULT, RequestContext};
use crate::oauth::exchange::{ExchangeEngine, ExchangeError, require_code};
use crate::oauth::models::{GrantRequest, GrantType, ProviderResult};
use crate::views::ViewError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error};

/// Stages of a grant flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Nothing has run yet
    Start,
    /// A code was present and the grant body is stored
    Validated,
    /// The provider result is stored
    Exchanged,
    /// The terminal handler produced the response
    Rendered,
    /// A stage failed; no later stage runs
    Failed,
}

/// Errors that end a grant flow
#[derive(Debug, Error)]
pub enum FlowError {
    /// Missing code or rejected exchange
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    /// View could not be rendered
    #[error("Failed to render view: {0}")]
    View(#[from] ViewError),

    /// A stage ran before the one it depends on
    #[error("Stage '{stage}' cannot run in state {state:?}")]
    OutOfOrder {
        /// Stage that was attempted
        stage: &'static str,
        /// State the flow was in
        state: FlowState,
    },
}

impl FlowError {
    /// HTTP status of the error response
    pub fn status(&self) -> StatusCode {
        match self {
            FlowError::Exchange(_) => StatusCode::BAD_REQUEST,
            FlowError::View(_) | FlowError::OutOfOrder { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FlowError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Grant flow failed");
        }
        (status, self.to_string()).into_response()
    }
}

/// One request's run through the grant stages
pub struct GrantFlow<'a> {
    engine: &'a ExchangeEngine,
    grant_type: GrantType,
    context: RequestContext,
    state: FlowState,
}

impl<'a> GrantFlow<'a> {
    /// New flow in the `Start` state
    pub fn new(engine: &'a ExchangeEngine, grant_type: GrantType, context: RequestContext) -> Self {
        Self {
            engine,
            grant_type,
            context,
            state: FlowState::Start,
        }
    }

    /// Current stage
    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Context carried between stages
    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Give back the context, ending the flow
    pub fn into_context(self) -> RequestContext {
        self.context
    }

    fn transition(&mut self, next: FlowState) {
        debug!(
            request_id = %self.context.request_id,
            grant_type = %self.grant_type,
            from = ?self.state,
            to = ?next,
            "Grant flow transition"
        );
        self.state = next;
    }

    fn expect_state(&self, stage: &'static str, expected: FlowState) -> Result<(), FlowError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(FlowError::OutOfOrder {
                stage,
                state: self.state,
            })
        }
    }

    fn fail(&mut self, error: FlowError) -> FlowError {
        self.transition(FlowState::Failed);
        error
    }

    /// Start -> Validated: require a code and store the grant body built from it
    pub fn validate(&mut self, code: Option<&str>) -> Result<(), FlowError> {
        self.expect_state("validate", FlowState::Start)?;

        let code = match require_code(code) {
            Ok(code) => code,
            Err(e) => return Err(self.fail(e.into())),
        };
        let grant = self.engine.grant_request(code, self.grant_type);
        self.context.set_property(FORM_DATA, grant);

        self.transition(FlowState::Validated);
        Ok(())
    }

    /// Validated -> Exchanged: submit the stored grant and store the result
    pub async fn exchange(&mut self) -> Result<(), FlowError> {
        self.expect_state("exchange", FlowState::Validated)?;

        let Some(grant) = self.context.get_property::<GrantRequest>(FORM_DATA).cloned() else {
            let error = FlowError::OutOfOrder {
                stage: "exchange",
                state: self.state,
            };
            return Err(self.fail(error));
        };

        match self.engine.submit(&grant).await {
            Ok(result) => {
                self.context.set_property(OAUTH_RESULT, result);
                self.transition(FlowState::Exchanged);
                Ok(())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Exchanged -> Rendered: hand the stored result to the terminal handler
    pub fn render<R, F>(&mut self, terminal: F) -> Result<R, FlowError>
    where
        F: FnOnce(&ProviderResult) -> Result<R, FlowError>,
    {
        self.expect_state("render", FlowState::Exchanged)?;

        let outcome = match self.context.get_property::<ProviderResult>(OAUTH_RESULT) {
            Some(result) => terminal(result),
            None => Err(FlowError::OutOfOrder {
                stage: "render",
                state: self.state,
            }),
        };

        match outcome {
            Ok(rendered) => {
                self.transition(FlowState::Rendered);
                Ok(rendered)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Run every stage in order, stopping at the first failure
    pub async fn run<R, F>(mut self, code: Option<&str>, terminal: F) -> Result<R, FlowError>
    where
        F: FnOnce(&ProviderResult) -> Result<R, FlowError>,
    {
        self.validate(code)?;
        self.exchange().await?;
        self.render(terminal)
    }
}
