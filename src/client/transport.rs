use futures::future::BoxFuture;
use thiserror::Error;

use crate::dto::play::{
    AdvanceResponse, CurrentQuestionResponse, SubmitAnswerRequest, SubmitAnswerResponse,
};

/// Result alias for transport operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by a [`SessionApi`] implementation.
///
/// The distinction drives the loop's retry policy: transport failures are
/// retried on the next tick, rejections are final server verdicts.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request never produced a server verdict; retrying may succeed.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The server understood the request and refused it.
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Abstraction over the engine's play surface as seen by one participant.
///
/// Implementations carry the participant's resolved identity; the loop only
/// addresses operations by session code.
pub trait SessionApi: Send + Sync {
    /// Fetch the session's current-question view.
    fn fetch_current(&self, code: &str) -> BoxFuture<'static, ApiResult<CurrentQuestionResponse>>;
    /// Submit (or replay) an answer for the current question.
    fn submit_answer(
        &self,
        code: &str,
        request: SubmitAnswerRequest,
    ) -> BoxFuture<'static, ApiResult<SubmitAnswerResponse>>;
    /// Host-only: move the session past the current question.
    fn advance(&self, code: &str) -> BoxFuture<'static, ApiResult<AdvanceResponse>>;
}
