use futures::future::BoxFuture;

use crate::{
    client::transport::{ApiError, ApiResult, SessionApi},
    dto::play::{AdvanceResponse, CurrentQuestionResponse, SubmitAnswerRequest, SubmitAnswerResponse},
    error::ServiceError,
    services::{answer_service, question_service},
    state::SharedState,
};

/// [`SessionApi`] bound directly to an in-process engine, bypassing HTTP.
///
/// Used by integration tests and by deployments that embed the engine in the
/// same process as the consumer.
pub struct LocalSessionApi {
    state: SharedState,
    participant_id: String,
}

impl LocalSessionApi {
    /// Bind the given participant identity to an engine handle.
    pub fn new(state: SharedState, participant_id: impl Into<String>) -> Self {
        Self {
            state,
            participant_id: participant_id.into(),
        }
    }
}

impl SessionApi for LocalSessionApi {
    fn fetch_current(&self, code: &str) -> BoxFuture<'static, ApiResult<CurrentQuestionResponse>> {
        let state = self.state.clone();
        let code = code.to_string();
        Box::pin(async move {
            question_service::current(&state, &code)
                .await
                .map_err(rejected)
        })
    }

    fn submit_answer(
        &self,
        code: &str,
        request: SubmitAnswerRequest,
    ) -> BoxFuture<'static, ApiResult<SubmitAnswerResponse>> {
        let state = self.state.clone();
        let code = code.to_string();
        let participant_id = self.participant_id.clone();
        Box::pin(async move {
            answer_service::submit(&state, &code, &participant_id, request)
                .await
                .map_err(rejected)
        })
    }

    fn advance(&self, code: &str) -> BoxFuture<'static, ApiResult<AdvanceResponse>> {
        let state = self.state.clone();
        let code = code.to_string();
        let participant_id = self.participant_id.clone();
        Box::pin(async move {
            question_service::advance(&state, &code, &participant_id)
                .await
                .map_err(rejected)
        })
    }
}

fn rejected(err: ServiceError) -> ApiError {
    ApiError::Rejected(err.to_string())
}
