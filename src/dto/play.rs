use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::session::{QuestionKindInput, SessionStatus},
    state::session::Question,
};

/// Participant-facing projection of a question: the answer key is stripped
/// before anything leaves the engine.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionView {
    pub id: Uuid,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKindInput,
    pub options: Vec<String>,
    pub base_points: u32,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id,
            text: question.text.clone(),
            kind: question.kind.into(),
            options: question.options.clone(),
            base_points: question.base_points,
        }
    }
}

/// Poll response describing what the session is currently showing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CurrentQuestionResponse {
    pub status: SessionStatus,
    /// Index of the active question; absent in the lobby and once completed.
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    /// Seconds left on the authoritative clock, zero when nothing is running.
    pub remaining_seconds: u64,
    pub question_count: usize,
    pub host_id: String,
}

/// Payload submitting an answer for the current question.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct SubmitAnswerRequest {
    /// Index the client believes is current; stale values are rejected.
    pub question_index: usize,
    /// Raw answer; empty means the participant let the clock run out.
    #[validate(length(max = 500))]
    pub answer: String,
}

/// Scored outcome of a submission. Replays of the same submission return
/// the originally stored outcome unchanged.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmitAnswerResponse {
    pub is_correct: bool,
    pub points_awarded: u32,
    /// Cumulative points for the submitting participant.
    pub total_points: u64,
}

/// Response to the host's start call: the first question is now live.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StartedResponse {
    pub status: SessionStatus,
    pub index: usize,
    pub question: QuestionView,
    pub time_limit_seconds: u64,
}

/// Response to the host's advance call: the next question, or completion.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdvanceResponse {
    pub status: SessionStatus,
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    pub time_limit_seconds: u64,
}
