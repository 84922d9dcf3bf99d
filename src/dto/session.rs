use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dto::format_system_time,
    state::{
        machine::SessionPhase,
        session::{Participant, QuestionKind},
    },
};

/// Payload used to open a brand-new quiz session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateSessionRequest {
    /// Answer window applied to every question, in seconds.
    #[validate(range(min = 5, max = 600))]
    pub time_limit_seconds: u64,
    #[validate(length(min = 1), nested)]
    pub questions: Vec<QuestionInput>,
}

/// Incoming question definition for the session bootstrap.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuestionInput {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKindInput,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
    pub base_points: u32,
}

impl Validate for QuestionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.text.trim().is_empty() {
            errors.add("text", ValidationError::new("question_text_empty"));
        }

        if self.correct_answer.trim().is_empty() {
            errors.add(
                "correct_answer",
                ValidationError::new("correct_answer_empty"),
            );
        }

        if matches!(self.kind, QuestionKindInput::MultipleChoice) && self.options.len() < 2 {
            errors.add("options", ValidationError::new("too_few_options"));
        }

        if self.base_points == 0 {
            errors.add("base_points", ValidationError::new("base_points_zero"));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Wire form of the question kind, matching the authoring tool's vocabulary.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionKindInput {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

impl From<QuestionKindInput> for QuestionKind {
    fn from(value: QuestionKindInput) -> Self {
        match value {
            QuestionKindInput::MultipleChoice => QuestionKind::MultipleChoice,
            QuestionKindInput::TrueFalse => QuestionKind::TrueFalse,
            QuestionKindInput::ShortAnswer => QuestionKind::ShortAnswer,
        }
    }
}

impl From<QuestionKind> for QuestionKindInput {
    fn from(value: QuestionKind) -> Self {
        match value {
            QuestionKind::MultipleChoice => QuestionKindInput::MultipleChoice,
            QuestionKind::TrueFalse => QuestionKindInput::TrueFalse,
            QuestionKind::ShortAnswer => QuestionKindInput::ShortAnswer,
        }
    }
}

/// Session lifecycle status exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Participants are gathering; the host has not started yet.
    Lobby,
    /// A question is currently accepting answers.
    Active,
    /// The question sequence has been exhausted.
    Completed,
}

impl From<&SessionPhase> for SessionStatus {
    fn from(value: &SessionPhase) -> Self {
        match value {
            SessionPhase::Lobby => SessionStatus::Lobby,
            SessionPhase::Active { .. } => SessionStatus::Active,
            SessionPhase::Completed => SessionStatus::Completed,
        }
    }
}

/// Summary returned once a session has been created.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionCreatedResponse {
    /// Join code participants type in.
    pub code: String,
    pub question_count: usize,
    pub time_limit_seconds: u64,
}

/// Summary returned when a participant joins (or re-joins) a session.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinResponse {
    pub code: String,
    pub status: SessionStatus,
    pub question_count: usize,
    pub participant_count: usize,
    pub host_id: String,
}

/// Public projection of one roster entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct ParticipantSummary {
    pub id: String,
    pub joined_at: String,
}

impl From<(String, Participant)> for ParticipantSummary {
    fn from((id, participant): (String, Participant)) -> Self {
        Self {
            id,
            joined_at: format_system_time(participant.joined_at),
        }
    }
}

/// Roster view served while participants gather (and afterwards).
#[derive(Debug, Serialize, ToSchema)]
pub struct LobbyResponse {
    pub code: String,
    pub status: SessionStatus,
    pub participant_count: usize,
    pub participants: Vec<ParticipantSummary>,
    pub question_count: usize,
}
