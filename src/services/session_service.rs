use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use crate::{
    dto::play::StartedResponse,
    dto::session::{
        CreateSessionRequest, JoinResponse, LobbyResponse, ParticipantSummary, QuestionInput,
        SessionCreatedResponse, SessionStatus,
    },
    error::ServiceError,
    state::{
        SharedState,
        machine::{SessionEvent, SessionPhase},
        session::{Question, QuestionKind, QuizSession},
    },
};

/// Bootstrap a fresh session in the lobby phase, owned by `host_id`.
pub async fn create(
    state: &SharedState,
    host_id: &str,
    request: CreateSessionRequest,
) -> Result<SessionCreatedResponse, ServiceError> {
    let CreateSessionRequest {
        time_limit_seconds,
        questions,
    } = request;

    if time_limit_seconds == 0 {
        return Err(ServiceError::InvalidInput(
            "time limit must be strictly positive".into(),
        ));
    }

    let questions = build_questions(questions)?;
    let time_limit = Duration::from_secs(time_limit_seconds);

    let host = host_id.to_string();
    let session = state.register(|code| {
        QuizSession::new(code, host.clone(), questions.clone(), time_limit)
    });

    info!(
        code = session.code(),
        questions = session.questions().len(),
        time_limit_seconds,
        "created live quiz session"
    );

    Ok(SessionCreatedResponse {
        code: session.code().to_string(),
        question_count: session.questions().len(),
        time_limit_seconds,
    })
}

/// Add a participant to a session's roster; idempotent for repeat joins.
///
/// Joining is allowed while the session is in the lobby or already active,
/// so late joiners and reconnecting clients can still take part.
pub async fn join(
    state: &SharedState,
    code: &str,
    participant_id: &str,
) -> Result<JoinResponse, ServiceError> {
    let session = state.require_session(code)?;
    session.touch().await;

    let snapshot = session.snapshot().await;
    if snapshot.phase == SessionPhase::Completed {
        return Err(ServiceError::InvalidState(
            "session has already completed".into(),
        ));
    }

    if session.join(participant_id).await {
        info!(code, participant = participant_id, "participant joined session");
    }

    Ok(JoinResponse {
        code: session.code().to_string(),
        status: (&snapshot.phase).into(),
        question_count: session.questions().len(),
        participant_count: session.roster().await.len(),
        host_id: session.host_id().to_string(),
    })
}

/// Read-only roster view of a session.
pub async fn lobby(state: &SharedState, code: &str) -> Result<LobbyResponse, ServiceError> {
    let session = state.require_session(code)?;
    session.touch().await;

    let snapshot = session.snapshot().await;
    let roster = session.roster().await;
    let participants = roster
        .into_iter()
        .map(ParticipantSummary::from)
        .collect::<Vec<_>>();

    Ok(LobbyResponse {
        code: session.code().to_string(),
        status: (&snapshot.phase).into(),
        participant_count: participants.len(),
        participants,
        question_count: session.questions().len(),
    })
}

/// Open the first question. Host-only, lobby-only.
pub async fn start(
    state: &SharedState,
    code: &str,
    caller_id: &str,
) -> Result<StartedResponse, ServiceError> {
    let session = state.require_session(code)?;

    if caller_id != session.host_id() {
        return Err(ServiceError::Unauthorized(
            "only the host can start the session".into(),
        ));
    }

    let snapshot = session.snapshot().await;
    if snapshot.phase != SessionPhase::Lobby {
        return Err(ServiceError::InvalidState(
            "session can only be started from the lobby".into(),
        ));
    }

    session.apply_event(snapshot.version, SessionEvent::Start).await?;

    let first = session.questions().first().ok_or_else(|| {
        ServiceError::InvalidState("session has no questions".into())
    })?;

    info!(code, "session started");

    Ok(StartedResponse {
        status: SessionStatus::Active,
        index: 0,
        question: first.into(),
        time_limit_seconds: session.time_limit().as_secs(),
    })
}

fn build_questions(inputs: Vec<QuestionInput>) -> Result<Vec<Question>, ServiceError> {
    if inputs.is_empty() {
        return Err(ServiceError::InvalidInput(
            "a session requires at least one question".into(),
        ));
    }

    inputs
        .into_iter()
        .enumerate()
        .map(|(position, input)| {
            if input.text.trim().is_empty() {
                return Err(ServiceError::InvalidInput(format!(
                    "question {position} has an empty prompt"
                )));
            }

            if input.correct_answer.trim().is_empty() {
                return Err(ServiceError::InvalidInput(format!(
                    "question {position} has an empty answer key"
                )));
            }

            if input.base_points == 0 {
                return Err(ServiceError::InvalidInput(format!(
                    "question {position} must be worth at least one point"
                )));
            }

            let kind: QuestionKind = input.kind.into();
            validate_answer_key(position, kind, &input.options, &input.correct_answer)?;

            Ok(Question {
                id: Uuid::new_v4(),
                text: input.text,
                kind,
                options: input.options,
                correct_answer: input.correct_answer,
                base_points: input.base_points,
            })
        })
        .collect()
}

fn validate_answer_key(
    position: usize,
    kind: QuestionKind,
    options: &[String],
    correct_answer: &str,
) -> Result<(), ServiceError> {
    match kind {
        QuestionKind::MultipleChoice => {
            if options.len() < 2 {
                return Err(ServiceError::InvalidInput(format!(
                    "question {position} needs at least two options"
                )));
            }
            let selected = correct_answer.trim().parse::<usize>().map_err(|_| {
                ServiceError::InvalidInput(format!(
                    "question {position} answer key must be an option index"
                ))
            })?;
            if selected >= options.len() {
                return Err(ServiceError::InvalidInput(format!(
                    "question {position} answer key references option {selected}, but only {} exist",
                    options.len()
                )));
            }
        }
        QuestionKind::TrueFalse => {
            let key = correct_answer.trim();
            if !key.eq_ignore_ascii_case("true") && !key.eq_ignore_ascii_case("false") {
                return Err(ServiceError::InvalidInput(format!(
                    "question {position} answer key must be `true` or `false`"
                )));
            }
        }
        QuestionKind::ShortAnswer => {}
    }

    Ok(())
}
