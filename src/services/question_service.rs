use std::time::Duration;

use tracing::info;

use crate::{
    dto::play::{AdvanceResponse, CurrentQuestionResponse},
    dto::session::SessionStatus,
    error::ServiceError,
    state::{
        SharedState,
        machine::{SessionEvent, SessionPhase},
        session::Progress,
    },
};

/// Externally visible view of the current question, answer key stripped.
///
/// The remaining time is computed against the authoritative start instant so
/// polling clients re-sync their local countdown instead of trusting their
/// own clock.
pub async fn current(
    state: &SharedState,
    code: &str,
) -> Result<CurrentQuestionResponse, ServiceError> {
    let session = state.require_session(code)?;
    session.touch().await;

    let snapshot = session.snapshot().await;
    let (index, question, remaining) = match snapshot.phase {
        SessionPhase::Active { index } => {
            let question = session.questions().get(index).ok_or_else(|| {
                ServiceError::InvalidState(format!("question index {index} out of range"))
            })?;
            (
                Some(index),
                Some(question.into()),
                remaining_seconds(&snapshot, session.time_limit()),
            )
        }
        SessionPhase::Lobby | SessionPhase::Completed => (None, None, 0),
    };

    Ok(CurrentQuestionResponse {
        status: (&snapshot.phase).into(),
        index,
        question,
        remaining_seconds: remaining,
        question_count: session.questions().len(),
        host_id: session.host_id().to_string(),
    })
}

/// Move the session past the current question. Host-only, active-only.
///
/// The apply is guarded by the snapshot's version: of two racing advance
/// calls exactly one wins, and the loser observes an invalid-state error
/// instead of skipping a question.
pub async fn advance(
    state: &SharedState,
    code: &str,
    caller_id: &str,
) -> Result<AdvanceResponse, ServiceError> {
    let session = state.require_session(code)?;

    if caller_id != session.host_id() {
        return Err(ServiceError::Unauthorized(
            "only the host can advance the session".into(),
        ));
    }

    let snapshot = session.snapshot().await;
    if !matches!(snapshot.phase, SessionPhase::Active { .. }) {
        return Err(ServiceError::InvalidState(
            "advance requires an active session".into(),
        ));
    }

    let next = session
        .apply_event(snapshot.version, SessionEvent::Advance)
        .await?;

    let time_limit_seconds = session.time_limit().as_secs();
    let response = match next {
        SessionPhase::Active { index } => {
            let question = session.questions().get(index).ok_or_else(|| {
                ServiceError::InvalidState(format!("question index {index} out of range"))
            })?;
            info!(code, index, "advanced to next question");
            AdvanceResponse {
                status: SessionStatus::Active,
                index: Some(index),
                question: Some(question.into()),
                time_limit_seconds,
            }
        }
        SessionPhase::Completed => {
            info!(code, "session completed");
            AdvanceResponse {
                status: SessionStatus::Completed,
                index: None,
                question: None,
                time_limit_seconds,
            }
        }
        SessionPhase::Lobby => {
            return Err(ServiceError::InvalidState(
                "advance cannot return a session to the lobby".into(),
            ));
        }
    };

    Ok(response)
}

fn remaining_seconds(snapshot: &Progress, limit: Duration) -> u64 {
    snapshot
        .started_at
        .map(|started| limit.saturating_sub(started.elapsed()))
        .unwrap_or(Duration::ZERO)
        .as_secs()
}
