use std::time::SystemTime;

use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::{
    dto::play::{SubmitAnswerRequest, SubmitAnswerResponse},
    error::ServiceError,
    state::{
        SharedState,
        machine::SessionPhase,
        session::{AnswerRecord, QuizSession},
    },
};

/// Record a scored answer with an at-most-once guarantee per
/// `(session, question, participant)`.
///
/// A repeat submission for a key that already holds a record returns the
/// stored outcome unchanged, whatever the session has moved on to since, so
/// client retries stay idempotent. New submissions are validated against the
/// current question and its time window before the insert.
pub async fn submit(
    state: &SharedState,
    code: &str,
    participant_id: &str,
    request: SubmitAnswerRequest,
) -> Result<SubmitAnswerResponse, ServiceError> {
    let session = state.require_session(code)?;
    session.touch().await;

    if !session.is_participant(participant_id).await {
        return Err(ServiceError::Unauthorized(
            "join the session before submitting answers".into(),
        ));
    }

    let replay_key = (request.question_index, participant_id.to_string());
    if let Some(existing) = session.ledger().get(&replay_key) {
        let record = existing.value().clone();
        drop(existing);
        return Ok(respond(&session, participant_id, record));
    }

    // Hold the lifecycle read guard across the insert so a concurrent
    // advance cannot move the session between validation and the write.
    let progress = session.progress().read().await;

    let SessionPhase::Active { index } = progress.phase else {
        return Err(ServiceError::InvalidState(
            "submissions require an active session".into(),
        ));
    };

    if request.question_index != index {
        return Err(ServiceError::StaleQuestion {
            submitted: request.question_index,
            current: index,
        });
    }

    let started = progress.started_at.ok_or_else(|| {
        ServiceError::InvalidState("active question is missing its start instant".into())
    })?;
    let elapsed = started.elapsed();
    let limit = session.time_limit();
    if elapsed > limit + state.config().grace_period() {
        return Err(ServiceError::TimeExpired);
    }

    let question = session.questions().get(index).ok_or_else(|| {
        ServiceError::InvalidState(format!("question index {index} out of range"))
    })?;

    let record = match session.ledger().entry((index, participant_id.to_string())) {
        // Lost an insert race with our own retry: the first write stands.
        Entry::Occupied(existing) => existing.get().clone(),
        Entry::Vacant(slot) => {
            let is_correct = question.grade(&request.answer);
            let points_awarded = if is_correct {
                state
                    .config()
                    .scoring()
                    .award(question.base_points, elapsed, limit)
            } else {
                0
            };

            let record = AnswerRecord {
                participant_id: participant_id.to_string(),
                question_index: index,
                answer: request.answer,
                submitted_at: SystemTime::now(),
                is_correct,
                points_awarded,
            };
            slot.insert(record.clone());

            debug!(
                code,
                participant = participant_id,
                index,
                is_correct,
                points_awarded,
                "recorded answer submission"
            );

            record
        }
    };

    drop(progress);
    Ok(respond(&session, participant_id, record))
}

fn respond(
    session: &QuizSession,
    participant_id: &str,
    record: AnswerRecord,
) -> SubmitAnswerResponse {
    SubmitAnswerResponse {
        is_correct: record.is_correct,
        points_awarded: record.points_awarded,
        total_points: session.total_points(participant_id),
    }
}
