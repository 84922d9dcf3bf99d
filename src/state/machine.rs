use thiserror::Error;

/// Lifecycle phase of one quiz session.
///
/// Transitions are one-directional: `Lobby → Active → Completed`. The active
/// phase carries the index of the question currently accepting answers; the
/// index never decreases and never revisits a prior value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// Participants are gathering; no question is active yet.
    Lobby,
    /// The session is running and `index` identifies the current question.
    Active {
        /// Zero-based index into the session's question list.
        index: usize,
    },
    /// The question sequence has been exhausted; the session is terminal.
    Completed,
}

impl SessionPhase {
    /// Index of the current question, if one is active.
    pub fn current_index(&self) -> Option<usize> {
        match self {
            SessionPhase::Active { index } => Some(*index),
            _ => None,
        }
    }
}

/// Events that can be applied to the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The host opens the first question.
    Start,
    /// The host moves past the current question.
    Advance,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the session was in when the invalid event was received.
    pub from: SessionPhase,
    /// The event that cannot be applied from this phase.
    pub event: SessionEvent,
}

/// Compute the next phase for an event, validating it against the current one.
///
/// `question_count` bounds the advancement: advancing past the last question
/// completes the session instead of producing an out-of-range index.
pub fn compute_transition(
    phase: &SessionPhase,
    event: SessionEvent,
    question_count: usize,
) -> Result<SessionPhase, InvalidTransition> {
    let next = match (phase, event) {
        (SessionPhase::Lobby, SessionEvent::Start) => SessionPhase::Active { index: 0 },
        (SessionPhase::Active { index }, SessionEvent::Advance) => {
            if index + 1 < question_count {
                SessionPhase::Active { index: index + 1 }
            } else {
                SessionPhase::Completed
            }
        }
        (from, event) => {
            return Err(InvalidTransition {
                from: from.clone(),
                event,
            });
        }
    };

    Ok(next)
}
