use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

use crate::state::machine::{self, InvalidTransition, SessionEvent, SessionPhase};

/// Kind of a quiz question, driving how answers are graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    /// Answer is the index of the chosen option.
    MultipleChoice,
    /// Answer is `true` or `false`.
    TrueFalse,
    /// Answer is free text compared case-insensitively.
    ShortAnswer,
}

/// One question of a session's fixed sequence. Authored externally and
/// read-only to the engine once the session exists.
#[derive(Debug, Clone)]
pub struct Question {
    /// Stable identifier for the question.
    pub id: Uuid,
    /// Prompt shown to participants.
    pub text: String,
    /// Grading mode.
    pub kind: QuestionKind,
    /// Choices, only meaningful for [`QuestionKind::MultipleChoice`].
    pub options: Vec<String>,
    /// Answer key. Never exposed to participants.
    pub correct_answer: String,
    /// Points awarded for a correct answer before the speed curve applies.
    pub base_points: u32,
}

impl Question {
    /// Grade a raw answer against the answer key.
    pub fn grade(&self, answer: &str) -> bool {
        match self.kind {
            QuestionKind::MultipleChoice => {
                match (
                    answer.trim().parse::<usize>(),
                    self.correct_answer.trim().parse::<usize>(),
                ) {
                    (Ok(submitted), Ok(expected)) => submitted == expected,
                    _ => false,
                }
            }
            QuestionKind::TrueFalse => answer.trim().eq_ignore_ascii_case(self.correct_answer.trim()),
            QuestionKind::ShortAnswer => {
                answer.trim().to_lowercase() == self.correct_answer.trim().to_lowercase()
            }
        }
    }
}

/// Roster entry for a joined participant.
#[derive(Debug, Clone)]
pub struct Participant {
    /// When the participant joined the session.
    pub joined_at: SystemTime,
}

/// Ledger key: one scored record per `(question index, participant)` pair.
pub type AnswerKey = (usize, String);

/// A scored answer submission. Created once, never mutated.
#[derive(Debug, Clone)]
pub struct AnswerRecord {
    /// Participant that submitted.
    pub participant_id: String,
    /// Question index the submission targeted.
    pub question_index: usize,
    /// Raw answer as submitted.
    pub answer: String,
    /// Wall-clock submission time, used for leaderboard tie-breaks.
    pub submitted_at: SystemTime,
    /// Whether the answer matched the answer key.
    pub is_correct: bool,
    /// Points granted by the scoring curve (zero when incorrect).
    pub points_awarded: u32,
}

/// Mutable lifecycle state of a session, guarded by one lock.
///
/// `version` increments on every applied transition; callers that validated
/// against a snapshot pass its version back so a concurrent transition makes
/// the stale apply fail instead of double-firing.
#[derive(Debug, Clone)]
pub struct Progress {
    /// Current lifecycle phase.
    pub phase: SessionPhase,
    /// Transition counter for the compare-and-swap guard.
    pub version: usize,
    /// Activation instant of the current question, present while active.
    pub started_at: Option<Instant>,
    /// Last read or write that touched the session, for the TTL sweep.
    pub last_activity: Instant,
}

/// Errors raised when applying a lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The requested event is not valid from the current phase.
    #[error(transparent)]
    Invalid(#[from] InvalidTransition),
    /// Another transition won the race since the caller's snapshot.
    #[error("session version mismatch (expected {expected}, got {actual})")]
    VersionMismatch {
        /// Version the caller validated against.
        expected: usize,
        /// Version found at apply time.
        actual: usize,
    },
}

/// Canonical state of one quiz session, the unit of concurrency partitioning.
///
/// The question list and host identity are immutable for the session's
/// lifetime; everything mutable lives behind the progress lock, the roster
/// lock, or the ledger's own sharded locks.
pub struct QuizSession {
    code: String,
    host_id: String,
    questions: Vec<Question>,
    time_limit: Duration,
    created_at: SystemTime,
    progress: RwLock<Progress>,
    participants: RwLock<IndexMap<String, Participant>>,
    ledger: DashMap<AnswerKey, AnswerRecord>,
}

impl QuizSession {
    /// Build a session in the lobby phase.
    pub fn new(code: String, host_id: String, questions: Vec<Question>, time_limit: Duration) -> Self {
        let now = Instant::now();
        Self {
            code,
            host_id,
            questions,
            time_limit,
            created_at: SystemTime::now(),
            progress: RwLock::new(Progress {
                phase: SessionPhase::Lobby,
                version: 0,
                started_at: None,
                last_activity: now,
            }),
            participants: RwLock::new(IndexMap::new()),
            ledger: DashMap::new(),
        }
    }

    /// Join code addressing this session.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Identity of the participant allowed to start and advance.
    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    /// Ordered, immutable question sequence.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Per-question answer window.
    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    /// Creation timestamp for display and auditing.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Lifecycle lock. Submissions hold the read guard across their ledger
    /// insert so transitions (write guard) cannot interleave.
    pub fn progress(&self) -> &RwLock<Progress> {
        &self.progress
    }

    /// Clone of the current lifecycle state.
    pub async fn snapshot(&self) -> Progress {
        self.progress.read().await.clone()
    }

    /// Apply a lifecycle event if the caller's snapshot is still current.
    ///
    /// Exactly one of several racing callers wins; the rest observe
    /// [`TransitionError::VersionMismatch`].
    pub async fn apply_event(
        &self,
        expected_version: usize,
        event: SessionEvent,
    ) -> Result<SessionPhase, TransitionError> {
        let mut progress = self.progress.write().await;
        if progress.version != expected_version {
            return Err(TransitionError::VersionMismatch {
                expected: expected_version,
                actual: progress.version,
            });
        }

        let next = machine::compute_transition(&progress.phase, event, self.questions.len())?;
        progress.phase = next.clone();
        progress.version += 1;
        progress.started_at = match next {
            SessionPhase::Active { .. } => Some(Instant::now()),
            _ => None,
        };
        progress.last_activity = Instant::now();

        Ok(next)
    }

    /// Add a participant to the roster; idempotent when already present.
    /// Returns `true` when the participant was newly added.
    pub async fn join(&self, participant_id: &str) -> bool {
        let mut roster = self.participants.write().await;
        if roster.contains_key(participant_id) {
            return false;
        }
        roster.insert(
            participant_id.to_string(),
            Participant {
                joined_at: SystemTime::now(),
            },
        );
        true
    }

    /// Whether the participant has joined this session.
    pub async fn is_participant(&self, participant_id: &str) -> bool {
        self.participants.read().await.contains_key(participant_id)
    }

    /// Join-ordered roster snapshot.
    pub async fn roster(&self) -> IndexMap<String, Participant> {
        self.participants.read().await.clone()
    }

    /// Append-only collection of scored answer records.
    pub fn ledger(&self) -> &DashMap<AnswerKey, AnswerRecord> {
        &self.ledger
    }

    /// Cumulative points for one participant across the whole ledger.
    pub fn total_points(&self, participant_id: &str) -> u64 {
        self.ledger
            .iter()
            .filter(|entry| entry.key().1 == participant_id)
            .map(|entry| u64::from(entry.value().points_awarded))
            .sum()
    }

    /// Record a read or write touching this session.
    pub async fn touch(&self) {
        self.progress.write().await.last_activity = Instant::now();
    }

    /// Time since the session was last touched.
    pub async fn idle_for(&self) -> Duration {
        let progress = self.progress.read().await;
        progress.last_activity.elapsed()
    }
}
