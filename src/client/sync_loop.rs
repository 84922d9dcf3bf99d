use std::{future::pending, ops::ControlFlow, sync::Arc, time::Duration};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, sleep_until};
use tracing::warn;

use crate::{
    client::transport::{ApiError, SessionApi},
    dto::play::{CurrentQuestionResponse, QuestionView, SubmitAnswerRequest},
    dto::session::SessionStatus,
};

/// Sentinel submitted when the local countdown runs out before the
/// participant picked an answer. Grades as incorrect for every question kind.
pub const NO_ANSWER: &str = "";

/// Documented polling cadence of the session view.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Delay before re-attempting a submission that failed at the transport level.
const SUBMIT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Submission slot for the question currently on screen.
///
/// Exactly one transition away from `Pending` ever happens per question; the
/// timeout path and the user-tap path both go through [`SyncLoop::claim`]
/// and the loser of the race is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    /// No submission sent yet; both paths may still claim the slot.
    Pending,
    /// An answer reached the server (or the server already refused one).
    Submitted,
    /// The countdown fired and the auto-submission is in flight.
    Expired,
}

/// Events emitted to the embedding UI.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A new question is live; restart rendering and countdown.
    Question {
        /// Index of the question in the session's sequence.
        index: usize,
        /// Answer-key-stripped question payload.
        question: QuestionView,
        /// Seconds left according to the authoritative server clock.
        remaining_seconds: u64,
    },
    /// The participant's submission (manual or automatic) was scored.
    Answered {
        /// Index the submission targeted.
        index: usize,
        /// True when the countdown fired the submission.
        auto: bool,
        /// Whether the answer matched.
        is_correct: bool,
        /// Points granted by the scoring curve.
        points_awarded: u32,
        /// Cumulative points after this submission.
        total_points: u64,
    },
    /// The session completed; the loop has stopped.
    Completed,
    /// Non-fatal, retryable condition worth surfacing to the user.
    Notice(String),
}

/// Commands the embedding UI sends into the loop.
#[derive(Debug, Clone)]
pub enum SyncCommand {
    /// Submit the given answer for the question currently on screen.
    Submit(String),
    /// Host control: move the session past the current question.
    Advance,
}

/// Tunables for the polling loop.
#[derive(Debug, Clone)]
pub struct SyncLoopConfig {
    /// Wait between polls of the session view.
    pub poll_interval: Duration,
}

impl Default for SyncLoopConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Handle owned by the view embedding the loop.
///
/// Dropping the handle (or calling [`SyncLoopHandle::shutdown`]) cancels the
/// loop: the task observes the closed watch channel on its next select and
/// stops without firing any further request.
pub struct SyncLoopHandle {
    commands: mpsc::UnboundedSender<SyncCommand>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SyncLoopHandle {
    /// Submit an answer for the question currently on screen.
    pub fn submit(&self, answer: impl Into<String>) {
        let _ = self.commands.send(SyncCommand::Submit(answer.into()));
    }

    /// Host control: advance the session.
    pub fn advance(&self) {
        let _ = self.commands.send(SyncCommand::Advance);
    }

    /// Request cancellation of the loop.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Wait for the loop task to finish.
    pub async fn join(self) {
        let _ = self.task.await;
    }

    /// Whether the loop task has already stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn the polling loop for one session view.
///
/// Returns the control handle and the event stream the UI renders from.
pub fn spawn(
    api: Arc<dyn SessionApi>,
    code: impl Into<String>,
    config: SyncLoopConfig,
) -> (SyncLoopHandle, mpsc::UnboundedReceiver<SyncEvent>) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sync_loop = SyncLoop {
        api,
        code: code.into(),
        events: event_tx,
        current_index: None,
        submit_state: SubmitState::Pending,
        deadline: None,
        advance_failures: 0,
    };

    let task = tokio::spawn(sync_loop.run(shutdown_rx, command_rx, config.poll_interval));

    (
        SyncLoopHandle {
            commands: command_tx,
            shutdown: shutdown_tx,
            task,
        },
        event_rx,
    )
}

struct SyncLoop {
    api: Arc<dyn SessionApi>,
    code: String,
    events: mpsc::UnboundedSender<SyncEvent>,
    current_index: Option<usize>,
    submit_state: SubmitState,
    deadline: Option<Instant>,
    advance_failures: u32,
}

impl SyncLoop {
    async fn run(
        mut self,
        mut shutdown: watch::Receiver<bool>,
        mut commands: mpsc::UnboundedReceiver<SyncCommand>,
        poll_interval: Duration,
    ) {
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // The countdown only races while the slot is still claimable.
            let armed = match self.submit_state {
                SubmitState::Pending => self.deadline,
                _ => None,
            };

            tokio::select! {
                // Fires on an explicit shutdown and when the handle is dropped.
                _ = shutdown.changed() => break,
                // The poll is awaited inline, so at most one request is in
                // flight and the next tick waits for this one to finish.
                _ = ticker.tick() => {
                    if self.poll().await.is_break() {
                        break;
                    }
                }
                _ = countdown(armed) => self.auto_submit().await,
                command = commands.recv() => match command {
                    Some(SyncCommand::Submit(answer)) => self.user_submit(answer).await,
                    Some(SyncCommand::Advance) => {
                        if self.host_advance().await.is_break() {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
    }

    async fn poll(&mut self) -> ControlFlow<()> {
        match self.api.fetch_current(&self.code).await {
            Ok(view) => self.apply_view(view),
            Err(err) => {
                // Failed polls are not an error state; next tick retries.
                warn!(code = %self.code, error = %err, "poll failed; retrying next tick");
                ControlFlow::Continue(())
            }
        }
    }

    fn apply_view(&mut self, view: CurrentQuestionResponse) -> ControlFlow<()> {
        if view.status == SessionStatus::Completed {
            let _ = self.events.send(SyncEvent::Completed);
            return ControlFlow::Break(());
        }

        if let (Some(index), Some(question)) = (view.index, view.question) {
            if self.current_index != Some(index) {
                self.show_question(index, question, view.remaining_seconds);
            }
        }

        ControlFlow::Continue(())
    }

    /// Reset the per-question state for a newly observed index. The countdown
    /// restarts from the server-reported remaining time, not a full window,
    /// so late joiners and reconnects stay on the authoritative clock.
    fn show_question(&mut self, index: usize, question: QuestionView, remaining_seconds: u64) {
        self.current_index = Some(index);
        self.submit_state = SubmitState::Pending;
        self.deadline = Some(Instant::now() + Duration::from_secs(remaining_seconds));
        let _ = self.events.send(SyncEvent::Question {
            index,
            question,
            remaining_seconds,
        });
    }

    /// Single guarded entry point for the submission slot. Returns whether
    /// the caller won the claim; the loser must do nothing.
    fn claim(&mut self, next: SubmitState) -> bool {
        if self.submit_state != SubmitState::Pending {
            return false;
        }
        self.submit_state = next;
        true
    }

    async fn auto_submit(&mut self) {
        let Some(index) = self.current_index else {
            return;
        };
        if !self.claim(SubmitState::Expired) {
            return;
        }
        self.deadline = None;

        let request = SubmitAnswerRequest {
            question_index: index,
            answer: NO_ANSWER.into(),
        };
        match self.api.submit_answer(&self.code, request).await {
            Ok(result) => {
                self.submit_state = SubmitState::Submitted;
                let _ = self.events.send(SyncEvent::Answered {
                    index,
                    auto: true,
                    is_correct: result.is_correct,
                    points_awarded: result.points_awarded,
                    total_points: result.total_points,
                });
            }
            Err(ApiError::Transport(message)) => {
                // The slot stays claimable and the countdown re-arms shortly.
                self.submit_state = SubmitState::Pending;
                self.deadline = Some(Instant::now() + SUBMIT_RETRY_DELAY);
                let _ = self
                    .events
                    .send(SyncEvent::Notice(format!("auto-submit failed: {message}")));
            }
            Err(ApiError::Rejected(message)) => {
                // The server closed the window first; nothing left to send.
                self.submit_state = SubmitState::Submitted;
                let _ = self.events.send(SyncEvent::Notice(message));
            }
        }
    }

    async fn user_submit(&mut self, answer: String) {
        let Some(index) = self.current_index else {
            let _ = self
                .events
                .send(SyncEvent::Notice("no question is active".into()));
            return;
        };
        if !self.claim(SubmitState::Submitted) {
            return;
        }
        self.deadline = None;

        let request = SubmitAnswerRequest {
            question_index: index,
            answer,
        };
        match self.api.submit_answer(&self.code, request).await {
            Ok(result) => {
                let _ = self.events.send(SyncEvent::Answered {
                    index,
                    auto: false,
                    is_correct: result.is_correct,
                    points_awarded: result.points_awarded,
                    total_points: result.total_points,
                });
            }
            Err(ApiError::Transport(message)) => {
                // Give the slot back so the user (or the timeout) can retry.
                self.submit_state = SubmitState::Pending;
                self.deadline = Some(Instant::now() + SUBMIT_RETRY_DELAY);
                let _ = self
                    .events
                    .send(SyncEvent::Notice(format!("submit failed: {message}")));
            }
            Err(ApiError::Rejected(message)) => {
                let _ = self.events.send(SyncEvent::Notice(message));
            }
        }
    }

    async fn host_advance(&mut self) -> ControlFlow<()> {
        match self.api.advance(&self.code).await {
            Ok(response) => {
                self.advance_failures = 0;
                if response.status == SessionStatus::Completed {
                    let _ = self.events.send(SyncEvent::Completed);
                    return ControlFlow::Break(());
                }
                // The host observes its own advance immediately instead of
                // waiting a poll tick.
                if let (Some(index), Some(question)) = (response.index, response.question) {
                    self.show_question(index, question, response.time_limit_seconds);
                }
                ControlFlow::Continue(())
            }
            Err(err) => {
                self.advance_failures += 1;
                let _ = self.events.send(SyncEvent::Notice(format!(
                    "advance failed ({} attempt(s)): {err}",
                    self.advance_failures
                )));
                ControlFlow::Continue(())
            }
        }
    }
}

async fn countdown(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;

    use crate::client::transport::{ApiResult, SessionApi};
    use crate::dto::play::{AdvanceResponse, SubmitAnswerResponse};
    use crate::dto::session::QuestionKindInput;
    use uuid::Uuid;

    struct UnreachableApi;

    impl SessionApi for UnreachableApi {
        fn fetch_current(
            &self,
            _code: &str,
        ) -> BoxFuture<'static, ApiResult<CurrentQuestionResponse>> {
            Box::pin(async { Err(ApiError::Transport("offline".into())) })
        }

        fn submit_answer(
            &self,
            _code: &str,
            _request: SubmitAnswerRequest,
        ) -> BoxFuture<'static, ApiResult<SubmitAnswerResponse>> {
            Box::pin(async { Err(ApiError::Transport("offline".into())) })
        }

        fn advance(&self, _code: &str) -> BoxFuture<'static, ApiResult<AdvanceResponse>> {
            Box::pin(async { Err(ApiError::Transport("offline".into())) })
        }
    }

    fn test_loop() -> (SyncLoop, mpsc::UnboundedReceiver<SyncEvent>) {
        let (events, event_rx) = mpsc::unbounded_channel();
        (
            SyncLoop {
                api: Arc::new(UnreachableApi),
                code: "123456".into(),
                events,
                current_index: None,
                submit_state: SubmitState::Pending,
                deadline: None,
                advance_failures: 0,
            },
            event_rx,
        )
    }

    fn view(index: usize, remaining_seconds: u64) -> CurrentQuestionResponse {
        CurrentQuestionResponse {
            status: SessionStatus::Active,
            index: Some(index),
            question: Some(QuestionView {
                id: Uuid::new_v4(),
                text: "q".into(),
                kind: QuestionKindInput::TrueFalse,
                options: Vec::new(),
                base_points: 100,
            }),
            remaining_seconds,
            question_count: 3,
            host_id: "host".into(),
        }
    }

    #[tokio::test]
    async fn first_claim_wins_and_the_loser_is_a_noop() {
        let (mut sync_loop, _events) = test_loop();
        assert!(sync_loop.claim(SubmitState::Submitted));
        assert!(!sync_loop.claim(SubmitState::Expired));
        assert_eq!(sync_loop.submit_state, SubmitState::Submitted);
    }

    #[tokio::test]
    async fn new_index_resets_the_submission_slot() {
        let (mut sync_loop, mut events) = test_loop();

        let _ = sync_loop.apply_view(view(0, 30));
        assert!(sync_loop.claim(SubmitState::Submitted));

        let _ = sync_loop.apply_view(view(1, 30));
        assert_eq!(sync_loop.submit_state, SubmitState::Pending);
        assert_eq!(sync_loop.current_index, Some(1));

        // Both question announcements reached the UI.
        let mut indices = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let SyncEvent::Question { index, .. } = event {
                indices.push(index);
            }
        }
        assert_eq!(indices, vec![0, 1]);
    }

    #[tokio::test]
    async fn same_index_does_not_restart_the_countdown() {
        let (mut sync_loop, mut events) = test_loop();

        let _ = sync_loop.apply_view(view(0, 30));
        let armed = sync_loop.deadline;
        let _ = sync_loop.apply_view(view(0, 25));
        assert_eq!(sync_loop.deadline, armed);

        let mut announcements = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, SyncEvent::Question { .. }) {
                announcements += 1;
            }
        }
        assert_eq!(announcements, 1);
    }

    #[tokio::test]
    async fn completed_view_breaks_the_loop() {
        let (mut sync_loop, mut events) = test_loop();
        let flow = sync_loop.apply_view(CurrentQuestionResponse {
            status: SessionStatus::Completed,
            index: None,
            question: None,
            remaining_seconds: 0,
            question_count: 3,
            host_id: "host".into(),
        });
        assert!(flow.is_break());
        assert!(matches!(events.try_recv(), Ok(SyncEvent::Completed)));
    }
}
