//! End-to-end exercises of the session engine through the service layer,
//! run under tokio's paused clock so timing assertions are exact.

use std::time::Duration;

use live_quiz_back::{
    config::AppConfig,
    dto::play::SubmitAnswerRequest,
    dto::session::{CreateSessionRequest, QuestionInput, QuestionKindInput, SessionStatus},
    error::ServiceError,
    services::{answer_service, leaderboard_service, question_service, session_service},
    state::{AppState, SharedState},
};

const HOST: &str = "host-1";
const ALICE: &str = "alice";
const BOB: &str = "bob";

fn multiple_choice(text: &str, correct: usize) -> QuestionInput {
    QuestionInput {
        text: text.into(),
        kind: QuestionKindInput::MultipleChoice,
        options: vec!["red".into(), "green".into(), "blue".into()],
        correct_answer: correct.to_string(),
        base_points: 100,
    }
}

fn three_question_request() -> CreateSessionRequest {
    CreateSessionRequest {
        time_limit_seconds: 30,
        questions: vec![
            multiple_choice("first", 1),
            multiple_choice("second", 0),
            multiple_choice("third", 2),
        ],
    }
}

async fn started_session(state: &SharedState) -> String {
    let created = session_service::create(state, HOST, three_question_request())
        .await
        .unwrap();
    session_service::join(state, &created.code, ALICE).await.unwrap();
    session_service::join(state, &created.code, BOB).await.unwrap();
    session_service::start(state, &created.code, HOST).await.unwrap();
    created.code
}

fn answer(question_index: usize, answer: &str) -> SubmitAnswerRequest {
    SubmitAnswerRequest {
        question_index,
        answer: answer.into(),
    }
}

#[tokio::test]
async fn create_rejects_empty_question_lists() {
    let state = AppState::new(AppConfig::default());
    let err = session_service::create(
        &state,
        HOST,
        CreateSessionRequest {
            time_limit_seconds: 30,
            questions: Vec::new(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn only_the_host_may_start_or_advance() {
    let state = AppState::new(AppConfig::default());
    let created = session_service::create(&state, HOST, three_question_request())
        .await
        .unwrap();
    session_service::join(&state, &created.code, ALICE).await.unwrap();

    let err = session_service::start(&state, &created.code, ALICE)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized(_)));

    session_service::start(&state, &created.code, HOST).await.unwrap();
    let err = question_service::advance(&state, &created.code, ALICE)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized(_)));
}

#[tokio::test]
async fn start_requires_the_lobby_phase() {
    let state = AppState::new(AppConfig::default());
    let code = started_session(&state).await;

    let err = session_service::start(&state, &code, HOST).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn join_is_idempotent_and_open_while_active() {
    let state = AppState::new(AppConfig::default());
    let code = started_session(&state).await;

    // A late joiner arrives mid-game; a repeat join changes nothing.
    let first = session_service::join(&state, &code, "carol").await.unwrap();
    assert_eq!(first.status, SessionStatus::Active);
    let second = session_service::join(&state, &code, "carol").await.unwrap();
    assert_eq!(second.participant_count, first.participant_count);

    let lobby = session_service::lobby(&state, &code).await.unwrap();
    assert_eq!(lobby.participant_count, 3);
}

#[tokio::test]
async fn unknown_codes_are_not_found() {
    let state = AppState::new(AppConfig::default());
    let err = session_service::join(&state, "999999", ALICE).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    let err = question_service::current(&state, "999999").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

// Scenario A: a correct answer at 20 of 30 seconds remaining scores
// round(100 * 20/30) = 67 under the default speed-factor curve.
#[tokio::test(start_paused = true)]
async fn correct_answer_scores_by_remaining_time() {
    let state = AppState::new(AppConfig::default());
    let code = started_session(&state).await;

    let view = question_service::current(&state, &code).await.unwrap();
    assert_eq!(view.status, SessionStatus::Active);
    assert_eq!(view.index, Some(0));
    assert_eq!(view.remaining_seconds, 30);

    tokio::time::advance(Duration::from_secs(10)).await;

    let view = question_service::current(&state, &code).await.unwrap();
    assert_eq!(view.remaining_seconds, 20);

    let outcome = answer_service::submit(&state, &code, ALICE, answer(0, "1"))
        .await
        .unwrap();
    assert!(outcome.is_correct);
    assert_eq!(outcome.points_awarded, 67);
    assert_eq!(outcome.total_points, 67);
}

// Scenario B: advancing past an unanswered question synthesizes nothing,
// and submissions against the old index fail as stale.
#[tokio::test(start_paused = true)]
async fn advance_skips_unanswered_questions_without_records() {
    let state = AppState::new(AppConfig::default());
    let code = started_session(&state).await;

    let advanced = question_service::advance(&state, &code, HOST).await.unwrap();
    assert_eq!(advanced.index, Some(1));

    let board = leaderboard_service::leaderboard(&state, &code).await.unwrap();
    assert!(board.entries.iter().all(|entry| entry.answered_count == 0));

    let err = answer_service::submit(&state, &code, ALICE, answer(0, "1"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::StaleQuestion {
            submitted: 0,
            current: 1
        }
    ));
}

// Scenario C: a submission past the window plus grace is rejected and
// leaves no trace in the ledger.
#[tokio::test(start_paused = true)]
async fn late_submissions_expire_without_a_record() {
    let state = AppState::new(AppConfig::default());
    let code = started_session(&state).await;

    tokio::time::advance(Duration::from_secs(33)).await;

    let err = answer_service::submit(&state, &code, ALICE, answer(0, "1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::TimeExpired));

    let board = leaderboard_service::leaderboard(&state, &code).await.unwrap();
    assert!(board.entries.iter().all(|entry| entry.answered_count == 0));
}

// A submission inside the grace period is still accepted.
#[tokio::test(start_paused = true)]
async fn grace_period_absorbs_slightly_late_submissions() {
    let state = AppState::new(AppConfig::default());
    let code = started_session(&state).await;

    tokio::time::advance(Duration::from_secs(31)).await;

    let outcome = answer_service::submit(&state, &code, ALICE, answer(0, "1"))
        .await
        .unwrap();
    assert!(outcome.is_correct);
    // Past the nominal window the speed factor has tapered to zero.
    assert_eq!(outcome.points_awarded, 0);
}

// Scenario D: simultaneous submissions from different participants land as
// two independent records with no lost write.
#[tokio::test(start_paused = true)]
async fn concurrent_submissions_from_two_participants_both_land() {
    let state = AppState::new(AppConfig::default());
    let code = started_session(&state).await;

    let (alice, bob) = tokio::join!(
        answer_service::submit(&state, &code, ALICE, answer(0, "1")),
        answer_service::submit(&state, &code, BOB, answer(0, "2")),
    );
    assert!(alice.unwrap().is_correct);
    assert!(!bob.unwrap().is_correct);

    let board = leaderboard_service::leaderboard(&state, &code).await.unwrap();
    let answered: usize = board.entries.iter().map(|entry| entry.answered_count).sum();
    assert_eq!(answered, 2);
}

// Scenario E: advancing past the last question completes the session and
// every further submit or advance is rejected.
#[tokio::test(start_paused = true)]
async fn completion_is_terminal() {
    let state = AppState::new(AppConfig::default());
    let code = started_session(&state).await;

    question_service::advance(&state, &code, HOST).await.unwrap();
    question_service::advance(&state, &code, HOST).await.unwrap();
    let done = question_service::advance(&state, &code, HOST).await.unwrap();
    assert_eq!(done.status, SessionStatus::Completed);
    assert_eq!(done.index, None);

    let err = answer_service::submit(&state, &code, ALICE, answer(2, "2"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    let err = question_service::advance(&state, &code, HOST).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    let view = question_service::current(&state, &code).await.unwrap();
    assert_eq!(view.status, SessionStatus::Completed);
    assert_eq!(view.remaining_seconds, 0);
}

// Idempotence: a repeat submission (even with a different answer) returns
// the stored outcome and leaves the ledger untouched.
#[tokio::test(start_paused = true)]
async fn repeat_submissions_replay_the_original_outcome() {
    let state = AppState::new(AppConfig::default());
    let code = started_session(&state).await;

    let first = answer_service::submit(&state, &code, ALICE, answer(0, "1"))
        .await
        .unwrap();
    assert!(first.is_correct);

    tokio::time::advance(Duration::from_secs(5)).await;

    let replay = answer_service::submit(&state, &code, ALICE, answer(0, "2"))
        .await
        .unwrap();
    assert_eq!(replay.is_correct, first.is_correct);
    assert_eq!(replay.points_awarded, first.points_awarded);
    assert_eq!(replay.total_points, first.total_points);

    let board = leaderboard_service::leaderboard(&state, &code).await.unwrap();
    let alice_row = board
        .entries
        .iter()
        .find(|entry| entry.participant_id == ALICE)
        .unwrap();
    assert_eq!(alice_row.answered_count, 1);
}

// A replay still resolves after the host has advanced past the question.
#[tokio::test(start_paused = true)]
async fn replays_survive_advancement() {
    let state = AppState::new(AppConfig::default());
    let code = started_session(&state).await;

    let first = answer_service::submit(&state, &code, ALICE, answer(0, "1"))
        .await
        .unwrap();
    question_service::advance(&state, &code, HOST).await.unwrap();

    let replay = answer_service::submit(&state, &code, ALICE, answer(0, "1"))
        .await
        .unwrap();
    assert_eq!(replay.points_awarded, first.points_awarded);
}

#[tokio::test(start_paused = true)]
async fn submissions_require_membership() {
    let state = AppState::new(AppConfig::default());
    let code = started_session(&state).await;

    let err = answer_service::submit(&state, &code, "stranger", answer(0, "1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized(_)));
}

// Leaderboard totals equal the sum of awarded points, ordered by points,
// then earliest last submission, then participant id.
#[tokio::test(start_paused = true)]
async fn leaderboard_orders_points_then_speed_then_id() {
    let state = AppState::new(AppConfig::default());
    let code = started_session(&state).await;
    session_service::join(&state, &code, "carol").await.unwrap();
    session_service::join(&state, &code, "dave").await.unwrap();

    // Alice answers correctly at full speed, Bob incorrectly; Carol and
    // Dave never submit at all.
    answer_service::submit(&state, &code, ALICE, answer(0, "1"))
        .await
        .unwrap();
    answer_service::submit(&state, &code, BOB, answer(0, "0"))
        .await
        .unwrap();

    question_service::advance(&state, &code, HOST).await.unwrap();
    answer_service::submit(&state, &code, ALICE, answer(1, "0"))
        .await
        .unwrap();

    let board = leaderboard_service::leaderboard(&state, &code).await.unwrap();
    let order: Vec<&str> = board
        .entries
        .iter()
        .map(|entry| entry.participant_id.as_str())
        .collect();
    // Bob submitted (and scored zero), so he ranks above the silent pair;
    // Carol and Dave fall back to id order.
    assert_eq!(order, vec![ALICE, BOB, "carol", "dave"]);

    let alice_row = &board.entries[0];
    assert_eq!(alice_row.total_points, 200);
    assert_eq!(alice_row.correct_count, 2);
    assert_eq!(alice_row.answered_count, 2);
    assert_eq!(alice_row.rank, 1);
    assert!(board.entries.iter().enumerate().all(|(i, e)| e.rank == i + 1));
}

#[tokio::test(start_paused = true)]
async fn results_report_accuracy_and_session_stats() {
    let state = AppState::new(AppConfig::default());
    let code = started_session(&state).await;

    answer_service::submit(&state, &code, ALICE, answer(0, "1"))
        .await
        .unwrap();
    answer_service::submit(&state, &code, BOB, answer(0, "0"))
        .await
        .unwrap();
    question_service::advance(&state, &code, HOST).await.unwrap();
    answer_service::submit(&state, &code, ALICE, answer(1, "2"))
        .await
        .unwrap();
    question_service::advance(&state, &code, HOST).await.unwrap();
    question_service::advance(&state, &code, HOST).await.unwrap();

    let results = leaderboard_service::results(&state, &code).await.unwrap();
    assert_eq!(results.status, SessionStatus::Completed);

    let alice_row = results
        .entries
        .iter()
        .find(|entry| entry.participant_id == ALICE)
        .unwrap();
    assert_eq!(alice_row.answered_count, 2);
    assert_eq!(alice_row.correct_count, 1);
    assert_eq!(alice_row.accuracy, 50);

    assert_eq!(results.stats.total_answers, 3);
    assert_eq!(results.stats.correct_answers, 1);
    assert_eq!(results.stats.average_accuracy, 33);
}

#[tokio::test(start_paused = true)]
async fn idle_sessions_are_swept_and_active_ones_survive() {
    let state = AppState::new(AppConfig::default());
    let idle_code = started_session(&state).await;
    let busy_code = started_session(&state).await;
    let ttl = state.config().session_ttl();

    // The busy session keeps being polled; the idle one is left alone.
    tokio::time::advance(ttl / 2).await;
    question_service::current(&state, &busy_code).await.unwrap();
    tokio::time::advance(ttl / 2).await;

    let removed = state.sweep_idle(ttl).await;
    assert_eq!(removed, 1);
    assert!(state.session(&idle_code).is_none());
    assert!(state.session(&busy_code).is_some());
}
