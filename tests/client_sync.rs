//! Exercises the consumer-side polling loop against a real in-process
//! engine, under the paused clock so countdowns are deterministic.

use std::sync::Arc;
use std::time::Duration;

use live_quiz_back::{
    client::{self, LocalSessionApi, SyncEvent, sync_loop::SyncLoopConfig},
    config::AppConfig,
    dto::session::{CreateSessionRequest, QuestionInput, QuestionKindInput},
    services::{leaderboard_service, session_service},
    state::{AppState, SharedState},
};
use tokio::sync::mpsc::UnboundedReceiver;

const HOST: &str = "host-1";
const ALICE: &str = "alice";

fn quiz(questions: usize) -> CreateSessionRequest {
    CreateSessionRequest {
        time_limit_seconds: 30,
        questions: (0..questions)
            .map(|i| QuestionInput {
                text: format!("question {i}"),
                kind: QuestionKindInput::MultipleChoice,
                options: vec!["red".into(), "green".into()],
                correct_answer: "1".into(),
                base_points: 100,
            })
            .collect(),
    }
}

async fn started_session(state: &SharedState, questions: usize) -> String {
    let created = session_service::create(state, HOST, quiz(questions)).await.unwrap();
    session_service::join(state, &created.code, ALICE).await.unwrap();
    session_service::start(state, &created.code, HOST).await.unwrap();
    created.code
}

async fn next_question(events: &mut UnboundedReceiver<SyncEvent>) -> (usize, u64) {
    loop {
        match events.recv().await.expect("event stream closed") {
            SyncEvent::Question {
                index,
                remaining_seconds,
                ..
            } => return (index, remaining_seconds),
            _ => continue,
        }
    }
}

async fn next_answered(events: &mut UnboundedReceiver<SyncEvent>) -> (usize, bool, u32) {
    loop {
        match events.recv().await.expect("event stream closed") {
            SyncEvent::Answered {
                index,
                auto,
                points_awarded,
                ..
            } => return (index, auto, points_awarded),
            _ => continue,
        }
    }
}

#[tokio::test(start_paused = true)]
async fn countdown_expiry_auto_submits_exactly_once() {
    let state = AppState::new(AppConfig::default());
    let code = started_session(&state, 1).await;

    let api = Arc::new(LocalSessionApi::new(state.clone(), ALICE));
    let (handle, mut events) = client::spawn(api, code.clone(), SyncLoopConfig::default());

    let (index, remaining) = next_question(&mut events).await;
    assert_eq!(index, 0);
    assert_eq!(remaining, 30);

    // Nobody taps an answer; the paused clock runs down to the deadline.
    let (answered_index, auto, points) = next_answered(&mut events).await;
    assert_eq!(answered_index, 0);
    assert!(auto);
    assert_eq!(points, 0);

    // A tap arriving after the timeout loses the claim race and is a no-op.
    handle.submit("1");
    let board = leaderboard_service::leaderboard(&state, &code).await.unwrap();
    let alice_row = board
        .entries
        .iter()
        .find(|entry| entry.participant_id == ALICE)
        .unwrap();
    assert_eq!(alice_row.answered_count, 1);
    assert_eq!(alice_row.total_points, 0);

    handle.shutdown();
    handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn user_tap_wins_over_the_timeout() {
    let state = AppState::new(AppConfig::default());
    let code = started_session(&state, 1).await;

    let api = Arc::new(LocalSessionApi::new(state.clone(), ALICE));
    let (handle, mut events) = client::spawn(api, code.clone(), SyncLoopConfig::default());

    next_question(&mut events).await;

    handle.submit("1");
    let (index, auto, points) = next_answered(&mut events).await;
    assert_eq!(index, 0);
    assert!(!auto);
    assert_eq!(points, 100);

    // The countdown is disarmed; letting the window lapse adds nothing.
    tokio::time::advance(Duration::from_secs(40)).await;
    let board = leaderboard_service::leaderboard(&state, &code).await.unwrap();
    let alice_row = board
        .entries
        .iter()
        .find(|entry| entry.participant_id == ALICE)
        .unwrap();
    assert_eq!(alice_row.answered_count, 1);
    assert_eq!(alice_row.total_points, 100);

    handle.shutdown();
    handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn host_advance_walks_to_completion_and_stops_the_loop() {
    let state = AppState::new(AppConfig::default());
    let code = started_session(&state, 2).await;

    let api = Arc::new(LocalSessionApi::new(state.clone(), HOST));
    let (handle, mut events) = client::spawn(api, code, SyncLoopConfig::default());

    let (index, _) = next_question(&mut events).await;
    assert_eq!(index, 0);

    // The host observes its own advance without waiting for a poll tick.
    handle.advance();
    let (index, _) = next_question(&mut events).await;
    assert_eq!(index, 1);

    handle.advance();
    loop {
        match events.recv().await.expect("event stream closed") {
            SyncEvent::Completed => break,
            _ => continue,
        }
    }

    handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn reconnecting_client_resumes_from_the_server_clock() {
    let state = AppState::new(AppConfig::default());
    let code = started_session(&state, 1).await;

    tokio::time::advance(Duration::from_secs(10)).await;

    // A client arriving mid-question counts down from the remaining 20
    // seconds, not a fresh 30-second window.
    let api = Arc::new(LocalSessionApi::new(state.clone(), ALICE));
    let (handle, mut events) = client::spawn(api, code, SyncLoopConfig::default());

    let (index, remaining) = next_question(&mut events).await;
    assert_eq!(index, 0);
    assert_eq!(remaining, 20);

    handle.shutdown();
    handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_tears_the_loop_down() {
    let state = AppState::new(AppConfig::default());
    let code = started_session(&state, 1).await;

    let api = Arc::new(LocalSessionApi::new(state.clone(), ALICE));
    let (handle, mut events) = client::spawn(api, code, SyncLoopConfig::default());

    next_question(&mut events).await;

    handle.shutdown();
    handle.join().await;
}
