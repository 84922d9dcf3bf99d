use std::{cmp::Ordering, time::SystemTime};

use indexmap::IndexMap;

use crate::{
    dto::leaderboard::{
        LeaderboardEntry, LeaderboardResponse, ResultEntry, ResultsResponse, SessionStats,
    },
    error::ServiceError,
    state::{SharedState, session::QuizSession},
};

/// Per-participant aggregate derived from the ledger.
#[derive(Debug, Default, Clone)]
struct Tally {
    total_points: u64,
    correct_count: usize,
    answered_count: usize,
    last_submission: Option<SystemTime>,
}

/// Ranked cumulative scores for every roster member, zero scores included.
pub async fn leaderboard(
    state: &SharedState,
    code: &str,
) -> Result<LeaderboardResponse, ServiceError> {
    let session = state.require_session(code)?;
    session.touch().await;

    let snapshot = session.snapshot().await;
    let ranked = ranked_tallies(&session).await;
    let participant_count = ranked.len();

    let entries = ranked
        .into_iter()
        .enumerate()
        .map(|(position, (participant_id, tally))| LeaderboardEntry {
            participant_id,
            total_points: tally.total_points,
            correct_count: tally.correct_count,
            answered_count: tally.answered_count,
            rank: position + 1,
        })
        .collect();

    Ok(LeaderboardResponse {
        entries,
        participant_count,
        current_index: snapshot.phase.current_index(),
        question_count: session.questions().len(),
    })
}

/// Final results view: the ranked rows plus session-wide statistics.
pub async fn results(state: &SharedState, code: &str) -> Result<ResultsResponse, ServiceError> {
    let session = state.require_session(code)?;
    session.touch().await;

    let snapshot = session.snapshot().await;
    let ranked = ranked_tallies(&session).await;
    let participant_count = ranked.len();

    let total_answers: usize = ranked.iter().map(|(_, tally)| tally.answered_count).sum();
    let correct_answers: usize = ranked.iter().map(|(_, tally)| tally.correct_count).sum();

    let entries = ranked
        .into_iter()
        .enumerate()
        .map(|(position, (participant_id, tally))| ResultEntry {
            accuracy: percentage(tally.correct_count, tally.answered_count),
            participant_id,
            total_points: tally.total_points,
            correct_count: tally.correct_count,
            answered_count: tally.answered_count,
            rank: position + 1,
        })
        .collect();

    Ok(ResultsResponse {
        code: session.code().to_string(),
        status: (&snapshot.phase).into(),
        entries,
        stats: SessionStats {
            participant_count,
            total_answers,
            correct_answers,
            average_accuracy: percentage(correct_answers, total_answers),
        },
    })
}

/// Aggregate the ledger per participant and sort into leaderboard order:
/// points descending, then earliest last submission (never-submitted rows
/// order after submitted ones at equal points), then participant id.
async fn ranked_tallies(session: &QuizSession) -> Vec<(String, Tally)> {
    let mut tallies: IndexMap<String, Tally> = session
        .roster()
        .await
        .into_keys()
        .map(|participant_id| (participant_id, Tally::default()))
        .collect();

    for entry in session.ledger().iter() {
        let (_, participant_id) = entry.key();
        let record = entry.value();
        let tally = tallies.entry(participant_id.clone()).or_default();
        tally.total_points += u64::from(record.points_awarded);
        tally.answered_count += 1;
        if record.is_correct {
            tally.correct_count += 1;
        }
        tally.last_submission = match tally.last_submission {
            Some(previous) => Some(previous.max(record.submitted_at)),
            None => Some(record.submitted_at),
        };
    }

    let mut rows: Vec<(String, Tally)> = tallies.into_iter().collect();
    rows.sort_by(|(left_id, left), (right_id, right)| {
        right
            .total_points
            .cmp(&left.total_points)
            .then_with(|| compare_last_submission(left.last_submission, right.last_submission))
            .then_with(|| left_id.cmp(right_id))
    });
    rows
}

fn compare_last_submission(left: Option<SystemTime>, right: Option<SystemTime>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}
