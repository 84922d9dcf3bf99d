use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::session::SessionStatus;

/// One ranked row of the live leaderboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    pub participant_id: String,
    pub total_points: u64,
    pub correct_count: usize,
    pub answered_count: usize,
    /// 1-based position after sorting.
    pub rank: usize,
}

/// Ranked cumulative scores derived from the ledger on demand.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
    pub participant_count: usize,
    /// Index of the question currently accepting answers, if any.
    pub current_index: Option<usize>,
    pub question_count: usize,
}

/// Final per-participant row including the accuracy percentage.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResultEntry {
    pub participant_id: String,
    pub total_points: u64,
    pub correct_count: usize,
    pub answered_count: usize,
    /// Share of answered questions that were correct, 0-100.
    pub accuracy: u32,
    pub rank: usize,
}

/// Session-wide aggregates shown with the final results.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionStats {
    pub participant_count: usize,
    pub total_answers: usize,
    pub correct_answers: usize,
    /// Correct share across every answer in the session, 0-100.
    pub average_accuracy: u32,
}

/// Final results view: ranked rows plus aggregate statistics.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResultsResponse {
    pub code: String,
    pub status: SessionStatus,
    pub entries: Vec<ResultEntry>,
    pub stats: SessionStats,
}
