use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Health check payloads.
pub mod health;
/// Leaderboard and final results payloads.
pub mod leaderboard;
/// Current-question, submission, and advancement payloads.
pub mod play;
/// Session creation, join, and lobby payloads.
pub mod session;
/// Validation helpers for DTOs.
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
