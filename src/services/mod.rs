/// Answer submission and the at-most-once scored ledger.
pub mod answer_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Leaderboard aggregation and final results.
pub mod leaderboard_service;
/// Current-question projection and host-driven advancement.
pub mod question_service;
/// Speed-weighted scoring curves.
pub mod scoring;
/// Session bootstrap: creation, joining, and the lobby view.
pub mod session_service;
/// Idle-session expiry sweep.
pub mod sweeper;
