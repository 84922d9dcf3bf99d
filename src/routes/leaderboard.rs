use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::leaderboard::{LeaderboardResponse, ResultsResponse},
    error::AppError,
    routes::ensure_code,
    services::leaderboard_service,
    state::SharedState,
};

/// Read-only routes deriving ranked views from the answer ledger.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/live/sessions/{code}/leaderboard", get(get_leaderboard))
        .route("/live/sessions/{code}/results", get(get_results))
}

/// Return the live ranked leaderboard.
#[utoipa::path(
    get,
    path = "/live/sessions/{code}/leaderboard",
    tag = "leaderboard",
    params(("code" = String, Path, description = "Join code of the session")),
    responses(
        (status = 200, description = "Ranked scores", body = LeaderboardResponse),
        (status = 404, description = "Unknown session code")
    )
)]
pub async fn get_leaderboard(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    ensure_code(&code)?;
    let payload = leaderboard_service::leaderboard(&state, &code).await?;
    Ok(Json(payload))
}

/// Return the final results with per-participant accuracy and session stats.
#[utoipa::path(
    get,
    path = "/live/sessions/{code}/results",
    tag = "leaderboard",
    params(("code" = String, Path, description = "Join code of the session")),
    responses(
        (status = 200, description = "Final results", body = ResultsResponse),
        (status = 404, description = "Unknown session code")
    )
)]
pub async fn get_results(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<ResultsResponse>, AppError> {
    ensure_code(&code)?;
    let payload = leaderboard_service::results(&state, &code).await?;
    Ok(Json(payload))
}
