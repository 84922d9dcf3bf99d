use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::play::{AdvanceResponse, CurrentQuestionResponse, SubmitAnswerRequest, SubmitAnswerResponse},
    error::AppError,
    routes::{ensure_code, identity::Caller},
    services::{answer_service, question_service},
    state::SharedState,
};

/// Routes driving active gameplay: polling, submitting, and advancing.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/live/sessions/{code}/question", get(get_current_question))
        .route("/live/sessions/{code}/answer", post(submit_answer))
        .route("/live/sessions/{code}/advance", post(advance_session))
}

/// Return the current question with the answer key stripped and the
/// authoritative remaining time.
#[utoipa::path(
    get,
    path = "/live/sessions/{code}/question",
    tag = "play",
    params(("code" = String, Path, description = "Join code of the session")),
    responses(
        (status = 200, description = "Current question view", body = CurrentQuestionResponse),
        (status = 404, description = "Unknown session code")
    )
)]
pub async fn get_current_question(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<CurrentQuestionResponse>, AppError> {
    ensure_code(&code)?;
    let payload = question_service::current(&state, &code).await?;
    Ok(Json(payload))
}

/// Submit an answer for the current question. Repeat submissions return the
/// originally stored outcome.
#[utoipa::path(
    post,
    path = "/live/sessions/{code}/answer",
    tag = "play",
    params(("code" = String, Path, description = "Join code of the session")),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Scored outcome", body = SubmitAnswerResponse),
        (status = 403, description = "Caller never joined the session"),
        (status = 409, description = "Session inactive or question no longer current"),
        (status = 410, description = "Time window expired")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Caller(participant_id): Caller,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<SubmitAnswerRequest>>,
) -> Result<Json<SubmitAnswerResponse>, AppError> {
    ensure_code(&code)?;
    let payload = answer_service::submit(&state, &code, &participant_id, payload).await?;
    Ok(Json(payload))
}

/// Move past the current question. Only the session's host may call this.
#[utoipa::path(
    post,
    path = "/live/sessions/{code}/advance",
    tag = "play",
    params(("code" = String, Path, description = "Join code of the session")),
    responses(
        (status = 200, description = "Next question or completion", body = AdvanceResponse),
        (status = 403, description = "Caller is not the host"),
        (status = 409, description = "Session is not active")
    )
)]
pub async fn advance_session(
    State(state): State<SharedState>,
    Caller(caller_id): Caller,
    Path(code): Path<String>,
) -> Result<Json<AdvanceResponse>, AppError> {
    ensure_code(&code)?;
    let payload = question_service::advance(&state, &code, &caller_id).await?;
    Ok(Json(payload))
}
