use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::session::{CreateSessionRequest, JoinResponse, LobbyResponse, SessionCreatedResponse},
    dto::play::StartedResponse,
    error::AppError,
    routes::{ensure_code, identity::Caller},
    services::session_service,
    state::SharedState,
};

/// Routes handling session bootstrap: creation, joining, lobby, and start.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/live/sessions", post(create_session))
        .route("/live/sessions/{code}/join", post(join_session))
        .route("/live/sessions/{code}/lobby", get(get_lobby))
        .route("/live/sessions/{code}/start", post(start_session))
}

/// Create a fresh session owned by the caller.
#[utoipa::path(
    post,
    path = "/live/sessions",
    tag = "session",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created", body = SessionCreatedResponse),
        (status = 400, description = "Malformed session parameters")
    )
)]
pub async fn create_session(
    State(state): State<SharedState>,
    Caller(host_id): Caller,
    Valid(Json(payload)): Valid<Json<CreateSessionRequest>>,
) -> Result<Json<SessionCreatedResponse>, AppError> {
    let summary = session_service::create(&state, &host_id, payload).await?;
    Ok(Json(summary))
}

/// Join the caller to a session; repeat joins are a no-op.
#[utoipa::path(
    post,
    path = "/live/sessions/{code}/join",
    tag = "session",
    params(("code" = String, Path, description = "Join code of the session")),
    responses(
        (status = 200, description = "Joined", body = JoinResponse),
        (status = 404, description = "Unknown session code"),
        (status = 409, description = "Session already completed")
    )
)]
pub async fn join_session(
    State(state): State<SharedState>,
    Caller(participant_id): Caller,
    Path(code): Path<String>,
) -> Result<Json<JoinResponse>, AppError> {
    ensure_code(&code)?;
    let summary = session_service::join(&state, &code, &participant_id).await?;
    Ok(Json(summary))
}

/// Return the roster of a session.
#[utoipa::path(
    get,
    path = "/live/sessions/{code}/lobby",
    tag = "session",
    params(("code" = String, Path, description = "Join code of the session")),
    responses(
        (status = 200, description = "Current roster", body = LobbyResponse),
        (status = 404, description = "Unknown session code")
    )
)]
pub async fn get_lobby(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<LobbyResponse>, AppError> {
    ensure_code(&code)?;
    let payload = session_service::lobby(&state, &code).await?;
    Ok(Json(payload))
}

/// Open the first question. Only the session's host may call this.
#[utoipa::path(
    post,
    path = "/live/sessions/{code}/start",
    tag = "session",
    params(("code" = String, Path, description = "Join code of the session")),
    responses(
        (status = 200, description = "Session started", body = StartedResponse),
        (status = 403, description = "Caller is not the host"),
        (status = 409, description = "Session is not in the lobby")
    )
)]
pub async fn start_session(
    State(state): State<SharedState>,
    Caller(caller_id): Caller,
    Path(code): Path<String>,
) -> Result<Json<StartedResponse>, AppError> {
    ensure_code(&code)?;
    let payload = session_service::start(&state, &code, &caller_id).await?;
    Ok(Json(payload))
}
