use axum::Router;

use crate::{dto::validation::validate_session_code, error::AppError, state::SharedState};

pub mod docs;
pub mod health;
pub mod identity;
pub mod leaderboard;
pub mod play;
pub mod session;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(session::router())
        .merge(play::router())
        .merge(leaderboard::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}

/// Reject malformed join codes before they reach the registry.
fn ensure_code(code: &str) -> Result<(), AppError> {
    validate_session_code(code).map_err(|err| {
        let message = err
            .message
            .map(|m| m.to_string())
            .unwrap_or_else(|| "invalid session code".into());
        AppError::BadRequest(message)
    })
}
