use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the live quiz backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::session::create_session,
        crate::routes::session::join_session,
        crate::routes::session::get_lobby,
        crate::routes::session::start_session,
        crate::routes::play::get_current_question,
        crate::routes::play::submit_answer,
        crate::routes::play::advance_session,
        crate::routes::leaderboard::get_leaderboard,
        crate::routes::leaderboard::get_results,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::session::CreateSessionRequest,
            crate::dto::session::QuestionInput,
            crate::dto::session::QuestionKindInput,
            crate::dto::session::SessionStatus,
            crate::dto::session::SessionCreatedResponse,
            crate::dto::session::JoinResponse,
            crate::dto::session::ParticipantSummary,
            crate::dto::session::LobbyResponse,
            crate::dto::play::QuestionView,
            crate::dto::play::CurrentQuestionResponse,
            crate::dto::play::SubmitAnswerRequest,
            crate::dto::play::SubmitAnswerResponse,
            crate::dto::play::StartedResponse,
            crate::dto::play::AdvanceResponse,
            crate::dto::leaderboard::LeaderboardEntry,
            crate::dto::leaderboard::LeaderboardResponse,
            crate::dto::leaderboard::ResultEntry,
            crate::dto::leaderboard::SessionStats,
            crate::dto::leaderboard::ResultsResponse,
        )
    ),
    tags(
        (name = "session", description = "Session bootstrap and roster"),
        (name = "play", description = "Active gameplay: polling, answering, advancing"),
        (name = "leaderboard", description = "Ranked views derived from the ledger"),
        (name = "health", description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;
