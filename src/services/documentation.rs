use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Archery Score Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::stream,
        crate::routes::players::list_players,
        crate::routes::players::create_player,
        crate::routes::players::player_options,
        crate::routes::players::get_player,
        crate::routes::players::delete_player,
        crate::routes::players::player_profile,
        crate::routes::scores::recent_scores,
        crate::routes::scores::delete_score,
        crate::routes::sessions::start_session,
        crate::routes::sessions::get_session,
        crate::routes::sessions::abandon_session,
        crate::routes::sessions::record_shot,
        crate::routes::sessions::switch_active_player,
        crate::routes::sessions::jump_to_cell,
        crate::routes::sessions::confirm_distance,
        crate::routes::sessions::acknowledge_reward,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::player::CreatePlayerRequest,
            crate::dto::player::PlayerSummary,
            crate::dto::player::PlayerProfile,
            crate::dto::player::PlayerOptions,
            crate::dto::score::ScoreSummary,
            crate::dto::score::RecentScoreItem,
            crate::dto::session::StartSessionRequest,
            crate::dto::session::ShotRequest,
            crate::dto::session::ActivePlayerRequest,
            crate::dto::session::JumpRequest,
            crate::dto::session::ConfirmRequest,
            crate::dto::session::SessionSnapshot,
            crate::dto::session::ActionOutcome,
            crate::dto::sse::Handshake,
            crate::dto::sse::ConfirmationRequestedEvent,
            crate::dto::sse::DistanceLockedEvent,
            crate::dto::sse::ScoreSavedEvent,
            crate::dto::sse::ScoreSaveFailedEvent,
            crate::dto::sse::SessionCompletedEvent,
            crate::dto::sse::SessionAbandonedEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events stream"),
        (name = "players", description = "Player directory"),
        (name = "scores", description = "Finalized results"),
        (name = "sessions", description = "Live scoring sessions"),
    )
)]
pub struct ApiDoc;
