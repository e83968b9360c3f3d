use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::player::{CreatePlayerRequest, PlayerOptions, PlayerProfile, PlayerSummary},
    error::AppError,
    services::player_service,
    state::SharedState,
};

/// Routes managing the player directory.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/players", get(list_players).post(create_player))
        .route("/players/options", get(player_options))
        .route("/players/{id}", get(get_player).delete(delete_player))
        .route("/players/{id}/profile", get(player_profile))
}

/// List registered players in registration order.
#[utoipa::path(
    get,
    path = "/players",
    tag = "players",
    responses((status = 200, description = "Registered players", body = [PlayerSummary]))
)]
pub async fn list_players(
    State(state): State<SharedState>,
) -> Result<Json<Vec<PlayerSummary>>, AppError> {
    Ok(Json(player_service::list_players(&state).await?))
}

/// Register a new player.
#[utoipa::path(
    post,
    path = "/players",
    tag = "players",
    request_body = CreatePlayerRequest,
    responses(
        (status = 201, description = "Player registered", body = PlayerSummary),
        (status = 400, description = "Blank name, unknown grade or avatar")
    )
)]
pub async fn create_player(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreatePlayerRequest>>,
) -> Result<(StatusCode, Json<PlayerSummary>), AppError> {
    let player = player_service::create_player(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(player)))
}

/// Avatars and grades a new player can pick from.
#[utoipa::path(
    get,
    path = "/players/options",
    tag = "players",
    responses((status = 200, description = "Registration options", body = PlayerOptions))
)]
pub async fn player_options(State(state): State<SharedState>) -> Json<PlayerOptions> {
    Json(player_service::player_options(&state))
}

#[utoipa::path(
    get,
    path = "/players/{id}",
    tag = "players",
    params(("id" = Uuid, Path, description = "Identifier of the player")),
    responses(
        (status = 200, description = "Player found", body = PlayerSummary),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn get_player(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerSummary>, AppError> {
    Ok(Json(player_service::get_player(&state, id).await?))
}

/// Delete a player and every result recorded for them, abandoning their running sessions.
#[utoipa::path(
    delete,
    path = "/players/{id}",
    tag = "players",
    params(("id" = Uuid, Path, description = "Identifier of the player")),
    responses(
        (status = 204, description = "Player and results deleted"),
        (status = 404, description = "Unknown player"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn delete_player(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    player_service::delete_player(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Player details with history, best and average grand totals.
#[utoipa::path(
    get,
    path = "/players/{id}/profile",
    tag = "players",
    params(("id" = Uuid, Path, description = "Identifier of the player")),
    responses(
        (status = 200, description = "Player profile", body = PlayerProfile),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn player_profile(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerProfile>, AppError> {
    Ok(Json(player_service::player_profile(&state, id).await?))
}
