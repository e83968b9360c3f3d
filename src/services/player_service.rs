use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{PlayerEntity, sort_newest_first},
    dto::player::{CreatePlayerRequest, PlayerOptions, PlayerProfile, PlayerSummary},
    error::ServiceError,
    services::session_service,
    state::{SharedState, stats::best_and_average},
};

/// Players in registration order.
pub async fn list_players(state: &SharedState) -> Result<Vec<PlayerSummary>, ServiceError> {
    let players = state.players().list_players().await?;
    Ok(players.into_iter().map(Into::into).collect())
}

/// Avatars and grades accepted when registering a player.
pub fn player_options(state: &SharedState) -> PlayerOptions {
    PlayerOptions {
        avatars: state.config().avatars().to_vec(),
        grades: state.config().grades().to_vec(),
    }
}

/// Register a player after normalising and checking the submitted fields.
pub async fn create_player(
    state: &SharedState,
    request: CreatePlayerRequest,
) -> Result<PlayerSummary, ServiceError> {
    let player = build_player(state, request)?;
    state.players().add_player(player.clone()).await?;
    info!(player_id = %player.id, name = %player.name, "player registered");
    Ok(player.into())
}

pub async fn get_player(state: &SharedState, id: Uuid) -> Result<PlayerSummary, ServiceError> {
    Ok(require_player(state, id).await?.into())
}

/// Player details with their result history, best and rounded average grand totals.
pub async fn player_profile(state: &SharedState, id: Uuid) -> Result<PlayerProfile, ServiceError> {
    let player = require_player(state, id).await?;
    let mut history = state.ledger().scores_for_player(id).await?;
    sort_newest_first(&mut history);

    let grands: Vec<u32> = history.iter().map(|score| score.grand).collect();
    let (best, average) = best_and_average(&grands);

    Ok(PlayerProfile {
        player: player.into(),
        best,
        average,
        history: history.into_iter().map(Into::into).collect(),
    })
}

/// Remove a player together with every result recorded for them.
///
/// Running sessions the player takes part in are abandoned first.
pub async fn delete_player(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    require_player(state, id).await?;

    let released = session_service::release_player(state, id).await;
    if !released.is_empty() {
        info!(player_id = %id, sessions = released.len(), "abandoned sessions of deleted player");
    }

    if !state.players().delete_player(id).await? {
        return Err(ServiceError::NotFound(format!("player `{id}` not found")));
    }
    let removed_scores = state.ledger().delete_scores_for_player(id).await?;

    info!(player_id = %id, removed_scores, "player deleted");
    Ok(())
}

async fn require_player(state: &SharedState, id: Uuid) -> Result<PlayerEntity, ServiceError> {
    state
        .players()
        .find_player(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("player `{id}` not found")))
}

fn build_player(
    state: &SharedState,
    request: CreatePlayerRequest,
) -> Result<PlayerEntity, ServiceError> {
    let config = state.config();

    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput("player name must not be blank".into()));
    }

    let grade = request.grade.map(|grade| grade.trim().to_string());
    if let Some(grade) = &grade {
        if !config.grades().iter().any(|known| known == grade) {
            return Err(ServiceError::InvalidInput(format!("unknown grade `{grade}`")));
        }
    }

    let avatar = match request.avatar.map(|avatar| avatar.trim().to_string()) {
        Some(avatar) if config.avatars().iter().any(|known| *known == avatar) => avatar,
        Some(avatar) => {
            return Err(ServiceError::InvalidInput(format!("unknown avatar `{avatar}`")));
        }
        None => config.default_avatar().to_string(),
    };

    Ok(PlayerEntity {
        id: Uuid::new_v4(),
        name,
        grade,
        avatar,
        joined_at: SystemTime::now(),
    })
}
