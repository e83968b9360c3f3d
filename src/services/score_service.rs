use std::collections::HashMap;

use tracing::info;
use uuid::Uuid;

use crate::{dto::score::RecentScoreItem, error::ServiceError, state::SharedState};

/// Most recent results across all players, newest first, joined with player details.
pub async fn recent_scores(
    state: &SharedState,
    limit: Option<usize>,
) -> Result<Vec<RecentScoreItem>, ServiceError> {
    let limit = limit.unwrap_or_else(|| state.config().recent_limit());
    let scores = state.ledger().recent_scores(limit).await?;
    let players: HashMap<_, _> = state
        .players()
        .list_players()
        .await?
        .into_iter()
        .map(|player| (player.id, player))
        .collect();

    Ok(scores
        .into_iter()
        .map(|score| {
            let player = players.get(&score.player_id);
            RecentScoreItem::new(score, player)
        })
        .collect())
}

pub async fn delete_score(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    if !state.ledger().delete_score(id).await? {
        return Err(ServiceError::NotFound(format!("score `{id}` not found")));
    }
    info!(score_id = %id, "score deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Arc,
        time::{Duration, SystemTime},
    };

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{NewScore, PlayerEntity},
            store::{PlayerDirectory, ScoreLedger, memory::MemoryStore},
        },
        state::AppState,
    };

    fn score(player_id: Uuid, grand: u32, age_secs: u64) -> NewScore {
        NewScore {
            player_id,
            recorded_at: SystemTime::now() - Duration::from_secs(age_secs),
            grand,
            near_total: grand,
            far_total: 0,
            near_rounds: [[0; 5]; 3],
            far_rounds: [[0; 5]; 3],
        }
    }

    #[tokio::test]
    async fn recent_scores_join_player_details() {
        let store = MemoryStore::new();
        let state = AppState::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            AppConfig::default(),
        );
        let player = PlayerEntity {
            id: Uuid::new_v4(),
            name: "Robin".into(),
            grade: None,
            avatar: "🦊".into(),
            joined_at: SystemTime::now(),
        };
        store.add_player(player.clone()).await.unwrap();
        store.add_score(score(player.id, 100, 20)).await.unwrap();
        store.add_score(score(player.id, 120, 10)).await.unwrap();
        // result whose player has been removed
        store.add_score(score(Uuid::new_v4(), 90, 5)).await.unwrap();

        let recent = recent_scores(&state, Some(2)).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].score.grand, 90);
        assert!(recent[0].player_name.is_none());
        assert_eq!(recent[1].player_name.as_deref(), Some("Robin"));
        assert_eq!(recent[1].player_avatar.as_deref(), Some("🦊"));
    }

    #[tokio::test]
    async fn deleting_missing_score_is_not_found() {
        let store = MemoryStore::new();
        let state = AppState::new(
            Arc::new(store.clone()),
            Arc::new(store),
            AppConfig::default(),
        );
        assert!(matches!(
            delete_score(&state, Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
