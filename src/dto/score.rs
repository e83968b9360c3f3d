//! DTO definitions for finalized results.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    dao::models::{PlayerEntity, ScoreEntity},
    dto::{format_system_time, rounds_to_rows},
};

/// Finalized result as exposed over the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreSummary {
    pub id: Uuid,
    pub player_id: Uuid,
    /// RFC 3339 timestamp of finalization.
    pub recorded_at: String,
    pub grand: u32,
    pub near_total: u32,
    pub far_total: u32,
    /// Rounds of shots at the near distance, misses as 0.
    pub near_rounds: Vec<Vec<u8>>,
    /// Rounds of shots at the far distance, misses as 0.
    pub far_rounds: Vec<Vec<u8>>,
}

impl From<ScoreEntity> for ScoreSummary {
    fn from(score: ScoreEntity) -> Self {
        Self {
            id: score.id,
            player_id: score.player_id,
            recorded_at: format_system_time(score.recorded_at),
            grand: score.grand,
            near_total: score.near_total,
            far_total: score.far_total,
            near_rounds: rounds_to_rows(&score.near_rounds),
            far_rounds: rounds_to_rows(&score.far_rounds),
        }
    }
}

/// Entry of the recent results feed.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecentScoreItem {
    #[serde(flatten)]
    pub score: ScoreSummary,
    /// Absent when the player was removed in the meantime.
    pub player_name: Option<String>,
    pub player_avatar: Option<String>,
}

impl RecentScoreItem {
    pub fn new(score: ScoreEntity, player: Option<&PlayerEntity>) -> Self {
        Self {
            score: score.into(),
            player_name: player.map(|p| p.name.clone()),
            player_avatar: player.map(|p| p.avatar.clone()),
        }
    }
}

/// Query string accepted by the recent results listing.
#[derive(Debug, Deserialize, IntoParams)]
pub struct RecentScoresQuery {
    /// Maximum number of results; defaults to the configured limit.
    pub limit: Option<usize>,
}
