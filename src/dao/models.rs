use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::state::scoring::RoundScores;

/// Registered archer stored by the player directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Stable identifier for the player.
    pub id: Uuid,
    /// Display name, trimmed.
    pub name: String,
    /// Grade or division, when one was chosen.
    pub grade: Option<String>,
    /// Avatar glyph.
    pub avatar: String,
    /// Time the player was registered.
    pub joined_at: SystemTime,
}

/// Finalized tournament result for one player, kept for audit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntity {
    /// Identifier assigned by the ledger.
    pub id: Uuid,
    /// Owning player.
    pub player_id: Uuid,
    /// Time the result was finalized.
    pub recorded_at: SystemTime,
    /// Sum of both distances.
    pub grand: u32,
    /// Near distance total.
    pub near_total: u32,
    /// Far distance total.
    pub far_total: u32,
    /// Near distance shots, misses and unset cells stored as 0.
    pub near_rounds: RoundScores,
    /// Far distance shots, misses and unset cells stored as 0.
    pub far_rounds: RoundScores,
}

/// Result submitted to the ledger before an identifier is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScore {
    pub player_id: Uuid,
    pub recorded_at: SystemTime,
    pub grand: u32,
    pub near_total: u32,
    pub far_total: u32,
    pub near_rounds: RoundScores,
    pub far_rounds: RoundScores,
}

impl NewScore {
    /// Attach a fresh identifier, producing the stored form.
    pub fn into_entity(self) -> ScoreEntity {
        ScoreEntity {
            id: Uuid::new_v4(),
            player_id: self.player_id,
            recorded_at: self.recorded_at,
            grand: self.grand,
            near_total: self.near_total,
            far_total: self.far_total,
            near_rounds: self.near_rounds,
            far_rounds: self.far_rounds,
        }
    }
}

/// Newest results first.
pub fn sort_newest_first(scores: &mut [ScoreEntity]) {
    scores.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
}
