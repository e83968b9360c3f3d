//! DTO definitions for scoring sessions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::DistanceLabels,
    dto::rounds_to_rows,
    state::{
        engine::Transition,
        scoring::{Distance, Grid, RewardInfo, SessionPlayer, SessionState},
    },
};

/// Shooting distance exposed to clients.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DistanceDto {
    Near,
    Far,
}

impl From<Distance> for DistanceDto {
    fn from(distance: Distance) -> Self {
        match distance {
            Distance::Near => DistanceDto::Near,
            Distance::Far => DistanceDto::Far,
        }
    }
}

/// Payload used to open a scoring session.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartSessionRequest {
    /// Player identifiers, either as a JSON array of strings or as a string holding such an
    /// array. Unknown or malformed identifiers are skipped.
    #[schema(value_type = Object)]
    pub player_ids: Value,
}

/// A ring value hit by the active player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ShotRequest {
    /// 0 for a miss, up to 10.
    #[validate(range(max = 10))]
    pub value: u8,
}

/// Select the player being scored.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ActivePlayerRequest {
    pub index: usize,
}

/// Move the cursor onto an already recorded cell of the active distance.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JumpRequest {
    pub round: usize,
    pub shot: usize,
}

/// Answer to a pending distance confirmation.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmRequest {
    /// `true` locks the distance, `false` takes back the last shot.
    pub accept: bool,
}

/// One player's progress inside a session.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionPlayerView {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
    pub phase: DistanceDto,
    pub phase_label: String,
    /// Near distance cells, `null` where nothing was recorded yet.
    pub near: Vec<Vec<Option<u8>>>,
    /// Far distance cells, `null` where nothing was recorded yet.
    pub far: Vec<Vec<Option<u8>>>,
    pub near_total: u32,
    pub far_total: u32,
    pub grand_total: u32,
    pub confirmed_near: bool,
    pub confirmed_far: bool,
    pub round: usize,
    pub shot: usize,
    pub done: bool,
}

impl SessionPlayerView {
    fn new(player: &SessionPlayer, labels: &DistanceLabels) -> Self {
        let scoring = &player.scoring;
        Self {
            id: player.id,
            name: player.name.clone(),
            avatar: player.avatar.clone(),
            phase: scoring.phase.into(),
            phase_label: labels.label(scoring.phase).to_string(),
            near: grid_rows(&scoring.near),
            far: grid_rows(&scoring.far),
            near_total: scoring.total(Distance::Near),
            far_total: scoring.total(Distance::Far),
            grand_total: scoring.grand_total(),
            confirmed_near: scoring.confirmed_near,
            confirmed_far: scoring.confirmed_far,
            round: scoring.round,
            shot: scoring.shot,
            done: scoring.done,
        }
    }
}

fn grid_rows(grid: &Grid) -> Vec<Vec<Option<u8>>> {
    grid.rows().iter().map(|row| row.to_vec()).collect()
}

/// Summary of a player who just finished both distances.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RewardView {
    pub player_id: Uuid,
    pub name: String,
    pub avatar: String,
    pub grand: u32,
    pub near_total: u32,
    pub far_total: u32,
    pub near_rounds: Vec<Vec<u8>>,
    pub far_rounds: Vec<Vec<u8>>,
}

impl From<&RewardInfo> for RewardView {
    fn from(reward: &RewardInfo) -> Self {
        Self {
            player_id: reward.player_id,
            name: reward.name.clone(),
            avatar: reward.avatar.clone(),
            grand: reward.grand,
            near_total: reward.near_total,
            far_total: reward.far_total,
            near_rounds: rounds_to_rows(&reward.near_rounds),
            far_rounds: rounds_to_rows(&reward.far_rounds),
        }
    }
}

/// Full view of a scoring session.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub active_index: usize,
    /// Distance of the active player waiting to be confirmed.
    pub pending_confirmation: Option<DistanceDto>,
    pub reward: Option<RewardView>,
    pub all_done: bool,
    pub players: Vec<SessionPlayerView>,
}

impl SessionSnapshot {
    /// Project `state` for the session identified by `id`.
    pub fn new(id: Uuid, state: &SessionState, labels: &DistanceLabels) -> Self {
        Self {
            id,
            active_index: state.active_index,
            pending_confirmation: state.pending_confirmation.map(Into::into),
            reward: state.reward.as_ref().map(Into::into),
            all_done: state.all_done,
            players: state
                .players
                .iter()
                .map(|player| SessionPlayerView::new(player, labels))
                .collect(),
        }
    }
}

/// Outcome of a session action.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionOutcome {
    /// Whether the action changed the session.
    pub applied: bool,
    /// Why the action was ignored, when it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored_reason: Option<String>,
    pub session: SessionSnapshot,
}

impl ActionOutcome {
    pub fn new(transition: Transition, session: SessionSnapshot) -> Self {
        match transition {
            Transition::Applied => Self {
                applied: true,
                ignored_reason: None,
                session,
            },
            Transition::Ignored(reason) => Self {
                applied: false,
                ignored_reason: Some(reason.to_string()),
                session,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::engine::{IgnoreReason, ScoringAction};

    #[test]
    fn snapshot_exposes_unset_cells_as_null() {
        let mut state = SessionState::new(vec![SessionPlayer::new(Uuid::new_v4(), "Ada", "🏹")]);
        state.apply(ScoringAction::RecordShot(7));

        let snapshot = SessionSnapshot::new(Uuid::new_v4(), &state, &DistanceLabels::default());
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["players"][0]["near"][0][0], 7);
        assert!(json["players"][0]["near"][0][1].is_null());
        assert_eq!(json["players"][0]["phase"], "near");
        assert_eq!(json["players"][0]["phase_label"], "10m");
        assert!(json["pending_confirmation"].is_null());
    }

    #[test]
    fn shot_above_ten_fails_validation() {
        assert!(ShotRequest { value: 11 }.validate().is_err());
        assert!(ShotRequest { value: 0 }.validate().is_ok());
        assert!(ShotRequest { value: 10 }.validate().is_ok());
    }

    #[test]
    fn ignored_outcome_carries_reason() {
        let state = SessionState::new(Vec::new());
        let snapshot = SessionSnapshot::new(Uuid::new_v4(), &state, &DistanceLabels::default());
        let outcome = ActionOutcome::new(Transition::Ignored(IgnoreReason::NoReward), snapshot);
        assert!(!outcome.applied);
        assert_eq!(
            outcome.ignored_reason.as_deref(),
            Some("no reward is awaiting acknowledgment")
        );
    }
}
