use serde::Serialize;
use uuid::Uuid;

use crate::dao::models::PlayerEntity;
use crate::state::stats::sum_grid;

/// Number of rounds shot at each distance.
pub const ROUNDS: usize = 3;
/// Number of shots in a single round.
pub const SHOTS: usize = 5;
/// Highest ring value a shot can score (0 is a miss).
pub const MAX_RING: u8 = 10;

/// Filled grid layout used by the ledger, unset cells stored as misses.
pub type RoundScores = [[u8; SHOTS]; ROUNDS];

/// The two fixed distances shot during a tournament session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Distance {
    /// Shot first; must be confirmed before moving on.
    Near,
    /// Shot second; confirming it finalizes the player.
    Far,
}

/// `ROUNDS x SHOTS` matrix of shot values for one distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Grid {
    cells: [[Option<u8>; SHOTS]; ROUNDS],
}

impl Grid {
    /// Value stored at `(round, shot)`, `None` when unset or out of bounds.
    pub fn get(&self, round: usize, shot: usize) -> Option<u8> {
        self.cells.get(round)?.get(shot).copied().flatten()
    }

    pub(crate) fn set(&mut self, round: usize, shot: usize, value: u8) {
        self.cells[round][shot] = Some(value);
    }

    pub(crate) fn clear(&mut self, round: usize, shot: usize) {
        self.cells[round][shot] = None;
    }

    /// Cells grouped by round.
    pub fn rows(&self) -> &[[Option<u8>; SHOTS]; ROUNDS] {
        &self.cells
    }

    /// Iterate over every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Option<u8>> + '_ {
        self.cells.iter().flat_map(|row| row.iter().copied())
    }

    /// True when no cell has been set yet.
    pub fn is_empty(&self) -> bool {
        self.cells().all(|cell| cell.is_none())
    }

    /// Position of the first unset cell in row-major order.
    pub fn first_unset(&self) -> Option<(usize, usize)> {
        (0..ROUNDS)
            .flat_map(|round| (0..SHOTS).map(move |shot| (round, shot)))
            .find(|&(round, shot)| self.cells[round][shot].is_none())
    }

    /// Position of the last set cell, scanning backward from the final cell.
    pub fn last_filled(&self) -> Option<(usize, usize)> {
        (0..ROUNDS)
            .rev()
            .flat_map(|round| (0..SHOTS).rev().map(move |shot| (round, shot)))
            .find(|&(round, shot)| self.cells[round][shot].is_some())
    }

    /// Copy of the grid with unset cells counted as misses.
    pub fn to_round_scores(&self) -> RoundScores {
        self.cells.map(|row| row.map(|cell| cell.unwrap_or(0)))
    }
}

/// Per-player progress through both distances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerScoringState {
    /// Distance currently being shot.
    pub phase: Distance,
    /// Near distance shots.
    pub near: Grid,
    /// Far distance shots.
    pub far: Grid,
    /// Near total locked by explicit confirmation.
    pub confirmed_near: bool,
    /// Far total locked by explicit confirmation.
    pub confirmed_far: bool,
    /// Cursor row; `ROUNDS` means the grid is full and awaiting confirmation.
    pub round: usize,
    /// Cursor column.
    pub shot: usize,
    /// Both distances confirmed.
    pub done: bool,
}

impl Default for PlayerScoringState {
    fn default() -> Self {
        Self {
            phase: Distance::Near,
            near: Grid::default(),
            far: Grid::default(),
            confirmed_near: false,
            confirmed_far: false,
            round: 0,
            shot: 0,
            done: false,
        }
    }
}

impl PlayerScoringState {
    /// Grid for the given distance.
    pub fn grid(&self, distance: Distance) -> &Grid {
        match distance {
            Distance::Near => &self.near,
            Distance::Far => &self.far,
        }
    }

    pub(crate) fn grid_mut(&mut self, distance: Distance) -> &mut Grid {
        match distance {
            Distance::Near => &mut self.near,
            Distance::Far => &mut self.far,
        }
    }

    /// Grid of the distance currently being shot.
    pub fn active_grid(&self) -> &Grid {
        self.grid(self.phase)
    }

    /// Whether the active grid is full and waiting for a confirmation decision.
    pub fn awaiting_confirmation(&self) -> bool {
        !self.done && self.round >= ROUNDS
    }

    /// Sum of the shots recorded at `distance`.
    pub fn total(&self, distance: Distance) -> u32 {
        sum_grid(self.grid(distance))
    }

    /// Sum of both distances.
    pub fn grand_total(&self) -> u32 {
        self.total(Distance::Near) + self.total(Distance::Far)
    }
}

/// Snapshot of a directory player plus their in-session progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionPlayer {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
    pub scoring: PlayerScoringState,
}

impl SessionPlayer {
    /// Build a session entry with fresh scoring progress.
    pub fn new(id: Uuid, name: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            avatar: avatar.into(),
            scoring: PlayerScoringState::default(),
        }
    }
}

impl From<&PlayerEntity> for SessionPlayer {
    fn from(player: &PlayerEntity) -> Self {
        Self::new(player.id, player.name.clone(), player.avatar.clone())
    }
}

/// Result staged when a player confirms their far distance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardInfo {
    pub player_id: Uuid,
    pub name: String,
    pub avatar: String,
    pub grand: u32,
    pub near_total: u32,
    pub far_total: u32,
    pub near_rounds: RoundScores,
    pub far_rounds: RoundScores,
}

/// Full in-memory state of a scoring session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// Players in selection order.
    pub players: Vec<SessionPlayer>,
    /// Index of the player currently viewed and scored.
    pub active_index: usize,
    /// Distance awaiting a yes/no decision for the active player.
    pub pending_confirmation: Option<Distance>,
    /// Finalized result awaiting acknowledgment.
    pub reward: Option<RewardInfo>,
    /// Every player has confirmed both distances.
    pub all_done: bool,
}

impl SessionState {
    /// Start a session for `players`, resetting their scoring progress.
    ///
    /// An empty roster yields a degenerate session that is already complete;
    /// callers refuse to start one (see [`crate::state::controller::SessionStartError`]).
    pub fn new(players: Vec<SessionPlayer>) -> Self {
        let all_done = players.is_empty();
        let players = players
            .into_iter()
            .map(|player| SessionPlayer {
                scoring: PlayerScoringState::default(),
                ..player
            })
            .collect();

        Self {
            players,
            active_index: 0,
            pending_confirmation: None,
            reward: None,
            all_done,
        }
    }

    /// Currently active player, if the roster is not empty.
    pub fn active_player(&self) -> Option<&SessionPlayer> {
        self.players.get(self.active_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_fresh() {
        let mut player = SessionPlayer::new(Uuid::new_v4(), "Robin", "🏹");
        player.scoring.round = 2;
        player.scoring.near.set(0, 0, 7);

        let session = SessionState::new(vec![player]);
        let scoring = &session.players[0].scoring;

        assert_eq!(session.active_index, 0);
        assert!(session.pending_confirmation.is_none());
        assert!(session.reward.is_none());
        assert!(!session.all_done);
        assert_eq!(scoring, &PlayerScoringState::default());
        assert!(scoring.near.is_empty());
        assert!(scoring.far.is_empty());
    }

    #[test]
    fn empty_roster_is_degenerate() {
        let session = SessionState::new(Vec::new());
        assert!(session.all_done);
        assert!(session.active_player().is_none());
    }

    #[test]
    fn grid_scans() {
        let mut grid = Grid::default();
        assert_eq!(grid.first_unset(), Some((0, 0)));
        assert_eq!(grid.last_filled(), None);

        grid.set(0, 0, 9);
        grid.set(0, 1, 4);
        assert_eq!(grid.first_unset(), Some((0, 2)));
        assert_eq!(grid.last_filled(), Some((0, 1)));
        assert_eq!(grid.get(0, 1), Some(4));
        assert_eq!(grid.get(ROUNDS, 0), None);

        let scores = grid.to_round_scores();
        assert_eq!(scores[0], [9, 4, 0, 0, 0]);
    }
}
