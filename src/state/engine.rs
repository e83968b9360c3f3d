//! Transition function driving a scoring session shot by shot.
//!
//! Every action is validated against the current [`SessionState`] before any field is
//! touched, so a transition is either applied as a whole or ignored as a whole. Ignored
//! actions are reported through [`Transition::Ignored`] and never panic.

use thiserror::Error;

use crate::state::scoring::{
    Distance, MAX_RING, ROUNDS, RewardInfo, SHOTS, SessionPlayer, SessionState,
};

/// Actions that can be applied to a scoring session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoringAction {
    /// Replace the whole session with a fresh one for these players.
    Reset(Vec<SessionPlayer>),
    /// View / score another player.
    SwitchActivePlayer(usize),
    /// Ring value (0 = miss) hit by the active player.
    RecordShot(u8),
    /// Lock the pending distance total.
    ConfirmDistance,
    /// Decline the pending confirmation and take back the last shot.
    RejectConfirmation,
    /// Move the cursor onto an already recorded cell of the active distance.
    JumpToCell {
        /// Target round.
        round: usize,
        /// Target shot within the round.
        shot: usize,
    },
    /// Dismiss the reward of the player who just finished.
    AcknowledgeReward,
}

/// Why an action left the session untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IgnoreReason {
    #[error("session has no players")]
    NoActivePlayer,
    #[error("player index {index} is out of range (session has {len} players)")]
    PlayerOutOfRange { index: usize, len: usize },
    #[error("active player has already finished")]
    PlayerDone,
    #[error("ring value {0} is above the maximum of 10")]
    RingOutOfRange(u8),
    #[error("distance is full and awaiting confirmation")]
    GridFull,
    #[error("no confirmation is pending")]
    NoPendingConfirmation,
    #[error("pending confirmation does not match the active player")]
    ConfirmationMismatch,
    #[error("a confirmation is pending")]
    ConfirmationPending,
    #[error("cell ({round}, {shot}) is outside the grid")]
    CellOutOfRange { round: usize, shot: usize },
    #[error("cell ({round}, {shot}) has no recorded shot")]
    CellEmpty { round: usize, shot: usize },
    #[error("no reward is awaiting acknowledgment")]
    NoReward,
}

/// Result of applying a [`ScoringAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// State changed.
    Applied,
    /// State unchanged.
    Ignored(IgnoreReason),
}

impl Transition {
    /// Whether the action changed the session.
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied)
    }
}

/// Apply `action` to `state` by value.
pub fn reduce(mut state: SessionState, action: ScoringAction) -> SessionState {
    state.apply(action);
    state
}

impl SessionState {
    /// Apply a single action in place.
    pub fn apply(&mut self, action: ScoringAction) -> Transition {
        let outcome = match action {
            ScoringAction::Reset(players) => {
                *self = SessionState::new(players);
                Ok(())
            }
            ScoringAction::SwitchActivePlayer(index) => self.switch_active_player(index),
            ScoringAction::RecordShot(value) => self.record_shot(value),
            ScoringAction::ConfirmDistance => self.confirm_distance(),
            ScoringAction::RejectConfirmation => self.reject_confirmation(),
            ScoringAction::JumpToCell { round, shot } => self.jump_to_cell(round, shot),
            ScoringAction::AcknowledgeReward => self.acknowledge_reward(),
        };

        match outcome {
            Ok(()) => Transition::Applied,
            Err(reason) => Transition::Ignored(reason),
        }
    }

    fn switch_active_player(&mut self, index: usize) -> Result<(), IgnoreReason> {
        let len = self.players.len();
        if index >= len {
            return Err(IgnoreReason::PlayerOutOfRange { index, len });
        }

        self.active_index = index;
        self.refresh_pending_confirmation();
        Ok(())
    }

    fn record_shot(&mut self, value: u8) -> Result<(), IgnoreReason> {
        if value > MAX_RING {
            return Err(IgnoreReason::RingOutOfRange(value));
        }

        let player = self
            .players
            .get_mut(self.active_index)
            .ok_or(IgnoreReason::NoActivePlayer)?;
        let scoring = &mut player.scoring;
        if scoring.done {
            return Err(IgnoreReason::PlayerDone);
        }
        if scoring.round >= ROUNDS {
            return Err(IgnoreReason::GridFull);
        }

        let phase = scoring.phase;
        let (round, shot) = (scoring.round, scoring.shot);
        let grid = scoring.grid_mut(phase);
        grid.set(round, shot, value);

        // Unset cells always form a suffix of the grid, so this is the linear
        // successor in sequential entry and the resume point after a jump.
        let (next_round, next_shot) = grid.first_unset().unwrap_or((ROUNDS, 0));
        scoring.round = next_round;
        scoring.shot = next_shot;

        if next_round == ROUNDS {
            self.pending_confirmation = Some(phase);
        }
        Ok(())
    }

    fn confirm_distance(&mut self) -> Result<(), IgnoreReason> {
        let pending = self
            .pending_confirmation
            .ok_or(IgnoreReason::NoPendingConfirmation)?;
        let player = self
            .players
            .get_mut(self.active_index)
            .ok_or(IgnoreReason::NoActivePlayer)?;
        let scoring = &mut player.scoring;
        if scoring.done || scoring.phase != pending || scoring.round < ROUNDS {
            return Err(IgnoreReason::ConfirmationMismatch);
        }

        match pending {
            Distance::Near => {
                scoring.confirmed_near = true;
                scoring.phase = Distance::Far;
                scoring.round = 0;
                scoring.shot = 0;
            }
            Distance::Far => {
                scoring.confirmed_far = true;
                scoring.done = true;

                let near_total = scoring.total(Distance::Near);
                let far_total = scoring.total(Distance::Far);
                self.reward = Some(RewardInfo {
                    player_id: player.id,
                    name: player.name.clone(),
                    avatar: player.avatar.clone(),
                    grand: near_total + far_total,
                    near_total,
                    far_total,
                    near_rounds: player.scoring.near.to_round_scores(),
                    far_rounds: player.scoring.far.to_round_scores(),
                });
            }
        }

        self.pending_confirmation = None;
        Ok(())
    }

    fn reject_confirmation(&mut self) -> Result<(), IgnoreReason> {
        let pending = self
            .pending_confirmation
            .ok_or(IgnoreReason::NoPendingConfirmation)?;
        let player = self
            .players
            .get_mut(self.active_index)
            .ok_or(IgnoreReason::NoActivePlayer)?;
        let scoring = &mut player.scoring;
        if scoring.done || scoring.phase != pending {
            return Err(IgnoreReason::ConfirmationMismatch);
        }

        let grid = scoring.grid_mut(pending);
        let (round, shot) = match grid.last_filled() {
            Some((round, shot)) => {
                grid.clear(round, shot);
                (round, shot)
            }
            None => (0, 0),
        };
        scoring.round = round;
        scoring.shot = shot;

        self.pending_confirmation = None;
        Ok(())
    }

    fn jump_to_cell(&mut self, round: usize, shot: usize) -> Result<(), IgnoreReason> {
        if self.pending_confirmation.is_some() {
            return Err(IgnoreReason::ConfirmationPending);
        }

        let player = self
            .players
            .get_mut(self.active_index)
            .ok_or(IgnoreReason::NoActivePlayer)?;
        let scoring = &mut player.scoring;
        if scoring.done {
            return Err(IgnoreReason::PlayerDone);
        }
        if round >= ROUNDS || shot >= SHOTS {
            return Err(IgnoreReason::CellOutOfRange { round, shot });
        }
        if scoring.active_grid().get(round, shot).is_none() {
            return Err(IgnoreReason::CellEmpty { round, shot });
        }

        scoring.round = round;
        scoring.shot = shot;
        Ok(())
    }

    fn acknowledge_reward(&mut self) -> Result<(), IgnoreReason> {
        if self.reward.is_none() {
            return Err(IgnoreReason::NoReward);
        }

        self.reward = None;
        self.all_done = self.players.iter().all(|player| player.scoring.done);

        if !self.all_done {
            let next = self
                .players
                .iter()
                .enumerate()
                .find(|(index, player)| *index != self.active_index && !player.scoring.done)
                .map(|(index, _)| index);
            if let Some(index) = next {
                self.active_index = index;
            }
        }

        self.refresh_pending_confirmation();
        Ok(())
    }

    /// Pending confirmation always describes the active player.
    fn refresh_pending_confirmation(&mut self) {
        self.pending_confirmation = self
            .active_player()
            .filter(|player| player.scoring.awaiting_confirmation())
            .map(|player| player.scoring.phase);
    }
}
