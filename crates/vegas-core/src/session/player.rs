//! Participant state.

use crate::protocol::{PlayerColor, PlayerId, PlayerView, RolledDie};

/// Color dice handed to each player at round start
pub const COLOR_DICE_PER_ROUND: u8 = 8;

/// Neutral dice handed to each player at round start
pub const NEUTRAL_DICE_PER_ROUND: u8 = 4;

/// One seated participant
#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    /// None until the profile is registered
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub color: Option<PlayerColor>,
    /// 1-based seat index, assigned at join
    pub seat: u8,
    pub balance: u64,
    pub color_dice_left: u8,
    pub neutral_dice_left: u8,
    /// Outcome of the latest roll, until a bet value is chosen.
    /// Invariant: `Some` only while this player holds the turn.
    pub pending_roll: Option<Vec<RolledDie>>,
}

impl Player {
    pub fn new(id: PlayerId, seat: u8) -> Self {
        Self {
            id,
            name: None,
            avatar: None,
            color: None,
            seat,
            balance: 0,
            color_dice_left: 0,
            neutral_dice_left: 0,
            pending_roll: None,
        }
    }

    /// Can this player still act this round?
    pub fn has_dice(&self) -> bool {
        self.color_dice_left > 0 || self.neutral_dice_left > 0
    }

    /// Registered name, or the seat-based placeholder
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("Player {}", self.seat),
        }
    }

    /// Hand out fresh dice pools at the start of a round
    pub fn reset_for_round(&mut self) {
        self.color_dice_left = COLOR_DICE_PER_ROUND;
        self.neutral_dice_left = NEUTRAL_DICE_PER_ROUND;
        self.pending_roll = None;
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            name: self.name.clone(),
            avatar: self.avatar.clone(),
            color: self.color,
            index: self.seat,
            money: self.balance,
            dice_color_left: self.color_dice_left,
            dice_neutral_left: self.neutral_dice_left,
        }
    }
}
