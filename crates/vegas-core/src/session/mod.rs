//! The single live game session.
//!
//! `Session` is the aggregate every command mutates. It is designed to be
//! owned by one serialized dispatcher (the server runs it inside a single
//! actor task): each call is an atomic, non-suspending transition that
//! either rejects up front or applies fully.

mod bank;
mod dice;
mod payout;
mod player;
mod registry;
mod turn;

pub use bank::{Casino, BANKNOTE_VALUES, CASINO_COUNT, COPIES_PER_VALUE, SLOT_FILL_THRESHOLD};
pub use player::{Player, COLOR_DICE_PER_ROUND, NEUTRAL_DICE_PER_ROUND};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::protocol::{CasinoStateView, Command, Notification, Outbound, PlayerId, PlayerView};
use crate::rng::GameRng;

/// Minimum seated players to start (and to keep a game running)
pub const MIN_PLAYERS: usize = 2;

/// Rounds per game unless the host changes it
pub const DEFAULT_MAX_ROUNDS: u8 = 4;

/// Pause between a round's payouts and the next round's setup
pub const SETTLEMENT_DELAY: Duration = Duration::from_secs(3);

/// Session-wide configuration fixed at construction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Occupied-seat cap: 2 in the base rule, up to 4 in extended variants
    pub max_seats: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_seats: 2 }
    }
}

/// Where the session is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Lobby: seats filling, host may configure
    WaitingForPlayers,
    /// A round is running and one player holds the turn
    InProgress,
    /// Payouts are out; the next round starts after the settlement delay
    RoundSettling,
}

/// Why a command was refused. Every rejection is terminal for that command
/// and leaves the session unchanged.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("every seat is occupied")]
    RoomFull,

    #[error("it is not this player's turn")]
    NotYourTurn,

    #[error("a pending roll is already waiting for a bet")]
    AlreadyRolled,

    #[error("no dice left to roll")]
    NoDiceLeft,

    #[error("no pending roll to bet with")]
    NoPendingRoll,

    #[error("the game has not started")]
    GameNotStarted,

    #[error("the game has already started")]
    GameAlreadyStarted,

    #[error("only the host may do this")]
    NotHost,

    #[error("at least {MIN_PLAYERS} players are required")]
    NotEnoughPlayers,

    #[error("max rounds must be 1..=4, got {0}")]
    InvalidMaxRounds(u8),

    #[error("the round is settling; actions resume next round")]
    RoundSettling,

    #[error("caller is not seated in this session")]
    UnknownPlayer,
}

impl SessionError {
    /// The caller-directed rejection frame for this error, if the caller
    /// should hear about it at all.
    pub fn rejection(&self) -> Option<Notification> {
        match self {
            SessionError::RoomFull => Some(Notification::RoomFull),
            SessionError::NotYourTurn => Some(Notification::NotYourTurn),
            SessionError::AlreadyRolled => Some(Notification::RollRejected {
                reason: "alreadyRolled".to_string(),
            }),
            SessionError::NoDiceLeft => Some(Notification::NoDiceLeft),
            SessionError::NoPendingRoll => Some(Notification::CommandRejected {
                reason: "noPendingRoll".to_string(),
            }),
            SessionError::GameNotStarted => Some(Notification::CommandRejected {
                reason: "gameNotStarted".to_string(),
            }),
            SessionError::GameAlreadyStarted => Some(Notification::CommandRejected {
                reason: "gameAlreadyStarted".to_string(),
            }),
            SessionError::NotHost => Some(Notification::CommandRejected {
                reason: "notHost".to_string(),
            }),
            SessionError::NotEnoughPlayers => Some(Notification::CommandRejected {
                reason: "notEnoughPlayers".to_string(),
            }),
            SessionError::InvalidMaxRounds(_) => Some(Notification::CommandRejected {
                reason: "invalidMaxRounds".to_string(),
            }),
            SessionError::RoundSettling => Some(Notification::CommandRejected {
                reason: "roundSettling".to_string(),
            }),
            // Not a participant; nothing to address a frame to.
            SessionError::UnknownPlayer => None,
        }
    }
}

/// The one live game instance
#[derive(Clone, Debug)]
pub struct Session {
    pub config: SessionConfig,
    pub max_rounds: u8,
    /// Kept in seat order; the host is always the first entry
    pub players: Vec<Player>,
    /// Remaining banknotes, top of the deck at the end
    pub deck: Vec<u64>,
    /// Six slots while a game runs, empty in the lobby
    pub casinos: Vec<Casino>,
    pub round: u8,
    pub current_turn: Option<PlayerId>,
    pub phase: Phase,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            max_rounds: DEFAULT_MAX_ROUNDS,
            players: Vec::new(),
            deck: Vec::new(),
            casinos: Vec::new(),
            round: 0,
            current_turn: None,
            phase: Phase::WaitingForPlayers,
        }
    }

    /// Seat a new connection. Rejects with `RoomFull` when every seat is
    /// taken.
    pub fn join(&mut self, id: PlayerId) -> Result<Vec<Outbound>, SessionError> {
        registry::join(self, id)
    }

    /// Remove a participant (disconnect). Never fails: an unknown id is a
    /// no-op.
    pub fn leave(&mut self, id: PlayerId) -> Vec<Outbound> {
        registry::leave(self, id)
    }

    /// Apply one command from a seated participant.
    pub fn apply<R: GameRng>(
        &mut self,
        caller: PlayerId,
        command: Command,
        rng: &mut R,
    ) -> Result<Vec<Outbound>, SessionError> {
        if self.player(caller).is_none() {
            return Err(SessionError::UnknownPlayer);
        }
        match command {
            Command::RegisterProfile {
                name,
                color,
                avatar,
            } => registry::register_profile(self, caller, name, color, avatar),
            Command::SetMaxRounds { value } => registry::set_max_rounds(self, caller, value),
            Command::StartGame => turn::start_game(self, caller, rng),
            Command::RollDice => dice::roll_dice(self, caller, rng),
            Command::ChooseBetValue { value } => dice::choose_bet_value(self, caller, value),
        }
    }

    /// Complete a `RoundSettling` phase: advance to the next round.
    ///
    /// Called by the transport when the scheduled settlement delay elapses.
    /// A stale call (the session was force-reset meanwhile) is a no-op.
    pub fn finish_settlement(&mut self) -> Vec<Outbound> {
        turn::finish_settlement(self)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// The lowest-seated participant, who controls configuration and start
    pub fn host(&self) -> Option<&Player> {
        self.players.first()
    }

    pub fn started(&self) -> bool {
        self.phase != Phase::WaitingForPlayers
    }

    pub(crate) fn player_views(&self) -> Vec<PlayerView> {
        self.players.iter().map(Player::view).collect()
    }

    pub(crate) fn player_list(&self) -> Notification {
        Notification::PlayerList {
            players: self.player_views(),
        }
    }

    pub(crate) fn game_state(&self) -> Notification {
        Notification::GameState {
            round: self.round,
            casinos: self
                .casinos
                .iter()
                .enumerate()
                .map(|(i, c)| CasinoStateView {
                    index: (i + 1) as u8,
                    dice_by_player: c.dice_by_player.clone(),
                    neutral_count: c.neutral_count,
                })
                .collect(),
            players: self.player_views(),
            current_turn_id: self.current_turn,
            max_rounds: self.max_rounds,
        }
    }

    /// Discard all round state and return to the lobby. Balances survive
    /// until the next game start zeroes them.
    pub(crate) fn reset_to_lobby(&mut self) {
        self.phase = Phase::WaitingForPlayers;
        self.round = 0;
        self.current_turn = None;
        self.deck.clear();
        self.casinos.clear();
        for p in &mut self.players {
            p.color_dice_left = 0;
            p.neutral_dice_left = 0;
            p.pending_roll = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SeededRng;

    #[test]
    fn test_new_session_is_empty_lobby() {
        let session = Session::new(SessionConfig::default());
        assert_eq!(session.phase, Phase::WaitingForPlayers);
        assert_eq!(session.max_rounds, DEFAULT_MAX_ROUNDS);
        assert!(session.players.is_empty());
        assert!(session.deck.is_empty());
        assert!(session.casinos.is_empty());
        assert!(session.current_turn.is_none());
    }

    #[test]
    fn test_apply_from_unseated_caller_is_rejected() {
        let mut session = Session::new(SessionConfig::default());
        let mut rng = SeededRng::from_seed(0);
        let result = session.apply(PlayerId::new(), Command::RollDice, &mut rng);
        assert!(matches!(result, Err(SessionError::UnknownPlayer)));
    }

    #[test]
    fn test_unknown_player_rejection_has_no_frame() {
        assert!(SessionError::UnknownPlayer.rejection().is_none());
        assert!(SessionError::RoomFull.rejection().is_some());
        assert_eq!(
            SessionError::NotYourTurn.rejection(),
            Some(Notification::NotYourTurn)
        );
    }
}
