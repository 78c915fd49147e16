//! Outbound notifications.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::types::{
    CasinoSetupView, CasinoStateView, PayoutView, PlayerId, PlayerView, RolledDie,
};

/// Everything the session can tell its participants.
///
/// Each variant is a pure function of a state transition; the transport only
/// serializes and delivers them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notification {
    /// Handshake: the connection is seated, waiting for a profile
    #[serde(rename_all = "camelCase")]
    AwaitProfile { suggested_name: String },

    /// Acknowledges a registered profile back to its owner
    #[serde(rename_all = "camelCase")]
    PlayerInfo {
        id: PlayerId,
        name: String,
        avatar: Option<String>,
        index: u8,
        money: u64,
    },

    /// Current roster in seat order
    PlayerList { players: Vec<PlayerView> },

    /// Enough players are seated; the host may start
    #[serde(rename_all = "camelCase")]
    ReadyToStart { host_id: PlayerId, max_rounds: u8 },

    #[serde(rename_all = "camelCase")]
    ConfigUpdated { max_rounds: u8 },

    #[serde(rename_all = "camelCase")]
    GameStarted { round: u8, max_rounds: u8 },

    /// Banknotes dealt into the six casinos for a new round
    #[serde(rename_all = "camelCase")]
    RoundSetup {
        round: u8,
        casinos: Vec<CasinoSetupView>,
        max_rounds: u8,
    },

    #[serde(rename_all = "camelCase")]
    TurnChanged {
        current_player_id: PlayerId,
        current_player_name: String,
    },

    /// Full snapshot: committed dice, roster, whose turn it is
    #[serde(rename_all = "camelCase")]
    GameState {
        round: u8,
        casinos: Vec<CasinoStateView>,
        players: Vec<PlayerView>,
        current_turn_id: Option<PlayerId>,
        max_rounds: u8,
    },

    #[serde(rename_all = "camelCase")]
    DiceRolled {
        roller_id: PlayerId,
        roller_name: String,
        dice: Vec<RolledDie>,
    },

    #[serde(rename_all = "camelCase")]
    BetPlaced {
        player_id: PlayerId,
        player_name: String,
        casino_index: u8,
        color_count: u32,
        neutral_count: u32,
    },

    /// One batch per settled casino slot
    Payouts { payouts: Vec<PayoutView> },

    #[serde(rename_all = "camelCase")]
    GameOver {
        players: Vec<PlayerView>,
        winner_id: Option<PlayerId>,
        winner_name: Option<String>,
        max_rounds: u8,
    },

    // Rejections, delivered only to the offending caller.
    RoomFull,
    NotYourTurn,
    #[serde(rename_all = "camelCase")]
    RollRejected { reason: String },
    NoDiceLeft,
    #[serde(rename_all = "camelCase")]
    CommandRejected { reason: String },
}

/// A notification with routing attached, or a deferred effect the transport
/// must run on the session's behalf.
#[derive(Clone, Debug, PartialEq)]
pub enum Outbound {
    /// Deliver to every connected participant
    Broadcast(Notification),
    /// Deliver only to the participant whose command produced it
    ToCaller(Notification),
    /// Call `Session::finish_settlement` after the delay; lets payout
    /// presentation finish before the next round's state overwrites it
    ScheduleNextRound(Duration),
}
