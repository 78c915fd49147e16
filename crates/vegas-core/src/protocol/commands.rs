//! Inbound commands.

use serde::{Deserialize, Serialize};

use super::types::PlayerColor;

/// A discrete action submitted by a connected participant.
///
/// Join and leave are connection-level events handled by the transport, not
/// commands; everything a client can ask for mid-session is listed here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    /// Set display name, color and optional avatar for this connection
    #[serde(rename_all = "camelCase")]
    RegisterProfile {
        name: String,
        color: Option<PlayerColor>,
        avatar: Option<String>,
    },

    /// Host only, before the game starts: number of rounds to play (1..=4)
    #[serde(rename_all = "camelCase")]
    SetMaxRounds { value: u8 },

    /// Host only: begin the game once at least two players are seated
    StartGame,

    /// Roll every remaining die; valid once per turn
    RollDice,

    /// Commit all pending dice showing `value` to casino `value`
    #[serde(rename_all = "camelCase")]
    ChooseBetValue { value: u8 },
}
