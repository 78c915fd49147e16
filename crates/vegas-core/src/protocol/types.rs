//! Protocol types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique participant identifier.
///
/// Owned by the transport layer (one per connection); the core treats it as
/// an opaque token.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// Create a new random player ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl fmt::Debug for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerId({})", self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Player color, unique per session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    Red,
    Green,
    Blue,
    Yellow,
}

impl PlayerColor {
    /// Assignment order when the requested color is taken or unspecified
    pub const PALETTE: [PlayerColor; 4] = [
        PlayerColor::Red,
        PlayerColor::Green,
        PlayerColor::Blue,
        PlayerColor::Yellow,
    ];
}

/// Whether a die is bound to its roller's color or is neutral
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DieKind {
    Color,
    Neutral,
}

/// One die from a pending roll
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolledDie {
    pub value: u8,
    #[serde(rename = "type")]
    pub kind: DieKind,
}

/// Public per-player snapshot included in broadcasts
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub color: Option<PlayerColor>,
    pub index: u8,
    pub money: u64,
    pub dice_color_left: u8,
    pub dice_neutral_left: u8,
}

/// Casino slot contents at round setup time
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasinoSetupView {
    pub index: u8,
    pub banknotes: Vec<u64>,
}

/// Committed dice per casino slot, as broadcast in state snapshots
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasinoStateView {
    pub index: u8,
    pub dice_by_player: HashMap<PlayerId, u32>,
    pub neutral_count: u32,
}

/// One settled payout: a banknote leaving a slot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutView {
    pub casino_index: u8,
    pub player_name: String,
    pub amount: u64,
}
