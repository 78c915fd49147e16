//! Vegas Core Library
//!
//! This crate provides the authoritative state machine for the Vegas dice
//! betting game: one live session of 2-4 players, a shuffled banknote deck
//! dealt into six casino slots, turn sequencing, dice-roll and bet
//! resolution, and the round-end payout algorithm.
//!
//! The core is transport-agnostic: commands come in as typed values, state
//! changes go out as typed notifications with routing attached. All
//! randomness flows through the [`rng::GameRng`] seam so tests can replay
//! exact games.

pub mod protocol;
pub mod rng;
pub mod session;

pub use protocol::{
    Command, DieKind, Notification, Outbound, PlayerColor, PlayerId, RolledDie,
};
pub use rng::{GameRng, SeededRng, SystemRng};
pub use session::{Phase, Session, SessionConfig, SessionError};
