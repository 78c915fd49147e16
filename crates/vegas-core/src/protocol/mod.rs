//! Typed wire surface: commands in, notifications out.

mod commands;
mod notifications;
mod types;

pub use commands::Command;
pub use notifications::{Notification, Outbound};
pub use types::{
    CasinoSetupView, CasinoStateView, DieKind, PayoutView, PlayerColor, PlayerId, PlayerView,
    RolledDie,
};
