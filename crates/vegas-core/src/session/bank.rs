//! Banknote deck and casino slots.

use std::collections::HashMap;

use tracing::debug;

use super::Session;
use crate::protocol::{CasinoSetupView, Notification, PlayerId};
use crate::rng::GameRng;

/// The nine banknote denominations
pub const BANKNOTE_VALUES: [u64; 9] = [
    10_000, 20_000, 30_000, 40_000, 50_000, 60_000, 70_000, 80_000, 90_000,
];

/// Copies of each denomination in a fresh deck
pub const COPIES_PER_VALUE: usize = 6;

/// Betting slots per round
pub const CASINO_COUNT: usize = 6;

/// A slot keeps drawing notes until its sum reaches this
pub const SLOT_FILL_THRESHOLD: u64 = 50_000;

/// One numbered betting slot
#[derive(Clone, Debug, Default)]
pub struct Casino {
    /// Notes dealt at round setup; only payout removes them
    pub banknotes: Vec<u64>,
    /// Color dice committed per player; counts only grow within a round
    pub dice_by_player: HashMap<PlayerId, u32>,
    pub neutral_count: u32,
}

impl Casino {
    pub fn banknote_sum(&self) -> u64 {
        self.banknotes.iter().sum()
    }
}

/// Build the full 54-note deck and shuffle it uniformly.
/// Done once per game; rounds consume the same deck without replacement.
pub fn build_deck<R: GameRng>(rng: &mut R) -> Vec<u64> {
    let mut deck = Vec::with_capacity(BANKNOTE_VALUES.len() * COPIES_PER_VALUE);
    for &value in &BANKNOTE_VALUES {
        for _ in 0..COPIES_PER_VALUE {
            deck.push(value);
        }
    }
    rng.shuffle(&mut deck);
    deck
}

/// Deal the six casinos from the top of the deck, in index order.
///
/// Slot 1 fills completely before slot 2 sees a note; when the deck runs
/// low the high-indexed slots are the ones starved. Deterministic given the
/// deck order.
pub fn deal_casinos(deck: &mut Vec<u64>) -> Vec<Casino> {
    (0..CASINO_COUNT)
        .map(|_| {
            let mut notes = Vec::new();
            let mut sum = 0u64;
            while sum < SLOT_FILL_THRESHOLD {
                match deck.pop() {
                    Some(note) => {
                        sum += note;
                        notes.push(note);
                    }
                    None => break,
                }
            }
            Casino {
                banknotes: notes,
                ..Casino::default()
            }
        })
        .collect()
}

/// Start a round: fresh dice pools for everyone, casinos dealt from the
/// remaining deck. Returns the setup broadcast.
pub(crate) fn setup_round(session: &mut Session) -> Notification {
    for p in &mut session.players {
        p.reset_for_round();
    }
    session.casinos = deal_casinos(&mut session.deck);
    debug!(
        round = session.round,
        deck_left = session.deck.len(),
        "casinos dealt"
    );
    Notification::RoundSetup {
        round: session.round,
        casinos: session
            .casinos
            .iter()
            .enumerate()
            .map(|(i, c)| CasinoSetupView {
                index: (i + 1) as u8,
                banknotes: c.banknotes.clone(),
            })
            .collect(),
        max_rounds: session.max_rounds,
    }
}
