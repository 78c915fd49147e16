//! Random source abstraction.
//!
//! Deck shuffles and dice rolls are the only nondeterminism in the session
//! state machine. Putting them behind a trait lets the server use the system
//! RNG while tests inject a seeded source and assert exact outcomes.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Source of randomness for the game engine
pub trait GameRng: Send {
    /// Uniformly shuffle a slice in place (Fisher-Yates)
    fn shuffle<T>(&mut self, slice: &mut [T]);

    /// One uniform die face in 1..=6
    fn die_face(&mut self) -> u8;
}

/// Thread-RNG backed source used by the server
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRng;

impl GameRng for SystemRng {
    fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut rand::thread_rng());
    }

    fn die_face(&mut self) -> u8 {
        rand::thread_rng().gen_range(1..=6)
    }
}

/// Deterministic source for tests and replay.
/// The same seed reproduces the same shuffles and rolls.
#[derive(Clone, Debug)]
pub struct SeededRng {
    inner: StdRng,
}

impl SeededRng {
    /// Create from a 64-bit seed
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }
}

impl GameRng for SeededRng {
    fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut self.inner);
    }

    fn die_face(&mut self) -> u8 {
        self.inner.gen_range(1..=6)
    }
}
