//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples the greeter state machine from system
//! resources (time, randomness). The simulated per-account login state and
//! the autologin timer are the only places the greeter touches either, so
//! swapping the environment is enough to make a whole theme session
//! reproducible.
//!
//! # Invariants
//!
//! - Monotonicity: `env.now()` must never go backwards
//! - Determinism: Given the same seed, `random_bytes()` produces the same
//!   sequence
//! - Isolation: Implementations must not share global state

use std::time::{Duration, Instant};

/// Abstract environment providing time, randomness, and async primitives.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// 1. Time monotonicity: `now()` never goes backwards
/// 2. Minimal panics: Methods are infallible except in exceptional
///    circumstances (e.g., OS entropy exhaustion, incorrect simulation setup)
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the current time.
    fn now(&self) -> Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait, and it should only be used
    /// by driver code (the autologin timer), never by the state machine.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    ///
    /// Simulation implementations MUST be seeded so that the simulated
    /// login state of every account is reproducible.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Generates a uniformly random boolean.
    fn random_bool(&self) -> bool {
        self.random_u64() & 1 == 1
    }

    /// Picks a random index in `0..len`.
    ///
    /// Returns `None` for an empty range.
    fn random_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }

        #[allow(clippy::cast_possible_truncation)]
        let index = (self.random_u64() % len as u64) as usize;
        Some(index)
    }
}
