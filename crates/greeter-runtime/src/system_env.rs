//! Wall-clock environment for interactive use.
//!
//! `SystemEnv` backs the `greeter-mock` binary: real delays for the autologin
//! timer and OS randomness for the simulated login state of each account.

use std::time::{Duration, Instant};

use greeter_core::Environment;

/// Wall clock, tokio timers and `getrandom`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        if let Err(error) = getrandom::fill(buffer) {
            // Zeros read as "nobody logged in, first session for everyone".
            tracing::error!(%error, "OS randomness unavailable, using zeros");
            buffer.fill(0);
        }
    }
}
