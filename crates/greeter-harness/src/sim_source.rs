//! Simulated dataset source.
//!
//! Serves fixture bodies after a per-fetch latency drawn from a seeded
//! [`SimEnv`], so completion order varies with the seed but is reproducible.
//! Individual datasets can be made to fail.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use greeter_core::{Dataset, Environment, FetchResponse, FetchResult};
use greeter_runtime::DatasetSource;

use crate::SimEnv;

/// Fixture accounts: `alice`, `bob`, `carol`.
pub const USERS_JSON: &str = r#"[
    {"username":"alice","display_name":"Alice Liddell"},
    {"username":"bob","display_name":"Bob Builder"},
    {"username":"carol","display_name":"Carol Danvers"}
]"#;

/// Fixture languages.
pub const LANGUAGES_JSON: &str =
    r#"[{"code":"en_US.utf8","name":"English"},{"code":"fr_FR.utf8","name":"Français"}]"#;

/// Fixture keyboard layouts.
pub const LAYOUTS_JSON: &str = r#"[{"code":"us","name":"English (US)"},{"code":"fr","name":"French"}]"#;

/// Fixture sessions: `gnome`, `xfce`.
pub const SESSIONS_JSON: &str = r#"[
    {"key":"gnome","name":"GNOME","comment":"GNOME desktop"},
    {"key":"xfce","name":"Xfce"}
]"#;

/// Fixture body for `dataset`.
pub fn fixture(dataset: Dataset) -> &'static str {
    match dataset {
        Dataset::Accounts => USERS_JSON,
        Dataset::Languages => LANGUAGES_JSON,
        Dataset::Layouts => LAYOUTS_JSON,
        Dataset::Sessions => SESSIONS_JSON,
    }
}

/// Dataset source with seeded latency and injectable failures.
///
/// Clones share the fetch counter.
#[derive(Clone)]
pub struct SimSource {
    env: SimEnv,
    max_latency: Duration,
    failures: HashMap<Dataset, FetchResult>,
    fetches: Arc<AtomicUsize>,
}

impl SimSource {
    /// Serve the fixtures with latency up to `max_latency`.
    pub fn new(env: SimEnv, max_latency: Duration) -> Self {
        Self { env, max_latency, failures: HashMap::new(), fetches: Arc::new(AtomicUsize::new(0)) }
    }

    /// Answer `dataset` with `response` instead of its fixture.
    #[must_use]
    pub fn failing(mut self, dataset: Dataset, response: FetchResult) -> Self {
        self.failures.insert(dataset, response);
        self
    }

    /// Number of fetches started so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn latency(&self) -> Duration {
        let max = u64::try_from(self.max_latency.as_millis()).unwrap_or(u64::MAX);
        if max == 0 {
            return Duration::ZERO;
        }
        let raw = self.env.random_u64();
        Duration::from_millis(max.checked_add(1).map_or(raw, |bound| raw % bound))
    }
}

#[async_trait]
impl DatasetSource for SimSource {
    async fn fetch(&self, dataset: Dataset) -> FetchResult {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency();
        self.env.sleep(latency).await;

        match self.failures.get(&dataset) {
            Some(response) => response.clone(),
            None => Ok(FetchResponse::ok(fixture(dataset))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_stays_within_bound() {
        let source = SimSource::new(SimEnv::with_seed(9), Duration::from_millis(250));
        for _ in 0..100 {
            assert!(source.latency() <= Duration::from_millis(250));
        }
    }

    #[test]
    fn unbounded_latency_does_not_overflow() {
        let source = SimSource::new(SimEnv::with_seed(9), Duration::MAX);
        for _ in 0..100 {
            assert!(source.latency() <= Duration::from_millis(u64::MAX));
        }
        let none = SimSource::new(SimEnv::with_seed(9), Duration::ZERO);
        assert_eq!(none.latency(), Duration::ZERO);
    }
}
