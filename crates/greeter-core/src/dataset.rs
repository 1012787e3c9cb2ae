//! Dataset loading and the readiness barrier.
//!
//! The greeter needs four datasets (accounts, languages, layouts, sessions)
//! before it is ready. They are fetched independently and may complete in any
//! order, possibly from different tasks. [`DatasetLoader`] tracks a
//! [`LoadStatus`] per dataset and hands out the assembled [`Datasets`] exactly
//! once, to whichever completion makes all four `Loaded`.
//!
//! # Invariants
//!
//! - The barrier fires at most once per loader, regardless of completion
//!   order or duplicate completion signals
//! - The barrier fires only when all four datasets are `Loaded`
//! - A `Failed` dataset stays failed; the loader never becomes ready
//! - Status transitions: `NotRequested -> InFlight -> Loaded | Failed`

use std::{
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};

use serde::de::DeserializeOwned;

use crate::{
    error::GreeterError,
    types::{Account, LocaleOption, SessionOption},
};

/// One of the four datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dataset {
    /// `users.json`
    Accounts,
    /// `languages.json`
    Languages,
    /// `layouts.json`
    Layouts,
    /// `sessions.json`
    Sessions,
}

impl Dataset {
    /// All datasets, in request order.
    pub const ALL: [Self; 4] = [Self::Accounts, Self::Languages, Self::Layouts, Self::Sessions];

    /// File name relative to the dataset directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Accounts => "users.json",
            Self::Languages => "languages.json",
            Self::Layouts => "layouts.json",
            Self::Sessions => "sessions.json",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Accounts => 0,
            Self::Languages => 1,
            Self::Layouts => 2,
            Self::Sessions => 3,
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Response to a dataset fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// A `200` response.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self { status: 200, body: body.into() }
    }

    /// A bodiless response with the given status.
    pub fn status(status: u16) -> Self {
        Self { status, body: Vec::new() }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outcome of a fetch: a response, or a transport failure description.
pub type FetchResult = Result<FetchResponse, String>;

/// Parsed contents of one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetPayload {
    /// Accounts
    Accounts(Vec<Account>),
    /// Languages
    Languages(Vec<LocaleOption>),
    /// Keyboard layouts
    Layouts(Vec<LocaleOption>),
    /// Sessions
    Sessions(Vec<SessionOption>),
}

impl DatasetPayload {
    /// Parse a JSON array body for `dataset`.
    pub fn parse(dataset: Dataset, body: &[u8]) -> Result<Self, String> {
        fn array<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, String> {
            serde_json::from_slice(body).map_err(|e| format!("malformed JSON: {e}"))
        }

        Ok(match dataset {
            Dataset::Accounts => Self::Accounts(array(body)?),
            Dataset::Languages => Self::Languages(array(body)?),
            Dataset::Layouts => Self::Layouts(array(body)?),
            Dataset::Sessions => Self::Sessions(array(body)?),
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        match self {
            Self::Accounts(v) => v.len(),
            Self::Languages(v) | Self::Layouts(v) => v.len(),
            Self::Sessions(v) => v.len(),
        }
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Load state of one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Never requested.
    NotRequested,
    /// Fetch started, no completion yet.
    InFlight,
    /// Fetched and parsed.
    Loaded(DatasetPayload),
    /// Fetch or parse failed. Permanent for this loader.
    Failed(String),
}

impl LoadStatus {
    /// Whether the dataset is loaded.
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// All four datasets, handed to the greeter when the barrier fires.
///
/// Only [`DatasetLoader::complete`] builds one, so holding a `Datasets` means
/// the barrier fired for its generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datasets {
    pub(crate) generation: u64,
    pub(crate) accounts: Vec<Account>,
    pub(crate) languages: Vec<LocaleOption>,
    pub(crate) layouts: Vec<LocaleOption>,
    pub(crate) sessions: Vec<SessionOption>,
}

impl Datasets {
    /// Generation of the loader that produced this.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Accounts
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Languages
    pub fn languages(&self) -> &[LocaleOption] {
        &self.languages
    }

    /// Keyboard layouts
    pub fn layouts(&self) -> &[LocaleOption] {
        &self.layouts
    }

    /// Sessions
    pub fn sessions(&self) -> &[SessionOption] {
        &self.sessions
    }
}

#[derive(Debug)]
struct LoaderState {
    statuses: [LoadStatus; 4],
    already_fired: bool,
}

/// Tracks the four fetches and guards the readiness barrier.
///
/// Shared between fetch tasks (`Arc<DatasetLoader>`); all methods take
/// `&self`. The status update and the barrier test-and-set happen under the
/// same lock, so two completions racing to finish the set cannot both fire.
#[derive(Debug)]
pub struct DatasetLoader {
    generation: u64,
    state: Mutex<LoaderState>,
}

impl DatasetLoader {
    /// Create a loader with every dataset `NotRequested`.
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            state: Mutex::new(LoaderState {
                statuses: [
                    LoadStatus::NotRequested,
                    LoadStatus::NotRequested,
                    LoadStatus::NotRequested,
                    LoadStatus::NotRequested,
                ],
                already_fired: false,
            }),
        }
    }

    /// Greeter generation this loader belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Mark `dataset` as in flight.
    ///
    /// Returns `false` (and changes nothing) unless the dataset was
    /// `NotRequested`.
    pub fn request(&self, dataset: Dataset) -> bool {
        let mut state = self.lock();
        let status = &mut state.statuses[dataset.index()];

        if *status != LoadStatus::NotRequested {
            tracing::debug!(%dataset, "dataset already requested");
            return false;
        }

        *status = LoadStatus::InFlight;
        tracing::debug!(%dataset, generation = self.generation, "dataset requested");
        true
    }

    /// Record the completion of a fetch.
    ///
    /// Returns `Ok(Some(datasets))` to exactly one caller: the completion
    /// that made all four datasets `Loaded`. Completions for datasets that are
    /// not in flight are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GreeterError::DatasetLoad`] when the response is not 2xx or
    /// the body is not a JSON array of the expected shape. The dataset is
    /// marked `Failed` and the barrier will never fire.
    pub fn complete(
        &self,
        dataset: Dataset,
        response: FetchResult,
    ) -> Result<Option<Datasets>, GreeterError> {
        let outcome = response.and_then(|response| {
            if response.is_success() {
                DatasetPayload::parse(dataset, &response.body)
            } else {
                Err(format!("status {}", response.status))
            }
        });

        let mut state = self.lock();
        let index = dataset.index();

        if state.statuses[index] != LoadStatus::InFlight {
            tracing::debug!(%dataset, "ignoring completion for dataset not in flight");
            return Ok(None);
        }

        match outcome {
            Ok(payload) => {
                tracing::debug!(%dataset, entries = payload.len(), "dataset loaded");
                state.statuses[index] = LoadStatus::Loaded(payload);
            },
            Err(reason) => {
                tracing::error!(%dataset, %reason, "{dataset} did not load correctly");
                state.statuses[index] = LoadStatus::Failed(reason.clone());
                return Err(GreeterError::DatasetLoad { dataset, reason });
            },
        }

        if state.already_fired {
            return Ok(None);
        }

        let Some(datasets) = self.assemble(&state.statuses) else {
            return Ok(None);
        };

        state.already_fired = true;
        tracing::info!(generation = self.generation, "all datasets loaded");
        Ok(Some(datasets))
    }

    /// Current status of `dataset`.
    pub fn status(&self, dataset: Dataset) -> LoadStatus {
        self.lock().statuses[dataset.index()].clone()
    }

    /// Whether all four datasets are loaded.
    pub fn is_ready(&self) -> bool {
        self.lock().statuses.iter().all(LoadStatus::is_loaded)
    }

    /// Whether the barrier has fired.
    pub fn has_fired(&self) -> bool {
        self.lock().already_fired
    }

    fn assemble(&self, statuses: &[LoadStatus; 4]) -> Option<Datasets> {
        match statuses {
            [
                LoadStatus::Loaded(DatasetPayload::Accounts(accounts)),
                LoadStatus::Loaded(DatasetPayload::Languages(languages)),
                LoadStatus::Loaded(DatasetPayload::Layouts(layouts)),
                LoadStatus::Loaded(DatasetPayload::Sessions(sessions)),
            ] => Some(Datasets {
                generation: self.generation,
                accounts: accounts.clone(),
                languages: languages.clone(),
                layouts: layouts.clone(),
                sessions: sessions.clone(),
            }),
            _ => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LoaderState> {
        // State is only mutated in single assignments, so it stays consistent
        // even if a holder panicked.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    fn body(dataset: Dataset) -> FetchResponse {
        FetchResponse::ok(match dataset {
            Dataset::Accounts => r#"[{"username":"alice","display_name":"Alice"}]"#,
            Dataset::Languages => r#"[{"code":"en_US","name":"English"}]"#,
            Dataset::Layouts => r#"[{"code":"us","name":"English (US)"}]"#,
            Dataset::Sessions => r#"[{"key":"gnome","name":"GNOME"}]"#,
        })
    }

    fn requested_loader() -> DatasetLoader {
        let loader = DatasetLoader::new(0);
        for dataset in Dataset::ALL {
            assert!(loader.request(dataset));
        }
        loader
    }

    #[test]
    fn request_transitions_once() {
        let loader = DatasetLoader::new(0);
        assert_eq!(loader.status(Dataset::Layouts), LoadStatus::NotRequested);

        assert!(loader.request(Dataset::Layouts));
        assert!(!loader.request(Dataset::Layouts));
        assert_eq!(loader.status(Dataset::Layouts), LoadStatus::InFlight);
    }

    #[test]
    fn fires_after_last_completion_only() {
        let loader = requested_loader();

        for dataset in [Dataset::Sessions, Dataset::Accounts, Dataset::Layouts] {
            assert_eq!(loader.complete(dataset, Ok(body(dataset))).unwrap(), None);
            assert!(!loader.has_fired());
        }

        let datasets = loader.complete(Dataset::Languages, Ok(body(Dataset::Languages))).unwrap();
        let datasets = datasets.unwrap();

        assert_eq!(datasets.accounts[0].username, "alice");
        assert_eq!(datasets.sessions[0].key, "gnome");
        assert!(loader.has_fired());
        assert!(loader.is_ready());
    }

    #[test]
    fn duplicate_completion_does_not_refire() {
        let loader = requested_loader();
        for dataset in Dataset::ALL {
            loader.complete(dataset, Ok(body(dataset))).unwrap();
        }

        for dataset in Dataset::ALL {
            assert_eq!(loader.complete(dataset, Ok(body(dataset))).unwrap(), None);
        }
    }

    #[test]
    fn completion_without_request_is_ignored() {
        let loader = DatasetLoader::new(0);
        let result = loader.complete(Dataset::Accounts, Ok(body(Dataset::Accounts)));

        assert_eq!(result, Ok(None));
        assert_eq!(loader.status(Dataset::Accounts), LoadStatus::NotRequested);
    }

    #[test]
    fn non_success_status_fails_dataset() {
        let loader = requested_loader();
        let result = loader.complete(Dataset::Layouts, Ok(FetchResponse::status(404)));

        assert_eq!(
            result,
            Err(GreeterError::DatasetLoad {
                dataset: Dataset::Layouts,
                reason: "status 404".to_string(),
            })
        );
        assert_eq!(loader.status(Dataset::Layouts), LoadStatus::Failed("status 404".to_string()));
    }

    #[test]
    fn failed_dataset_stalls_barrier() {
        let loader = requested_loader();
        let err = loader.complete(Dataset::Sessions, Ok(FetchResponse::ok("{not json")));
        assert!(matches!(err, Err(GreeterError::DatasetLoad { dataset: Dataset::Sessions, .. })));

        for dataset in [Dataset::Accounts, Dataset::Languages, Dataset::Layouts] {
            assert_eq!(loader.complete(dataset, Ok(body(dataset))).unwrap(), None);
        }

        // A late success does not revive a failed dataset.
        let late = loader.complete(Dataset::Sessions, Ok(body(Dataset::Sessions)));
        assert_eq!(late, Ok(None));
        assert!(!loader.is_ready());
        assert!(!loader.has_fired());
        assert!(loader.status(Dataset::Accounts).is_loaded());
    }

    #[test]
    fn transport_error_fails_dataset() {
        let loader = requested_loader();
        let result = loader.complete(Dataset::Accounts, Err("connection refused".to_string()));
        assert!(matches!(result, Err(GreeterError::DatasetLoad { .. })));
    }

    #[test]
    fn wrong_shape_is_a_parse_failure() {
        let loader = requested_loader();
        let result =
            loader.complete(Dataset::Sessions, Ok(FetchResponse::ok(r#"[{"name":"GNOME"}]"#)));
        assert!(matches!(result, Err(GreeterError::DatasetLoad { .. })));
    }

    #[test]
    fn concurrent_completions_fire_once() {
        for _ in 0..64 {
            let loader = Arc::new(requested_loader());

            let handles: Vec<_> = Dataset::ALL
                .into_iter()
                .flat_map(|dataset| [dataset, dataset])
                .map(|dataset| {
                    let loader = Arc::clone(&loader);
                    thread::spawn(move || loader.complete(dataset, Ok(body(dataset))).unwrap())
                })
                .collect();

            let fired =
                handles.into_iter().map(|h| h.join().unwrap()).filter(Option::is_some).count();

            assert_eq!(fired, 1);
        }
    }
}
