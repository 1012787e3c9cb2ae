//! Where dataset bodies come from.
//!
//! The driver only needs "give me the bytes of `users.json`", so sources are
//! a small async trait. [`DirectorySource`] reads the files a theme ships in
//! `<base>/json/`; [`MemorySource`] serves canned responses, optionally
//! delayed, for tests.

use std::{collections::HashMap, io, path::PathBuf, time::Duration};

use async_trait::async_trait;
use greeter_core::{Dataset, FetchResponse, FetchResult};

/// Produces the raw response for a dataset.
///
/// `Ok` carries any response (including non-2xx); `Err` is a transport
/// failure.
#[async_trait]
pub trait DatasetSource: Send + Sync + 'static {
    /// Fetch `dataset`.
    async fn fetch(&self, dataset: Dataset) -> FetchResult;
}

/// Reads `<base>/json/<dataset file>` from disk.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    base: PathBuf,
}

impl DirectorySource {
    /// Serve datasets from `base/json/`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Path a dataset is read from.
    pub fn path(&self, dataset: Dataset) -> PathBuf {
        self.base.join("json").join(dataset.file_name())
    }
}

#[async_trait]
impl DatasetSource for DirectorySource {
    async fn fetch(&self, dataset: Dataset) -> FetchResult {
        let path = self.path(dataset);
        tracing::debug!(path = %path.display(), "reading dataset");

        match tokio::fs::read(&path).await {
            Ok(body) => Ok(FetchResponse::ok(body)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(FetchResponse::status(404)),
            Err(e) => Err(format!("{}: {e}", path.display())),
        }
    }
}

/// In-memory responses, for tests and embedding.
///
/// Datasets without a response answer `404`.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    responses: HashMap<Dataset, FetchResult>,
    delays: HashMap<Dataset, Duration>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `dataset` with a `200` and `body`.
    #[must_use]
    pub fn with_body(mut self, dataset: Dataset, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(dataset, Ok(FetchResponse::ok(body)));
        self
    }

    /// Answer `dataset` with `response`.
    #[must_use]
    pub fn with_response(mut self, dataset: Dataset, response: FetchResult) -> Self {
        self.responses.insert(dataset, response);
        self
    }

    /// Hold the answer for `dataset` back by `delay`.
    #[must_use]
    pub fn with_delay(mut self, dataset: Dataset, delay: Duration) -> Self {
        self.delays.insert(dataset, delay);
        self
    }
}

#[async_trait]
impl DatasetSource for MemorySource {
    async fn fetch(&self, dataset: Dataset) -> FetchResult {
        if let Some(delay) = self.delays.get(&dataset) {
            tokio::time::sleep(*delay).await;
        }

        self.responses.get(&dataset).cloned().unwrap_or_else(|| Ok(FetchResponse::status(404)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn directory_source_reads_json_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("json")).unwrap();
        std::fs::write(dir.path().join("json/users.json"), br#"[{"username":"alice"}]"#).unwrap();

        let source = DirectorySource::new(dir.path());

        let response = source.fetch(Dataset::Accounts).await.unwrap();
        assert!(response.is_success());
        assert_eq!(response.body, br#"[{"username":"alice"}]"#);

        let missing = source.fetch(Dataset::Sessions).await.unwrap();
        assert_eq!(missing.status, 404);
    }

    #[tokio::test]
    async fn memory_source_defaults_to_not_found() {
        let source = MemorySource::new()
            .with_body(Dataset::Layouts, "[]")
            .with_response(Dataset::Languages, Err("reset".to_string()));

        assert!(source.fetch(Dataset::Layouts).await.unwrap().is_success());
        assert_eq!(source.fetch(Dataset::Languages).await, Err("reset".to_string()));
        assert_eq!(source.fetch(Dataset::Accounts).await.unwrap().status, 404);
    }
}
