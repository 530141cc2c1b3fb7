use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// Configuration for the wait-for-file middleware.
///
/// Built once per mount point and immutable afterwards. The root is
/// canonicalized when the layer is constructed, so every candidate path the
/// resolver produces is checked against the real on-disk location.
#[derive(Clone, Debug)]
pub struct WaitConfig {
    /// Directory requests are resolved against. Must exist at mount time.
    pub root: PathBuf,
    /// Index file names tried, in priority order, for directory-style
    /// requests (default: `index.html`).
    pub index: Vec<String>,
    /// Upper bound on how long a single request may wait (default: 60 s).
    pub max_wait: Duration,
    /// Honor `If-None-Match`: an existing file whose current token still
    /// matches the request's token counts as "not ready yet" (default: off).
    pub etag: bool,
}

impl WaitConfig {
    /// Create a configuration for `root` with default settings.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index: vec!["index.html".to_string()],
            max_wait: Duration::from_secs(60),
            etag: false,
        }
    }

    /// Replace the index-file candidates tried for directory requests.
    pub fn with_index<I, N>(mut self, index: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.index = index.into_iter().map(Into::into).collect();
        self
    }

    /// Cap the per-request wait duration.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Enable `If-None-Match` freshness checking.
    pub fn with_etag(mut self) -> Self {
        self.etag = true;
        self
    }

    /// Validate the configuration and pin the root to its canonical path.
    pub(crate) fn finalize(mut self) -> Result<Self, Error> {
        if self.index.is_empty() {
            return Err(Error::NoIndexNames);
        }
        self.root = std::fs::canonicalize(&self.root).map_err(|source| Error::InvalidRoot {
            path: self.root.clone(),
            source,
        })?;
        Ok(self)
    }

    /// Maximum wait in whole milliseconds, saturating on overflow.
    pub(crate) fn max_wait_ms(&self) -> i64 {
        i64::try_from(self.max_wait.as_millis()).unwrap_or(i64::MAX)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
