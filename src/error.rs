use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while mounting the middleware or arming a directory watch.
///
/// None of these ever reach an HTTP client: mount-time variants are returned
/// from the layer constructors, and [`Error::Watch`] is consumed internally by
/// the coordinator, which treats a failed subscription as "stop waiting".
#[derive(Debug, Error)]
pub enum Error {
    /// The configured root could not be canonicalized at mount time.
    #[error("invalid root directory {}: {source}", path.display())]
    InvalidRoot {
        /// The root path as supplied by the caller.
        path: PathBuf,
        /// Underlying filesystem error.
        source: io::Error,
    },

    /// The configuration carried an empty index-file list.
    #[error("at least one index file name is required")]
    NoIndexNames,

    /// A directory-change subscription could not be established.
    #[error("failed to watch {}: {source}", dir.display())]
    Watch {
        /// Directory the subscription was attempted on.
        dir: PathBuf,
        /// Underlying watcher error.
        source: notify::Error,
    },
}
