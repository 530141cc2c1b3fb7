//! Bridge from `notify` callbacks onto a tokio channel.

use std::ffi::OsString;
use std::path::Path;

use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::Error;

/// Exclusive change subscription on a single directory.
///
/// Each wait request owns its own subscription; dropping the handle tears the
/// underlying watcher down. The receiver yields the bare entry name of every
/// changed path, which is all the coordinator needs to match candidates.
pub(crate) struct DirWatch {
    _watcher: RecommendedWatcher,
}

impl DirWatch {
    /// Subscribe to changes directly under `dir` (non-recursive).
    ///
    /// The watcher callback runs on notify's own thread; entry names are
    /// handed over through an unbounded channel. Watcher runtime errors are
    /// logged and otherwise ignored; a missed notification only means the
    /// request waits until its deadline.
    pub(crate) fn subscribe(
        dir: &Path,
    ) -> Result<(Self, mpsc::UnboundedReceiver<OsString>), Error> {
        let (tx, rx) = mpsc::unbounded_channel();
        let watch_error = |source| Error::Watch {
            dir: dir.to_path_buf(),
            source,
        };
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Access(_)) {
                        return;
                    }
                    for path in event.paths {
                        if let Some(name) = path.file_name() {
                            // The receiver disappears once the wait request
                            // completes; late events have nowhere to go.
                            let _ = tx.send(name.to_os_string());
                        }
                    }
                }
                Err(error) => debug!(%error, "ignoring watch error"),
            },
            NotifyConfig::default(),
        )
        .map_err(watch_error)?;
        watcher.watch(dir, RecursiveMode::NonRecursive).map_err(watch_error)?;
        Ok((Self { _watcher: watcher }, rx))
    }
}

impl std::fmt::Debug for DirWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DirWatch")
    }
}
