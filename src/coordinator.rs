//! Per-request wait orchestration.
//!
//! One [`WaitSession`] exists per delayed request. It owns every resource the
//! wait acquires (the directory subscription and, implicitly, the deadline
//! timer inside [`WaitSession::run`]) and funnels every terminal condition
//! (deadline, matching change event, watch-setup failure, eager readiness)
//! through a single completion latch, so control is released downstream
//! exactly once no matter how the event sources interleave.

use std::path::PathBuf;
use std::time::Duration;

use axum::http::request::Parts;
use axum::http::{Method, header};
use tracing::{debug, trace, warn};

use crate::config::WaitConfig;
use crate::prefer::requested_wait;
use crate::readiness::check_ready;
use crate::resolve::resolve_candidates;
use crate::watch::DirWatch;

/// Hold the request back until a candidate is ready, a deadline passes, or
/// waiting is impossible. Always returns; never errors.
///
/// Abstains entirely (no watch, no timer) when the method cannot be satisfied
/// by a file, the effective wait is not positive, or the path escapes the
/// configured root.
pub(crate) async fn wait_for_request(config: &WaitConfig, req: &Parts) {
    if req.method != Method::GET && req.method != Method::HEAD {
        return;
    }
    let wait = requested_wait(&req.headers)
        .unwrap_or(0)
        .min(config.max_wait_ms());
    if wait <= 0 {
        return;
    }
    let Some(candidates) = resolve_candidates(&config.root, req.uri.path(), &config.index)
    else {
        return;
    };
    let client_etag = if config.etag {
        req.headers
            .get(header::IF_NONE_MATCH)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    } else {
        None
    };

    debug!(
        path = req.uri.path(),
        wait_ms = wait,
        "delaying response until a candidate file is ready"
    );
    WaitSession::new(candidates, client_etag, config.etag)
        .run(Duration::from_millis(wait as u64))
        .await;
}

/// State for one in-flight wait: the candidate files, the freshness token the
/// client already holds, the directory subscription, and the completion latch.
pub(crate) struct WaitSession {
    candidates: Vec<PathBuf>,
    client_etag: Option<String>,
    etag_enabled: bool,
    watch: Option<DirWatch>,
    released: bool,
}

impl WaitSession {
    /// `candidates` must be non-empty and in priority order.
    pub(crate) fn new(
        candidates: Vec<PathBuf>,
        client_etag: Option<String>,
        etag_enabled: bool,
    ) -> Self {
        Self {
            candidates,
            client_etag,
            etag_enabled,
            watch: None,
            released: false,
        }
    }

    /// Check-and-set the completion latch, dropping the subscription.
    ///
    /// Returns whether this call performed the release. Every terminal path
    /// in [`run`](Self::run) goes through here.
    fn complete(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.watch.take();
        true
    }

    /// Drive the wait to completion.
    ///
    /// The deadline is armed before anything else so it bounds watch setup
    /// and the eager probes as well. Consumes the session; once this returns
    /// the timer and subscription are gone and the caller may proceed
    /// downstream.
    pub(crate) async fn run(mut self, timeout: Duration) {
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        // The file itself may not exist yet, so watch its directory. All
        // candidates share one parent by construction.
        let Some(parent) = self.candidates[0].parent().map(PathBuf::from) else {
            self.complete();
            return;
        };
        let mut events = match DirWatch::subscribe(&parent) {
            Ok((watch, events)) => {
                self.watch = Some(watch);
                events
            }
            Err(error) => {
                // Without notifications the wait could only ever end at the
                // deadline; release now and let downstream answer.
                warn!(%error, "releasing request without waiting");
                self.complete();
                return;
            }
        };

        // Eager pass: the subscription is live, so anything that existed
        // before it cannot be missed. Probe every candidate; first ready
        // wins.
        for i in 0..self.candidates.len() {
            let ready = check_ready(
                &self.candidates[i],
                self.client_etag.as_deref(),
                self.etag_enabled,
            )
            .await;
            if ready {
                self.complete();
                return;
            }
        }

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    debug!("wait deadline elapsed");
                    self.complete();
                    return;
                }
                changed = events.recv() => {
                    let Some(name) = changed else {
                        // Watcher backend went away mid-wait; stop waiting.
                        self.complete();
                        return;
                    };
                    trace!(name = %name.to_string_lossy(), "directory entry changed");
                    for i in 0..self.candidates.len() {
                        if self.candidates[i].file_name() != Some(name.as_os_str()) {
                            continue;
                        }
                        let ready = check_ready(
                            &self.candidates[i],
                            self.client_etag.as_deref(),
                            self.etag_enabled,
                        )
                        .await;
                        if ready && self.complete() {
                            return;
                        }
                    }
                }
            }
        }
    }
}
