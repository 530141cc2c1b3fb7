//! # axum-prefer-wait
//!
//! Axum/tower middleware that honors the RFC 7240 `Prefer: wait=` request
//! preference for static files: when the requested file does not exist yet,
//! or still carries the ETag the client already holds, the middleware parks
//! the request until the file shows up (or changes), a deadline passes, or
//! the directory cannot be watched, and only then lets the inner service
//! respond. Useful for build pipelines and long-polling dashboards where the
//! client asks for an artifact moments before it lands on disk.
//!
//! ## Overview
//!
//! - **Header-driven**: clients opt in per request with `Prefer: wait=<ms>`
//!   (or a plain `Timeout: <ms>` header); the configured maximum caps every
//!   wait. Requests without a usable wait value pass through untouched.
//! - **Directory watching**: the parent directory of the resolved file is
//!   watched through [`notify`], so files that do not exist yet can still be
//!   awaited. Directory-style requests wait on the configured index files in
//!   priority order.
//! - **Freshness aware**: with ETag checking enabled, an existing file whose
//!   current token still matches the request's `If-None-Match` counts as not
//!   ready, turning the wait into "until this file actually changes".
//! - **Never the responder**: the middleware releases control downstream
//!   exactly once and writes no response of its own; pair it with a file
//!   service such as `tower_http::services::ServeDir`.
//!
//! ## Example
//!
//! ```no_run
//! use axum_prefer_wait::{WaitConfig, WaitForFileLayer};
//! use std::time::Duration;
//! use tower::ServiceBuilder;
//! use tower_http::services::ServeDir;
//!
//! # fn main() -> Result<(), axum_prefer_wait::Error> {
//! let service = ServiceBuilder::new()
//!     .layer(WaitForFileLayer::with_config(
//!         WaitConfig::new("./public")
//!             .with_index(["index.html", "index.htm"])
//!             .with_max_wait(Duration::from_secs(30)),
//!     )?)
//!     .service(ServeDir::new("./public"));
//! # Ok(())
//! # }
//! ```

mod config;
mod coordinator;
mod error;
mod layer;
mod prefer;
mod readiness;
mod resolve;
mod watch;

pub use config::WaitConfig;
pub use error::Error;
pub use layer::{WaitForFile, WaitForFileLayer};
pub use prefer::{requested_wait, resolve_preference};
pub use readiness::metadata_etag;
