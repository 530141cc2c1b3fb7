//! Tower layer/service pair wrapping the wait coordinator around an inner
//! handler, typically a static file service.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::Request;
use tower::{Layer, Service};

use crate::config::WaitConfig;
use crate::coordinator::wait_for_request;
use crate::error::Error;

/// Layer producing [`WaitForFile`] middleware.
///
/// ```no_run
/// use axum_prefer_wait::{WaitConfig, WaitForFileLayer};
/// use std::time::Duration;
/// use tower::ServiceBuilder;
/// use tower_http::services::ServeDir;
///
/// # fn main() -> Result<(), axum_prefer_wait::Error> {
/// let layer = WaitForFileLayer::with_config(
///     WaitConfig::new("/srv/www")
///         .with_max_wait(Duration::from_secs(30))
///         .with_etag(),
/// )?;
/// let service = ServiceBuilder::new()
///     .layer(layer)
///     .service(ServeDir::new("/srv/www"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct WaitForFileLayer {
    config: Arc<WaitConfig>,
}

impl WaitForFileLayer {
    /// Build a layer for `root` with the default configuration.
    ///
    /// Fails when `root` cannot be canonicalized.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, Error> {
        Self::with_config(WaitConfig::new(root.as_ref()))
    }

    /// Build a layer from an explicit configuration.
    pub fn with_config(config: WaitConfig) -> Result<Self, Error> {
        Ok(Self {
            config: Arc::new(config.finalize()?),
        })
    }
}

impl<S> Layer<S> for WaitForFileLayer {
    type Service = WaitForFile<S>;

    fn layer(&self, inner: S) -> Self::Service {
        WaitForFile {
            inner,
            config: self.config.clone(),
        }
    }
}

/// Middleware that holds each request back until the file it names is ready,
/// then delegates to the inner service exactly once.
///
/// The response and error types of the inner service pass through untouched;
/// this middleware never writes a response of its own.
#[derive(Clone, Debug)]
pub struct WaitForFile<S> {
    inner: S,
    config: Arc<WaitConfig>,
}

impl<S> Service<Request<Body>> for WaitForFile<S>
where
    S: Service<Request<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<S::Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let config = self.config.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            wait_for_request(&config, &parts).await;
            inner.call(Request::from_parts(parts, body)).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use axum::body::Body;
    use axum::http::{Request, Response, StatusCode};
    use tower::util::BoxCloneService;
    use tower::{ServiceBuilder, ServiceExt};

    fn counting_service(
        calls: Arc<AtomicUsize>,
    ) -> BoxCloneService<Request<Body>, Response<Body>, std::convert::Infallible> {
        BoxCloneService::new(tower::service_fn(move |_req: Request<Body>| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, std::convert::Infallible>(Response::new(Body::from("downstream")))
            }
        }))
    }

    fn request(path: &str, wait: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(wait) = wait {
            builder = builder.header("prefer", wait);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn passes_through_without_wait_header() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let service = ServiceBuilder::new()
            .layer(WaitForFileLayer::new(dir.path()).unwrap())
            .service(counting_service(calls.clone()));

        let start = Instant::now();
        let response = service.oneshot(request("/missing.txt", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn root_escape_passes_through_despite_wait() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let service = ServiceBuilder::new()
            .layer(WaitForFileLayer::new(dir.path()).unwrap())
            .service(counting_service(calls.clone()));

        let start = Instant::now();
        let response = service
            .oneshot(request("/../escape.txt", Some("wait=10000")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn non_get_passes_through_despite_wait() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let service = ServiceBuilder::new()
            .layer(WaitForFileLayer::new(dir.path()).unwrap())
            .service(counting_service(calls.clone()));

        let start = Instant::now();
        let req = Request::builder()
            .method("POST")
            .uri("/missing.txt")
            .header("prefer", "wait=10000")
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn downstream_invoked_exactly_once_after_wait() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let service = ServiceBuilder::new()
            .layer(WaitForFileLayer::new(dir.path()).unwrap())
            .service(counting_service(calls.clone()));

        let path = dir.path().join("late.txt");
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            tokio::fs::write(&path, b"late").await.unwrap();
        });

        let response = service
            .oneshot(request("/late.txt", Some("wait=10000")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_root_fails_at_mount() {
        assert!(matches!(
            WaitForFileLayer::new("/definitely/not/a/real/root"),
            Err(Error::InvalidRoot { .. })
        ));
    }
}
