//! Graceful shutdown support.
//!
//! During shutdown new requests are rejected with 503 while in-flight
//! requests (including long magazine renders) run to completion. In-flight
//! accounting uses a drop guard, so a request cancelled mid-flight still
//! decrements the counter.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use http::{Request, Response, StatusCode};
use http_body::Body;
use pin_project::pin_project;
use tower::{Layer, Service};

/// Shared shutdown flag plus in-flight request counter.
#[derive(Clone, Default)]
pub struct ShutdownState {
    is_shutting_down: Arc<AtomicBool>,
    in_flight_count: Arc<AtomicUsize>,
}

impl ShutdownState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_shutdown(&self) {
        self.is_shutting_down.store(true, Ordering::SeqCst);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.is_shutting_down.load(Ordering::SeqCst)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight_count.load(Ordering::SeqCst)
    }

    /// Future that resolves once every in-flight request has finished.
    pub fn completed(&self) -> impl Future<Output = ()> + Send + 'static {
        let state = self.clone();
        async move {
            while state.in_flight_count() > 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    }

    fn guard(&self) -> InFlightGuard {
        self.in_flight_count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            counter: Arc::clone(&self.in_flight_count),
        }
    }
}

/// Decrements the in-flight counter when dropped, whether the request
/// completed or its future was dropped.
struct InFlightGuard {
    counter: Arc<AtomicUsize>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct GracefulShutdownLayer {
    state: ShutdownState,
}

impl GracefulShutdownLayer {
    pub fn new(state: ShutdownState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for GracefulShutdownLayer {
    type Service = GracefulShutdownService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GracefulShutdownService {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct GracefulShutdownService<S> {
    inner: S,
    state: ShutdownState,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for GracefulShutdownService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: Body + Default,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = GracefulShutdownFuture<S::Future, ResBody, S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        if self.state.is_shutting_down() {
            let response = Response::builder()
                .status(StatusCode::SERVICE_UNAVAILABLE)
                .body(ResBody::default())
                .expect("building empty response should not fail");

            GracefulShutdownFuture {
                kind: FutureKind::Immediate(Some(Ok(response))),
                _guard: None,
            }
        } else {
            let guard = self.state.guard();
            GracefulShutdownFuture {
                kind: FutureKind::Inner(self.inner.call(req)),
                _guard: Some(guard),
            }
        }
    }
}

#[pin_project]
pub struct GracefulShutdownFuture<F, B, E> {
    #[pin]
    kind: FutureKind<F, B, E>,
    _guard: Option<InFlightGuard>,
}

#[pin_project(project = FutureKindProj)]
enum FutureKind<F, B, E> {
    Inner(#[pin] F),
    Immediate(Option<Result<Response<B>, E>>),
}

impl<F, B, E> Future for GracefulShutdownFuture<F, B, E>
where
    F: Future<Output = Result<Response<B>, E>>,
    B: Body,
{
    type Output = Result<Response<B>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        match this.kind.project() {
            FutureKindProj::Inner(fut) => {
                let result = fut.poll(cx);
                if result.is_ready() {
                    // Release the guard as soon as the response is ready
                    // rather than waiting for the future to be dropped.
                    this._guard.take();
                }
                result
            }
            FutureKindProj::Immediate(response) => {
                Poll::Ready(response.take().expect("immediate response polled twice"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::Empty;
    use tower::{ServiceBuilder, ServiceExt};

    #[derive(Clone)]
    struct SlowOkService;

    impl Service<Request<Empty<Bytes>>> for SlowOkService {
        type Response = Response<Empty<Bytes>>;
        type Error = std::convert::Infallible;
        type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: Request<Empty<Bytes>>) -> Self::Future {
            Box::pin(async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(Response::new(Empty::new()))
            })
        }
    }

    fn service(state: &ShutdownState) -> GracefulShutdownService<SlowOkService> {
        ServiceBuilder::new()
            .layer(GracefulShutdownLayer::new(state.clone()))
            .service(SlowOkService)
    }

    #[tokio::test]
    async fn test_requests_pass_through_normally() {
        let state = ShutdownState::new();
        let svc = service(&state);

        let req = Request::builder().body(Empty::new()).unwrap();
        let response = svc.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_new_requests_rejected_during_shutdown() {
        let state = ShutdownState::new();
        let svc = service(&state);

        state.start_shutdown();

        let req = Request::builder().body(Empty::new()).unwrap();
        let response = svc.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(state.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_in_flight_requests_survive_shutdown() {
        let state = ShutdownState::new();
        let svc = service(&state);

        let req = Request::builder().body(Empty::new()).unwrap();
        let handle = tokio::spawn({
            let svc = svc.clone();
            async move { svc.oneshot(req).await }
        });

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(state.in_flight_count(), 1);

        state.start_shutdown();

        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        state.completed().await;
        assert_eq!(state.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_request_releases_guard() {
        let state = ShutdownState::new();
        let svc = service(&state);

        let req = Request::builder().body(Empty::new()).unwrap();
        let handle = tokio::spawn({
            let svc = svc.clone();
            async move { svc.oneshot(req).await }
        });

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(state.in_flight_count(), 1);

        // Dropping the request future must still decrement the counter.
        handle.abort();
        let _ = handle.await;
        assert_eq!(state.in_flight_count(), 0);
    }
}
