//! Request metrics middleware for HTTP services that consult a rate limiter.
//!
//! Bring your own `prometheus::Registry`; a response-time histogram labelled by
//! endpoint, method and status code, and an in-flight gauge labelled by
//! endpoint, are registered into it. Each request also runs inside a `server`
//! tracing span carrying the same labels.
//!
//! ```rust
//! use bucketstore_http::{MeasuredLayer, RoutePatterns};
//! use prometheus::Registry;
//!
//! let registry = Registry::new();
//! let routes = RoutePatterns::new().route("/login").route("/api/");
//! let layer = MeasuredLayer::new(routes, &registry).expect("metrics registered");
//! # let _ = layer;
//! ```

mod routes;

pub use routes::RoutePatterns;

use bucketstore::clock::{Clock, SystemClock};
use http::{Method, Request, Response, StatusCode};
use pin_project::pin_project;
use prometheus::{HistogramOpts, HistogramVec, IntGaugeVec, Opts, Registry};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use std::time::SystemTime;
use tower_layer::Layer;
use tower_service::Service;
use tracing::Span;

/// Name of the response-time histogram.
pub const RESPONSE_TIME: &str = "response_time";
/// Name of the in-flight gauge.
pub const IN_FLIGHT_REQUESTS: &str = "in_flight_requests";
/// Method label for anything outside the standard method set.
pub const UNKNOWN_METHOD: &str = "unknown";
/// Code label when the inner service fails without producing a response.
pub const NO_STATUS: &str = "0";

/// Map a request to the route pattern used as its `endpoint` label.
pub trait EndpointResolver: Send + Sync + 'static {
    fn endpoint(&self, method: &Method, path: &str) -> String;
}

impl<F> EndpointResolver for F
where
    F: Fn(&Method, &str) -> String + Send + Sync + 'static,
{
    fn endpoint(&self, method: &Method, path: &str) -> String {
        self(method, path)
    }
}

/// Label for `method`. Non-standard methods collapse to [`UNKNOWN_METHOD`] so
/// public input cannot inflate the number of series.
pub fn method_label(method: &Method) -> &'static str {
    match method.as_str() {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "POST" => "POST",
        "PUT" => "PUT",
        "PATCH" => "PATCH",
        "DELETE" => "DELETE",
        "CONNECT" => "CONNECT",
        "OPTIONS" => "OPTIONS",
        "TRACE" => "TRACE",
        _ => UNKNOWN_METHOD,
    }
}

#[derive(Clone)]
struct Metrics {
    response_time: HistogramVec,
    in_flight: IntGaugeVec,
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let response_time = HistogramVec::new(
            HistogramOpts::new(RESPONSE_TIME, "Time taken to respond to a request"),
            &["endpoint", "method", "code"],
        )?;
        let in_flight = IntGaugeVec::new(
            Opts::new(
                IN_FLIGHT_REQUESTS,
                "Tracks the number of requests currently in flight, labeled by endpoint.",
            ),
            &["endpoint"],
        )?;
        registry.register(Box::new(response_time.clone()))?;
        registry.register(Box::new(in_flight.clone()))?;
        Ok(Self { response_time, in_flight })
    }
}

/// Layer that records request metrics for the wrapped service.
#[derive(Debug)]
pub struct MeasuredLayer<R> {
    resolver: Arc<R>,
    clock: Arc<dyn Clock>,
    metrics: Metrics,
}

impl<R> Clone for MeasuredLayer<R> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            clock: self.clock.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<R: EndpointResolver> MeasuredLayer<R> {
    /// Create a layer and register its metrics into `registry`.
    ///
    /// # Errors
    /// Returns an error if a metric cannot be registered (e.g. name conflict).
    pub fn new(resolver: R, registry: &Registry) -> Result<Self, prometheus::Error> {
        Self::with_clock(resolver, SystemClock, registry)
    }

    /// Same as [`MeasuredLayer::new`] with an explicit clock for timing.
    pub fn with_clock<C>(resolver: R, clock: C, registry: &Registry) -> Result<Self, prometheus::Error>
    where
        C: Clock + 'static,
    {
        Ok(Self {
            resolver: Arc::new(resolver),
            clock: Arc::new(clock),
            metrics: Metrics::register(registry)?,
        })
    }
}

impl<S, R> Layer<S> for MeasuredLayer<R> {
    type Service = MeasuredService<S, R>;

    fn layer(&self, service: S) -> Self::Service {
        MeasuredService {
            inner: service,
            resolver: self.resolver.clone(),
            clock: self.clock.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

/// Middleware service that records request metrics.
#[derive(Debug)]
pub struct MeasuredService<S, R> {
    inner: S,
    resolver: Arc<R>,
    clock: Arc<dyn Clock>,
    metrics: Metrics,
}

impl<S: Clone, R> Clone for MeasuredService<S, R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            resolver: self.resolver.clone(),
            clock: self.clock.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<S, R, ReqBody, ResBody> Service<Request<ReqBody>> for MeasuredService<S, R>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    R: EndpointResolver,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = MeasuredFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let endpoint = self.resolver.endpoint(req.method(), req.uri().path());
        let method = method_label(req.method());
        let span = tracing::info_span!(
            "server",
            endpoint = %endpoint,
            method = %method,
            code = tracing::field::Empty,
        );
        let inner = span.in_scope(|| self.inner.call(req));
        let in_flight = InFlight::start(self.metrics.clone(), self.clock.clone(), endpoint, method);
        MeasuredFuture { inner, span, in_flight: Some(in_flight) }
    }
}

/// Response future of [`MeasuredService`]. The inner future is polled inside
/// the request's span.
#[pin_project]
pub struct MeasuredFuture<F> {
    #[pin]
    inner: F,
    span: Span,
    in_flight: Option<InFlight>,
}

impl<F, B, E> Future for MeasuredFuture<F>
where
    F: Future<Output = Result<Response<B>, E>>,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _enter = this.span.enter();
        let result = ready!(this.inner.poll(cx));
        if let Some(in_flight) = this.in_flight.take() {
            let status = result.as_ref().ok().map(Response::status);
            let code = status.as_ref().map_or(NO_STATUS, StatusCode::as_str);
            this.span.record("code", tracing::field::display(code));
            in_flight.finish(code);
        }
        Poll::Ready(result)
    }
}

// Holds one unit of the in-flight gauge; released on drop, so a request
// abandoned mid-flight is still accounted for.
struct InFlight {
    metrics: Metrics,
    clock: Arc<dyn Clock>,
    endpoint: String,
    method: &'static str,
    begin: SystemTime,
}

impl InFlight {
    fn start(metrics: Metrics, clock: Arc<dyn Clock>, endpoint: String, method: &'static str) -> Self {
        metrics.in_flight.with_label_values(&[endpoint.as_str()]).inc();
        let begin = clock.now();
        Self { metrics, clock, endpoint, method, begin }
    }

    fn finish(self, code: &str) {
        let elapsed = self.clock.since(self.begin);
        self.metrics
            .response_time
            .with_label_values(&[self.endpoint.as_str(), self.method, code])
            .observe(elapsed.as_secs_f64());
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.metrics.in_flight.with_label_values(&[self.endpoint.as_str()]).dec();
    }
}
