//! Per-endpoint request metrics.
//!
//! Every request increments `http_req{logid,endpoint}` on entry and
//! `http_rsp{logid,endpoint,status}` on exit; latency lands in
//! `http_latency{logid,endpoint,status}`. Buckets span 1 ms to 10 s with
//! thresholds roughly a factor 10^(1/4) apart.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use tower::{Layer, Service};

/// Latency bucket ladder, in seconds.
pub const LATENCY_BUCKETS: [f64; 17] = [
    1e-3, 2e-3, 3e-3, 6e-3, 10e-3, 20e-3, 30e-3, 60e-3, 0.1, 0.2, 0.3, 0.6, 1.0, 2.0, 3.0, 6.0,
    10.0,
];

/// Request/response counters and the latency histogram, on their own
/// registry so tests and embedders stay isolated.
pub struct HttpMetrics {
    registry: Registry,
    req: CounterVec,
    rsp: CounterVec,
    latency: HistogramVec,
}

impl HttpMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let req = CounterVec::new(
            Opts::new("http_req", "number of incoming http requests"),
            &["logid", "endpoint"],
        )?;
        let rsp = CounterVec::new(
            Opts::new("http_rsp", "number of outgoing http responses"),
            &["logid", "endpoint", "status"],
        )?;
        let latency = HistogramVec::new(
            HistogramOpts::new("http_latency", "http request-response latency")
                .buckets(LATENCY_BUCKETS.to_vec()),
            &["logid", "endpoint", "status"],
        )?;
        registry.register(Box::new(req.clone()))?;
        registry.register(Box::new(rsp.clone()))?;
        registry.register(Box::new(latency.clone()))?;
        Ok(Self {
            registry,
            req,
            rsp,
            latency,
        })
    }

    pub fn observe_request(&self, logid: &str, endpoint: &str) {
        self.req.with_label_values(&[logid, endpoint]).inc();
    }

    pub fn observe_response(&self, logid: &str, endpoint: &str, status: &str, seconds: f64) {
        self.rsp.with_label_values(&[logid, endpoint, status]).inc();
        self.latency
            .with_label_values(&[logid, endpoint, status])
            .observe(seconds);
    }

    /// Export the registry in the Prometheus text format.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap_or_default())
    }
}

/// Layer attaching [`HttpMetrics`] to every request.
#[derive(Clone)]
pub struct MetricsLayer {
    metrics: Arc<HttpMetrics>,
    log_id: String,
}

impl MetricsLayer {
    pub fn new(metrics: Arc<HttpMetrics>, log_id: String) -> Self {
        Self { metrics, log_id }
    }
}

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService {
            inner,
            metrics: Arc::clone(&self.metrics),
            log_id: self.log_id.clone(),
        }
    }
}

/// Service recording one request/response pair.
#[derive(Clone)]
pub struct MetricsService<S> {
    inner: S,
    metrics: Arc<HttpMetrics>,
    log_id: String,
}

impl<S> Service<Request<Body>> for MetricsService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let endpoint = endpoint_label(req.uri().path());
        let metrics = Arc::clone(&self.metrics);
        let log_id = self.log_id.clone();
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            metrics.observe_request(&log_id, &endpoint);
            let start = Instant::now();
            let response = inner.call(req).await?;
            metrics.observe_response(
                &log_id,
                &endpoint,
                response.status().as_str(),
                start.elapsed().as_secs_f64(),
            );
            Ok(response)
        })
    }
}

fn endpoint_label(path: &str) -> String {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("")
        .to_string()
}
