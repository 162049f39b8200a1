//! Service assembly: router, rotation task, serve loop.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::adapters::BackendClient;
use crate::domain::config::GatewayConfig;
use crate::domain::error::ServiceError;
use crate::domain::params::LogParameters;
use crate::domain::sth::SthSource;
use crate::middleware::{HttpMetrics, MetricsLayer};
use crate::ports::MerkleBackend;
use crate::rest::handlers;

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub params: Arc<LogParameters>,
    pub backend: Arc<BackendClient>,
    pub sth_source: Arc<SthSource>,
    pub metrics: Arc<HttpMetrics>,
}

/// One log gateway: a router plus the rotation task driving its cosigned
/// tree head.
pub struct LogService {
    config: GatewayConfig,
    state: AppState,
    cancel: CancellationToken,
}

impl LogService {
    pub fn new(
        config: GatewayConfig,
        params: LogParameters,
        backend: Arc<dyn MerkleBackend>,
    ) -> Result<Self, ServiceError> {
        config.validate()?;
        let params = Arc::new(params);
        let backend = Arc::new(BackendClient::new(backend, config.deadline));
        let sth_source = Arc::new(SthSource::new(Arc::clone(&params), Arc::clone(&backend)));
        let metrics = Arc::new(HttpMetrics::new()?);
        Ok(Self {
            config,
            state: AppState {
                params,
                backend,
                sth_source,
                metrics,
            },
            cancel: CancellationToken::new(),
        })
    }

    /// The shared handler state, also useful for driving tests.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Token that stops the serve loop and the rotation task.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Build the router with every endpoint mounted under the log prefix.
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Bind, establish a first tree head, and serve until cancelled. The
    /// rotation task observes the same token and stops before the listener
    /// finishes draining.
    pub async fn serve(self) -> Result<(), ServiceError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(addr).await.map_err(ServiceError::Bind)?;
        info!(%addr, prefix = %self.state.params.prefix, "starting log gateway");

        if let Err(error) = self.state.sth_source.rotate().await {
            warn!(%error, "initial tree head fetch failed, serving without a cosigned head");
        }
        let rotation = tokio::spawn(rotation_loop(
            Arc::clone(&self.state.sth_source),
            self.config.rotation_interval,
            self.cancel.clone(),
        ));

        let router = self.router();
        axum::serve(listener, router)
            .with_graceful_shutdown(self.cancel.clone().cancelled_owned())
            .await
            .map_err(ServiceError::Serve)?;

        let _ = rotation.await;
        info!("log gateway stopped");
        Ok(())
    }
}

/// Route table. GET and POST are strict: the wrong method earns a 405 with
/// the plaintext status body.
pub fn build_router(state: AppState) -> Router {
    let prefix = state.params.prefix.clone();
    let api = Router::new()
        .route("/add-entry", post(handlers::add_entry))
        .route("/add-cosignature", post(handlers::add_cosignature))
        .route("/get-latest-sth", get(handlers::get_latest_sth))
        .route("/get-stable-sth", get(handlers::get_stable_sth))
        .route("/get-cosigned-sth", get(handlers::get_cosigned_sth))
        .route("/get-proof-by-hash", get(handlers::get_proof_by_hash))
        .route("/get-consistency-proof", get(handlers::get_consistency_proof))
        .route("/get-entries", get(handlers::get_entries))
        .route("/get-anchors", get(handlers::get_anchors))
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state.clone());

    Router::new()
        .nest(&format!("/{prefix}"), api)
        .layer(MetricsLayer::new(
            Arc::clone(&state.metrics),
            state.params.log_id_b64(),
        ))
}

async fn method_not_allowed() -> (StatusCode, &'static str) {
    (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed\n")
}

async fn rotation_loop(source: Arc<SthSource>, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The serve loop already established the first head.
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("rotation task stopped");
                return;
            }
            _ = ticker.tick() => {
                if let Err(error) = source.rotate().await {
                    warn!(%error, "tree head rotation failed, keeping previous heads");
                }
            }
        }
    }
}
