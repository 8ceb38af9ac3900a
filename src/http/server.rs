//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared `AppState` from config
//! - Create the Axum router with all handlers
//! - Wire up middleware (gate, metrics, limits, request ID, tracing)
//! - Serve on a listener until shutdown is signalled

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::IdentityService;
use crate::cache::ShipmentCaches;
use crate::config::PortalConfig;
use crate::http::handlers::{auth, health, reports, tracking};
use crate::http::middleware::{request_gate, track_requests};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::reports::ReportEngine;
use crate::security::{with_security_headers, RateLimitPolicy, TokenBucketLimiter};
use crate::shipments::ShipmentWorkflow;
use crate::store::{MemoryStore, ShipmentStore, UserStore};

/// Application state injected into handlers.
///
/// Created empty at startup and shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<TokenBucketLimiter>,
    pub identity: Arc<IdentityService>,
    pub shipments: Arc<ShipmentWorkflow>,
    pub reports: Arc<ReportEngine>,
    pub rate_limit_enabled: bool,
}

impl AppState {
    /// State backed by a fresh in-memory store.
    pub fn new(config: &PortalConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_stores(config, store.clone(), store)
    }

    pub fn with_stores(
        config: &PortalConfig,
        shipment_store: Arc<dyn ShipmentStore>,
        user_store: Arc<dyn UserStore>,
    ) -> Self {
        let caches = ShipmentCaches::new();

        Self {
            limiter: Arc::new(TokenBucketLimiter::new(RateLimitPolicy::from(&config.rate_limit))),
            identity: Arc::new(IdentityService::new(
                user_store,
                Duration::from_secs(config.security.session_ttl_secs),
            )),
            shipments: Arc::new(ShipmentWorkflow::new(
                Arc::clone(&shipment_store),
                caches.clone(),
                &config.shipments,
            )),
            reports: Arc::new(ReportEngine::new(shipment_store, caches)),
            rate_limit_enabled: config.rate_limit.enabled,
        }
    }
}

/// HTTP server for the portal.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: PortalConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: PortalConfig) -> Self {
        let state = AppState::new(&config);
        Self::with_state(config, state)
    }

    pub fn with_state(config: PortalConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state.clone());
        Self { router, state, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &PortalConfig, state: AppState) -> Router {
        let gated = Router::new()
            .route("/tracking/my-shipments", get(tracking::my_shipments))
            .route("/tracking/create", post(tracking::create_shipment))
            .route("/tracking/{tracking_number}", get(tracking::track_shipment))
            .route("/tracking/{tracking_number}/status", put(tracking::update_status))
            .route("/reports/shipment-report", get(reports::shipment_report))
            .route("/reports/statistics", get(reports::statistics))
            .route_layer(middleware::from_fn_with_state(state.clone(), request_gate));

        let router = Router::new()
            .route("/auth/register", post(auth::register))
            .route("/auth/login", post(auth::login))
            .route("/health", get(health::health))
            .merge(gated)
            .with_state(state)
            .layer(middleware::from_fn(track_requests))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        // Outermost first: the ID must exist before the trace span records it
        with_security_headers(router).layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id(request),
                    )
                }))
                .layer(propagate_request_id_layer()),
        )
    }

    /// A clone of the fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
