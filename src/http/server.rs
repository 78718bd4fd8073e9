//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with one route per mounted resource
//! - Wire up middleware (request ID, tracing, timeout, security headers)
//! - Adapt axum requests for the decision engine
//! - Bind server to listener and stop on the shutdown signal
//! - Observability (metrics, correlation IDs)

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Query, RawPathParams, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::engine::DecisionEngine;
use crate::http::request::{BodyError, Request};
use crate::http::response::Outcome;
use crate::observability::metrics;
use crate::resource::{DescriptorError, ResourceDescriptor};
use crate::resources::{self, Mount};
use crate::store::ResourceStore;

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DecisionEngine>,
    pub max_body_size: usize,
}

/// HTTP server exposing the mounted resources.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server serving resources backed by `store`.
    pub fn new(config: ServiceConfig, store: ResourceStore) -> Result<Self, DescriptorError> {
        let mounts = resources::mounts(&store, &config.resources)?;

        let state = AppState {
            engine: Arc::new(DecisionEngine::new().with_trace(config.observability.decision_trace)),
            max_body_size: config.security.max_body_size,
        };

        let router = Self::build_router(&config, state, mounts);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState, mounts: Vec<Mount>) -> Router {
        let mut router = Router::new();
        for mount in mounts {
            tracing::debug!(path = mount.path, resource = mount.descriptor.name(), "Mounting resource");
            let descriptor = mount.descriptor;
            router = router.route(
                mount.path,
                any(
                    move |State(state): State<AppState>,
                          params: RawPathParams,
                          Query(query): Query<HashMap<String, String>>,
                          request: axum::extract::Request| {
                        let descriptor = descriptor.clone();
                        async move { resource_handler(state, descriptor, params, query, request).await }
                    },
                ),
            );
        }

        let mut router = router.fallback(not_found).with_state(state);

        if config.security.enable_headers {
            router = router
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                ));
        }

        let request_id = HeaderName::from_static(X_REQUEST_ID);
        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
    }

    /// The fully layered router, for serving or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

/// Evaluate one request against a mounted resource.
async fn resource_handler(
    state: AppState,
    descriptor: Arc<ResourceDescriptor>,
    params: RawPathParams,
    query: HashMap<String, String>,
    request: axum::extract::Request,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let params: HashMap<String, String> = params
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        resource = descriptor.name(),
        "Evaluating request"
    );

    let outcome = match Request::from_http(request, params, query, state.max_body_size).await {
        Ok(request) => state.engine.evaluate(request, &descriptor),
        Err(BodyError::TooLarge { limit }) => {
            tracing::warn!(request_id = %request_id, limit, "Request body too large");
            Outcome::plain(StatusCode::PAYLOAD_TOO_LARGE, "Request entity too large.")
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to read request body");
            Outcome::plain(StatusCode::BAD_REQUEST, "Bad request.")
        }
    };

    metrics::record_request(
        descriptor.name(),
        method.as_str(),
        outcome.status.as_u16(),
        start_time,
    );
    outcome.into_response()
}

async fn not_found() -> impl IntoResponse {
    Outcome::plain(StatusCode::NOT_FOUND, "Resource not found.")
}
