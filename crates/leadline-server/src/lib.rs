#![forbid(unsafe_code)]
//! Lead intake HTTP server: submission routes, step validation, the agent
//! portal and operational endpoints.

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use crate::http::request_tracing::RequestIdSource;
use leadline_crm::{
    BreakerConfig, CrmMode, HttpCrmSink, LeadDispatcher, LeadSink, MockSink, WebhookRelaySink,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use telemetry::metrics::RequestMetrics;
use telemetry::rate_limiter::RateLimiter;
use tracing::info;

mod config;
mod http;
mod middleware;
mod telemetry;

pub use config::{
    validate_startup_config_contract, ApiConfig, ConfigError, Env, RateLimitConfig,
    ServerConfig, ENV_PREFIX,
};

pub const CRATE_NAME: &str = "leadline-server";

#[derive(Clone)]
pub struct AppState {
    pub api: ApiConfig,
    pub dispatcher: Arc<LeadDispatcher>,
    pub ready: Arc<AtomicBool>,
    pub accepting_requests: Arc<AtomicBool>,
    pub(crate) limiter: Arc<RateLimiter>,
    pub(crate) metrics: Arc<RequestMetrics>,
    pub(crate) request_ids: Arc<RequestIdSource>,
}

impl AppState {
    #[must_use]
    pub fn new(api: ApiConfig, dispatcher: LeadDispatcher) -> Self {
        let dispatcher = match dispatcher.crm_deadline() {
            Some(_) => dispatcher,
            None => dispatcher.with_crm_deadline(api.crm_deadline()),
        };
        Self {
            limiter: Arc::new(RateLimiter::new(api.rate_limit_max_clients)),
            api,
            dispatcher: Arc::new(dispatcher),
            ready: Arc::new(AtomicBool::new(true)),
            accepting_requests: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(RequestMetrics::default()),
            request_ids: Arc::new(RequestIdSource::new()),
        }
    }

    /// Wires the CRM sink, relay and fallback mode described by `cfg`.
    pub fn from_config(cfg: &ServerConfig) -> Result<Self, ConfigError> {
        let mode = cfg.crm.effective_mode();
        let primary: Arc<dyn LeadSink> = match mode {
            CrmMode::Mock => Arc::new(MockSink),
            CrmMode::Live | CrmMode::Auto => Arc::new(
                HttpCrmSink::new(cfg.crm.clone()).map_err(|e| ConfigError(e.to_string()))?,
            ),
        };
        let mut dispatcher = LeadDispatcher::new(primary, mode, BreakerConfig::from(&cfg.crm));
        if let Some(relay) =
            WebhookRelaySink::from_config(&cfg.relay).map_err(|e| ConfigError(e.to_string()))?
        {
            dispatcher = dispatcher.with_relay(Arc::new(relay));
        }
        info!(
            crm_mode = mode.as_str(),
            crm_sink = dispatcher.primary_tag(),
            relay = dispatcher.has_relay(),
            "lead dispatcher configured"
        );
        Ok(Self::new(cfg.api.clone(), dispatcher))
    }
}

pub fn build_router(state: AppState) -> Router {
    let submissions = Router::new()
        .route("/v1/leads", post(http::submissions::submit_lead_handler))
        .route(
            "/v1/quotes/:product",
            post(http::submissions::submit_quote_handler),
        )
        .route("/v1/contact", post(http::submissions::submit_contact_handler))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::rate_limit::rate_limit_middleware,
        ));

    Router::new()
        .route("/healthz", get(http::handlers::healthz_handler))
        .route("/readyz", get(http::handlers::readyz_handler))
        .route("/metrics", get(http::handlers::metrics_handler))
        .route("/v1/version", get(http::handlers::version_handler))
        .route("/v1/openapi.json", get(http::handlers::openapi_handler))
        .route("/v1/products", get(http::handlers::products_handler))
        .route(
            "/v1/leads/validate",
            post(http::submissions::validate_step_handler),
        )
        .route("/v1/portal/summary", get(http::portal::portal_summary_handler))
        .merge(submissions)
        .fallback(http::handlers::not_found_handler)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::security::cors_middleware,
        ))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::security::audit_middleware,
        ))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_tracing::request_tracing_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes))
        .with_state(state)
}
