#![forbid(unsafe_code)]

use leadline_server::{build_router, validate_startup_config_contract, AppState, ServerConfig};
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                warn!("signal handlers unavailable; falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let loaded = ServerConfig::from_env();
    init_tracing(loaded.as_ref().map_or(true, |cfg| cfg.log_json));
    let cfg = loaded.map_err(|e| {
        error!(error = %e, "invalid configuration");
        format!("invalid configuration: {e}")
    })?;
    validate_startup_config_contract(&cfg).map_err(|e| {
        error!(error = %e, "startup config contract violated");
        format!("invalid configuration: {e}")
    })?;
    info!(config = %cfg.redacted_summary(), "leadline-server starting");

    let state = AppState::from_config(&cfg).map_err(|e| format!("startup failed: {e}"))?;
    let app = build_router(state.clone());

    let listener = TcpListener::bind(&cfg.bind)
        .await
        .map_err(|e| format!("bind {} failed: {e}", cfg.bind))?;
    info!("leadline-server listening on {}", cfg.bind);

    let drain = cfg.shutdown_drain;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        wait_for_shutdown_signal().await;
        state.accepting_requests.store(false, Ordering::Relaxed);
        state.ready.store(false, Ordering::Relaxed);
        info!(drain_ms = drain.as_millis() as u64, "shutdown requested; draining");
        tokio::time::sleep(drain).await;
    })
    .await
    .map_err(|e| format!("server failed: {e}"))
}
