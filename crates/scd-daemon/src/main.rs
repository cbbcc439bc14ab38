//! scd-daemon entry point.
//!
//! Thin: sets up tracing, loads config, builds the shared state, wires
//! middleware, and starts the HTTP server. Route handlers live in
//! `routes.rs`; shared state lives in `state.rs`.
//!
//! Config paths come from the command line (merge order), or from
//! `SCD_CONFIG_PATHS` (comma-separated) when none are given.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{bail, Context};
use axum::http::{HeaderValue, Method};
use scd_config::ConfigSurface;
use scd_daemon::{routes, state};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let paths = config_paths();
    if paths.is_empty() {
        bail!("no config given: pass YAML paths as arguments or set SCD_CONFIG_PATHS");
    }

    let loaded = scd_config::load_layered_yaml(&paths)?;
    let unused = scd_config::unused_keys(ConfigSurface::Daemon, &loaded.config_json);
    if !unused.is_clean() {
        warn!(unused = ?unused.unused_leaf_pointers, "config has keys the daemon does not read");
    }
    let cfg = loaded.engine()?;
    let secrets = scd_config::resolve_store_secrets(&cfg)?;
    let shared = Arc::new(state::AppState::from_config(&cfg, &secrets).context("store setup")?);
    info!(config_hash = %loaded.config_hash, store = ?cfg.store.kind, "config loaded");

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr = match bind_addr_from_env() {
        Some(a) => a,
        None => cfg
            .daemon
            .bind
            .parse::<SocketAddr>()
            .with_context(|| format!("CONFIG_INVALID: daemon.bind '{}'", cfg.daemon.bind))?,
    };
    info!("scd-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn config_paths() -> Vec<String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return args;
    }
    std::env::var("SCD_CONFIG_PATHS")
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var("SCD_DAEMON_ADDR").ok()?.parse().ok()
}

/// CORS: allow only localhost origins, read-only methods.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET])
        .allow_headers(tower_http::cors::Any)
}
