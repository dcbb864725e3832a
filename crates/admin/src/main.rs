//! `lorry-desk-admin`: the dashboard's JSON API server.
//!
//! Reads `LD_*` settings from the environment (and `.env`), seeds the
//! in-memory store from `LD_SEED_FILE` when set, and listens on
//! `LD_HOST:LD_PORT` (3001 by default). Errors go to Sentry when
//! `SENTRY_DSN` is present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::error::Error;

use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use lorry_desk_admin::config::AdminConfig;
use lorry_desk_admin::db::{MemoryStore, SeedData};
use lorry_desk_admin::routes;
use lorry_desk_admin::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Returns `None` without a DSN. Dropping the guard flushes pending events.
fn init_sentry(config: &AdminConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!(environment = ?config.sentry_environment, "error reporting enabled");
    Some(guard)
}

// Warnings and errors become Sentry events; info and debug ride along as breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(config: &AdminConfig) {
    // RUST_LOG wins over this default.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lorry_desk_admin=info,tower_http=debug".into());

    let json_layer = config
        .log_json
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!config.log_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

/// Memory store for the configured organization, seeded when a fixture is set.
fn build_store(config: &AdminConfig) -> Result<MemoryStore, Box<dyn Error>> {
    let Some(path) = &config.seed_file else {
        tracing::warn!("LD_SEED_FILE not set, starting with an empty store");
        return Ok(MemoryStore::for_organization(config.organization_id.clone()));
    };

    let seed = SeedData::from_path(path)?;
    if seed.organization_id != config.organization_id {
        return Err(format!(
            "seed file {} belongs to organization {}, expected {}",
            path.display(),
            seed.organization_id,
            config.organization_id
        )
        .into());
    }
    let store = MemoryStore::from_seed(seed)?;
    tracing::info!(seed = %path.display(), "Memory store seeded");
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AdminConfig::from_env()?;

    // The Sentry client has to exist before the tracing layer that feeds it.
    let _sentry_guard = init_sentry(&config);
    init_tracing(&config);

    let store = build_store(&config)?;
    let state = AppState::with_memory_store(config.clone(), store);

    let app = routes::routes()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Outside the router so failed extractors are reported too.
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!(organization = %config.organization_id, "admin listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("draining connections before exit");
}
