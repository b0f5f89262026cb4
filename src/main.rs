//! Credibility scoring service: binary entrypoint.
//! Boots the Axum HTTP server with the engine, report store and optional debug routes.

use credibility_scorer::{api, run_ml_quick_probe, EngineConfig};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("credibility_scorer=info,warn"));

    // A subscriber may already be installed by the runtime; keep that one.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = EngineConfig::load()?;
    let state = api::AppState::from_config(&cfg);
    run_ml_quick_probe(state.engine()).await;

    let router = api::create_router(state, cfg.service.debug_routes);
    Ok(router.into())
}
