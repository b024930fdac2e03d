/*
 * Responsibility
 * - Config読み込み → 依存生成 (pool, migrations, authorizer) → Router 組み立て
 * - Middleware の適用 (http / security headers / CORS)
 * - axum::serve() で起動、Ctrl-C で graceful shutdown
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware::{cors, http, security_headers};
use crate::repos::PgDrinkStore;
use crate::services::auth::build_authorizer;
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG wins when set, e.g.
    // RUST_LOG=info,coffee_shop_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr may be hidden depending on how the process is launched.
        tracing::error!(?info, "panic");

        // Development fails fast; production keeps serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("loading configuration")?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        env = ?config.app_env,
        addr = %config.addr,
        auth_domain = %config.auth_domain,
        jwks = %config.jwks_url,
        audience = %config.auth_audience,
        "starting coffee shop API"
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    tracing::info!("shut down");
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("connecting to database")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("running migrations")?;

    // Keys are fetched lazily on the first protected request.
    let auth = build_authorizer(config).context("building authorizer")?;

    Ok(AppState::new(Arc::new(PgDrinkStore::new(pool)), auth))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = api::v1::routes(&state).with_state(state);
    let router = http::apply(router);
    let router = security_headers::apply(router);
    cors::apply(router, config)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
