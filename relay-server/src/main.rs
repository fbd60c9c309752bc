mod admin_routes;
mod app_state;
mod auth;
mod ws;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use game_core::{AdminAuth, AdminHandle, GameLogicAdapter, IntentQueue, ModuleRegistry, SubscriptionRegistry, TickEngine};
use game_core::game_logic::FrameworkHandle;
use sqlx::any::{AnyPoolOptions, install_default_drivers};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app_state::AppState;
use crate::auth::{StaticTokenAdminAuth, TrustingAuthenticator};

/// Activates structured tracing, loads configuration, wires the
/// persistence gateway and game-logic module the config names, starts
/// the tick engine, then serves the push-channel and admin surfaces.
/// Mirrors the teacher's `main.rs` shape (`tracing_subscriber` init,
/// then build router, then `axum::serve`), with the room-relay wiring
/// replaced by the tick-engine bootstrap this framework needs instead.
#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config = match game_core::config::load(&config_path).await {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "failed to load configuration, shutting down");
            std::process::exit(1);
        }
    };

    install_default_drivers();
    let pool = match AnyPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(err) => {
            tracing::error!(error = %err, "failed to connect to the persistence backend, shutting down");
            std::process::exit(1);
        }
    };
    if let Err(err) = ensure_schema(&pool).await {
        tracing::error!(error = %err, "failed to prepare schema, shutting down");
        std::process::exit(1);
    }
    let gateway: Arc<dyn persistence_api::Gateway> =
        Arc::new(persistence_sqlx::SqlxGateway::new(pool));

    let mut modules = ModuleRegistry::new();
    modules.register("tic-tac-toe", Arc::new(tic_tac_toe::TicTacToeLogic::new()));
    let Some(module) = modules.resolve(&config.game_module) else {
        tracing::error!(game_module = %config.game_module, "unknown game_module, shutting down");
        std::process::exit(1);
    };

    let adapter = GameLogicAdapter::new(module);
    let framework = FrameworkHandle::new(gateway.clone());
    if let Err(err) = adapter.init(framework.clone()).await {
        tracing::error!(error = %err, "game module failed to initialize, shutting down");
        std::process::exit(1);
    }

    let registry = Arc::new(SubscriptionRegistry::new());
    let intents = Arc::new(IntentQueue::new());
    let engine = Arc::new(TickEngine::new(
        gateway,
        adapter,
        registry.clone(),
        intents.clone(),
        Duration::from_millis(config.tick_interval_ms),
    ));

    let engine_for_loop = engine.clone();
    tokio::spawn(async move { engine_for_loop.run().await });

    let admin = AdminHandle::new(engine.clone(), framework, registry.clone());
    let admin_auth: Option<Arc<dyn AdminAuth>> = config
        .admin_token
        .map(|token| Arc::new(StaticTokenAdminAuth::new(token)) as Arc<dyn AdminAuth>);

    let app_state = Arc::new(AppState {
        registry,
        intents,
        admin,
        authenticator: Arc::new(TrustingAuthenticator),
        admin_auth,
        max_connections: config.max_connections,
    });

    let app = Router::new()
        .route("/ws", get(ws::websocket_handler))
        .merge(admin_routes::routes())
        .with_state(app_state);

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, bind_addr = %config.bind_addr, "failed to bind, shutting down");
            std::process::exit(1);
        }
    };
    tracing::info!(bind_addr = %config.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(engine))
        .await
        .unwrap();
}

async fn shutdown_signal(engine: Arc<TickEngine>) {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received, stopping tick engine at the next tick boundary");
    engine.shutdown().await;
}

/// Creates the zones/entities tables if they are not already present.
/// A production deployment is expected to run its own migration
/// tooling against this schema ahead of time; this exists only so the
/// bundled demo is runnable against a bare SQLite file or `:memory:`.
async fn ensure_schema(pool: &sqlx::AnyPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS zones ( \
            id BIGINT PRIMARY KEY, \
            name TEXT NOT NULL UNIQUE, \
            width INTEGER NOT NULL, \
            height INTEGER NOT NULL, \
            metadata BLOB NOT NULL, \
            created_at TIMESTAMP NOT NULL, \
            updated_at TIMESTAMP NOT NULL \
        )",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS entities ( \
            id INTEGER PRIMARY KEY AUTOINCREMENT, \
            zone_id BIGINT NOT NULL REFERENCES zones(id), \
            x INTEGER NOT NULL, \
            y INTEGER NOT NULL, \
            width INTEGER NOT NULL, \
            height INTEGER NOT NULL, \
            metadata BLOB NOT NULL, \
            created_at TIMESTAMP NOT NULL, \
            updated_at TIMESTAMP NOT NULL \
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}
