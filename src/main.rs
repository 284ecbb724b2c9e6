//! Buzz Back binary entrypoint wiring REST, SSE, persistence and expiry.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::{Context, bail};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use buzz_back::{
    config::AppConfig,
    routes,
    services::{expiry, persistence},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_state = AppState::new(AppConfig::load());

    start_storage(&app_state).await?;
    tokio::spawn(persistence::run(app_state.clone()));
    tokio::spawn(expiry::run(app_state.clone()));

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Start the supervisor of the backend selected by `STORE_BACKEND`, if any.
///
/// The state stays degraded until the backend answers.
async fn start_storage(state: &SharedState) -> anyhow::Result<()> {
    let backend = env::var("STORE_BACKEND").unwrap_or_default();

    match backend.trim() {
        "" | "memory" => {
            info!("no storage backend configured; games live in memory only");
        }
        #[cfg(feature = "mongo-store")]
        "mongo" => {
            use buzz_back::dao::{
                game_store::{
                    GameStore,
                    mongodb::{MongoConfig, MongoGameStore},
                },
                storage::StorageError,
            };
            use buzz_back::services::storage_supervisor;

            let config = MongoConfig::from_env()
                .await
                .context("reading MongoDB configuration")?;
            state.update_degraded(true).await;
            tokio::spawn(storage_supervisor::run(state.clone(), move || {
                let config = config.clone();
                async move {
                    MongoGameStore::connect(config)
                        .await
                        .map(|store| Arc::new(store) as Arc<dyn GameStore>)
                        .map_err(StorageError::from)
                }
            }));
        }
        #[cfg(feature = "couch-store")]
        "couch" => {
            use buzz_back::dao::{
                game_store::{
                    GameStore,
                    couchdb::{CouchConfig, CouchGameStore},
                },
                storage::StorageError,
            };
            use buzz_back::services::storage_supervisor;

            let config = CouchConfig::from_env().context("reading CouchDB configuration")?;
            state.update_degraded(true).await;
            tokio::spawn(storage_supervisor::run(state.clone(), move || {
                let config = config.clone();
                async move {
                    CouchGameStore::connect(config)
                        .await
                        .map(|store| Arc::new(store) as Arc<dyn GameStore>)
                        .map_err(StorageError::from)
                }
            }));
        }
        other => bail!("unsupported STORE_BACKEND `{other}`"),
    }

    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
