//! Crossword Back binary entrypoint wiring REST, SSE, storage and the layout generator.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crossword_back::{
    config::AppConfig,
    dao::{
        puzzle_store::{PuzzleStore, memory::MemoryPuzzleStore},
        storage::StorageError,
    },
    layout::{LayoutGenerator, UnconfiguredLayoutGenerator},
    routes,
    services::{session_service, sse_service, storage_supervisor},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let layout = build_layout_generator(&config)?;
    let app_state = AppState::new(config, layout);

    spawn_storage(app_state.clone())?;
    session_service::spawn_save_listener(app_state.clone());
    session_service::spawn_idle_sweeper(app_state.clone());
    sse_service::spawn_status_forwarder(app_state.clone());

    let app = build_router(app_state.clone());

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

    let open = app_state.sessions().len();
    let flushed = session_service::flush_all(&app_state).await;
    info!(open, flushed, "flushed open sessions before exit");

    Ok(())
}

/// Start the supervisor for the backend named by `STORAGE_BACKEND` (default `mongo`).
fn spawn_storage(state: SharedState) -> anyhow::Result<()> {
    let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| "mongo".into());
    info!(backend = %backend, "selecting storage backend");

    match backend.as_str() {
        #[cfg(feature = "mongo-store")]
        "mongo" => {
            use crossword_back::dao::puzzle_store::mongodb::{MongoConfig, MongoPuzzleStore};

            tokio::spawn(storage_supervisor::run(state, || async {
                let config = MongoConfig::from_env().await?;
                let store = MongoPuzzleStore::connect(config).await?;
                Ok::<Arc<dyn PuzzleStore>, StorageError>(Arc::new(store))
            }));
        }
        #[cfg(feature = "couch-store")]
        "couch" => {
            use crossword_back::dao::puzzle_store::couchdb::{CouchConfig, CouchPuzzleStore};

            let config = CouchConfig::from_env().context("reading CouchDB configuration")?;
            tokio::spawn(storage_supervisor::run(state, move || {
                let config = config.clone();
                async move {
                    let store = CouchPuzzleStore::connect(config).await?;
                    Ok::<Arc<dyn PuzzleStore>, StorageError>(Arc::new(store))
                }
            }));
        }
        "memory" => {
            warn!("using the in-memory store; nothing survives a restart");
            let store = MemoryPuzzleStore::new();
            tokio::spawn(storage_supervisor::run(state, move || {
                let store = store.clone();
                async move { Ok::<Arc<dyn PuzzleStore>, StorageError>(Arc::new(store)) }
            }));
        }
        other => anyhow::bail!("unsupported STORAGE_BACKEND `{other}`"),
    }

    Ok(())
}

fn build_layout_generator(config: &AppConfig) -> anyhow::Result<Arc<dyn LayoutGenerator>> {
    match config.layout_generator_url() {
        #[cfg(feature = "http-layout")]
        Some(url) => {
            use crossword_back::layout::http::HttpLayoutGenerator;

            info!(url, "using HTTP layout generator");
            let generator =
                HttpLayoutGenerator::new(url).context("building layout generator client")?;
            Ok(Arc::new(generator))
        }
        _ => {
            warn!("no layout generator configured; puzzle generation will fail");
            Ok(Arc::new(UnconfiguredLayoutGenerator))
        }
    }
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
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
