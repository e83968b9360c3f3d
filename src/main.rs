//! Archery Score Back binary entrypoint wiring REST, SSE and the selected storage backend.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::{Context, bail};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use archery_score_back::{
    config::AppConfig,
    dao::store::{
        PlayerDirectory, ScoreLedger,
        file::{FileConfig, FileStore},
        memory::MemoryStore,
    },
    routes,
    services::session_service,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let (players, ledger) = open_store().await?;
    let app_state = AppState::new(players, ledger, config);
    session_service::spawn_idle_reaper(&app_state);

    // Build the HTTP router once the shared state is ready.
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

type Stores = (Arc<dyn PlayerDirectory>, Arc<dyn ScoreLedger>);

/// Open the backend named by `STORE_BACKEND` (`file` by default).
async fn open_store() -> anyhow::Result<Stores> {
    let backend = env::var("STORE_BACKEND").unwrap_or_else(|_| "file".into());
    match backend.trim().to_ascii_lowercase().as_str() {
        "file" => {
            let config = FileConfig::from_env();
            info!(data_dir = %config.data_dir.display(), "using JSON file store");
            let store = FileStore::open(config)
                .await
                .context("opening file store")?;
            Ok(shared(store))
        }
        "memory" => {
            info!("using in-memory store; results are lost on exit");
            Ok(shared(MemoryStore::new()))
        }
        #[cfg(feature = "couch-store")]
        "couch" => {
            use archery_score_back::dao::store::couchdb::{CouchConfig, CouchStore};

            let config = CouchConfig::from_env().context("reading CouchDB configuration")?;
            info!(base_url = %config.base_url, database = %config.database, "using CouchDB store");
            let store = CouchStore::connect(config)
                .await
                .context("connecting to CouchDB")?;
            Ok(shared(store))
        }
        other => bail!("unsupported STORE_BACKEND `{other}`"),
    }
}

/// One backend serving as both player directory and score ledger.
fn shared<S>(store: S) -> Stores
where
    S: PlayerDirectory + ScoreLedger + Clone + 'static,
{
    (Arc::new(store.clone()), Arc::new(store))
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
