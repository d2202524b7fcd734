//! Song of the Week backend entrypoint wiring configuration, storage, the music service
//! and the REST API.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sotw_back::{
    config::AppConfig,
    dao::round_store::{RoundStore, memory::InMemoryRoundStore},
    music::{MusicClient, OfflineMusicClient, SpotifyClient, SpotifyConfig},
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let music = build_music_client(&config)?;
    let app_state = AppState::new(config, music);

    start_storage(app_state.clone()).await?;
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Spotify when credentials are present in the environment, the offline client otherwise.
fn build_music_client(config: &AppConfig) -> anyhow::Result<Arc<dyn MusicClient>> {
    match SpotifyConfig::from_env() {
        Ok(spotify) => {
            let client = SpotifyClient::new(spotify.with_public_playlists(config.public_playlists()))
                .context("building Spotify client")?;
            info!("using Spotify music service");
            Ok(Arc::new(client))
        }
        Err(err) => {
            warn!(error = %err, "Spotify credentials unavailable; playlists will be simulated offline");
            Ok(Arc::new(OfflineMusicClient))
        }
    }
}

/// Install the storage backend selected by `STORAGE_BACKEND` (`mongo` or `memory`).
async fn start_storage(state: SharedState) -> anyhow::Result<()> {
    let default_backend = if cfg!(feature = "mongo-store") {
        "mongo"
    } else {
        "memory"
    };
    let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| default_backend.to_owned());

    match backend.as_str() {
        "memory" => {
            info!("using in-memory storage");
            let store: Arc<dyn RoundStore> = Arc::new(InMemoryRoundStore::new());
            state.set_round_store(store).await;
            Ok(())
        }
        #[cfg(feature = "mongo-store")]
        "mongo" => {
            use sotw_back::{
                dao::{
                    round_store::mongodb::{MongoConfig, MongoRoundStore},
                    storage::StorageError,
                },
                services::storage_supervisor,
            };

            info!("using MongoDB storage; degraded until connected");
            tokio::spawn(storage_supervisor::run(state, || async {
                let config = MongoConfig::from_env().await?;
                let store = MongoRoundStore::connect(config).await?;
                Ok::<Arc<dyn RoundStore>, StorageError>(Arc::new(store))
            }));
            Ok(())
        }
        other => anyhow::bail!("unsupported STORAGE_BACKEND `{other}`"),
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

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
