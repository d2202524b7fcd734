pub mod round_machine;

use std::sync::Arc;

use dashmap::DashMap;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock, watch};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::round_store::RoundStore,
    error::ServiceError,
    music::MusicClient,
    services::schedule::{Clock, SystemClock},
};

pub type SharedState = Arc<AppState>;

/// Central application state holding the storage handle and the collaborators.
pub struct AppState {
    round_store: RwLock<Option<Arc<dyn RoundStore>>>,
    music: Arc<dyn MusicClient>,
    clock: Arc<dyn Clock>,
    config: AppConfig,
    degraded: watch::Sender<bool>,
    advancement_gates: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, music: Arc<dyn MusicClient>) -> SharedState {
        Self::with_clock(config, music, Arc::new(SystemClock))
    }

    /// Same as [`AppState::new`] with an explicit source of "now".
    pub fn with_clock(
        config: AppConfig,
        music: Arc<dyn MusicClient>,
        clock: Arc<dyn Clock>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            round_store: RwLock::new(None),
            music,
            clock,
            config,
            degraded: degraded_tx,
            advancement_gates: DashMap::new(),
        })
    }

    /// Obtain a handle to the current round store, if one is installed.
    pub async fn round_store(&self) -> Option<Arc<dyn RoundStore>> {
        let guard = self.round_store.read().await;
        guard.as_ref().cloned()
    }

    /// Round store or [`ServiceError::Degraded`] while storage is unavailable.
    pub async fn require_round_store(&self) -> Result<Arc<dyn RoundStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.round_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a round store implementation and leave degraded mode.
    pub async fn set_round_store(&self, store: Arc<dyn RoundStore>) {
        {
            let mut guard = self.round_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    pub fn music(&self) -> Arc<dyn MusicClient> {
        self.music.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    /// Lock serializing round advancement of one group inside this process.
    pub fn advancement_gate(&self, group_id: Uuid) -> Arc<Mutex<()>> {
        self.advancement_gates
            .entry(group_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
