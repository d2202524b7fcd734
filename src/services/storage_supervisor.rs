//! Background task owning the storage connection and the degraded flag.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::{
    dao::{round_store::RoundStore, storage::StorageError},
    state::SharedState,
};

/// Delays used while connecting and watching the round store.
#[derive(Debug, Clone, Copy)]
pub struct SupervisorPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub health_poll_interval: Duration,
    /// In-place reconnects tried before the store is dropped and rebuilt.
    pub reconnect_attempts: u32,
}

impl Default for SupervisorPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_secs(10),
            health_poll_interval: Duration::from_secs(5),
            reconnect_attempts: 3,
        }
    }
}

/// Exponential backoff capped at `max`.
struct Backoff {
    initial: Duration,
    current: Duration,
    max: Duration,
}

impl Backoff {
    fn new(policy: &SupervisorPolicy) -> Self {
        Self {
            initial: policy.initial_delay,
            current: policy.initial_delay,
            max: policy.max_delay,
        }
    }

    async fn wait(&mut self) {
        sleep(self.current).await;
        self.current = (self.current * 2).min(self.max);
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// [`run_with_policy`] with the default delays.
pub async fn run<F, Fut>(state: SharedState, connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn RoundStore>, StorageError>> + Send,
{
    run_with_policy(state, connect, SupervisorPolicy::default()).await
}

/// Connect to the round store, install it, then watch its health forever.
///
/// The application stays degraded until the first connection succeeds. A failing
/// health check is answered with in-place reconnects; when those run out the store is
/// rebuilt through `connect`.
pub async fn run_with_policy<F, Fut>(state: SharedState, mut connect: F, policy: SupervisorPolicy)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn RoundStore>, StorageError>> + Send,
{
    let mut backoff = Backoff::new(&policy);

    loop {
        let store = match connect().await {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "round store connection failed");
                backoff.wait().await;
                continue;
            }
        };

        state.set_round_store(store.clone()).await;
        info!("round store connected; serving requests");
        backoff.reset();

        watch(&state, store.as_ref(), &policy).await;
        error!("round store lost; rebuilding the connection");
        backoff.wait().await;
    }
}

/// Poll the store until it fails and cannot be reconnected in place.
async fn watch(state: &SharedState, store: &dyn RoundStore, policy: &SupervisorPolicy) {
    loop {
        match store.health_check().await {
            Ok(()) => sleep(policy.health_poll_interval).await,
            Err(err) => {
                warn!(error = %err, "round store health check failed; degraded");
                state.update_degraded(true);
                if !reconnect(store, policy).await {
                    return;
                }
                info!("round store reconnected; leaving degraded mode");
                state.update_degraded(false);
            }
        }
    }
}

async fn reconnect(store: &dyn RoundStore, policy: &SupervisorPolicy) -> bool {
    let mut backoff = Backoff::new(policy);
    for attempt in 1..=policy.reconnect_attempts {
        match store.try_reconnect().await {
            Ok(()) => return true,
            Err(err) => {
                warn!(attempt, error = %err, "round store reconnect failed");
                backoff.wait().await;
            }
        }
    }
    false
}
