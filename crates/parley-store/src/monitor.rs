use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::state::ConnectionState;
use crate::store::ChatHistoryStore;

/// Background task that keeps the store's health flag honest.
///
/// On every tick a connected store is pinged and a disconnected or failed
/// one is reconnected. A store that was explicitly shut down is left
/// alone.
pub struct HealthMonitor {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl HealthMonitor {
    /// Start monitoring at the interval from the store's config.
    pub fn start(store: Arc<ChatHistoryStore>) -> Self {
        let interval = store.config().health_interval();
        Self::spawn(store, interval)
    }

    pub fn spawn(store: Arc<ChatHistoryStore>, interval: Duration) -> Self {
        let (stop, mut stopped) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        check_once(&store).await;
                    }
                    _ = stopped.changed() => break,
                }
            }
            tracing::debug!("health monitor stopped");
        });
        Self { stop, handle }
    }

    /// Stop the task and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "health monitor task failed");
        }
    }
}

/// One health check pass. Returns the state afterwards.
pub async fn check_once(store: &ChatHistoryStore) -> ConnectionState {
    if store.is_closed() {
        return store.connection_state();
    }
    match store.connection_state() {
        ConnectionState::Connected => {
            store.ping().await;
        }
        ConnectionState::Disconnected | ConnectionState::Error => {
            tracing::debug!("attempting cache reconnect");
            store.connect().await;
        }
        ConnectionState::Connecting => {}
    }
    store.connection_state()
}
