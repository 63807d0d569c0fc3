use crate::application::ports::{ConnectivityProvider, RemoteError, RemoteStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Online/offline state published over a watch channel.
///
/// The state is set either explicitly (`set_online`, e.g. from an OS signal or
/// the `--offline` flag) or by the probe loop polling the remote health check.
pub struct ConnectivityMonitor {
    state: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Arc<Self> {
        let (state, _) = watch::channel(initially_online);
        Arc::new(Self { state })
    }

    /// Publishes `online`; returns whether this was a transition.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.state.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if changed {
            if online {
                tracing::info!(target: "connectivity", "offline -> online");
            } else {
                tracing::warn!(target: "connectivity", "online -> offline");
            }
        }
        changed
    }

    /// Polls `remote.health_check()` every `interval` and publishes the result.
    pub fn spawn_probe(
        self: &Arc<Self>,
        remote: Arc<dyn RemoteStore>,
        interval: Duration,
    ) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let result = remote.health_check().await;
                if let Err(err) = &result {
                    tracing::debug!(
                        target: "connectivity",
                        error = %err,
                        "health probe failed"
                    );
                }
                monitor.set_online(probe_reached_remote(&result));
            }
        })
    }
}

/// Only transport-level failures mean offline. A server that answers with a
/// non-retryable error is reachable.
pub fn probe_reached_remote(result: &Result<(), RemoteError>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => !err.is_retryable(),
    }
}

impl ConnectivityProvider for ConnectivityMonitor {
    fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}
