use crate::application::ports::ConnectivityProvider;
use crate::application::services::SyncOrchestrator;
use crate::domain::entities::DrainOutcome;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Background task that drains the sync queue when the device comes back
/// online and on a fixed interval.
pub struct SyncScheduler {
    shutdown: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SyncScheduler {
    pub fn spawn(
        orchestrator: Arc<SyncOrchestrator>,
        connectivity: Arc<dyn ConnectivityProvider>,
        interval: Duration,
    ) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let mut online_rx = connectivity.subscribe();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(
                target: "sync::scheduler",
                interval_secs = interval.as_secs(),
                "sync scheduler started"
            );

            loop {
                let trigger = tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    changed = online_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        if !*online_rx.borrow_and_update() {
                            continue;
                        }
                        "reconnect"
                    }
                    _ = ticker.tick() => "interval",
                };

                run_drain(&orchestrator, trigger).await;
            }

            tracing::info!(target: "sync::scheduler", "sync scheduler stopped");
        });

        Self {
            shutdown,
            handle: Mutex::new(Some(handle)),
        }
    }

    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.lock().await.take() {
            if let Err(err) = handle.await {
                tracing::warn!(
                    target: "sync::scheduler",
                    error = %err,
                    "scheduler task ended abnormally"
                );
            }
        }
    }
}

async fn run_drain(orchestrator: &SyncOrchestrator, trigger: &'static str) {
    let started = Instant::now();
    match orchestrator.drain().await {
        Ok(DrainOutcome::Completed(report)) => {
            tracing::info!(
                target: "sync::scheduler",
                trigger,
                applied = report.applied,
                retained = report.retained,
                rejected = report.rejected.len(),
                duration_ms = started.elapsed().as_millis() as u64,
                "scheduled drain completed"
            );
        }
        Ok(outcome) => {
            tracing::debug!(
                target: "sync::scheduler",
                trigger,
                ?outcome,
                "scheduled drain skipped"
            );
        }
        Err(err) => {
            tracing::error!(
                target: "sync::scheduler",
                trigger,
                error = %err,
                "scheduled drain failed"
            );
        }
    }
}
