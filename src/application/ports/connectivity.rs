use tokio::sync::watch;

/// Online/offline signal. Only the sync orchestrator and scheduler consult it.
pub trait ConnectivityProvider: Send + Sync {
    fn is_online(&self) -> bool;

    /// Receiver that observes every online/offline transition.
    fn subscribe(&self) -> watch::Receiver<bool>;
}
