pub mod change_notifier;
pub mod connectivity;
pub mod local_store;
pub mod remote_store;

pub use change_notifier::ChangeNotifier;
pub use connectivity::ConnectivityProvider;
pub use local_store::{HydrationWrite, MetadataStore, RecordStore, SyncQueueStore};
pub use remote_store::{RemoteError, RemoteStore};
