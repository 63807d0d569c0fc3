pub mod http_remote;
pub mod offline_remote;

pub use http_remote::HttpRemoteStore;
pub use offline_remote::OfflineRemoteStore;
