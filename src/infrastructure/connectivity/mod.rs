pub mod monitor;

pub use monitor::{probe_reached_remote, ConnectivityMonitor};
