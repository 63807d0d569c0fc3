pub mod fake_remote;

pub use fake_remote::{FakeRemoteStore, RemoteCall};
