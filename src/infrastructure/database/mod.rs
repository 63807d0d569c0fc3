pub mod local_database;
pub mod writer_lease;

pub use local_database::LocalDatabase;
pub use writer_lease::{LeaseError, WriterLease};
