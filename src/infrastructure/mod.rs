pub mod connectivity;
pub mod database;
pub mod jobs;
pub mod remote;
pub mod storage;
