pub mod query;
pub mod snapshot;
