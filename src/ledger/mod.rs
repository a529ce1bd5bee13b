//! Persisted record of what has already been organized under a root.

pub mod format;
pub mod store;

pub use store::Ledger;
