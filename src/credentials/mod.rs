//! Per-host credential persistence.
//!
//! Credentials live in a single JSON file holding one record per API host.
//! Files written before the format was versioned are migrated on first read.

pub mod envelope;
pub mod migrate;
pub mod store;

pub use envelope::UserRecord;
pub use store::CredentialStore;
