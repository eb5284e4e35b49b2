//! praxis-core
//!
//! Pure domain types, storage key conventions, and subject hashing.
//! No AWS SDK dependency. This is the shared vocabulary of the Praxis system.

pub mod error;
pub mod keys;
pub mod models;
pub mod subject;
