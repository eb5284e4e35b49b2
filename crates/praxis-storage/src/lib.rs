//! praxis-storage
//!
//! Object persistence. An [`store::ObjectStore`] trait with an S3
//! implementation (conditional writes via ETag) and an in-memory one, plus
//! [`records::RecordStore`] which maps domain records onto object keys.

pub mod client;
pub mod error;
pub mod memory;
pub mod objects;
pub mod records;
pub mod store;
