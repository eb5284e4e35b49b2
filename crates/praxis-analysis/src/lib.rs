//! praxis-analysis
//!
//! The completion pipeline run after a survey run is completed:
//! prompt assembly, search-query generation, literature lookup, evidence
//! synthesis, and persistence of one analysis per run. [`worker`] runs it
//! off the request path with bounded retries.

pub mod error;
pub mod pipeline;
pub mod prompt;
pub mod query;
pub mod synthesis;
pub mod worker;
