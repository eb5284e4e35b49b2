//! praxis-survey
//!
//! Survey execution rules. Pure logic, no I/O: import validation of survey
//! documents, step navigation with branch overrides, answer validation, and
//! the run state machine.
//!
//! Everything here operates on `praxis-core` types and returns new values;
//! persistence and dispatch are the caller's job.

pub mod answer;
pub mod error;
pub mod import;
pub mod navigation;
pub mod run;
