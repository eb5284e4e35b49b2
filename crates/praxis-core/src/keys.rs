//! Object key conventions.
//!
//! Pure string functions. These define the canonical layout of records in
//! the Praxis object store.

use uuid::Uuid;

pub fn survey(id: Uuid) -> String {
    format!("surveys/{id}.json")
}

/// The run record: run state plus its response set, written as one object.
pub fn run(id: Uuid) -> String {
    format!("runs/{id}/run.json")
}

/// The completion analysis lives beside the run so pipeline writes never
/// race with run state writes.
pub fn run_analysis(id: Uuid) -> String {
    format!("runs/{id}/analysis.json")
}
