//! praxis-service
//!
//! Orchestration of survey runs: [`service::SurveyService`] ties the record
//! store, answer validation, navigation, the run state machine, subject
//! hashing and completion dispatch together. [`state::AppState`] wires those
//! parts from a [`config::PraxisConfig`].

pub mod config;
pub mod error;
pub mod service;
pub mod state;
