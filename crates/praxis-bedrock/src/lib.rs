//! praxis-bedrock
//!
//! Text completion over the Bedrock Converse API, behind the
//! [`completion::TextCompletion`] trait so the analysis pipeline can be
//! driven by a scripted model in tests.

pub mod completion;
pub mod error;
pub mod tokens;
