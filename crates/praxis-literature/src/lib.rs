//! praxis-literature
//!
//! Biomedical literature lookup against NCBI E-utilities (PubMed).
//!
//! [`source::LiteratureSource`] is the seam: [`client::PubMedClient`] talks
//! HTTP, tests substitute scripted sources. [`source::search_with_summaries`]
//! never fails; lookup errors are folded into the returned results.

pub mod client;
pub mod error;
pub mod pubmed;
pub mod source;
