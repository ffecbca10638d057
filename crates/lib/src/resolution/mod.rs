//! Resolution inputs, outputs and the resolver boundary.
//!
//! # Modules
//!
//! - [`types`] - Inputs, requests, and update reports
//! - [`fingerprint`] - Stable hashes of resolution inputs
//! - [`resolver`] - Traits for the external resolver and reporters

pub mod fingerprint;
pub mod resolver;
mod types;

pub use types::*;
