//! Shared utilities.
//!
//! Canonical encoding and content hashing used by fingerprints, the lock
//! file and the resolution cache.

pub mod canonical;
pub mod hash;
