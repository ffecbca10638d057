//! depcache-lib: Dependency resolution caching and lock files
//!
//! This crate sits between a build's dependency declarations and an
//! external module resolver:
//! - `resolution`: the resolver boundary and the fingerprint of its inputs
//! - `lock`: lock files pinning a resolution for reproducible builds
//! - `cache`: memoization of resolver output, invalidated by content and file stamps
//! - `update`: one resolution step composing all of the above

pub mod cache;
pub mod consts;
pub mod lock;
pub mod log;
pub mod paths;
pub mod resolution;
pub mod store;
pub mod update;
pub mod util;
