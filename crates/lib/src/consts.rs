//! Crate-wide constants.

/// Application name used for default directories.
pub const APP_NAME: &str = "depcache";

/// Environment variable overriding the default cache directory.
pub const CACHE_DIR_ENV: &str = "DEPCACHE_CACHE_DIR";

/// Number of hex characters kept from a fingerprint digest.
///
/// Matches the length of a git/SHA-1 object id.
pub const FINGERPRINT_LEN: usize = 40;

/// Indentation unit of the canonical text format.
pub const INDENT: &[u8] = b"  ";

/// Persistent store slot holding the last fingerprint and raw inputs.
pub const INPUTS_SLOT: &str = "inputs";

/// Persistent store slot holding the last resolved output and its file stamps.
pub const OUTPUT_SLOT: &str = "output";

/// Revision suffixes marking a module whose content may change under a fixed version.
pub const MUTABLE_VERSION_MARKERS: &[&str] = &["-SNAPSHOT"];

/// Current lock file format version.
pub const LOCK_FORMAT_VERSION: &str = "1";

/// Default lock file name.
pub const LOCK_FILENAME: &str = "deps.lock";
