//! Resolution cache behavior through the file-backed stores.

use std::fs;
use std::time::{Duration, SystemTime};

use depcache_lib::cache::{CacheError, CacheStatus};
use depcache_lib::consts::{CACHE_DIR_ENV, INPUTS_SLOT, OUTPUT_SLOT};
use depcache_lib::log::{Level, MemoryLogger};
use depcache_lib::store::DirectoryStoreFactory;
use depcache_lib::update::{UpdateError, UpdateOptions};
use serial_test::serial;

use super::common::{TestEnv, input};

fn touch(path: &std::path::Path, secs: u64) {
  let file = fs::OpenOptions::new().write(true).open(path).unwrap();
  file
    .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    .unwrap();
}

#[test]
fn slots_are_files_under_cache_dir() {
  let env = TestEnv::new();
  let log = MemoryLogger::new();

  env.update(&input("2.13.8"), &log).unwrap();

  assert!(env.cache_dir().join(INPUTS_SLOT).is_file());
  assert!(env.cache_dir().join(OUTPUT_SLOT).is_file());
}

#[test]
fn unchanged_inputs_skip_resolver() {
  let env = TestEnv::new();
  let log = MemoryLogger::new();
  env.update(&input("2.13.8"), &log).unwrap();
  fs::remove_file(env.lock_path()).unwrap();

  let outcome = env.update(&input("2.13.8"), &log).unwrap();

  assert_eq!(outcome.status, CacheStatus::Hit);
  assert_eq!(env.resolver.calls(), 1);
  assert!(outcome.lock_written);
}

#[test]
fn modified_artifact_triggers_resolution() {
  let env = TestEnv::new();
  let log = MemoryLogger::new();
  env.update(&input("2.13.8"), &log).unwrap();
  env.update(&input("2.13.8"), &log).unwrap();
  assert_eq!(env.resolver.calls(), 1);

  touch(&env.resolver.artifact_path("libX-1.2.3-sources.jar"), 1_234_567);
  let outcome = env.update(&input("2.13.8"), &log).unwrap();

  assert_eq!(outcome.status, CacheStatus::Miss);
  assert!(outcome.pinned);
  assert_eq!(env.resolver.calls(), 2);
}

#[test]
fn force_and_deps_updated_always_resolve() {
  let env = TestEnv::new();
  let log = MemoryLogger::new();
  env.update(&input("2.13.8"), &log).unwrap();
  fs::remove_file(env.lock_path()).unwrap();

  let forced = UpdateOptions {
    force: true,
    skip: true,
    ..UpdateOptions::default()
  };
  env.update_with(&input("2.13.8"), &forced, &log).unwrap();
  fs::remove_file(env.lock_path()).unwrap();

  let updated = UpdateOptions {
    deps_updated: true,
    ..UpdateOptions::default()
  };
  let outcome = env.update_with(&input("2.13.8"), &updated, &log).unwrap();

  assert_eq!(outcome.status, CacheStatus::Miss);
  assert_eq!(env.resolver.calls(), 3);
}

#[test]
fn corrupt_output_slot_recovers_with_diagnostics() {
  let env = TestEnv::new();
  let log = MemoryLogger::new();
  env.update(&input("2.13.8"), &log).unwrap();
  fs::remove_file(env.lock_path()).unwrap();
  fs::write(env.cache_dir().join(OUTPUT_SLOT), "{\"stamps\": [").unwrap();

  let outcome = env.update(&input("2.13.8"), &log).unwrap();

  assert_eq!(outcome.status, CacheStatus::Recovered);
  assert_eq!(env.resolver.calls(), 2);
  assert!(log.contains(Level::Warn, "Resolution caching failed"));
  assert!(log.contains(Level::Warn, "libX-sources.jar (jar) [def456]"));
  assert!(log.messages(Level::Error).is_empty());
  assert!(outcome.lock_written);
}

#[test]
fn skip_reuses_output_even_if_files_changed() {
  let env = TestEnv::new();
  let log = MemoryLogger::new();
  env.update(&input("2.13.8"), &log).unwrap();
  fs::remove_file(env.resolver.artifact_path("libX-1.2.3.jar")).unwrap();

  let skip = UpdateOptions {
    skip: true,
    ..UpdateOptions::default()
  };
  let outcome = env.update_with(&input("2.13.8"), &skip, &log).unwrap();

  assert_eq!(outcome.status, CacheStatus::Skipped);
  assert_eq!(env.resolver.calls(), 1);
}

#[test]
fn skip_on_fresh_cache_dir_fails() {
  let env = TestEnv::new();
  let log = MemoryLogger::new();
  let skip = UpdateOptions {
    skip: true,
    ..UpdateOptions::default()
  };

  let result = env.update_with(&input("2.13.8"), &skip, &log);

  assert!(matches!(result, Err(UpdateError::Cache(CacheError::SkipWithoutHistory))));
  assert!(!env.lock_path().exists());
}

#[test]
#[serial]
fn default_location_follows_environment() {
  let env = TestEnv::new();
  temp_env::with_var(CACHE_DIR_ENV, Some(env.cache_dir()), || {
    assert_eq!(DirectoryStoreFactory::default_location().base(), env.cache_dir());
  });
}
