//! Lock file behavior across repeated updates on disk.

use std::fs;

use depcache_lib::cache::CacheStatus;
use depcache_lib::lock::{LockError, LockFileContent, LockFileStore};
use depcache_lib::log::{Level, MemoryLogger};
use depcache_lib::resolution::LogicalClock;
use depcache_lib::resolution::fingerprint::fingerprint;
use depcache_lib::update::{UpdateError, UpdateOptions};
use depcache_lib::util::canonical::from_canonical_str;

use super::common::{TestEnv, input};

#[test]
fn first_update_writes_canonical_lock_file() {
  let env = TestEnv::new();
  let log = MemoryLogger::new();
  let input = input("2.13.8");

  let outcome = env.update(&input, &log).unwrap();

  assert!(outcome.lock_written);
  let hash = fingerprint(&input, &log).unwrap();
  let text = env.read_lock();
  assert!(text.starts_with(&format!("{{\n  \"version\": \"1\",\n  \"hash\": \"{}\",\n  \"modules\": {{\n", hash)));
  assert!(text.contains(
    "    \"2.13.8\": [{\"module\": {\"organization\": \"orgA\", \"name\": \"libX\", \"revision\": \"1.2.3\", \
     \"transitive\": true, \"force\": false, \"changing\": false}, \"artifacts\": [\
     {\"artifact\": {\"name\": \"libX\", \"type\": \"jar\", \"extension\": \"jar\"}, \"checksum\": \"abc123\"}, \
     {\"artifact\": {\"name\": \"libX\", \"type\": \"jar\", \"extension\": \"jar\", \"classifier\": \"sources\"}, \"checksum\": \"def456\"}]}]"
  ));
  assert!(text.ends_with("\n  }\n}"));

  let content: LockFileContent = from_canonical_str(&text).unwrap();
  assert_eq!(content.hash, hash);
  assert_eq!(content.module_count(), 1);
}

#[test]
fn rerun_reuses_cached_resolution_without_rewriting() {
  let env = TestEnv::new();
  let log = MemoryLogger::new();
  let input = input("2.13.8");
  let first = env.update(&input, &log).unwrap();
  let written = env.read_lock();

  let outcome = env.update(&input, &log).unwrap();

  assert!(outcome.pinned);
  assert!(outcome.frozen);
  assert!(!outcome.lock_written);
  assert_eq!(outcome.status, CacheStatus::Hit);
  assert_eq!(outcome.report, first.report);
  assert_eq!(env.resolver.calls(), 1);
  assert_eq!(env.read_lock(), written);
  assert!(log.contains(Level::Info, "Applying dependency lock file"));
}

#[test]
fn forced_rerun_passes_pinned_request_to_resolver() {
  let env = TestEnv::new();
  let log = MemoryLogger::new();
  let input = input("2.13.8");
  env.update(&input, &log).unwrap();
  let written = env.read_lock();

  let options = UpdateOptions {
    force: true,
    clock: LogicalClock(42),
    dep_dir: Some(env.temp.path().join("deps")),
    ..UpdateOptions::default()
  };
  let outcome = env.update_with(&input, &options, &log).unwrap();

  assert_eq!(outcome.status, CacheStatus::Miss);
  assert_eq!(env.resolver.calls(), 2);
  assert_eq!(env.read_lock(), written);

  let request = env.resolver.last_request().unwrap();
  let pinned = &request.module_settings.as_inline().unwrap().dependencies;
  assert_eq!(pinned.len(), 1);
  assert!(!pinned[0].transitive);
  assert!(pinned[0].force);
  assert!(request.configuration.frozen);
  assert_eq!(env.resolver.seen_clock(), Some(LogicalClock(42)));
  assert_eq!(env.resolver.seen_dep_dir(), Some(env.temp.path().join("deps")));
}

#[test]
fn deleted_lock_file_is_written_again() {
  let env = TestEnv::new();
  let log = MemoryLogger::new();
  let input = input("2.13.8");
  env.update(&input, &log).unwrap();
  let written = env.read_lock();
  fs::remove_file(env.lock_path()).unwrap();

  let outcome = env.update(&input, &log).unwrap();

  assert!(outcome.lock_written);
  assert_eq!(env.read_lock(), written);
}

#[test]
fn changed_inputs_leave_stale_lock_untouched() {
  let env = TestEnv::new();
  let log = MemoryLogger::new();
  env.update(&input("2.13.8"), &log).unwrap();
  let written = env.read_lock();

  let outcome = env.update(&input("2.13.9"), &log).unwrap();

  assert!(!outcome.pinned);
  assert!(!outcome.lock_written);
  assert_eq!(env.read_lock(), written);
  assert!(log.contains(Level::Warn, "out of date"));
}

#[test]
fn reformatted_lock_file_is_still_fresh() {
  let env = TestEnv::new();
  let log = MemoryLogger::new();
  let input = input("2.13.8");
  env.update(&input, &log).unwrap();

  // any conforming JSON layout reads back the same
  let content: LockFileContent = from_canonical_str(&env.read_lock()).unwrap();
  fs::write(env.lock_path(), serde_json::to_string(&content).unwrap()).unwrap();

  let store = LockFileStore::at_path(env.lock_path());
  assert_eq!(store.get_up_to_date(&input, &log).unwrap(), Some(content));
  store.close();

  let outcome = env.update(&input, &log).unwrap();
  assert!(outcome.pinned);
}

#[test]
fn garbage_lock_file_reads_as_absent() {
  let env = TestEnv::new();
  let log = MemoryLogger::new();
  fs::create_dir_all(env.lock_path().parent().unwrap()).unwrap();
  fs::write(env.lock_path(), "not a lock file").unwrap();

  let store = LockFileStore::at_path(env.lock_path());
  assert!(store.read().is_none());
  assert!(store.get_up_to_date(&input("2.13.8"), &log).unwrap().is_none());
}

#[test]
fn lock_missing_target_version_fails_update() {
  let env = TestEnv::new();
  let log = MemoryLogger::new();
  let input = input("3.3.1");
  let hash = fingerprint(&input, &log).unwrap();
  let store = LockFileStore::at_path(env.lock_path());
  store
    .write(&LockFileContent::new(hash).with_modules("2.13.8", vec![]))
    .unwrap();
  store.close();

  let result = env.update(&input, &log);

  match result {
    Err(UpdateError::Lock(LockError::MissingLockedVersion { version, available })) => {
      assert_eq!(version, "3.3.1");
      assert_eq!(available, vec!["2.13.8".to_string()]);
    }
    other => panic!("expected MissingLockedVersion, got {:?}", other.map(|o| o.status)),
  }
  assert_eq!(env.resolver.calls(), 0);
}
