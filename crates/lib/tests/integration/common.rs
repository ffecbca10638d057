//! Shared helpers for update integration tests.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use depcache_lib::consts::LOCK_FILENAME;
use depcache_lib::log::Logger;
use depcache_lib::resolution::resolver::Resolver;
use depcache_lib::resolution::{
  Artifact, InlineSettings, LogicalClock, ModuleId, ModuleReport, ModuleSettings, Repository, ResolutionConfig,
  ResolutionInput, ResolveRequest, ResolvedArtifact, UnresolvedWarning, UnresolvedWarningConfig, UpdateConfiguration,
  UpdateReport,
};
use depcache_lib::store::{DirectoryStoreFactory, FileStore};
use depcache_lib::update::{UpdateError, UpdateOptions, UpdateOutcome, update};
use tempfile::TempDir;

/// Resolution input declaring `orgA:libX:1.2.3` for target version `target`.
pub fn input(target: &str) -> ResolutionInput {
  ResolutionInput::new(
    UpdateConfiguration::default(),
    ModuleSettings::Inline(InlineSettings {
      project: ModuleId::new("com.example", "app", "0.1.0"),
      dependencies: vec![ModuleId::new("orgA", "libX", "1.2.3")],
      target_version: Some(target.to_string()),
    }),
    ResolutionConfig {
      repositories: vec![Repository::new("central", "https://repo1.example/maven2")],
      offline: false,
    },
  )
}

/// Resolver double that "downloads" libX into a local repository directory.
pub struct MockResolver {
  repo: PathBuf,
  calls: Cell<usize>,
  requests: RefCell<Vec<ResolveRequest>>,
  seen_clock: Cell<Option<LogicalClock>>,
  seen_dep_dir: RefCell<Option<PathBuf>>,
}

impl MockResolver {
  pub fn new(repo: PathBuf) -> Self {
    Self {
      repo,
      calls: Cell::new(0),
      requests: RefCell::new(Vec::new()),
      seen_clock: Cell::new(None),
      seen_dep_dir: RefCell::new(None),
    }
  }

  pub fn calls(&self) -> usize {
    self.calls.get()
  }

  pub fn last_request(&self) -> Option<ResolveRequest> {
    self.requests.borrow().last().cloned()
  }

  pub fn seen_clock(&self) -> Option<LogicalClock> {
    self.seen_clock.get()
  }

  pub fn seen_dep_dir(&self) -> Option<PathBuf> {
    self.seen_dep_dir.borrow().clone()
  }

  pub fn artifact_path(&self, file: &str) -> PathBuf {
    self.repo.join(file)
  }

  fn fetch(&self, file: &str, contents: &str) -> PathBuf {
    let path = self.artifact_path(file);
    if !path.exists() {
      fs::write(&path, contents).unwrap();
    }
    path
  }
}

impl Resolver for MockResolver {
  fn resolve(
    &self,
    request: &ResolveRequest,
    _resolution: &ResolutionConfig,
    _diagnostics: &UnresolvedWarningConfig,
    clock: LogicalClock,
    dep_dir: Option<&Path>,
    log: &dyn Logger,
  ) -> Result<UpdateReport, UnresolvedWarning> {
    self.calls.set(self.calls.get() + 1);
    self.requests.borrow_mut().push(request.clone());
    self.seen_clock.set(Some(clock));
    *self.seen_dep_dir.borrow_mut() = dep_dir.map(Path::to_path_buf);
    log.verbose("mock resolver: resolving orgA:libX:1.2.3");

    fs::create_dir_all(&self.repo).unwrap();
    let classes = self.fetch("libX-1.2.3.jar", "classes");
    let sources = self.fetch("libX-1.2.3-sources.jar", "sources");
    let descriptor = self.fetch("resolved-app.xml", "<ivy-module/>");

    Ok(UpdateReport::new(
      descriptor,
      vec![ModuleReport::new(
        ModuleId::new("orgA", "libX", "1.2.3"),
        vec![
          ResolvedArtifact {
            artifact: Artifact::jar("libX"),
            file: classes,
            checksum: "abc123".to_string(),
          },
          ResolvedArtifact {
            artifact: Artifact::jar("libX").with_classifier("sources"),
            file: sources,
            checksum: "def456".to_string(),
          },
        ],
      )],
    ))
  }
}

/// Isolated on-disk environment: a project directory holding the lock file,
/// a cache directory and a local artifact repository.
pub struct TestEnv {
  pub temp: TempDir,
  pub resolver: MockResolver,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let resolver = MockResolver::new(temp.path().join("repo"));
    Self { temp, resolver }
  }

  pub fn lock_path(&self) -> PathBuf {
    self.temp.path().join("project").join(LOCK_FILENAME)
  }

  pub fn cache_dir(&self) -> PathBuf {
    self.temp.path().join("cache")
  }

  pub fn read_lock(&self) -> String {
    fs::read_to_string(self.lock_path()).unwrap()
  }

  /// Run one update with default options.
  pub fn update(&self, input: &ResolutionInput, log: &dyn Logger) -> Result<UpdateOutcome, UpdateError> {
    self.update_with(input, &UpdateOptions::default(), log)
  }

  pub fn update_with(
    &self,
    input: &ResolutionInput,
    options: &UpdateOptions,
    log: &dyn Logger,
  ) -> Result<UpdateOutcome, UpdateError> {
    let factory = DirectoryStoreFactory::new(self.cache_dir());
    update(
      input,
      Box::new(FileStore::new(self.lock_path())),
      &factory,
      &self.resolver,
      &[],
      options,
      log,
    )
  }
}
