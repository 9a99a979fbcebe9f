//! Unified project context - build once, pass everywhere
//!
//! ProjectContext resolves the project root, configuration, and descriptor
//! paths a single time in main.rs, then travels by reference through every
//! command. Commands never re-probe the filesystem for paths the context
//! already settled.

use crate::core::config::{GRADLE_CANDIDATES, ShipConfig};
use crate::core::error::{ResultExt, ShipResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared project-level state for one invocation.
///
/// Descriptor paths are resolved to absolute paths here; the gradle file is
/// probed through its candidate list exactly once, so Gathering and Writing
/// operate on the same file even if the tree changes mid-run.
#[derive(Clone)]
pub struct ProjectContext {
  /// Project root directory (absolute path)
  pub root: PathBuf,

  /// shipver configuration (shipver.toml), shared across commands
  pub config: Arc<ShipConfig>,

  /// Absolute path of the manifest (pubspec.yaml)
  pub manifest_path: PathBuf,

  /// Absolute path of the gradle descriptor; configured path, or the first
  /// existing candidate, or the primary candidate when none exists yet
  pub gradle_path: PathBuf,

  /// Absolute paths of the two iOS descriptors
  pub ios_plist_path: PathBuf,
  pub ios_pbxproj_path: PathBuf,
}

impl ProjectContext {
  /// Build project context from a root directory.
  ///
  /// Fails when shipver.toml is missing or invalid; commands that run
  /// without config (init) do not build a context.
  pub fn build(project_root: &Path) -> ShipResult<Self> {
    let root = project_root
      .canonicalize()
      .with_context(|| format!("Cannot resolve project root {}", project_root.display()))?;
    let config = Arc::new(ShipConfig::load(&root)?);

    let manifest_path = root.join(&config.paths.manifest);
    let gradle_path = Self::resolve_gradle_path(&root, &config);
    let ios_plist_path = root.join(&config.paths.ios_plist);
    let ios_pbxproj_path = root.join(&config.paths.ios_pbxproj);

    Ok(Self {
      root,
      config,
      manifest_path,
      gradle_path,
      ios_plist_path,
      ios_pbxproj_path,
    })
  }

  fn resolve_gradle_path(root: &Path, config: &ShipConfig) -> PathBuf {
    if let Some(ref configured) = config.paths.android {
      return root.join(configured);
    }

    for candidate in GRADLE_CANDIDATES {
      let path = root.join(candidate);
      if path.exists() {
        return path;
      }
    }

    root.join(GRADLE_CANDIDATES[0])
  }

  /// Directory for shipver run state (lock file, observation cache)
  pub fn state_dir(&self) -> PathBuf {
    self.root.join(".shipver")
  }

  /// Path of the advisory project lock
  pub fn lock_path(&self) -> PathBuf {
    self.state_dir().join("lock")
  }

  /// Path of the observed-version cache
  pub fn cache_path(&self) -> PathBuf {
    self.state_dir().join("cache.json")
  }
}
