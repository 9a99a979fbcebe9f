//! Descriptor adapters - format-specific version read/write
//!
//! One adapter per descriptor format:
//!
//! - **pubspec**: the manifest `version:` line (canonical source of truth)
//! - **gradle**: Android versionName/versionCode, Kotlin DSL or legacy Groovy
//! - **ios**: the Info.plist / project.pbxproj pair
//!
//! Adapters rewrite version fields by in-place textual substitution. All
//! surrounding content, comments and formatting survive a write, and writing
//! the version a file already carries leaves it byte-identical.

pub mod gradle;
pub mod ios;
pub mod pubspec;

use crate::core::error::ShipResult;
use crate::core::report::{Target, WriteOutcome};
use crate::version::VersionTag;

/// Format-specific access to one version-bearing target
pub trait DescriptorAdapter: Send + Sync {
  /// Which reconciliation target this adapter manages
  fn target(&self) -> Target;

  /// Read the current version.
  ///
  /// `Ok(None)` means the target holds no usable version right now (missing
  /// file, placeholder values). Malformed version literals are errors and
  /// are always surfaced, never guessed at.
  fn read(&self) -> ShipResult<Option<VersionTag>>;

  /// Write `version` into the target.
  ///
  /// Failures land in the outcome instead of an error so that one bad
  /// descriptor never aborts its siblings.
  fn write(&self, version: &VersionTag) -> WriteOutcome;
}

/// Whether a descriptor value is a build-time substitution marker.
///
/// Flutter templates wire versions through variables (`$(FLUTTER_BUILD_NAME)`
/// in Xcode files, `${flutter.versionName}` in gradle); those files are owned
/// by the build tooling and must never be overwritten.
pub fn is_placeholder(value: &str) -> bool {
  let trimmed = value.trim();
  trimmed.contains("$(") || trimmed.contains("${") || trimmed.starts_with('$')
}
