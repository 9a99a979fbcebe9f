//! Version tags in the `major.minor.patch+build` form used by mobile projects
//!
//! The release triple follows semver shape rules, but the `+build` suffix is a
//! monotonically climbing upload counter, not semver build metadata: it takes
//! part in ordering (semver ignores build metadata, the stores do not).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A full app version: release triple plus numeric build counter.
///
/// Ordering is lexicographic on `(major, minor, patch)` with `build` as the
/// tie-break, which the derived `Ord` provides through field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionTag {
  pub major: u64,
  pub minor: u64,
  pub patch: u64,
  pub build: u64,
}

impl VersionTag {
  pub fn new(major: u64, minor: u64, patch: u64, build: u64) -> Self {
    Self {
      major,
      minor,
      patch,
      build,
    }
  }

  /// Parse `X.Y.Z+B` or bare `X.Y.Z` (build defaults to 1).
  ///
  /// The triple is validated through `semver::Version`; decorated versions
  /// (`1.2.3-rc.1`, `1.2.3+abc`) are rejected rather than reinterpreted.
  pub fn parse(input: &str) -> Result<Self, ParseError> {
    let trimmed = input.trim();
    let (triple, build) = match trimmed.split_once('+') {
      Some((triple, build)) => (triple, Some(build)),
      None => (trimmed, None),
    };

    let release = semver::Version::parse(triple.trim()).map_err(|e| ParseError {
      input: input.to_string(),
      reason: e.to_string(),
    })?;

    if !release.pre.is_empty() || !release.build.is_empty() {
      return Err(ParseError {
        input: input.to_string(),
        reason: "pre-release and metadata suffixes are not valid in a version tag".to_string(),
      });
    }

    let build = match build {
      Some(raw) => raw.trim().parse::<u64>().map_err(|_| ParseError {
        input: input.to_string(),
        reason: format!("build counter '{}' is not a non-negative integer", raw.trim()),
      })?,
      None => 1,
    };

    Ok(Self {
      major: release.major,
      minor: release.minor,
      patch: release.patch,
      build,
    })
  }

  /// The release triple without the build counter, e.g. `1.4.2`.
  pub fn release(&self) -> String {
    format!("{}.{}.{}", self.major, self.minor, self.patch)
  }

  /// Produce the next version for the given bump kind.
  ///
  /// Every bump advances the build counter; Major/Minor/Patch additionally
  /// move the triple and zero the lower components.
  pub fn bump(&self, kind: BumpKind) -> Self {
    match kind {
      BumpKind::Major => Self::new(self.major + 1, 0, 0, self.build + 1),
      BumpKind::Minor => Self::new(self.major, self.minor + 1, 0, self.build + 1),
      BumpKind::Patch => Self::new(self.major, self.minor, self.patch + 1, self.build + 1),
      BumpKind::Build | BumpKind::Auto => Self::new(self.major, self.minor, self.patch, self.build + 1),
    }
  }
}

impl fmt::Display for VersionTag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}.{}+{}", self.major, self.minor, self.patch, self.build)
  }
}

impl FromStr for VersionTag {
  type Err = ParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl Serialize for VersionTag {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.to_string())
  }
}

impl<'de> Deserialize<'de> for VersionTag {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Self::parse(&raw).map_err(serde::de::Error::custom)
  }
}

/// Malformed version string; always surfaced to the caller, never guessed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
  pub input: String,
  pub reason: String,
}

impl fmt::Display for ParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Invalid version '{}': {}", self.input, self.reason)
  }
}

impl std::error::Error for ParseError {}

/// Which component a bump advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpKind {
  /// Breaking release: new major, minor/patch reset
  Major,
  /// Feature release: new minor, patch reset
  Minor,
  /// Fix release: new patch
  Patch,
  /// Same triple, next build counter
  Build,
  /// Smallest move that clears the store version (build counter only)
  Auto,
}

impl BumpKind {
  pub fn parse(s: &str) -> Result<Self, String> {
    match s.to_lowercase().as_str() {
      "major" => Ok(Self::Major),
      "minor" => Ok(Self::Minor),
      "patch" => Ok(Self::Patch),
      "build" => Ok(Self::Build),
      "auto" => Ok(Self::Auto),
      _ => Err(format!(
        "Invalid bump kind '{}'. Valid options: major, minor, patch, build, auto",
        s
      )),
    }
  }
}

impl fmt::Display for BumpKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      BumpKind::Major => "major",
      BumpKind::Minor => "minor",
      BumpKind::Patch => "patch",
      BumpKind::Build => "build",
      BumpKind::Auto => "auto",
    };
    write!(f, "{}", label)
  }
}
