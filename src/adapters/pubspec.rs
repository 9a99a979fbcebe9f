//! Manifest adapter: the `version:` line of pubspec.yaml
//!
//! The manifest is the canonical fallback source of truth. Only the first
//! `version:` line is managed; every other byte of the file is preserved.

use crate::adapters::DescriptorAdapter;
use crate::core::error::{DescriptorError, ShipError, ShipResult};
use crate::core::report::{SkipReason, Target, WriteOutcome};
use crate::version::VersionTag;
use regex::{Captures, Regex};
use std::fs;
use std::path::PathBuf;

pub struct PubspecAdapter {
  path: PathBuf,
  version_line: Regex,
}

impl PubspecAdapter {
  pub fn new(path: PathBuf) -> Self {
    Self {
      path,
      version_line: Regex::new(r"(?m)^(version\s*:\s*)(.+)$").unwrap(),
    }
  }
}

impl DescriptorAdapter for PubspecAdapter {
  fn target(&self) -> Target {
    Target::Manifest
  }

  fn read(&self) -> ShipResult<Option<VersionTag>> {
    if !self.path.exists() {
      return Ok(None);
    }
    let content = fs::read_to_string(&self.path)?;

    let caps = self.version_line.captures(&content).ok_or_else(|| {
      ShipError::Descriptor(DescriptorError::NoVersionField {
        target: Target::Manifest,
        path: self.path.clone(),
      })
    })?;

    let tag = VersionTag::parse(caps[2].trim())?;
    Ok(Some(tag))
  }

  fn write(&self, version: &VersionTag) -> WriteOutcome {
    if !self.path.exists() {
      return WriteOutcome::Skipped {
        reason: SkipReason::MissingFile,
      };
    }

    let content = match fs::read_to_string(&self.path) {
      Ok(content) => content,
      Err(e) => {
        return WriteOutcome::Failed { error: e.to_string() };
      }
    };

    let Some(caps) = self.version_line.captures(&content) else {
      return WriteOutcome::Failed {
        error: format!("{} has no version: line", self.path.display()),
      };
    };
    let previous = VersionTag::parse(caps[2].trim()).ok();

    let rewritten = self
      .version_line
      .replace(&content, |caps: &Captures| format!("{}{}", &caps[1], version))
      .into_owned();

    if rewritten == content {
      return WriteOutcome::Unchanged;
    }

    match fs::write(&self.path, rewritten) {
      Ok(()) => WriteOutcome::Updated { previous },
      Err(e) => WriteOutcome::Failed { error: e.to_string() },
    }
  }
}
