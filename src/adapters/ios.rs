//! iOS descriptor adapter: Info.plist and project.pbxproj as one target
//!
//! The version for an iOS app lives in two places. Info.plist carries
//! CFBundleShortVersionString / CFBundleVersion, and the Xcode project file
//! carries MARKETING_VERSION / CURRENT_PROJECT_VERSION once per build
//! configuration. Reads prefer plist literals and fall back to the project
//! file. Writes go to both files, but a file whose managed values are
//! build-time placeholders (the stock Flutter plist uses
//! `$(FLUTTER_BUILD_NAME)`) is left byte for byte untouched. The two
//! per-file results fold into a single outcome for the target.

use crate::adapters::{DescriptorAdapter, is_placeholder};
use crate::core::error::ShipResult;
use crate::core::report::{SkipReason, Target, WriteOutcome};
use crate::version::VersionTag;
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};

pub struct IosAdapter {
  plist_path: PathBuf,
  pbxproj_path: PathBuf,
  plist_short: Regex,
  plist_build: Regex,
  pbx_marketing: Regex,
  pbx_current: Regex,
}

impl IosAdapter {
  pub fn new(plist_path: PathBuf, pbxproj_path: PathBuf) -> Self {
    Self {
      plist_path,
      pbxproj_path,
      plist_short: Regex::new(
        r"(<key>CFBundleShortVersionString</key>\s*<string>)([^<]*)(</string>)",
      )
      .unwrap(),
      plist_build: Regex::new(r"(<key>CFBundleVersion</key>\s*<string>)([^<]*)(</string>)")
        .unwrap(),
      pbx_marketing: Regex::new(r"(?m)(MARKETING_VERSION\s*=\s*)([^;]+)(;)").unwrap(),
      pbx_current: Regex::new(r"(?m)(CURRENT_PROJECT_VERSION\s*=\s*)([^;]+)(;)").unwrap(),
    }
  }

  fn read_if_present(path: &Path) -> ShipResult<Option<String>> {
    if !path.exists() {
      return Ok(None);
    }
    Ok(Some(fs::read_to_string(path)?))
  }

  /// First matched value, only if it is a literal rather than a placeholder.
  fn literal(pattern: &Regex, content: Option<&str>) -> Option<String> {
    let value = pattern.captures(content?)?[2].trim().trim_matches('"').to_string();
    if is_placeholder(&value) { None } else { Some(value) }
  }

  /// Values a file carries for the managed keys, placeholders included.
  fn managed_values<'c>(content: &'c str, patterns: [&Regex; 2]) -> Vec<&'c str> {
    patterns
      .iter()
      .flat_map(|pattern| pattern.captures_iter(content))
      .map(|caps| caps.get(2).map_or("", |m| m.as_str()))
      .collect()
  }

  fn write_plist(&self, version: &VersionTag) -> WriteOutcome {
    if !self.plist_path.exists() {
      return WriteOutcome::Skipped {
        reason: SkipReason::MissingFile,
      };
    }
    let content = match fs::read_to_string(&self.plist_path) {
      Ok(content) => content,
      Err(e) => {
        return WriteOutcome::Failed { error: e.to_string() };
      }
    };

    let values = Self::managed_values(&content, [&self.plist_short, &self.plist_build]);
    if values.is_empty() || values.iter().any(|value| is_placeholder(value)) {
      return WriteOutcome::Skipped {
        reason: SkipReason::Placeholder,
      };
    }

    let release = version.release();
    let rewritten = self
      .plist_short
      .replace(&content, |caps: &Captures| {
        format!("{}{}{}", &caps[1], release, &caps[3])
      })
      .into_owned();
    let rewritten = self
      .plist_build
      .replace(&rewritten, |caps: &Captures| {
        format!("{}{}{}", &caps[1], version.build, &caps[3])
      })
      .into_owned();

    if rewritten == content {
      return WriteOutcome::Unchanged;
    }
    match fs::write(&self.plist_path, rewritten) {
      Ok(()) => WriteOutcome::Updated { previous: None },
      Err(e) => WriteOutcome::Failed { error: e.to_string() },
    }
  }

  fn write_pbxproj(&self, version: &VersionTag) -> WriteOutcome {
    if !self.pbxproj_path.exists() {
      return WriteOutcome::Skipped {
        reason: SkipReason::MissingFile,
      };
    }
    let content = match fs::read_to_string(&self.pbxproj_path) {
      Ok(content) => content,
      Err(e) => {
        return WriteOutcome::Failed { error: e.to_string() };
      }
    };

    let values = Self::managed_values(&content, [&self.pbx_marketing, &self.pbx_current]);
    if values.is_empty() || values.iter().any(|value| is_placeholder(value)) {
      return WriteOutcome::Skipped {
        reason: SkipReason::Placeholder,
      };
    }

    // Every build configuration carries its own copy of both settings.
    let release = version.release();
    let rewritten = self
      .pbx_marketing
      .replace_all(&content, |caps: &Captures| {
        format!("{}{}{}", &caps[1], release, &caps[3])
      })
      .into_owned();
    let rewritten = self
      .pbx_current
      .replace_all(&rewritten, |caps: &Captures| {
        format!("{}{}{}", &caps[1], version.build, &caps[3])
      })
      .into_owned();

    if rewritten == content {
      return WriteOutcome::Unchanged;
    }
    match fs::write(&self.pbxproj_path, rewritten) {
      Ok(()) => WriteOutcome::Updated { previous: None },
      Err(e) => WriteOutcome::Failed { error: e.to_string() },
    }
  }

  fn fold(previous: Option<VersionTag>, plist: WriteOutcome, pbx: WriteOutcome) -> WriteOutcome {
    let mut errors = Vec::new();
    if let WriteOutcome::Failed { error } = &plist {
      errors.push(format!("Info.plist: {error}"));
    }
    if let WriteOutcome::Failed { error } = &pbx {
      errors.push(format!("project.pbxproj: {error}"));
    }
    if !errors.is_empty() {
      return WriteOutcome::Failed {
        error: errors.join("; "),
      };
    }

    let outcomes = [&plist, &pbx];
    if outcomes.iter().any(|o| matches!(o, WriteOutcome::Updated { .. })) {
      return WriteOutcome::Updated { previous };
    }
    if outcomes.iter().any(|o| matches!(o, WriteOutcome::Unchanged)) {
      return WriteOutcome::Unchanged;
    }
    let placeholder = outcomes.iter().any(|o| {
      matches!(
        o,
        WriteOutcome::Skipped {
          reason: SkipReason::Placeholder
        }
      )
    });
    WriteOutcome::Skipped {
      reason: if placeholder {
        SkipReason::Placeholder
      } else {
        SkipReason::MissingFile
      },
    }
  }
}

impl DescriptorAdapter for IosAdapter {
  fn target(&self) -> Target {
    Target::IosDescriptor
  }

  fn read(&self) -> ShipResult<Option<VersionTag>> {
    let plist = Self::read_if_present(&self.plist_path)?;
    let pbx = Self::read_if_present(&self.pbxproj_path)?;

    let short = Self::literal(&self.plist_short, plist.as_deref())
      .or_else(|| Self::literal(&self.pbx_marketing, pbx.as_deref()));
    let Some(short) = short else {
      return Ok(None);
    };

    let build = Self::literal(&self.plist_build, plist.as_deref())
      .or_else(|| Self::literal(&self.pbx_current, pbx.as_deref()))
      .and_then(|value| value.parse::<u64>().ok());

    let mut tag = VersionTag::parse(&short)?;
    if let Some(build) = build {
      tag.build = build;
    }
    Ok(Some(tag))
  }

  fn write(&self, version: &VersionTag) -> WriteOutcome {
    let previous = self.read().ok().flatten();
    let plist = self.write_plist(version);
    let pbx = self.write_pbxproj(version);
    Self::fold(previous, plist, pbx)
  }
}
