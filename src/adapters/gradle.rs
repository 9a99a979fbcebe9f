//! Android descriptor adapter: versionName / versionCode in build.gradle
//!
//! Understands both flavors of the Gradle DSL. Kotlin (`versionName = "1.2.3"`)
//! is tried first, the legacy Groovy form (`versionName "1.2.3"`) second. Only
//! quoted literals are managed; the stock Flutter template wires these fields to
//! `flutter.versionName` / `flutter.versionCode`, which carry no literal to
//! rewrite and are skipped the same way placeholder values are.

use crate::adapters::{DescriptorAdapter, is_placeholder};
use crate::core::error::ShipResult;
use crate::core::report::{SkipReason, Target, WriteOutcome};
use crate::version::VersionTag;
use regex::{Captures, Regex};
use std::fs;
use std::path::PathBuf;

pub struct GradleAdapter {
  path: PathBuf,
  kts_name: Regex,
  kts_code: Regex,
  groovy_name: Regex,
  groovy_code: Regex,
}

struct GradleFields<'a> {
  name: &'a Regex,
  code: &'a Regex,
  name_value: String,
  code_value: Option<u64>,
}

impl GradleAdapter {
  pub fn new(path: PathBuf) -> Self {
    Self {
      path,
      kts_name: Regex::new(r#"(?m)^(\s*versionName\s*=\s*")([^"]*)(")"#).unwrap(),
      kts_code: Regex::new(r"(?m)^(\s*versionCode\s*=\s*)(\d+)\b").unwrap(),
      groovy_name: Regex::new(r#"(?m)^(\s*versionName\s+")([^"]*)(")"#).unwrap(),
      groovy_code: Regex::new(r"(?m)^(\s*versionCode\s+)(\d+)\b").unwrap(),
    }
  }

  /// Locates the managed fields, picking the DSL flavor by whichever
  /// versionName pattern matches.
  fn fields<'a>(&'a self, content: &str) -> Option<GradleFields<'a>> {
    let (name, code) = if self.kts_name.is_match(content) {
      (&self.kts_name, &self.kts_code)
    } else if self.groovy_name.is_match(content) {
      (&self.groovy_name, &self.groovy_code)
    } else {
      return None;
    };

    let name_value = name.captures(content)?[2].to_string();
    let code_value = code
      .captures(content)
      .and_then(|caps| caps[2].parse::<u64>().ok());

    Some(GradleFields { name, code, name_value, code_value })
  }
}

impl DescriptorAdapter for GradleAdapter {
  fn target(&self) -> Target {
    Target::AndroidDescriptor
  }

  fn read(&self) -> ShipResult<Option<VersionTag>> {
    if !self.path.exists() {
      return Ok(None);
    }
    let content = fs::read_to_string(&self.path)?;

    let Some(fields) = self.fields(&content) else {
      return Ok(None);
    };
    if is_placeholder(&fields.name_value) {
      return Ok(None);
    }

    let mut tag = VersionTag::parse(&fields.name_value)?;
    if let Some(code) = fields.code_value {
      tag.build = code;
    }
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

    let Some(fields) = self.fields(&content) else {
      return WriteOutcome::Skipped {
        reason: SkipReason::Placeholder,
      };
    };
    if is_placeholder(&fields.name_value) {
      return WriteOutcome::Skipped {
        reason: SkipReason::Placeholder,
      };
    }

    let previous = VersionTag::parse(&fields.name_value).ok().map(|mut tag| {
      if let Some(code) = fields.code_value {
        tag.build = code;
      }
      tag
    });

    let release = version.release();
    let rewritten = fields
      .name
      .replace(&content, |caps: &Captures| {
        format!("{}{}{}", &caps[1], release, &caps[3])
      })
      .into_owned();
    let rewritten = fields
      .code
      .replace(&rewritten, |caps: &Captures| {
        format!("{}{}", &caps[1], version.build)
      })
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
