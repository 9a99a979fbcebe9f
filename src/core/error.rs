//! Error types for shipver with contextual messages and exit codes
//!
//! This module provides a unified error type that categorizes errors and provides
//! contextual help messages to users. Every error includes a helpful suggestion
//! to guide users toward resolution.

use crate::core::report::Target;
use crate::version::{ParseError, VersionTag};
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for shipver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, malformed versions)
  User = 1,
  /// System error (network, I/O, lock)
  System = 2,
  /// Validation failure (partial writes, drift, version conflict)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for shipver
#[derive(Debug)]
pub enum ShipError {
  /// Configuration errors
  Config(ConfigError),

  /// Version string errors
  Version(ParseError),

  /// Descriptor file errors
  Descriptor(DescriptorError),

  /// Store provider errors
  Store(StoreError),

  /// Project lock errors
  Lock(LockError),

  /// Reconciliation outcome errors (conflicts, partial writes, drift)
  Validation(ValidationError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ShipError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ShipError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ShipError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ShipError::Message { message, context, help } => ShipError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ShipError::Config(_) => ExitCode::User,
      ShipError::Version(_) => ExitCode::User,
      ShipError::Descriptor(_) => ExitCode::User,
      ShipError::Store(_) => ExitCode::System,
      ShipError::Lock(_) => ExitCode::System,
      ShipError::Validation(_) => ExitCode::Validation,
      ShipError::Io(_) => ExitCode::System,
      ShipError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ShipError::Config(e) => e.help_message(),
      ShipError::Descriptor(e) => e.help_message(),
      ShipError::Store(e) => e.help_message(),
      ShipError::Lock(e) => e.help_message(),
      ShipError::Validation(e) => e.help_message(),
      ShipError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for ShipError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ShipError::Config(e) => write!(f, "{}", e),
      ShipError::Version(e) => write!(f, "{}", e),
      ShipError::Descriptor(e) => write!(f, "{}", e),
      ShipError::Store(e) => write!(f, "{}", e),
      ShipError::Lock(e) => write!(f, "{}", e),
      ShipError::Validation(e) => write!(f, "{}", e),
      ShipError::Io(e) => write!(f, "I/O error: {}", e),
      ShipError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ShipError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ShipError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ShipError {
  fn from(err: io::Error) -> Self {
    ShipError::Io(err)
  }
}

impl From<String> for ShipError {
  fn from(msg: String) -> Self {
    ShipError::message(msg)
  }
}

impl From<&str> for ShipError {
  fn from(msg: &str) -> Self {
    ShipError::message(msg)
  }
}

impl From<ParseError> for ShipError {
  fn from(err: ParseError) -> Self {
    ShipError::Version(err)
  }
}

impl From<StoreError> for ShipError {
  fn from(err: StoreError) -> Self {
    ShipError::Store(err)
  }
}

impl From<toml_edit::TomlError> for ShipError {
  fn from(err: toml_edit::TomlError) -> Self {
    ShipError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for ShipError {
  fn from(err: toml_edit::de::Error) -> Self {
    ShipError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for ShipError {
  fn from(err: toml_edit::ser::Error) -> Self {
    ShipError::message(format!("TOML serialization error: {}", err))
  }
}

impl From<serde_json::Error> for ShipError {
  fn from(err: serde_json::Error) -> Self {
    ShipError::message(format!("JSON error: {}", err))
  }
}

impl From<std::num::ParseIntError> for ShipError {
  fn from(err: std::num::ParseIntError) -> Self {
    ShipError::message(format!("Parse error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for ShipError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    ShipError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Convert anyhow::Error to ShipError (for context-wrapped io paths)
impl From<anyhow::Error> for ShipError {
  fn from(err: anyhow::Error) -> Self {
    ShipError::message(err.to_string())
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// shipver.toml not found
  NotFound { project_root: PathBuf },

  /// Missing required field
  MissingField { field: String },

  /// Invalid sync policy string
  InvalidPolicy { input: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => Some("Run `shipver init` to create a configuration file.".to_string()),
      ConfigError::InvalidPolicy { .. } => Some(
        "Policies look like `<strategy>[:<bump>]`, e.g. `store-or-fallback:build` or `fallback-only`.".to_string(),
      ),
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { project_root } => {
        write!(
          f,
          "No shipver configuration found.\nExpected file: {}/shipver.toml",
          project_root.display()
        )
      }
      ConfigError::MissingField { field } => {
        write!(f, "Missing required field in config: {}", field)
      }
      ConfigError::InvalidPolicy { input, reason } => {
        write!(f, "Invalid sync policy '{}': {}", input, reason)
      }
    }
  }
}

/// Descriptor file errors
#[derive(Debug)]
pub enum DescriptorError {
  /// A required descriptor file is missing.
  /// Only the manifest is required; platform descriptors degrade to skips.
  NotFound { target: Target, path: PathBuf },

  /// The descriptor exists but carries no recognizable version fields
  NoVersionField { target: Target, path: PathBuf },
}

impl DescriptorError {
  fn help_message(&self) -> Option<String> {
    match self {
      DescriptorError::NotFound { target: Target::Manifest, .. } => {
        Some("The manifest is the fallback source of truth and must exist. Check the `manifest` path in shipver.toml.".to_string())
      }
      DescriptorError::NotFound { .. } => None,
      DescriptorError::NoVersionField { .. } => {
        Some("Add a `version:` line (manifest) or versionName/versionCode fields so shipver can manage them.".to_string())
      }
    }
  }
}

impl fmt::Display for DescriptorError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DescriptorError::NotFound { target, path } => {
        write!(f, "{} descriptor not found at: {}", target, path.display())
      }
      DescriptorError::NoVersionField { target, path } => {
        write!(f, "{} descriptor at {} has no version fields", target, path.display())
      }
    }
  }
}

/// Store provider errors
#[derive(Debug)]
pub enum StoreError {
  /// Signing key unreadable or not a P-256 private key
  Key { path: PathBuf, reason: String },

  /// Transport-level failure (DNS, connect, timeout)
  Network { url: String, reason: String },

  /// The API answered with a non-success status
  Api { url: String, status: u16, body: String },

  /// Bundle id lookup returned zero or several apps
  AppNotFound { bundle_id: String, matches: usize },

  /// Response arrived but no version could be extracted from it
  NoVersionInResponse { source: String },

  /// A store-only policy found no store version at all
  NoVersion { causes: Vec<String> },
}

impl StoreError {
  fn help_message(&self) -> Option<String> {
    match self {
      StoreError::Key { .. } => {
        Some("Point `app_store.key_path` at the .p8 private key downloaded from App Store Connect.".to_string())
      }
      StoreError::AppNotFound { bundle_id, matches: 0 } => Some(format!(
        "No app with bundle id '{}' is visible to this API key. Check the bundle id and the key's access.",
        bundle_id
      )),
      StoreError::NoVersion { .. } => {
        Some("Re-run with `--policy store-or-fallback` to fall back to local versions when the stores are unreachable.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for StoreError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StoreError::Key { path, reason } => {
        write!(f, "Cannot use signing key {}: {}", path.display(), reason)
      }
      StoreError::Network { url, reason } => {
        write!(f, "Network error talking to {}: {}", url, reason)
      }
      StoreError::Api { url, status, body } => {
        write!(f, "API request to {} failed with status {}: {}", url, status, body)
      }
      StoreError::AppNotFound { bundle_id, matches } => {
        if *matches == 0 {
          write!(f, "No app found for bundle id '{}'", bundle_id)
        } else {
          write!(f, "Bundle id '{}' matched {} apps; expected exactly one", bundle_id, matches)
        }
      }
      StoreError::NoVersionInResponse { source } => {
        write!(f, "{} responded but no version could be extracted", source)
      }
      StoreError::NoVersion { causes } => {
        write!(f, "No store provided a version")?;
        for cause in causes {
          write!(f, "\n  - {}", cause)?;
        }
        Ok(())
      }
    }
  }
}

/// Project lock errors
#[derive(Debug)]
pub enum LockError {
  /// Another run holds the lock
  Held { path: PathBuf, holder: Option<String> },

  /// The lock file could not be created or removed
  Io { path: PathBuf, source: io::Error },
}

impl LockError {
  fn help_message(&self) -> Option<String> {
    match self {
      LockError::Held { path, .. } => Some(format!(
        "If no other shipver run is active, delete the stale lock file: {}",
        path.display()
      )),
      LockError::Io { .. } => None,
    }
  }
}

impl fmt::Display for LockError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LockError::Held { path, holder } => {
        write!(f, "Project is locked by another shipver run ({})", path.display())?;
        if let Some(holder) = holder {
          write!(f, "\nHeld by: {}", holder)?;
        }
        Ok(())
      }
      LockError::Io { path, source } => {
        write!(f, "Lock file error at {}: {}", path.display(), source)
      }
    }
  }
}

/// Reconciliation outcome errors
#[derive(Debug)]
pub enum ValidationError {
  /// A store version is at or past the local one and auto-increment is off
  Conflict {
    local: VersionTag,
    store: VersionTag,
    source: String,
  },

  /// Some descriptor writes failed; the rest were still attempted
  PartialFailure { failed: Vec<String> },

  /// Strict drift check found local descriptors out of sync
  Drifted { details: Vec<String> },
}

impl ValidationError {
  fn help_message(&self) -> Option<String> {
    match self {
      ValidationError::Conflict { .. } => {
        Some("Drop `--no-auto-increment` to let shipver move past the store version, or raise the manifest version yourself.".to_string())
      }
      ValidationError::PartialFailure { .. } => {
        Some("Fix the failed descriptors and re-run `shipver resolve`; successful writes are idempotent and safe to repeat.".to_string())
      }
      ValidationError::Drifted { .. } => {
        Some("Run `shipver auto-fix` to converge every descriptor to the highest local version.".to_string())
      }
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationError::Conflict { local, store, source } => {
        write!(
          f,
          "Version conflict: {} already has {} which is not below local {}",
          source, store, local
        )
      }
      ValidationError::PartialFailure { failed } => {
        write!(f, "Reconciliation finished with failed writes: {}", failed.join(", "))
      }
      ValidationError::Drifted { details } => {
        write!(f, "Local descriptors are out of sync")?;
        for detail in details {
          write!(f, "\n  - {}", detail)?;
        }
        Ok(())
      }
    }
  }
}

/// Result type alias for shipver
pub type ShipResult<T> = Result<T, ShipError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ShipResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ShipResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ShipError>,
{
  fn context(self, ctx: impl Into<String>) -> ShipResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ShipResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with colors and help text
pub fn print_error(error: &ShipError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
