use crate::core::error::{ConfigError, ResultExt, ShipError, ShipResult};
use crate::core::policy::SyncPolicy;
use crate::version::VersionTag;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for shipver
/// Searched in order: shipver.toml, .shipver.toml, .config/shipver.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipConfig {
  pub app: AppConfig,
  #[serde(default)]
  pub paths: PathsConfig,
  #[serde(default)]
  pub sync: SyncConfig,
  /// App Store Connect credentials; the provider is disabled when absent
  #[serde(default)]
  pub app_store: Option<AppStoreConfig>,
  #[serde(default)]
  pub play_store: PlayStoreConfig,
}

/// App identity on both stores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
  /// Display name used in output (optional)
  #[serde(default)]
  pub name: Option<String>,

  /// iOS bundle identifier, e.g. `com.example.app`
  pub bundle_id: String,

  /// Android application id, e.g. `com.example.app`
  pub package_name: String,
}

/// Locations of the version-bearing files, relative to the project root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
  /// The manifest holding the canonical `version:` line
  #[serde(default = "default_manifest_path")]
  pub manifest: PathBuf,

  /// Gradle build descriptor. When unset, the Kotlin-DSL file is probed
  /// first and the legacy Groovy file second.
  #[serde(default)]
  pub android: Option<PathBuf>,

  #[serde(default = "default_ios_plist_path")]
  pub ios_plist: PathBuf,

  #[serde(default = "default_ios_pbxproj_path")]
  pub ios_pbxproj: PathBuf,
}

fn default_manifest_path() -> PathBuf {
  PathBuf::from("pubspec.yaml")
}

fn default_ios_plist_path() -> PathBuf {
  PathBuf::from("ios/Runner/Info.plist")
}

fn default_ios_pbxproj_path() -> PathBuf {
  PathBuf::from("ios/Runner.xcodeproj/project.pbxproj")
}

/// Candidate gradle descriptors, probed in order when `paths.android` is unset
pub const GRADLE_CANDIDATES: [&str; 2] = ["android/app/build.gradle.kts", "android/app/build.gradle"];

impl Default for PathsConfig {
  fn default() -> Self {
    Self {
      manifest: default_manifest_path(),
      android: None,
      ios_plist: default_ios_plist_path(),
      ios_pbxproj: default_ios_pbxproj_path(),
    }
  }
}

/// Reconciliation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
  /// Version to use when no store answers and the manifest should not decide
  #[serde(default)]
  pub fallback_version: Option<VersionTag>,

  /// Default policy string, overridable with `--policy`
  #[serde(default)]
  pub policy: Option<String>,

  /// Cache observed store versions between runs
  #[serde(default = "default_cache_enabled")]
  pub cache: bool,

  /// How long a cached store observation stays fresh
  #[serde(default = "default_cache_ttl_secs")]
  pub cache_ttl_secs: u64,
}

fn default_cache_enabled() -> bool {
  true
}

fn default_cache_ttl_secs() -> u64 {
  300
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      fallback_version: None,
      policy: None,
      cache: default_cache_enabled(),
      cache_ttl_secs: default_cache_ttl_secs(),
    }
  }
}

/// App Store Connect API credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppStoreConfig {
  /// Key id of the .p8 API key
  pub key_id: String,

  /// Issuer id from the App Store Connect keys page
  pub issuer_id: String,

  /// Path to the P-256 private key PEM, relative to the project root
  pub key_path: PathBuf,

  /// API base URL override (useful for testing)
  #[serde(default = "default_api_url")]
  pub api_url: String,
}

fn default_api_url() -> String {
  "https://api.appstoreconnect.apple.com/v1".to_string()
}

/// Play Store listing scrape settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayStoreConfig {
  /// Listing base URL override (useful for testing)
  #[serde(default = "default_listing_url")]
  pub listing_url: String,
}

fn default_listing_url() -> String {
  "https://play.google.com/store/apps/details".to_string()
}

impl Default for PlayStoreConfig {
  fn default() -> Self {
    Self {
      listing_url: default_listing_url(),
    }
  }
}

impl ShipConfig {
  /// Find config file in search order: shipver.toml, .shipver.toml, .config/shipver.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("shipver.toml"),
      path.join(".shipver.toml"),
      path.join(".config").join("shipver.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from shipver.toml (searches multiple locations)
  pub fn load(path: &Path) -> ShipResult<Self> {
    let config_path = Self::find_config_path(path).ok_or_else(|| {
      ShipError::Config(ConfigError::NotFound {
        project_root: path.to_path_buf(),
      })
    })?;

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: ShipConfig = toml_edit::de::from_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config
      .validate()
      .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    Ok(config)
  }

  /// Save config to shipver.toml (default location)
  pub fn save(&self, path: &Path) -> ShipResult<()> {
    let config_path = path.join("shipver.toml");
    let content = toml_edit::ser::to_string_pretty(self).context("Failed to serialize config to TOML")?;
    fs::write(&config_path, content).with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    Ok(())
  }

  /// Check if config exists at the given path
  pub fn exists(path: &Path) -> bool {
    Self::find_config_path(path).is_some()
  }

  /// Starter configuration for `shipver init`.
  /// No credentials are templated; the App Store provider stays disabled
  /// until the user adds an `[app_store]` section.
  pub fn starter(bundle_id: String, package_name: String) -> Self {
    Self {
      app: AppConfig {
        name: None,
        bundle_id,
        package_name,
      },
      paths: PathsConfig::default(),
      sync: SyncConfig::default(),
      app_store: None,
      play_store: PlayStoreConfig::default(),
    }
  }

  /// Validate configuration
  pub fn validate(&self) -> ShipResult<()> {
    if self.app.bundle_id.trim().is_empty() {
      return Err(ShipError::Config(ConfigError::MissingField {
        field: "app.bundle_id".to_string(),
      }));
    }
    if self.app.package_name.trim().is_empty() {
      return Err(ShipError::Config(ConfigError::MissingField {
        field: "app.package_name".to_string(),
      }));
    }

    if let Some(ref policy) = self.sync.policy {
      SyncPolicy::parse(policy)?;
    }

    if let Some(ref store) = self.app_store {
      if store.key_id.trim().is_empty() {
        return Err(ShipError::Config(ConfigError::MissingField {
          field: "app_store.key_id".to_string(),
        }));
      }
      if store.issuer_id.trim().is_empty() {
        return Err(ShipError::Config(ConfigError::MissingField {
          field: "app_store.issuer_id".to_string(),
        }));
      }
      if store.key_path.as_os_str().is_empty() {
        return Err(ShipError::Config(ConfigError::MissingField {
          field: "app_store.key_path".to_string(),
        }));
      }
    }

    Ok(())
  }

  /// The default policy for this project: config `sync.policy` if set,
  /// otherwise store-or-fallback with an auto bump
  pub fn default_policy(&self) -> ShipResult<SyncPolicy> {
    match &self.sync.policy {
      Some(policy) => SyncPolicy::parse(policy),
      None => Ok(SyncPolicy::default()),
    }
  }

  /// Identity of the store lookups this config describes. Cached store
  /// observations are only valid under an identical fingerprint.
  pub fn store_fingerprint(&self) -> String {
    let mut parts = vec![
      self.app.bundle_id.as_str(),
      self.app.package_name.as_str(),
      self.play_store.listing_url.as_str(),
    ];
    if let Some(store) = &self.app_store {
      parts.push(store.key_id.as_str());
      parts.push(store.issuer_id.as_str());
      parts.push(store.api_url.as_str());
    }
    parts.join("|")
  }
}
