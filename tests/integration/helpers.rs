//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Config with store queries disabled. The fallback-only policy never
/// opens a connection, so tests stay deterministic offline.
pub const OFFLINE_CONFIG: &str = r#"[app]
bundle_id = "com.example.demo"
package_name = "com.example.demo"

[sync]
policy = "fallback-only"
"#;

/// Config that points the Play Store provider at a closed local port.
/// The connection is refused immediately, so the provider reports the
/// store as unreachable without waiting on a timeout.
pub const DARK_STORE_CONFIG: &str = r#"[app]
bundle_id = "com.example.demo"
package_name = "com.example.demo"

[sync]
policy = "store-or-fallback"
cache = false

[play_store]
listing_url = "http://127.0.0.1:9/listing"
"#;

/// Same dead store, but with a policy that refuses to fall back.
pub const STORE_ONLY_CONFIG: &str = r#"[app]
bundle_id = "com.example.demo"
package_name = "com.example.demo"

[sync]
policy = "store-only"
cache = false

[play_store]
listing_url = "http://127.0.0.1:9/listing"
"#;

const PBXPROJ_TEMPLATE: &str = r#"// !$*UTF8*$!
{
	objects = {
		97C147061CF9000F007C117D /* Debug */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				CURRENT_PROJECT_VERSION = @BUILD@;
				MARKETING_VERSION = @NAME@;
			};
			name = Debug;
		};
		97C147071CF9000F007C117D /* Release */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				CURRENT_PROJECT_VERSION = @BUILD@;
				MARKETING_VERSION = @NAME@;
			};
			name = Release;
		};
	};
}
"#;

const LITERAL_PLIST_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>CFBundleDisplayName</key>
	<string>Demo</string>
	<key>CFBundleShortVersionString</key>
	<string>@NAME@</string>
	<key>CFBundleVersion</key>
	<string>@BUILD@</string>
</dict>
</plist>
"#;

const PLACEHOLDER_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>CFBundleDisplayName</key>
	<string>Demo</string>
	<key>CFBundleShortVersionString</key>
	<string>$(FLUTTER_BUILD_NAME)</string>
	<key>CFBundleVersion</key>
	<string>$(FLUTTER_BUILD_NUMBER)</string>
</dict>
</plist>
"#;

/// A Flutter-style project tree with all three version descriptors
pub struct TestProject {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestProject {
  /// Create a project with the manifest, Android, and iOS descriptors
  /// all at 1.4.2+27, plus an offline config.
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    let project = Self { _root: root, path };

    project.write_pubspec("1.4.2+27")?;
    project.write_gradle("1.4.2", 27)?;
    project.write_ios("1.4.2", 27)?;
    project.write_config(OFFLINE_CONFIG)?;

    Ok(project)
  }

  /// Create an empty directory with no project files at all.
  pub fn bare() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    Ok(Self { _root: root, path })
  }

  pub fn write_pubspec(&self, version: &str) -> Result<()> {
    let content = format!(
      "name: demo_app\ndescription: A demo application.\nversion: {}\n\nenvironment:\n  sdk: \">=3.0.0 <4.0.0\"\n",
      version
    );
    fs::write(self.path.join("pubspec.yaml"), content)?;
    Ok(())
  }

  pub fn write_gradle(&self, name: &str, code: u64) -> Result<()> {
    let dir = self.path.join("android/app");
    fs::create_dir_all(&dir)?;
    let content = format!(
      "android {{\n    namespace = \"com.example.demo\"\n\n    defaultConfig {{\n        applicationId = \"com.example.demo\"\n        versionCode = {}\n        versionName = \"{}\"\n    }}\n}}\n",
      code, name
    );
    fs::write(dir.join("build.gradle.kts"), content)?;
    Ok(())
  }

  pub fn write_ios(&self, name: &str, build: u64) -> Result<()> {
    let plist = LITERAL_PLIST_TEMPLATE
      .replace("@NAME@", name)
      .replace("@BUILD@", &build.to_string());
    self.write_ios_raw(&plist, name, build)
  }

  /// iOS files in the stock Flutter shape: the plist carries build-time
  /// placeholders and only the project file holds literals.
  pub fn write_ios_placeholder_plist(&self, name: &str, build: u64) -> Result<()> {
    self.write_ios_raw(PLACEHOLDER_PLIST, name, build)
  }

  fn write_ios_raw(&self, plist: &str, name: &str, build: u64) -> Result<()> {
    let plist_dir = self.path.join("ios/Runner");
    fs::create_dir_all(&plist_dir)?;
    fs::write(plist_dir.join("Info.plist"), plist)?;

    let pbx_dir = self.path.join("ios/Runner.xcodeproj");
    fs::create_dir_all(&pbx_dir)?;
    let pbxproj = PBXPROJ_TEMPLATE
      .replace("@NAME@", name)
      .replace("@BUILD@", &build.to_string());
    fs::write(pbx_dir.join("project.pbxproj"), pbxproj)?;
    Ok(())
  }

  pub fn write_config(&self, content: &str) -> Result<()> {
    fs::write(self.path.join("shipver.toml"), content)?;
    Ok(())
  }

  pub fn read_file(&self, path: &str) -> Result<String> {
    fs::read_to_string(self.path.join(path)).with_context(|| format!("Failed to read {}", path))
  }

  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }
}

/// Run the shipver binary and capture its output. Callers check the
/// exit status themselves, so failure paths can be asserted too.
pub fn run_shipver(cwd: &Path, args: &[&str]) -> Result<Output> {
  let shipver_bin = env!("CARGO_BIN_EXE_shipver");

  Command::new(shipver_bin)
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to execute shipver")
}

/// Run shipver and fail the test if the command did not exit cleanly.
pub fn run_shipver_ok(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_shipver(cwd, args)?;

  if !output.status.success() {
    anyhow::bail!(
      "shipver {} failed\nstdout: {}\nstderr: {}",
      args.join(" "),
      String::from_utf8_lossy(&output.stdout),
      String::from_utf8_lossy(&output.stderr)
    );
  }

  Ok(output)
}

pub fn stdout_of(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr_of(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}
