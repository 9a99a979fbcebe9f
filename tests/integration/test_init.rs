//! Tests for the `init` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_init_creates_config() -> Result<()> {
  let project = TestProject::bare()?;
  project.write_pubspec("1.0.0+1")?;
  project.write_gradle("1.0.0", 1)?;

  let output = run_shipver_ok(&project.path, &["init"])?;

  assert!(project.file_exists("shipver.toml"));
  assert!(stdout_of(&output).contains("shipver.toml"));

  // Identifiers are picked up from the gradle descriptor
  let config = project.read_file("shipver.toml")?;
  assert!(config.contains("[app]"));
  assert!(config.contains("bundle_id = \"com.example.demo\""));
  assert!(config.contains("package_name = \"com.example.demo\""));
  assert!(config.contains("[sync]"));

  Ok(())
}

#[test]
fn test_init_detects_ios_bundle_id() -> Result<()> {
  let project = TestProject::bare()?;
  project.write_pubspec("1.0.0+1")?;
  project.write_ios("1.0.0", 1)?;

  // The fixture pbxproj has no PRODUCT_BUNDLE_IDENTIFIER, so add one
  // next to the version settings.
  let pbx_path = project.path.join("ios/Runner.xcodeproj/project.pbxproj");
  let pbxproj = project.read_file("ios/Runner.xcodeproj/project.pbxproj")?;
  let pbxproj = pbxproj.replace(
    "MARKETING_VERSION = 1.0.0;",
    "MARKETING_VERSION = 1.0.0;\n\t\t\t\tPRODUCT_BUNDLE_IDENTIFIER = com.acme.demo;",
  );
  std::fs::write(pbx_path, pbxproj)?;

  run_shipver_ok(&project.path, &["init"])?;

  let config = project.read_file("shipver.toml")?;
  assert!(config.contains("bundle_id = \"com.acme.demo\""));

  Ok(())
}

#[test]
fn test_init_writes_no_store_credentials() -> Result<()> {
  let project = TestProject::bare()?;
  project.write_pubspec("1.0.0+1")?;

  run_shipver_ok(&project.path, &["init"])?;

  // Credentials are added by hand later, never templated
  let config = project.read_file("shipver.toml")?;
  assert!(!config.contains("[app_store]"));
  assert!(!config.contains("key_id"));
  assert!(!config.contains("issuer_id"));

  Ok(())
}

#[test]
fn test_init_refuses_to_overwrite() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_shipver(&project.path, &["init"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr_of(&output).contains("already exists"));

  // The existing config is untouched
  let config = project.read_file("shipver.toml")?;
  assert!(config.contains("fallback-only"));

  Ok(())
}

#[test]
fn test_init_force_overwrites() -> Result<()> {
  let project = TestProject::new()?;

  run_shipver_ok(&project.path, &["init", "--force"])?;

  // The fallback-only test config is replaced by the starter
  let config = project.read_file("shipver.toml")?;
  assert!(!config.contains("fallback-only"));
  assert!(config.contains("bundle_id"));

  Ok(())
}

#[test]
fn test_init_defaults_without_descriptors() -> Result<()> {
  let project = TestProject::bare()?;

  run_shipver_ok(&project.path, &["init"])?;

  let config = project.read_file("shipver.toml")?;
  assert!(config.contains("com.example.app"));

  Ok(())
}
