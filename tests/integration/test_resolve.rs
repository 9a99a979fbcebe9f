//! Tests for the `resolve` command
//!
//! Store-backed decisions are covered by engine unit tests with stub
//! providers; these tests exercise the CLI surface with offline
//! policies and a refused store connection.

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_resolve_unifies_all_targets() -> Result<()> {
  let project = TestProject::new()?;

  // Manifest is ahead of the platform descriptors
  project.write_pubspec("1.4.3+28")?;

  let output = run_shipver_ok(&project.path, &["resolve"])?;
  let stdout = stdout_of(&output);
  assert!(stdout.contains("1.4.3+28"));

  let gradle = project.read_file("android/app/build.gradle.kts")?;
  assert!(gradle.contains("versionName = \"1.4.3\""));
  assert!(gradle.contains("versionCode = 28"));

  let plist = project.read_file("ios/Runner/Info.plist")?;
  assert!(plist.contains("<string>1.4.3</string>"));
  assert!(plist.contains("<string>28</string>"));

  // Both build configurations in the project file are rewritten
  let pbxproj = project.read_file("ios/Runner.xcodeproj/project.pbxproj")?;
  assert_eq!(pbxproj.matches("MARKETING_VERSION = 1.4.3;").count(), 2);
  assert_eq!(pbxproj.matches("CURRENT_PROJECT_VERSION = 28;").count(), 2);

  Ok(())
}

#[test]
fn test_resolve_is_idempotent() -> Result<()> {
  let project = TestProject::new()?;
  project.write_pubspec("1.4.3+28")?;

  run_shipver_ok(&project.path, &["resolve"])?;
  let gradle_first = project.read_file("android/app/build.gradle.kts")?;
  let plist_first = project.read_file("ios/Runner/Info.plist")?;

  // A second run finds everything already in place
  let output = run_shipver_ok(&project.path, &["resolve"])?;
  assert!(stdout_of(&output).contains("unchanged"));

  assert_eq!(project.read_file("android/app/build.gradle.kts")?, gradle_first);
  assert_eq!(project.read_file("ios/Runner/Info.plist")?, plist_first);

  Ok(())
}

#[test]
fn test_resolve_dry_run_writes_nothing() -> Result<()> {
  let project = TestProject::new()?;
  project.write_pubspec("1.4.3+28")?;

  let pubspec_before = project.read_file("pubspec.yaml")?;
  let gradle_before = project.read_file("android/app/build.gradle.kts")?;
  let plist_before = project.read_file("ios/Runner/Info.plist")?;
  let pbxproj_before = project.read_file("ios/Runner.xcodeproj/project.pbxproj")?;

  let output = run_shipver_ok(&project.path, &["resolve", "--dry-run"])?;
  let stdout = stdout_of(&output);
  assert!(stdout.contains("(dry-run)"));
  assert!(stdout.contains("1.4.3+28"));
  assert!(stdout.contains("(none)"));

  assert_eq!(project.read_file("pubspec.yaml")?, pubspec_before);
  assert_eq!(project.read_file("android/app/build.gradle.kts")?, gradle_before);
  assert_eq!(project.read_file("ios/Runner/Info.plist")?, plist_before);
  assert_eq!(project.read_file("ios/Runner.xcodeproj/project.pbxproj")?, pbxproj_before);

  Ok(())
}

#[test]
fn test_resolve_json_output() -> Result<()> {
  let project = TestProject::new()?;
  project.write_pubspec("1.4.3+28")?;

  let output = run_shipver_ok(&project.path, &["resolve", "--json"])?;
  let report: serde_json::Value = serde_json::from_str(&stdout_of(&output))?;

  assert_eq!(report["state"], "done");
  assert_eq!(report["chosen"], "1.4.3+28");
  assert_eq!(report["source"], "manifest");
  assert_eq!(report["bumped"], false);
  assert_eq!(report["observed"]["manifest"]["state"], "known");
  assert_eq!(report["observed"]["manifest"]["version"], "1.4.3+28");
  assert_eq!(report["writes"]["manifest"]["outcome"], "unchanged");
  assert_eq!(report["writes"]["android_descriptor"]["outcome"], "updated");
  assert_eq!(report["writes"]["android_descriptor"]["previous"], "1.4.2+27");

  Ok(())
}

#[test]
fn test_resolve_unreachable_store_falls_back_to_manifest() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(DARK_STORE_CONFIG)?;

  let output = run_shipver_ok(&project.path, &["resolve", "--json"])?;
  let report: serde_json::Value = serde_json::from_str(&stdout_of(&output))?;

  // The refused connection degrades the store to unknown; the manifest
  // version still wins and the run exits cleanly.
  assert_eq!(report["observed"]["play_store"]["state"], "unknown");
  assert_eq!(report["source"], "manifest");
  assert_eq!(report["chosen"], "1.4.2+27");
  assert_eq!(report["state"], "done");

  Ok(())
}

#[test]
fn test_resolve_store_only_fails_when_no_store_answers() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(STORE_ONLY_CONFIG)?;

  let output = run_shipver(&project.path, &["resolve"])?;

  assert_eq!(output.status.code(), Some(2));
  let stderr = stderr_of(&output);
  assert!(stderr.contains("No store provided a version"));
  assert!(stderr.contains("store-or-fallback"));

  Ok(())
}

#[test]
fn test_resolve_policy_flag_overrides_config() -> Result<()> {
  let project = TestProject::new()?;
  project.write_config(STORE_ONLY_CONFIG)?;

  // The config policy would fail offline; the flag swaps it out
  run_shipver_ok(&project.path, &["resolve", "--policy", "fallback-only"])?;

  Ok(())
}

#[test]
fn test_resolve_preserves_placeholder_plist() -> Result<()> {
  let project = TestProject::new()?;
  project.write_ios_placeholder_plist("1.4.2", 27)?;
  project.write_pubspec("1.4.3+28")?;

  let plist_before = project.read_file("ios/Runner/Info.plist")?;

  let output = run_shipver_ok(&project.path, &["resolve", "--json"])?;
  let report: serde_json::Value = serde_json::from_str(&stdout_of(&output))?;

  // The placeholder plist is untouched, the project file is rewritten,
  // and the combined iOS outcome reports the update.
  assert_eq!(project.read_file("ios/Runner/Info.plist")?, plist_before);
  let pbxproj = project.read_file("ios/Runner.xcodeproj/project.pbxproj")?;
  assert_eq!(pbxproj.matches("MARKETING_VERSION = 1.4.3;").count(), 2);
  assert_eq!(report["writes"]["ios_descriptor"]["outcome"], "updated");

  Ok(())
}

#[test]
fn test_resolve_normalizes_bare_version() -> Result<()> {
  let project = TestProject::new()?;
  project.write_pubspec("2.0.0")?;

  run_shipver_ok(&project.path, &["resolve"])?;

  // A manifest without a build number is treated as build 1
  let pubspec = project.read_file("pubspec.yaml")?;
  assert!(pubspec.contains("version: 2.0.0+1"));
  let gradle = project.read_file("android/app/build.gradle.kts")?;
  assert!(gradle.contains("versionCode = 1"));

  Ok(())
}

#[test]
fn test_resolve_repairs_malformed_android_descriptor() -> Result<()> {
  let project = TestProject::new()?;
  project.write_gradle("1.4", 27)?;

  // Gathering records the bad value as unknown; the write step then
  // rewrites the descriptor from the chosen version
  let output = run_shipver_ok(&project.path, &["resolve", "--json"])?;
  let report: serde_json::Value = serde_json::from_str(&stdout_of(&output))?;

  assert_eq!(report["state"], "done");
  assert_eq!(report["observed"]["android_descriptor"]["state"], "unknown");
  assert_eq!(report["writes"]["android_descriptor"]["outcome"], "updated");

  let gradle = project.read_file("android/app/build.gradle.kts")?;
  assert!(gradle.contains("versionName = \"1.4.2\""));
  assert!(gradle.contains("versionCode = 27"));

  Ok(())
}

#[test]
fn test_resolve_requires_config() -> Result<()> {
  let project = TestProject::bare()?;
  project.write_pubspec("1.0.0+1")?;

  let output = run_shipver(&project.path, &["resolve"])?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = stderr_of(&output);
  assert!(stderr.contains("No shipver configuration found"));
  assert!(stderr.contains("shipver init"));

  Ok(())
}

#[test]
fn test_resolve_requires_manifest() -> Result<()> {
  let project = TestProject::new()?;
  std::fs::remove_file(project.path.join("pubspec.yaml"))?;

  let output = run_shipver(&project.path, &["resolve"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr_of(&output).contains("manifest descriptor not found"));

  Ok(())
}

#[test]
fn test_resolve_respects_held_lock() -> Result<()> {
  let project = TestProject::new()?;

  // Simulate a concurrent run holding the lock
  let lock_dir = project.path.join(".shipver");
  std::fs::create_dir_all(&lock_dir)?;
  std::fs::write(lock_dir.join("lock"), format!("pid {}\n", std::process::id()))?;

  let output = run_shipver(&project.path, &["resolve"])?;

  assert_eq!(output.status.code(), Some(2));
  assert!(stderr_of(&output).to_lowercase().contains("lock"));

  // Dry runs take no lock, so they still work
  run_shipver_ok(&project.path, &["resolve", "--dry-run"])?;

  Ok(())
}
