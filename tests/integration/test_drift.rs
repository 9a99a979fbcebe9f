//! Tests for the `drift-check` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_drift_check_in_sync() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_shipver_ok(&project.path, &["drift-check"])?;

  let stdout = stdout_of(&output);
  assert!(stdout.contains("Drift check"));
  assert!(stdout.contains("agree on 1.4.2+27"));

  Ok(())
}

#[test]
fn test_drift_check_reports_divergence() -> Result<()> {
  let project = TestProject::new()?;
  project.write_pubspec("1.4.3+28")?;

  // Without --strict a drifted tree still exits cleanly
  let output = run_shipver_ok(&project.path, &["drift-check"])?;

  let stdout = stdout_of(&output);
  assert!(stdout.contains("Drift detected"));
  assert!(stdout.contains("Android descriptor has 1.4.2+27 (behind 1.4.3+28)"));
  assert!(stdout.contains("Local maximum: 1.4.3+28"));

  Ok(())
}

#[test]
fn test_drift_check_strict_exit_code() -> Result<()> {
  let project = TestProject::new()?;
  project.write_pubspec("1.4.3+28")?;

  let output = run_shipver(&project.path, &["drift-check", "--strict"])?;

  assert_eq!(output.status.code(), Some(3));
  let stderr = stderr_of(&output);
  assert!(stderr.contains("out of sync"));
  assert!(stderr.contains("auto-fix"));

  Ok(())
}

#[test]
fn test_drift_check_strict_passes_when_in_sync() -> Result<()> {
  let project = TestProject::new()?;

  run_shipver_ok(&project.path, &["drift-check", "--strict"])?;

  Ok(())
}

#[test]
fn test_drift_check_json() -> Result<()> {
  let project = TestProject::new()?;
  project.write_pubspec("1.4.3+28")?;

  let output = run_shipver_ok(&project.path, &["drift-check", "--json"])?;
  let report: serde_json::Value = serde_json::from_str(&stdout_of(&output))?;

  assert_eq!(report["in_sync"], false);
  assert_eq!(report["max"], "1.4.3+28");
  assert!(report["details"].as_array().is_some_and(|d| !d.is_empty()));
  assert_eq!(report["observed"]["manifest"]["version"], "1.4.3+28");

  Ok(())
}

#[test]
fn test_drift_check_is_read_only() -> Result<()> {
  let project = TestProject::new()?;
  project.write_pubspec("1.4.3+28")?;

  let pubspec_before = project.read_file("pubspec.yaml")?;
  let gradle_before = project.read_file("android/app/build.gradle.kts")?;

  run_shipver_ok(&project.path, &["drift-check"])?;

  assert_eq!(project.read_file("pubspec.yaml")?, pubspec_before);
  assert_eq!(project.read_file("android/app/build.gradle.kts")?, gradle_before);

  Ok(())
}

#[test]
fn test_drift_check_missing_platform_files() -> Result<()> {
  let project = TestProject::new()?;
  std::fs::remove_file(project.path.join("android/app/build.gradle.kts"))?;

  // A missing platform descriptor reads as absent, not as drift
  let output = run_shipver_ok(&project.path, &["drift-check", "--json"])?;
  let report: serde_json::Value = serde_json::from_str(&stdout_of(&output))?;

  assert_eq!(report["in_sync"], true);
  assert_eq!(report["observed"]["android_descriptor"]["state"], "absent");

  Ok(())
}

#[test]
fn test_drift_check_malformed_android_version_degrades_to_unknown() -> Result<()> {
  let project = TestProject::new()?;
  project.write_gradle("1.4", 27)?;

  // A quoted but unparseable versionName must not abort the check
  let output = run_shipver_ok(&project.path, &["drift-check", "--json"])?;
  let report: serde_json::Value = serde_json::from_str(&stdout_of(&output))?;

  assert_eq!(report["in_sync"], true);
  assert_eq!(report["observed"]["android_descriptor"]["state"], "unknown");
  assert!(
    report["observed"]["android_descriptor"]["cause"]
      .as_str()
      .is_some_and(|c| c.contains("Invalid version"))
  );

  Ok(())
}
