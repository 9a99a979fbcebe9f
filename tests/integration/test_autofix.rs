//! Tests for the `auto-fix` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_auto_fix_converges_drifted_tree() -> Result<()> {
  let project = TestProject::new()?;
  project.write_pubspec("1.4.3+28")?;

  let output = run_shipver_ok(&project.path, &["auto-fix"])?;

  let stdout = stdout_of(&output);
  assert!(stdout.contains("Drift detected"));
  assert!(stdout.contains("Converging local descriptors to 1.4.3+28"));

  let gradle = project.read_file("android/app/build.gradle.kts")?;
  assert!(gradle.contains("versionName = \"1.4.3\""));
  assert!(gradle.contains("versionCode = 28"));

  // The tree now passes a strict drift check
  run_shipver_ok(&project.path, &["drift-check", "--strict"])?;

  Ok(())
}

#[test]
fn test_auto_fix_json_report() -> Result<()> {
  let project = TestProject::new()?;
  project.write_pubspec("1.4.3+28")?;

  let output = run_shipver_ok(&project.path, &["auto-fix", "--json"])?;
  let report: serde_json::Value = serde_json::from_str(&stdout_of(&output))?;

  assert_eq!(report["drift"]["in_sync"], false);
  assert_eq!(report["unify_writes"]["android_descriptor"]["outcome"], "updated");
  assert_eq!(report["unify_writes"]["manifest"]["outcome"], "unchanged");
  assert_eq!(report["resolve"]["state"], "done");
  assert_eq!(report["resolve"]["chosen"], "1.4.3+28");

  Ok(())
}

#[test]
fn test_auto_fix_in_sync_skips_convergence() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_shipver_ok(&project.path, &["auto-fix", "--json"])?;
  let report: serde_json::Value = serde_json::from_str(&stdout_of(&output))?;

  assert_eq!(report["drift"]["in_sync"], true);
  assert!(report["unify_writes"].as_object().is_some_and(|w| w.is_empty()));
  assert_eq!(report["resolve"]["state"], "done");

  Ok(())
}

#[test]
fn test_auto_fix_respects_held_lock() -> Result<()> {
  let project = TestProject::new()?;

  let lock_dir = project.path.join(".shipver");
  std::fs::create_dir_all(&lock_dir)?;
  std::fs::write(lock_dir.join("lock"), format!("pid {}\n", std::process::id()))?;

  let output = run_shipver(&project.path, &["auto-fix"])?;

  assert_eq!(output.status.code(), Some(2));
  assert!(stderr_of(&output).to_lowercase().contains("lock"));

  Ok(())
}
