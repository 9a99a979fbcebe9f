use regex::Regex;
use std::env;
use std::fs;
use std::path::Path;

use crate::core::config::{GRADLE_CANDIDATES, ShipConfig};
use crate::core::error::{ShipError, ShipResult};

/// Run the init command
pub fn run_init(force: bool) -> ShipResult<()> {
  let current_dir = env::current_dir()?;

  if ShipConfig::exists(&current_dir) && !force {
    return Err(ShipError::with_help(
      "shipver.toml already exists",
      "Re-run with --force to overwrite the existing configuration.",
    ));
  }

  let (bundle_id, package_name) = detect_identifiers(&current_dir);
  let config = ShipConfig::starter(bundle_id, package_name);
  config.save(&current_dir)?;

  println!("✅ Created {}", current_dir.join("shipver.toml").display());
  println!("\nNext steps:");
  println!("  1. Check `app.bundle_id` and `app.package_name` match your released identifiers");
  println!("  2. Add an [app_store] section with your API key to enable App Store lookups");
  println!("  3. Run `shipver drift-check` to see where your descriptors stand");

  Ok(())
}

/// Pulls the app identifiers out of the platform descriptors when they are
/// present, so the starter config matches the project it lands in.
fn detect_identifiers(root: &Path) -> (String, String) {
  let application_id = Regex::new(r#"applicationId\s*=?\s*"([^"]+)""#).unwrap();
  let package_name = GRADLE_CANDIDATES
    .iter()
    .filter_map(|candidate| fs::read_to_string(root.join(candidate)).ok())
    .find_map(|content| application_id.captures(&content).map(|caps| caps[1].to_string()))
    .unwrap_or_else(|| "com.example.app".to_string());

  let bundle_pattern = Regex::new(r"PRODUCT_BUNDLE_IDENTIFIER\s*=\s*([^;]+);").unwrap();
  let bundle_id = fs::read_to_string(root.join("ios/Runner.xcodeproj/project.pbxproj"))
    .ok()
    .and_then(|content| {
      bundle_pattern
        .captures(&content)
        .map(|caps| caps[1].trim().trim_matches('"').to_string())
    })
    .unwrap_or_else(|| package_name.clone());

  (bundle_id, package_name)
}
