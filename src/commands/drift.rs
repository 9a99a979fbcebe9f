use std::env;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::core::context::ProjectContext;
use crate::core::engine::ReconcileEngine;
use crate::core::error::{ShipError, ShipResult, ValidationError};

/// Run the drift-check command
pub fn run_drift_check(strict: bool, json: bool) -> ShipResult<()> {
  let current_dir = env::current_dir()?;
  let ctx = ProjectContext::build(&current_dir)?;

  // Read-only; no lock, no store traffic.
  let engine = ReconcileEngine::from_context(&ctx, Arc::new(AtomicBool::new(false)));
  let report = engine.drift_check()?;

  if json {
    println!("{}", report.to_json()?);
  } else {
    println!("{}", report.to_human_readable());
  }

  if strict && !report.in_sync {
    return Err(ShipError::Validation(ValidationError::Drifted {
      details: report.details.clone(),
    }));
  }

  Ok(())
}
