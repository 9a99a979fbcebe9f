use std::env;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::commands::resolve::{check_run_state, effective_policy};
use crate::core::context::ProjectContext;
use crate::core::engine::ReconcileEngine;
use crate::core::error::{ShipError, ShipResult, ValidationError};
use crate::core::lock::ProjectLock;

/// Run the auto-fix command
pub fn run_auto_fix(
  policy: Option<String>,
  fresh: bool,
  json: bool,
  interrupt: Arc<AtomicBool>,
) -> ShipResult<()> {
  let current_dir = env::current_dir()?;
  let ctx = ProjectContext::build(&current_dir)?;

  let policy = effective_policy(&ctx, policy)?;
  let _lock = ProjectLock::acquire(&ctx.lock_path())?;

  if !json {
    println!("🔧 Auto-fixing versions for {}\n", ctx.config.app.package_name);
  }

  let engine = ReconcileEngine::from_context(&ctx, interrupt)
    .with_fresh(fresh)
    .with_quiet(json);
  let report = engine.auto_fix(&policy)?;

  if json {
    println!("{}", report.to_json()?);
  } else {
    println!("{}", report.to_human_readable());
  }

  // The convergence writes can fail even when the reconciliation succeeds.
  let unify_failed: Vec<String> = report
    .unify_writes
    .iter()
    .filter(|(_, outcome)| outcome.is_failed())
    .map(|(target, _)| target.to_string())
    .collect();
  if !unify_failed.is_empty() {
    return Err(ShipError::Validation(ValidationError::PartialFailure {
      failed: unify_failed,
    }));
  }

  check_run_state(&report.resolve)
}
