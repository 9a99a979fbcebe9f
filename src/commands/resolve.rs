use std::env;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::core::context::ProjectContext;
use crate::core::engine::ReconcileEngine;
use crate::core::error::{ShipError, ShipResult, ValidationError};
use crate::core::lock::ProjectLock;
use crate::core::policy::SyncPolicy;
use crate::core::report::{ResolveReport, RunState};

/// Run the resolve command
pub fn run_resolve(
  policy: Option<String>,
  dry_run: bool,
  no_auto_increment: bool,
  fresh: bool,
  json: bool,
  interrupt: Arc<AtomicBool>,
) -> ShipResult<()> {
  let current_dir = env::current_dir()?;
  let ctx = ProjectContext::build(&current_dir)?;

  let policy = effective_policy(&ctx, policy)?.with_auto_increment(!no_auto_increment);

  // Dry runs write nothing, so they skip the lock too.
  let _lock = if dry_run { None } else { Some(ProjectLock::acquire(&ctx.lock_path())?) };

  if !json {
    println!("🔄 Reconciling versions for {}\n", ctx.config.app.package_name);
  }

  let engine = ReconcileEngine::from_context(&ctx, interrupt)
    .with_fresh(fresh)
    .with_quiet(json);
  let report = engine.resolve(&policy, dry_run)?;

  if json {
    println!("{}", report.to_json()?);
  } else {
    println!("{}", report.to_human_readable());
  }

  check_run_state(&report)
}

/// CLI flag beats the configured default, which beats the built-in default.
pub fn effective_policy(ctx: &ProjectContext, flag: Option<String>) -> ShipResult<SyncPolicy> {
  match flag {
    Some(input) => SyncPolicy::parse(&input),
    None => ctx.config.default_policy(),
  }
}

/// A partially failed run exits with a validation error so CI notices.
pub fn check_run_state(report: &ResolveReport) -> ShipResult<()> {
  if report.state != RunState::PartiallyFailed {
    return Ok(());
  }

  let failed = report.failed_targets();
  if failed.is_empty() {
    // Interrupted before the targets were written; nothing actually failed.
    return Err(ShipError::with_help(
      "Interrupted before all targets were written",
      "Re-run `shipver resolve` to finish writing the remaining targets.",
    ));
  }
  Err(ShipError::Validation(ValidationError::PartialFailure { failed }))
}
