//! Reconciliation and drift reports
//!
//! Every engine run produces a report before the process exits, whether the
//! run succeeded, partially failed, or only looked around. Reports are
//! JSON-serializable for CI and render to a human summary for terminals.
//! The report ID is a content hash of the decision, so identical inputs
//! produce identical IDs (same property the plan IDs had).

use crate::core::error::ShipResult;
use crate::version::VersionTag;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Report identifier (SHA256 hash of the decision contents)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportId(String);

impl ReportId {
  /// Create a report ID from decision contents
  pub fn from_contents(contents: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let result = hasher.finalize();
    Self(format!("{:x}", result))
  }

  /// Get the short ID (first 12 characters)
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }
}

impl fmt::Display for ReportId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

/// Where an observed version came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSource {
  Manifest,
  AndroidDescriptor,
  IosDescriptor,
  AppStore,
  PlayStore,
  Fallback,
}

impl fmt::Display for VersionSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      VersionSource::Manifest => "manifest",
      VersionSource::AndroidDescriptor => "Android descriptor",
      VersionSource::IosDescriptor => "iOS descriptor",
      VersionSource::AppStore => "App Store",
      VersionSource::PlayStore => "Play Store",
      VersionSource::Fallback => "fallback",
    };
    write!(f, "{}", label)
  }
}

/// A local descriptor the engine writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
  Manifest,
  AndroidDescriptor,
  IosDescriptor,
}

impl Target {
  /// The source label this target contributes during Gathering
  pub fn source(self) -> VersionSource {
    match self {
      Target::Manifest => VersionSource::Manifest,
      Target::AndroidDescriptor => VersionSource::AndroidDescriptor,
      Target::IosDescriptor => VersionSource::IosDescriptor,
    }
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      Target::Manifest => "manifest",
      Target::AndroidDescriptor => "Android",
      Target::IosDescriptor => "iOS",
    };
    write!(f, "{}", label)
  }
}

/// What Gathering learned from one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Observation {
  /// A version was read successfully
  Known { version: VersionTag },

  /// The source exists in principle but carries no version
  /// (missing file, placeholder values)
  Absent,

  /// The source could not be consulted; the cause is kept for the report
  Unknown { cause: String },
}

impl Observation {
  pub fn version(&self) -> Option<VersionTag> {
    match self {
      Observation::Known { version } => Some(*version),
      _ => None,
    }
  }
}

impl fmt::Display for Observation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Observation::Known { version } => write!(f, "{}", version),
      Observation::Absent => write!(f, "absent"),
      Observation::Unknown { cause } => write!(f, "unknown ({})", cause),
    }
  }
}

/// Why a write was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
  /// Descriptor file does not exist
  MissingFile,
  /// A managed field holds a build-time substitution marker
  Placeholder,
  /// An interrupt arrived before this write started
  Interrupted,
}

impl fmt::Display for SkipReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      SkipReason::MissingFile => "missing file",
      SkipReason::Placeholder => "placeholder value",
      SkipReason::Interrupted => "interrupted",
    };
    write!(f, "{}", label)
  }
}

/// Per-target result of the Writing phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WriteOutcome {
  /// File rewritten to the chosen version
  Updated {
    #[serde(skip_serializing_if = "Option::is_none")]
    previous: Option<VersionTag>,
  },

  /// File already carried the chosen version; left byte-identical
  Unchanged,

  /// File left alone (missing, placeholder-managed, or interrupted)
  Skipped { reason: SkipReason },

  /// The write was attempted and failed; siblings still ran
  Failed { error: String },
}

impl WriteOutcome {
  pub fn is_failed(&self) -> bool {
    matches!(self, WriteOutcome::Failed { .. })
  }

  fn is_interrupted(&self) -> bool {
    matches!(
      self,
      WriteOutcome::Skipped {
        reason: SkipReason::Interrupted
      }
    )
  }
}

impl fmt::Display for WriteOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      WriteOutcome::Updated { previous: Some(prev) } => write!(f, "updated (was {})", prev),
      WriteOutcome::Updated { previous: None } => write!(f, "updated"),
      WriteOutcome::Unchanged => write!(f, "unchanged"),
      WriteOutcome::Skipped { reason } => write!(f, "skipped ({})", reason),
      WriteOutcome::Failed { error } => write!(f, "failed: {}", error),
    }
  }
}

/// Terminal state of a reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
  Done,
  PartiallyFailed,
}

impl RunState {
  /// Fold write outcomes into a run state.
  ///
  /// A run only counts as Done when every descriptor either holds the chosen
  /// version or was skipped for a reason that is stable across re-runs;
  /// failures and interrupt skips both mean the invariant does not hold yet.
  pub fn from_writes<'a, I>(writes: I) -> Self
  where
    I: IntoIterator<Item = &'a WriteOutcome>,
  {
    let partial = writes
      .into_iter()
      .any(|outcome| outcome.is_failed() || outcome.is_interrupted());
    if partial { RunState::PartiallyFailed } else { RunState::Done }
  }
}

impl fmt::Display for RunState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RunState::Done => write!(f, "done"),
      RunState::PartiallyFailed => write!(f, "partially failed"),
    }
  }
}

/// Full record of one `resolve` run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveReport {
  /// Content hash of the decision
  pub id: ReportId,

  /// Policy string the run was invoked with
  pub policy: String,

  /// The version every target was (to be) written to
  pub chosen: VersionTag,

  /// Which source won the decision
  pub source: VersionSource,

  /// Whether `chosen` was bumped past a store version
  pub bumped: bool,

  /// Everything Gathering observed, successes and failures alike
  pub observed: BTreeMap<VersionSource, Observation>,

  /// Per-target write results
  pub writes: BTreeMap<Target, WriteOutcome>,

  /// Terminal state
  pub state: RunState,

  /// True when the Writing phase was simulated
  pub dry_run: bool,

  pub generated_at: DateTime<Utc>,
}

impl ResolveReport {
  pub fn new(
    policy: String,
    chosen: VersionTag,
    source: VersionSource,
    bumped: bool,
    observed: BTreeMap<VersionSource, Observation>,
    writes: BTreeMap<Target, WriteOutcome>,
    dry_run: bool,
  ) -> Self {
    let state = RunState::from_writes(writes.values());
    let id = Self::compute_id(&chosen, source, &observed);
    Self {
      id,
      policy,
      chosen,
      source,
      bumped,
      observed,
      writes,
      state,
      dry_run,
      generated_at: Utc::now(),
    }
  }

  /// Hash the decision inputs so identical observations yield identical IDs
  fn compute_id(chosen: &VersionTag, source: VersionSource, observed: &BTreeMap<VersionSource, Observation>) -> ReportId {
    let contents = serde_json::to_vec(&(chosen, source, observed)).unwrap_or_default();
    ReportId::from_contents(&contents)
  }

  /// Serialize to JSON
  pub fn to_json(&self) -> ShipResult<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Get human-readable representation
  pub fn to_human_readable(&self) -> String {
    let mut output = String::new();

    let mode = if self.dry_run { " (dry-run)" } else { "" };
    output.push_str(&format!("📦 Reconciliation {}{}\n", self.id, mode));
    output.push_str(&format!("   Policy: {}\n", self.policy));

    output.push_str("\n   Observed versions:\n");
    for (source, observation) in &self.observed {
      output.push_str(&format!("     {:<20} {}\n", source.to_string(), observation));
    }

    let how = if self.bumped { ", bumped" } else { "" };
    output.push_str(&format!("\n   Decision: {} (from {}{})\n", self.chosen, self.source, how));

    output.push_str("\n   Writes:\n");
    if self.writes.is_empty() {
      output.push_str("     (none)\n");
    }
    for (target, outcome) in &self.writes {
      let icon = match outcome {
        WriteOutcome::Updated { .. } => "✅",
        WriteOutcome::Unchanged => "✅",
        WriteOutcome::Skipped { .. } => "⏭️ ",
        WriteOutcome::Failed { .. } => "❌",
      };
      output.push_str(&format!("     {} {:<10} {}\n", icon, target.to_string(), outcome));
    }

    output.push_str(&format!("\n   State: {}\n", self.state));
    output
  }

  /// Names of targets whose writes failed (for the partial-failure error)
  pub fn failed_targets(&self) -> Vec<String> {
    self
      .writes
      .iter()
      .filter(|(_, outcome)| outcome.is_failed())
      .map(|(target, _)| target.to_string())
      .collect()
  }
}

/// Record of a read-only drift check across local descriptors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftReport {
  /// Local observations only; no store is consulted
  pub observed: BTreeMap<VersionSource, Observation>,

  /// True when every known local version is identical
  pub in_sync: bool,

  /// Highest version seen locally
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max: Option<VersionTag>,

  /// Human-readable drift descriptions
  pub details: Vec<String>,

  pub generated_at: DateTime<Utc>,
}

impl DriftReport {
  pub fn new(observed: BTreeMap<VersionSource, Observation>) -> Self {
    let known: Vec<(VersionSource, VersionTag)> = observed
      .iter()
      .filter_map(|(source, obs)| obs.version().map(|v| (*source, v)))
      .collect();

    let max = known.iter().map(|(_, v)| *v).max();
    let in_sync = match max {
      Some(max) => known.iter().all(|(_, v)| *v == max),
      None => true,
    };

    let details = match max {
      Some(max) if !in_sync => known
        .iter()
        .filter(|(_, v)| *v != max)
        .map(|(source, v)| format!("{} has {} (behind {})", source, v, max))
        .collect(),
      _ => Vec::new(),
    };

    Self {
      observed,
      in_sync,
      max,
      details,
      generated_at: Utc::now(),
    }
  }

  /// Serialize to JSON
  pub fn to_json(&self) -> ShipResult<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Get human-readable representation
  pub fn to_human_readable(&self) -> String {
    let mut output = String::new();
    output.push_str("🔍 Drift check\n\n");

    for (source, observation) in &self.observed {
      output.push_str(&format!("   {:<20} {}\n", source.to_string(), observation));
    }

    if self.in_sync {
      match self.max {
        Some(max) => output.push_str(&format!("\n✅ All local descriptors agree on {}\n", max)),
        None => output.push_str("\n✅ No local versions to compare\n"),
      }
    } else {
      output.push_str("\n⚠️  Drift detected:\n");
      for detail in &self.details {
        output.push_str(&format!("   - {}\n", detail));
      }
      if let Some(max) = self.max {
        output.push_str(&format!("\n   Local maximum: {}\n", max));
      }
    }

    output
  }
}

/// Combined record of an `auto-fix` run: drift, local convergence, then resolve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoFixReport {
  pub drift: DriftReport,

  /// Writes performed to converge drifted descriptors before reconciling;
  /// empty when nothing was drifted
  pub unify_writes: BTreeMap<Target, WriteOutcome>,

  pub resolve: ResolveReport,
}

impl AutoFixReport {
  /// Serialize to JSON
  pub fn to_json(&self) -> ShipResult<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Get human-readable representation
  pub fn to_human_readable(&self) -> String {
    let mut output = String::new();
    output.push_str(&self.drift.to_human_readable());

    if !self.unify_writes.is_empty() {
      if let Some(max) = self.drift.max {
        output.push_str(&format!("\n🔧 Converging local descriptors to {}:\n", max));
      }
      for (target, outcome) in &self.unify_writes {
        output.push_str(&format!("   {:<10} {}\n", target.to_string(), outcome));
      }
    }

    output.push('\n');
    output.push_str(&self.resolve.to_human_readable());
    output
  }
}
