//! Reconciliation engine
//!
//! One run moves through four phases. Gathering reads every local
//! descriptor and, policy permitting, queries the stores in parallel.
//! Deciding folds the observations into a single chosen version. Writing
//! pushes the chosen version through each adapter in turn, recording the
//! outcome per target. The run then lands in `Done` or `PartiallyFailed`.
//!
//! A failed store lookup or platform-descriptor read never aborts a run on
//! its own; it degrades into an unknown observation and the policy decides
//! what that means. A failed write on one target does not stop writes to
//! the others. Interruption is
//! honored at phase boundaries and between writes, and an interrupted run
//! reports every unwritten target as skipped.

use crate::adapters::DescriptorAdapter;
use crate::adapters::gradle::GradleAdapter;
use crate::adapters::ios::IosAdapter;
use crate::adapters::pubspec::PubspecAdapter;
use crate::core::cache::ObservedCache;
use crate::core::context::ProjectContext;
use crate::core::error::{DescriptorError, ShipError, ShipResult, StoreError, ValidationError};
use crate::core::policy::{SyncPolicy, SyncStrategy};
use crate::core::report::{
  AutoFixReport, DriftReport, Observation, ResolveReport, SkipReason, Target, VersionSource,
  WriteOutcome,
};
use crate::stores::StoreProvider;
use crate::stores::app_store::AppStoreProvider;
use crate::stores::play_store::PlayStoreProvider;
use crate::stores::token::TokenSigner;
use crate::ui::progress::FetchProgress;
use crate::version::VersionTag;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct ReconcileEngine {
  adapters: Vec<Box<dyn DescriptorAdapter>>,
  providers: Vec<Box<dyn StoreProvider>>,
  fallback: Option<VersionTag>,
  manifest_path: PathBuf,
  cache_path: PathBuf,
  cache_key: String,
  cache_enabled: bool,
  cache_ttl_secs: u64,
  fresh: bool,
  quiet: bool,
  interrupt: Arc<AtomicBool>,
}

/// What Deciding settled on.
struct Decision {
  chosen: VersionTag,
  source: VersionSource,
  bumped: bool,
}

impl ReconcileEngine {
  pub fn from_context(ctx: &ProjectContext, interrupt: Arc<AtomicBool>) -> Self {
    let adapters: Vec<Box<dyn DescriptorAdapter>> = vec![
      Box::new(PubspecAdapter::new(ctx.manifest_path.clone())),
      Box::new(GradleAdapter::new(ctx.gradle_path.clone())),
      Box::new(IosAdapter::new(ctx.ios_plist_path.clone(), ctx.ios_pbxproj_path.clone())),
    ];

    let mut providers: Vec<Box<dyn StoreProvider>> = Vec::new();
    if let Some(app_store) = &ctx.config.app_store {
      let key_path = if app_store.key_path.is_absolute() {
        app_store.key_path.clone()
      } else {
        ctx.root.join(&app_store.key_path)
      };
      let signer =
        TokenSigner::new(app_store.key_id.clone(), app_store.issuer_id.clone(), key_path);
      providers.push(Box::new(AppStoreProvider::new(
        app_store.api_url.clone(),
        ctx.config.app.bundle_id.clone(),
        signer,
      )));
    }
    providers.push(Box::new(PlayStoreProvider::new(
      ctx.config.play_store.listing_url.clone(),
      ctx.config.app.package_name.clone(),
    )));

    Self {
      adapters,
      providers,
      fallback: ctx.config.sync.fallback_version,
      manifest_path: ctx.manifest_path.clone(),
      cache_path: ctx.cache_path(),
      cache_key: ctx.config.store_fingerprint(),
      cache_enabled: ctx.config.sync.cache,
      cache_ttl_secs: ctx.config.sync.cache_ttl_secs,
      fresh: false,
      quiet: false,
      interrupt,
    }
  }

  /// Bypass the observation cache for this run.
  pub fn with_fresh(mut self, fresh: bool) -> Self {
    self.fresh = fresh;
    self
  }

  /// Suppress progress bars (JSON output mode).
  pub fn with_quiet(mut self, quiet: bool) -> Self {
    self.quiet = quiet;
    self
  }

  /// Reconcile local descriptors against the stores under `policy`.
  pub fn resolve(&self, policy: &SyncPolicy, dry_run: bool) -> ShipResult<ResolveReport> {
    let (manifest, mut observed) = self.gather_local()?;

    if policy.strategy != SyncStrategy::FallbackOnly {
      for (source, observation) in self.gather_stores() {
        observed.insert(source, observation);
      }
    }

    let decision = self.decide(policy, manifest, &observed)?;

    let writes = if dry_run {
      BTreeMap::new()
    } else {
      self.write_all(&decision.chosen)
    };

    Ok(ResolveReport::new(
      policy.to_string(),
      decision.chosen,
      decision.source,
      decision.bumped,
      observed,
      writes,
      dry_run,
    ))
  }

  /// Read-only comparison of the local descriptors. No store is consulted
  /// and nothing is written.
  pub fn drift_check(&self) -> ShipResult<DriftReport> {
    let (_, observed) = self.gather_local()?;
    Ok(DriftReport::new(observed))
  }

  /// Converge drifted descriptors onto the highest local version, then run
  /// a normal reconciliation from the unified state.
  pub fn auto_fix(&self, policy: &SyncPolicy) -> ShipResult<AutoFixReport> {
    let (_, observed) = self.gather_local()?;
    let drift = DriftReport::new(observed);

    let unify_writes = match (drift.in_sync, drift.max) {
      (false, Some(max)) => self.write_all(&max),
      _ => BTreeMap::new(),
    };

    let resolve = self.resolve(policy, false)?;
    Ok(AutoFixReport { drift, unify_writes, resolve })
  }

  /// Reads every descriptor. The manifest must yield a version; a platform
  /// descriptor that is absent or unreadable degrades to an observation.
  fn gather_local(&self) -> ShipResult<(VersionTag, BTreeMap<VersionSource, Observation>)> {
    let mut observed = BTreeMap::new();
    let mut manifest = None;

    for adapter in &self.adapters {
      let source = adapter.target().source();
      let observation = if adapter.target() == Target::Manifest {
        match adapter.read()? {
          Some(version) => {
            manifest = Some(version);
            Observation::Known { version }
          }
          None => Observation::Absent,
        }
      } else {
        match adapter.read() {
          Ok(Some(version)) => Observation::Known { version },
          Ok(None) => Observation::Absent,
          Err(e) => Observation::Unknown { cause: e.to_string() },
        }
      };
      observed.insert(source, observation);
    }

    let manifest = manifest.ok_or_else(|| {
      ShipError::Descriptor(DescriptorError::NotFound {
        target: Target::Manifest,
        path: self.manifest_path.clone(),
      })
    })?;
    Ok((manifest, observed))
  }

  /// Queries all providers in parallel, one thread each. Fresh cache
  /// entries short-circuit the network; new answers are cached for the
  /// next run. Cache trouble is never fatal.
  fn gather_stores(&self) -> Vec<(VersionSource, Observation)> {
    let mut cache = if self.cache_enabled {
      ObservedCache::load(&self.cache_path, &self.cache_key)
    } else {
      ObservedCache::default()
    };

    let mut results: Vec<(VersionSource, Observation)> = Vec::new();
    let mut to_fetch: Vec<&dyn StoreProvider> = Vec::new();
    for provider in &self.providers {
      if self.cache_enabled && !self.fresh {
        if let Some(version) = cache.fresh(provider.source(), self.cache_ttl_secs) {
          results.push((provider.source(), Observation::Known { version }));
          continue;
        }
      }
      to_fetch.push(provider.as_ref());
    }

    let progress = if self.quiet || to_fetch.is_empty() {
      None
    } else {
      Some(FetchProgress::new())
    };
    let bars: Vec<_> = progress
      .as_ref()
      .map(|p| {
        to_fetch
          .iter()
          .map(|provider| p.add_bar(1, format!("Querying {}", provider.source())))
          .collect()
      })
      .unwrap_or_default();

    let fetched: Vec<(VersionSource, Observation)> = to_fetch
      .par_iter()
      .enumerate()
      .map(|(idx, provider)| {
        let observation = provider.fetch_latest();
        if let Some(p) = &progress {
          p.inc(&bars[idx]);
        }
        (provider.source(), observation)
      })
      .collect();

    for (source, observation) in &fetched {
      if let Observation::Known { version } = observation {
        cache.record(*source, *version);
      }
    }
    if self.cache_enabled {
      cache.store(&self.cache_path);
    }

    results.extend(fetched);
    results
  }

  fn decide(
    &self,
    policy: &SyncPolicy,
    manifest: VersionTag,
    observed: &BTreeMap<VersionSource, Observation>,
  ) -> ShipResult<Decision> {
    // Highest version any store produced; ties keep the first store in
    // source order.
    let mut best: Option<(VersionSource, VersionTag)> = None;
    for (source, observation) in observed {
      if !matches!(source, VersionSource::AppStore | VersionSource::PlayStore) {
        continue;
      }
      if let Some(version) = observation.version() {
        if best.is_none_or(|(_, b)| version > b) {
          best = Some((*source, version));
        }
      }
    }

    match policy.strategy {
      SyncStrategy::FallbackOnly => Ok(self.fallback_decision(manifest)),
      SyncStrategy::StoreOnly => match best {
        Some((source, version)) => self.against_local(policy, manifest, version, source),
        None => Err(ShipError::Store(StoreError::NoVersion {
          causes: store_causes(observed),
        })),
      },
      SyncStrategy::StoreOrFallback => match best {
        Some((source, version)) => self.against_local(policy, manifest, version, source),
        None => Ok(self.fallback_decision(manifest)),
      },
    }
  }

  /// No usable store version: settle on the configured fallback, or the
  /// manifest when none is configured. Never bumps.
  fn fallback_decision(&self, manifest: VersionTag) -> Decision {
    match self.fallback {
      Some(chosen) => Decision { chosen, source: VersionSource::Fallback, bumped: false },
      None => Decision { chosen: manifest, source: VersionSource::Manifest, bumped: false },
    }
  }

  /// A store version exists. If the manifest is already past it, nothing
  /// moves. Otherwise the next version must clear the store, which means a
  /// bump, or a conflict error when bumping is off.
  fn against_local(
    &self,
    policy: &SyncPolicy,
    manifest: VersionTag,
    store: VersionTag,
    source: VersionSource,
  ) -> ShipResult<Decision> {
    if manifest > store {
      return Ok(Decision { chosen: manifest, source: VersionSource::Manifest, bumped: false });
    }
    if !policy.auto_increment {
      return Err(ShipError::Validation(ValidationError::Conflict {
        local: manifest,
        store,
        source: source.to_string(),
      }));
    }
    Ok(Decision { chosen: store.bump(policy.bump), source, bumped: true })
  }

  /// Writes the chosen version through every adapter. Failures are recorded
  /// and do not stop the remaining writes; an interrupt makes the rest of
  /// the targets skip.
  fn write_all(&self, chosen: &VersionTag) -> BTreeMap<Target, WriteOutcome> {
    let mut writes = BTreeMap::new();
    for adapter in &self.adapters {
      let outcome = if self.interrupted() {
        WriteOutcome::Skipped { reason: SkipReason::Interrupted }
      } else {
        adapter.write(chosen)
      };
      writes.insert(adapter.target(), outcome);
    }
    writes
  }

  fn interrupted(&self) -> bool {
    self.interrupt.load(Ordering::SeqCst)
  }
}

/// Per-store explanations for a run that found no store version.
fn store_causes(observed: &BTreeMap<VersionSource, Observation>) -> Vec<String> {
  let mut causes: Vec<String> = observed
    .iter()
    .filter(|(source, _)| {
      matches!(source, VersionSource::AppStore | VersionSource::PlayStore)
    })
    .filter_map(|(source, observation)| match observation {
      Observation::Unknown { cause } => Some(format!("{source}: {cause}")),
      _ => None,
    })
    .collect();
  if causes.is_empty() {
    causes.push("no store providers are configured".to_string());
  }
  causes
}
