//! Sync policy parsing: how to pick the next version
//!
//! A policy is immutable for the duration of one invocation; there is no
//! global mutable configuration anywhere in the engine.

use crate::core::error::{ConfigError, ShipError, ShipResult};
use crate::version::BumpKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the chosen version may come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncStrategy {
  /// Prefer store versions, fall back to local/configured when unreachable (default)
  #[default]
  StoreOrFallback,
  /// Ignore stores entirely
  FallbackOnly,
  /// Store version required; fail when none is available
  StoreOnly,
}

impl SyncStrategy {
  pub fn parse(s: &str) -> Result<Self, String> {
    match s.to_lowercase().as_str() {
      "store-or-fallback" | "stores" => Ok(Self::StoreOrFallback),
      "fallback-only" | "fallback" => Ok(Self::FallbackOnly),
      "store-only" => Ok(Self::StoreOnly),
      _ => Err(format!(
        "Invalid strategy '{}'. Valid options: store-or-fallback, fallback-only, store-only",
        s
      )),
    }
  }
}

impl fmt::Display for SyncStrategy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      SyncStrategy::StoreOrFallback => "store-or-fallback",
      SyncStrategy::FallbackOnly => "fallback-only",
      SyncStrategy::StoreOnly => "store-only",
    };
    write!(f, "{}", label)
  }
}

/// Full policy for one reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPolicy {
  pub strategy: SyncStrategy,
  pub bump: BumpKind,

  /// When false, a store version at or past the local one is a hard
  /// conflict instead of an automatic move past it
  pub auto_increment: bool,
}

impl Default for SyncPolicy {
  fn default() -> Self {
    Self {
      strategy: SyncStrategy::default(),
      bump: BumpKind::Auto,
      auto_increment: true,
    }
  }
}

impl SyncPolicy {
  /// Parse `<strategy>[:<bump>]`, e.g. `store-or-fallback:build`.
  ///
  /// An omitted bump means `auto`; an empty string is the default policy.
  pub fn parse(input: &str) -> ShipResult<Self> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
      return Ok(Self::default());
    }

    let (strategy_str, bump_str) = match trimmed.split_once(':') {
      Some((strategy, bump)) => (strategy, Some(bump)),
      None => (trimmed, None),
    };

    let strategy = SyncStrategy::parse(strategy_str).map_err(|reason| {
      ShipError::Config(ConfigError::InvalidPolicy {
        input: input.to_string(),
        reason,
      })
    })?;

    let bump = match bump_str {
      Some(raw) => BumpKind::parse(raw).map_err(|reason| {
        ShipError::Config(ConfigError::InvalidPolicy {
          input: input.to_string(),
          reason,
        })
      })?,
      None => BumpKind::Auto,
    };

    Ok(Self {
      strategy,
      bump,
      auto_increment: true,
    })
  }

  pub fn with_auto_increment(mut self, enabled: bool) -> Self {
    self.auto_increment = enabled;
    self
  }
}

impl fmt::Display for SyncPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.strategy, self.bump)?;
    if !self.auto_increment {
      write!(f, " (no-auto-increment)")?;
    }
    Ok(())
  }
}
