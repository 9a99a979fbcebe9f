//! Store providers - published-version lookup per distribution channel
//!
//! One provider per store:
//!
//! - **app_store**: App Store Connect API, authenticated build list
//! - **play_store**: public Play Store listing page scrape
//! - **token**: short-lived ES256 bearer tokens for App Store Connect
//!
//! Store lookups are advisory. A provider that cannot produce a version
//! reports `Observation::Unknown` with the cause preserved for the report
//! instead of failing the run; whether an all-unknown gather is fatal is a
//! policy decision made by the engine.

pub mod app_store;
pub mod play_store;
pub mod token;

use crate::core::report::{Observation, VersionSource};

/// A remote source of published version information.
///
/// Providers are queried in parallel, one thread each, so implementations
/// must be shareable across threads and do their own timeouts.
pub trait StoreProvider: Send + Sync {
  /// Which store this provider speaks for.
  fn source(&self) -> VersionSource;

  /// The latest version the store knows about. Trouble of any kind folds
  /// into `Observation::Unknown`.
  fn fetch_latest(&self) -> Observation;
}
