//! CLI commands for shipver
//!
//! This module contains all user-facing command implementations:
//!
//! - **init**: Create a starter shipver.toml for a project
//! - **resolve**: Reconcile local descriptor versions against the stores
//! - **drift**: Read-only comparison of local descriptor versions
//! - **autofix**: Converge drifted descriptors, then reconcile
//!
//! Commands build their own `ProjectContext` from the current directory.
//! Mutating commands additionally hold the advisory project lock for the
//! duration of the run.

pub mod autofix;
pub mod drift;
pub mod init;
pub mod resolve;

pub use autofix::run_auto_fix;
pub use drift::run_drift_check;
pub use init::run_init;
pub use resolve::run_resolve;
