//! Core engine for shipver operations
//!
//! This module contains the fundamental building blocks every command uses:
//!
//! - **cache**: Best-effort store observation cache with TTL
//! - **config**: Shipver configuration (shipver.toml) parsing and validation
//! - **context**: Resolved project paths plus loaded configuration
//! - **engine**: Gather/decide/write reconciliation engine
//! - **error**: Error taxonomy with contextual help messages and exit codes
//! - **lock**: Advisory per-project lock for mutating commands
//! - **policy**: Sync policy parsing (strategy plus bump kind)
//! - **report**: Run reports and per-target write outcomes

pub mod cache;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod lock;
pub mod policy;
pub mod report;
