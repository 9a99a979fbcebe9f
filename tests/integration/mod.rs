//! Integration test suite
//!
//! Each test builds a throwaway Flutter-style project in a temp
//! directory and drives the compiled `shipver` binary against it.
//! Store providers are either disabled or pointed at a closed local
//! port, so the suite runs without network access.

mod helpers;
mod test_autofix;
mod test_drift;
mod test_init;
mod test_resolve;
