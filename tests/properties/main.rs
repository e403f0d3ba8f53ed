//! Property-based tests.

mod determinism_tests;
mod validation_tests;
