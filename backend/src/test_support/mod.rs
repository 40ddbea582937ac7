//! Test doubles shared by unit and integration tests.
//!
//! Compiled for `cfg(test)` and behind the `test-support` feature.

pub mod clock;
pub mod remote;
