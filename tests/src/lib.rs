//! Shared harness for the attendance engine's end-to-end tests.

pub mod fixtures;
pub mod mocks;
