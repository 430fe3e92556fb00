//! Testing utilities for the pagegraph workspace
//!
//! Shared fakes and fixtures.

#![allow(missing_docs)]

pub mod fake;
pub mod fixtures;

pub use fake::{FakeTransport, RecordedCall, Reply};
pub use fixtures::*;
