//! Test support utilities for the paged memory-file subsystem.
//!
//! This crate provides:
//! - Isolated test execution contexts wrapping a temp-dir-backed `PagedFile`
//! - Page builders for low-level tests
//! - Custom assertion helpers for payloads, errors, and diagnostic events
//! - Property-based test generators for positions, payloads, and configs
//!
//! # Example
//!
//! ```
//! use testsupport::prelude::*;
//!
//! let ctx = TestContext::new().unwrap();
//! write_confirmed_page(&ctx.file, 0, 0xAA).unwrap();
//!
//! let mut reader = ctx.file.get_reader(false).unwrap();
//! let page = reader.read_page(0).unwrap();
//! assert_payload_filled(page.page.payload(), 0xAA);
//! ```

pub mod assertions;
pub mod context;
pub mod fixtures;
pub mod proptest_generators;

/// Convenient re-exports for common testing patterns.
pub mod prelude {
    pub use crate::assertions::*;
    pub use crate::context::*;
    pub use crate::fixtures::*;
}
