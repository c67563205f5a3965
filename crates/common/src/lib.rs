//! Shared identifiers, error types, configuration, and diagnostics for the
//! paged memory-file subsystem.
//!
//! This crate has no I/O of its own. It exists so that `storage`, `buffer`,
//! `wal`, and `pagefile` can agree on the vocabulary of the subsystem
//! without depending on each other.


mod config;
mod error;
mod event;

pub use config::{Config, FileMode};
pub use error::{DbError, DbResult};
pub use event::{Event, EventBus};

use serde::{Deserialize, Serialize};

/// Logical identifier for a page: its absolute byte offset divided by
/// `PAGE_SIZE`. See `storage::PAGE_SIZE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageId(pub u64);

/// Identifier for a transaction: a group of page writes committed
/// atomically by a final page with the confirmed flag set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxId(pub u64);

/// Where a [`buffer::PageBuffer`](../buffer/struct.PageBuffer.html) currently
/// lives. Forms half of the Memory Store's readable-map key, the other half
/// being the page's logical position.
///
/// `New` marks a writable slot that has not yet been assigned a home; it is
/// never a valid readable-map key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    Data,
    Log,
    New,
}

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{Config, DbError, DbResult, Event, EventBus, Origin, PageId, TxId};
}
