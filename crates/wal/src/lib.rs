//! The WAL Coordinator: tracks confirmed transactions in the log, drives
//! checkpoints, and reconstructs state at recovery.
//!
//! This crate holds no file handles of its own. `pagefile` owns the
//! physical log stream and calls into [`WalCoordinator`] to decide what
//! the confirmed/pending bookkeeping should be as pages are written or
//! replayed; [`WalCoordinator`] decides, `pagefile` does the I/O.
//!
//! # Example
//!
//! ```
//! use common::EventBus;
//! use storage::PageHeader;
//! use wal::WalCoordinator;
//!
//! let wal = WalCoordinator::new(1000, EventBus::new());
//! let tx = wal.next_tx_id();
//!
//! // Two pages of a transaction, the second one confirmed.
//! wal.observe_log_page(&PageHeader::for_log(10, tx, false), 4096);
//! wal.observe_log_page(&PageHeader::for_log(20, tx, true), 8192);
//!
//! assert_eq!(wal.resolve(10), Some(4096));
//! assert_eq!(wal.resolve(20), Some(8192));
//! ```

#[cfg(test)]
mod tests;

mod coordinator;
mod log_header;

pub use coordinator::{RecoveryOutcome, WalCoordinator};
pub use log_header::{LogHeader, log_header_bytes};
