use std::io;
use thiserror::Error;

/// Canonical error type for the paged memory-file subsystem.
///
/// One variant per failure kind in the error-handling design: a malformed
/// on-disk header, a checksum that doesn't match its page, an I/O failure
/// surfaced from the underlying stream, a Memory Store that cannot grow,
/// and a producer that aborted mid-transaction.
#[derive(Error, Debug)]
pub enum DbError {
    /// A `LogHeader` or `PageHeader` failed validation (bad magic, version,
    /// or encoding). Fatal if it comes from the data file; the log is
    /// simply discarded if it comes from there.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// A page's stored checksum does not match its content. Treated as a
    /// miss and retried against the data file; fatal if the data file
    /// itself is the source.
    #[error("checksum mismatch: {0}")]
    ChecksumMismatch(String),

    /// The Memory Store could not allocate a new segment under the
    /// configured memory budget.
    #[error("capacity exhausted: {0}")]
    CapacityExhausted(String),

    /// A producer raised mid-transaction. No recovery is needed: the
    /// pending pages are simply never confirmed.
    #[error("transaction aborted: {0}")]
    TransactionAborted(String),

    /// Storage-layer failure not otherwise classified above.
    #[error("storage: {0}")]
    Storage(String),

    /// WAL-layer failure not otherwise classified above.
    #[error("wal: {0}")]
    Wal(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias that carries a `DbError`.
pub type DbResult<T> = Result<T, DbError>;
