use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Selects append-only versus random-access persistence for a `PagedFile`.
///
/// `DataFile` is the default random-access mode: writes go through a
/// dedicated log file and a `WalCoordinator`, and are checkpointed into the
/// data file once confirmed. `LogFile` skips the WAL indirection and treats
/// the primary file itself as a plain append-only log — every write lands
/// at the current end of file, with no confirm/checkpoint machinery.
/// `TempFile` is plain random-access with no WAL at all, for scratch files
/// that don't need crash recovery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileMode {
    DataFile,
    LogFile,
    TempFile,
}

/// Runtime configuration for a `PagedFile` and its collaborators.
///
/// # Example
/// ```
/// use common::Config;
/// use std::path::PathBuf;
///
/// let config = Config::builder()
///     .data_dir(PathBuf::from("./my_db"))
///     .buffer_pool_pages(512)
///     .checkpoint_threshold_pages(2000)
///     .build();
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, bon::Builder)]
pub struct Config {
    /// Directory holding the data file and log file.
    #[builder(default = PathBuf::from("./db_data"))]
    pub data_dir: PathBuf,

    /// Persistence mode for the primary stream.
    #[builder(default = FileMode::DataFile)]
    pub mode: FileMode,

    /// Number of pages the Memory Store keeps resident per segment growth
    /// step before it is willing to evict instead of allocate.
    #[builder(default = 256)]
    pub buffer_pool_pages: usize,

    /// Log size, in pages, at which an automatic checkpoint triggers.
    #[builder(default = 1000)]
    pub checkpoint_threshold_pages: usize,

    /// Optional passphrase enabling AES-256-GCM page encryption. `None`
    /// disables encryption entirely. The bytes are stretched into a key via
    /// HKDF-SHA256, not used directly.
    #[builder(default)]
    pub encryption_key: Option<Vec<u8>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./db_data"),
            mode: FileMode::DataFile,
            buffer_pool_pages: 256,
            checkpoint_threshold_pages: 1000,
            encryption_key: None,
        }
    }
}
