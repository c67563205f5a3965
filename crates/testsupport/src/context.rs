//! Test execution context: an isolated, temp-dir-backed `PagedFile`.
//!
//! Provides a one-line way to stand up a fresh subsystem instance per test,
//! and to reopen it against the same directory to model a process restart
//! (and, with it, crash recovery). Cleaned up automatically on drop.

use common::{Config, DbResult, FileMode};
use pagefile::PagedFile;
use tempfile::TempDir;

/// A test-scoped `PagedFile` with its backing directory.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
///
/// let ctx = TestContext::new().unwrap();
/// let tx = ctx.file.begin_transaction().unwrap();
/// let _ = tx;
/// ```
pub struct TestContext {
    pub file: PagedFile,
    config: Config,
    _temp_dir: TempDir,
}

impl TestContext {
    /// Open a `DataFile`-mode instance with a low checkpoint threshold, so
    /// tests don't need hundreds of writes to observe a checkpoint.
    pub fn new() -> DbResult<Self> {
        Self::with_config(base_config(FileMode::DataFile, None))
    }

    /// Open with a specific `FileMode`.
    pub fn with_mode(mode: FileMode) -> DbResult<Self> {
        Self::with_config(base_config(mode, None))
    }

    /// Open with page encryption enabled using the given passphrase.
    pub fn with_encryption_key(key: Vec<u8>) -> DbResult<Self> {
        Self::with_config(base_config(FileMode::DataFile, Some(key)))
    }

    fn with_config(config: Config) -> DbResult<Self> {
        let temp_dir = tempfile::tempdir()?;
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..config
        };
        let file = PagedFile::open(config.clone())?;
        Ok(Self {
            file,
            config,
            _temp_dir: temp_dir,
        })
    }

    /// Reopen a fresh `PagedFile` handle over the same directory, modeling a
    /// process restart (and, with it, crash recovery).
    pub fn reopen(&self) -> DbResult<PagedFile> {
        PagedFile::open(self.config.clone())
    }

    pub fn data_dir(&self) -> &std::path::Path {
        &self.config.data_dir
    }
}

fn base_config(mode: FileMode, encryption_key: Option<Vec<u8>>) -> Config {
    Config::builder()
        .mode(mode)
        .checkpoint_threshold_pages(4)
        .maybe_encryption_key(encryption_key)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_creation() {
        let ctx = TestContext::new();
        assert!(ctx.is_ok());
    }

    #[test]
    fn test_context_reopen_sees_an_empty_file() {
        let ctx = TestContext::new().unwrap();
        let reopened = ctx.reopen().unwrap();
        assert_eq!(reopened.length(), 0);
    }
}
