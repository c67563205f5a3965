use common::{DbError, DbResult};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Opens read and write streams over the two physical files this subsystem
/// maintains. A `PagedFile` depends on this trait rather than `std::fs`
/// directly so tests can substitute an in-memory backing store without
/// touching the real filesystem.
pub trait DiskFactory: Send + Sync {
    fn exists(&self, log: bool) -> bool;
    fn open_stream(&self, writable: bool, log: bool) -> DbResult<File>;
    /// Truncate the given file to exactly `len` bytes.
    fn truncate(&self, log: bool, len: u64) -> DbResult<()>;
    /// Current length in bytes of the given file, or 0 if it doesn't exist.
    fn len(&self, log: bool) -> DbResult<u64>;
}

/// The ordinary [`DiskFactory`]: two files, `data` and `log`, inside one
/// directory.
pub struct LocalDiskFactory {
    data_dir: PathBuf,
}

impl LocalDiskFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> DbResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn data_path(&self) -> PathBuf {
        self.data_dir.join("data.pdb")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("log.pdb")
    }

    fn path_for(&self, log: bool) -> PathBuf {
        if log { self.log_path() } else { self.data_path() }
    }
}

fn io_err(path: &Path, e: std::io::Error) -> DbError {
    DbError::Io(std::io::Error::new(
        e.kind(),
        format!("{}: {e}", path.display()),
    ))
}

impl DiskFactory for LocalDiskFactory {
    fn exists(&self, log: bool) -> bool {
        self.path_for(log).exists()
    }

    fn open_stream(&self, writable: bool, log: bool) -> DbResult<File> {
        let path = self.path_for(log);
        let mut options = OpenOptions::new();
        options.read(true).create(writable).write(writable);
        options.open(&path).map_err(|e| io_err(&path, e))
    }

    fn truncate(&self, log: bool, len: u64) -> DbResult<()> {
        let path = self.path_for(log);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| io_err(&path, e))?;
        file.set_len(len).map_err(|e| io_err(&path, e))
    }

    fn len(&self, log: bool) -> DbResult<u64> {
        let path = self.path_for(log);
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(io_err(&path, e)),
        }
    }
}
