use crate::disk::DiskFactory;
use crate::stream_pool::StreamPool;
use buffer::{MemoryStore, PageBuffer};
use common::{DbResult, Origin};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;
use wal::WalCoordinator;

/// A thread-local view over the combined (data + log) state of one file.
///
/// Owns one stream pulled from the data stream pool, and, when a WAL is in
/// play, a second stream pulled from the log pool. Both return to their
/// pool on [`Drop`]. A `Reader` must not be shared between threads.
///
/// The data stream is acquired lazily, on the first read that actually
/// needs it: in `DataFile` mode the data file is only created by the first
/// checkpoint's `ensure_data_writer`, so a `FileReader` built before that
/// must still be constructible (and readable) against a data file that
/// does not exist yet.
pub struct FileReader {
    disk: Arc<dyn DiskFactory>,
    store: Arc<MemoryStore>,
    wal: Option<Arc<WalCoordinator>>,
    cipher_key: Option<Vec<u8>>,
    data_pool: Arc<StreamPool>,
    log_pool: Arc<StreamPool>,
    data_stream: Option<File>,
    log_stream: Option<File>,
    held: Vec<Arc<PageBuffer>>,
}

impl FileReader {
    pub(crate) fn new(
        disk: Arc<dyn DiskFactory>,
        store: Arc<MemoryStore>,
        wal: Option<Arc<WalCoordinator>>,
        cipher_key: Option<Vec<u8>>,
        data_pool: Arc<StreamPool>,
        log_pool: Arc<StreamPool>,
    ) -> DbResult<Self> {
        let log_stream = if wal.is_some() && disk.exists(true) {
            Some(log_pool.acquire(disk.as_ref(), true)?)
        } else {
            None
        };
        Ok(Self {
            disk,
            store,
            wal,
            cipher_key,
            data_pool,
            log_pool,
            data_stream: None,
            log_stream,
            held: Vec::new(),
        })
    }

    /// Returns the latest confirmed version of the page at `position`.
    /// Consults a confirmed log mapping first, falling back to the data
    /// file.
    pub fn read_page(&mut self, position: u64) -> DbResult<Arc<PageBuffer>> {
        let resolved = self.wal.as_ref().and_then(|wal| wal.resolve(position));

        let buf = if let Some(log_offset) = resolved {
            if let Some(hit) = self.store.get_readable(Origin::Log, log_offset) {
                hit
            } else {
                let (data, fresh) = self.physical_read(true, log_offset)?;
                self.populate(Origin::Log, log_offset, data, fresh)?
            }
        } else if let Some(hit) = self.store.get_readable(Origin::Data, position) {
            hit
        } else {
            let (data, fresh) = self.physical_read(false, position)?;
            self.populate(Origin::Data, position, data, fresh)?
        };

        self.held.push(buf.clone());
        Ok(buf)
    }

    /// Allocate a fresh writable slot for a not-yet-persisted page, stamped
    /// with a plain data header at `position`. Reused slots may carry
    /// stale header bytes from a prior occupant, so this always stamps a
    /// clean one rather than leaving it to the caller.
    pub fn new_page(&self, position: u64) -> DbResult<PageBuffer> {
        let mut buf = self.store.get_writable(Origin::Data, position)?;
        buf.page.write_header(&storage::PageHeader::for_data(position))?;
        Ok(buf)
    }

    /// Returns `None` when the data file does not exist yet: in `DataFile`
    /// mode it is only created by the first checkpoint, so a reader built
    /// beforehand must tolerate reading against it entirely.
    fn ensure_data_stream(&mut self) -> DbResult<Option<&mut File>> {
        if self.data_stream.is_none() {
            if !self.disk.exists(false) {
                return Ok(None);
            }
            let stream = self.data_pool.acquire(self.disk.as_ref(), false)?;
            self.data_stream = Some(stream);
        }
        Ok(self.data_stream.as_mut())
    }

    /// Returns the page bytes at `position` plus whether they are freshly
    /// synthesized (the position was never actually written: the backing
    /// file doesn't exist, or the read ran past its current end) rather
    /// than read off disk.
    fn physical_read(&mut self, log: bool, position: u64) -> DbResult<(Vec<u8>, bool)> {
        if log {
            let stream = self
                .log_stream
                .as_mut()
                .expect("log reads only happen once resolve() confirms a log stream is open");
            read_or_zero(stream, position)
        } else {
            match self.ensure_data_stream()? {
                Some(stream) => read_or_zero(stream, position),
                None => Ok((vec![0u8; storage::PAGE_SIZE], true)),
            }
        }
    }

    fn populate(
        &self,
        origin: Origin,
        physical_position: u64,
        data: Vec<u8>,
        fresh: bool,
    ) -> DbResult<Arc<PageBuffer>> {
        let mut buf = self.store.get_writable(origin, physical_position)?;
        buf.page.data.copy_from_slice(&data);
        buf.page.physical_position = physical_position;

        if fresh {
            // Never written: stamp a clean header instead of running blank
            // bytes through decrypt/checksum, which only apply to pages
            // that were actually persisted.
            buf.page
                .write_header(&storage::PageHeader::for_data(physical_position))?;
        } else {
            buf.page.decrypt(self.cipher_key.as_deref())?;
            buf.page.verify_checksum()?;
        }

        Ok(self.store.move_to_readable(buf))
    }
}

/// Reads one page at `position`, treating a read that runs past the
/// stream's current end as a page that was never written rather than an
/// error. The returned `bool` is `true` when the page was synthesized this
/// way instead of read off disk.
fn read_or_zero(stream: &mut File, position: u64) -> DbResult<(Vec<u8>, bool)> {
    stream.seek(SeekFrom::Start(position))?;
    let mut data = vec![0u8; storage::PAGE_SIZE];
    match stream.read_exact(&mut data) {
        Ok(()) => Ok((data, false)),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Ok((vec![0u8; storage::PAGE_SIZE], true))
        }
        Err(e) => Err(e.into()),
    }
}

impl Drop for FileReader {
    fn drop(&mut self) {
        for buf in self.held.drain(..) {
            self.store.release(buf);
        }
        if let Some(stream) = self.data_stream.take() {
            self.data_pool.release(stream);
        }
        if let Some(stream) = self.log_stream.take() {
            self.log_pool.release(stream);
        }
    }
}
