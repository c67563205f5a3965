use crate::disk::{DiskFactory, LocalDiskFactory};
use crate::reader::FileReader;
use crate::stream_pool::StreamPool;
use crate::writer::{FileWriter, WriterMode};
use buffer::{MemoryStore, PageBuffer};
use common::{Config, DbResult, EventBus, FileMode, Origin, TxId};
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use wal::{RecoveryOutcome, WalCoordinator};

/// The top-level handle collaborators open: a fixed-size page cache backed
/// by a data file and, in `DataFile` mode, a write-ahead log.
///
/// Owns the Memory Store and (when applicable) the WAL Coordinator for its
/// entire life. The write streams are lazily constructed on first mutation
/// (§9, "lazy initialization of the write stream") so a read-only open of
/// an existing file needs no write-side resources.
pub struct PagedFile {
    config: Config,
    disk: Arc<LocalDiskFactory>,
    store: Arc<MemoryStore>,
    wal: Option<Arc<WalCoordinator>>,
    data_pool: Arc<StreamPool>,
    log_pool: Arc<StreamPool>,
    /// The writer collaborators submit ordinary mutations to: the log
    /// writer in `DataFile` mode, or the sole writer in `LogFile`/`TempFile`
    /// mode.
    primary_writer: Mutex<Option<Arc<FileWriter>>>,
    /// Only ever constructed in `DataFile` mode, to drain checkpoint pages
    /// into the data file.
    data_writer: Mutex<Option<Arc<FileWriter>>>,
    length: AtomicU64,
    bus: EventBus,
}

impl PagedFile {
    /// Open (creating if absent) the data and log files described by
    /// `config`, running crash recovery first when `mode` is `DataFile`.
    pub fn open(config: Config) -> DbResult<Self> {
        let disk = Arc::new(LocalDiskFactory::new(config.data_dir.clone())?);
        let bus = EventBus::new();
        let store = Arc::new(MemoryStore::new(&config, bus.clone()));
        let data_pool = Arc::new(StreamPool::new());
        let log_pool = Arc::new(StreamPool::new());

        let wal = match config.mode {
            FileMode::DataFile => Some(Arc::new(WalCoordinator::new(
                config.checkpoint_threshold_pages,
                bus.clone(),
            ))),
            FileMode::LogFile | FileMode::TempFile => None,
        };

        let data_len = disk.len(false)?;

        let file = Self {
            config,
            disk,
            store,
            wal,
            data_pool,
            log_pool,
            primary_writer: Mutex::new(None),
            data_writer: Mutex::new(None),
            length: AtomicU64::new(data_len),
            bus,
        };

        if file.wal.is_some() {
            file.recover()?;
        }

        Ok(file)
    }

    /// Current logical length of the data file.
    pub fn length(&self) -> u64 {
        self.length.load(Ordering::SeqCst)
    }

    /// Currently allocated heap bytes across the Memory Store's segments.
    pub fn memory_buffer_size(&self) -> usize {
        self.store.buffer_bytes()
    }

    pub fn subscribe(&self) -> crossbeam::channel::Receiver<common::Event> {
        self.bus.subscribe()
    }

    /// Issue a new transaction id. `None` outside `DataFile` mode, where
    /// there is no WAL to group pages by transaction.
    pub fn begin_transaction(&self) -> Option<TxId> {
        self.wal.as_ref().map(|wal| wal.next_tx_id())
    }

    /// Hand out a Reader over the combined data+log state of this file.
    /// `writable` is metadata only; any Reader can allocate a writable page
    /// via [`FileReader::new_page`].
    pub fn get_reader(&self, _writable: bool) -> DbResult<FileReader> {
        FileReader::new(
            self.disk.clone(),
            self.store.clone(),
            self.wal.clone(),
            self.config.encryption_key.clone(),
            self.data_pool.clone(),
            self.log_pool.clone(),
        )
    }

    /// Enqueue a batch of pages for the background writer. Returns
    /// immediately; callers must not touch the buffers afterwards.
    pub fn write_async(&self, pages: Vec<PageBuffer>) -> DbResult<()> {
        let writer = self.ensure_primary_writer()?;
        for buf in pages {
            writer.queue_page(buf)?;
        }
        if self
            .wal
            .as_ref()
            .map(|wal| wal.should_checkpoint())
            .unwrap_or(false)
        {
            self.checkpoint()?;
        }
        Ok(())
    }

    /// Schedule a length change on the data file. In `DataFile` mode the
    /// primary writer targets the log, not the data file, so this always
    /// routes through the data writer instead.
    pub fn set_length_async(&self, length: u64) -> DbResult<()> {
        let writer = self.ensure_data_writer()?;
        writer.queue_length(length)?;
        self.length.store(length, Ordering::SeqCst);
        Ok(())
    }

    /// Drain, flush, and release every writer stream.
    pub fn dispose(&self) -> DbResult<()> {
        if let Some(writer) = self.primary_writer.lock().unwrap().take() {
            writer.dispose()?;
        }
        if let Some(writer) = self.data_writer.lock().unwrap().take() {
            writer.dispose()?;
        }
        Ok(())
    }

    /// Migrate every confirmed log page into the data file and truncate
    /// the log back to just its header. A no-op outside `DataFile` mode.
    pub fn checkpoint(&self) -> DbResult<()> {
        let Some(wal) = self.wal.clone() else {
            return Ok(());
        };

        // Quiesce the log writer first: every page already queued must
        // reach disk before the log file underneath it is truncated.
        if let Some(writer) = self.primary_writer.lock().unwrap().as_ref() {
            writer.wait_completion()?;
        }

        let snapshot = wal.checkpoint_snapshot();
        if !snapshot.is_empty() {
            let data_writer = self.ensure_data_writer()?;
            let mut log_stream = self.disk.open_stream(false, true)?;
            let mut max_end = self.length.load(Ordering::SeqCst);

            for (position, log_offset) in &snapshot {
                let mut data = vec![0u8; storage::PAGE_SIZE];
                log_stream.seek(SeekFrom::Start(*log_offset))?;
                log_stream.read_exact(&mut data)?;

                let mut buf = self.store.get_writable(Origin::Data, *position)?;
                buf.page.data.copy_from_slice(&data);
                buf.page.physical_position = *position;
                buf.page.decrypt(self.config.encryption_key.as_deref())?;
                buf.page.verify_checksum()?;

                let mut header = buf.page.header()?;
                header.page_type = storage::PageType::Data;
                header.tx_id = 0;
                header.confirmed = false;
                buf.page.write_header(&header)?;

                max_end = max_end.max(position + storage::PAGE_SIZE as u64);
                data_writer.queue_page(buf)?;
            }
            data_writer.wait_completion()?;
            self.length.store(max_end, Ordering::SeqCst);
        }

        self.reset_log(wal.current_tx_seq())?;
        if let Some(writer) = self.primary_writer.lock().unwrap().as_ref() {
            writer.reset_length(storage::PAGE_SIZE as u64);
        }
        wal.finish_checkpoint();
        Ok(())
    }

    /// Scan the log at open, replaying pending/confirmed bookkeeping into
    /// the WAL Coordinator, then run an implicit checkpoint.
    fn recover(&self) -> DbResult<RecoveryOutcome> {
        let wal = self.wal.as_ref().expect("recovery only runs with a WAL");

        if !self.disk.exists(true) {
            return Ok(RecoveryOutcome::default());
        }
        let log_len = self.disk.len(true)?;
        if log_len < storage::PAGE_SIZE as u64 {
            return Ok(RecoveryOutcome::default());
        }

        let mut stream = self.disk.open_stream(false, true)?;
        let mut header_buf = vec![0u8; storage::PAGE_SIZE];
        stream.read_exact(&mut header_buf)?;

        let header = match wal::LogHeader::decode(&header_buf[..wal::log_header_bytes()]) {
            Ok(header) => header,
            Err(_) => {
                self.disk.truncate(true, 0)?;
                return Ok(RecoveryOutcome::default());
            }
        };
        wal.resume_tx_seq_after(header.last_confirmed_tx);

        let mut offset = storage::PAGE_SIZE as u64;
        loop {
            let mut page_buf = vec![0u8; storage::PAGE_SIZE];
            match stream.read_exact(&mut page_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            let page_header = storage::PageHeader::decode(&page_buf[..storage::header_bytes()])?;
            wal.observe_log_page(&page_header, offset);
            offset += storage::PAGE_SIZE as u64;
        }

        let outcome = wal.finish_recovery();
        self.checkpoint()?;
        Ok(outcome)
    }

    /// Truncate the log to just a fresh header stamped with the current
    /// transaction counter.
    fn reset_log(&self, last_confirmed_tx: u64) -> DbResult<()> {
        self.disk.truncate(true, storage::PAGE_SIZE as u64)?;
        let mut log_stream = self.disk.open_stream(true, true)?;
        let mut header_buf = vec![0u8; storage::PAGE_SIZE];
        let header = wal::LogHeader::with_last_confirmed_tx(last_confirmed_tx);
        header.encode_into(&mut header_buf[..wal::log_header_bytes()])?;
        log_stream.seek(SeekFrom::Start(0))?;
        log_stream.write_all(&header_buf)?;
        log_stream.sync_all()?;
        Ok(())
    }

    fn ensure_primary_writer(&self) -> DbResult<Arc<FileWriter>> {
        let mut guard = self.primary_writer.lock().unwrap();
        if let Some(writer) = guard.as_ref() {
            return Ok(writer.clone());
        }

        let (log, mode) = match self.config.mode {
            FileMode::DataFile => (true, WriterMode::Log),
            FileMode::LogFile => (false, WriterMode::Log),
            FileMode::TempFile => (false, WriterMode::Data),
        };
        if log && !self.disk.exists(true) {
            self.reset_log(0)?;
        }
        let initial_length = if log {
            self.disk.len(true)?
        } else {
            self.length.load(Ordering::SeqCst)
        };
        let stream = self.disk.open_stream(true, log)?;
        let writer = Arc::new(FileWriter::spawn(
            stream,
            mode,
            self.store.clone(),
            self.wal.clone(),
            self.config.encryption_key.clone(),
            self.bus.clone(),
            initial_length,
        ));
        *guard = Some(writer.clone());
        Ok(writer)
    }

    fn ensure_data_writer(&self) -> DbResult<Arc<FileWriter>> {
        let mut guard = self.data_writer.lock().unwrap();
        if let Some(writer) = guard.as_ref() {
            return Ok(writer.clone());
        }
        let stream = self.disk.open_stream(true, false)?;
        let writer = Arc::new(FileWriter::spawn(
            stream,
            WriterMode::Data,
            self.store.clone(),
            None,
            self.config.encryption_key.clone(),
            self.bus.clone(),
            self.length.load(Ordering::SeqCst),
        ));
        *guard = Some(writer.clone());
        Ok(writer)
    }
}

impl Drop for PagedFile {
    fn drop(&mut self) {
        let _ = self.dispose();
    }
}
