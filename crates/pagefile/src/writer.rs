use buffer::{MemoryStore, PageBuffer};
use common::{DbError, DbResult, Event, EventBus, Origin};
use crossbeam::channel::{Sender, unbounded};
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use wal::WalCoordinator;

/// Whether a [`FileWriter`] drains pages at their given position or
/// rewrites them to append at the current end of stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriterMode {
    /// Random-access: a page is written at its own logical position.
    Data,
    /// Append-only: a page's position is rewritten to the stream's current
    /// length before it is written, and length then advances by one page.
    Log,
}

enum WriterOp {
    Page(PageBuffer),
    Length(u64),
    Barrier(Sender<()>),
}

struct WorkerState {
    stream: File,
    mode: WriterMode,
    store: Arc<MemoryStore>,
    wal: Option<Arc<WalCoordinator>>,
    cipher_key: Option<Vec<u8>>,
    bus: EventBus,
    length: Arc<AtomicU64>,
}

impl WorkerState {
    fn handle_page(&mut self, mut buf: PageBuffer) -> DbResult<()> {
        buf.origin = match self.mode {
            WriterMode::Data => Origin::Data,
            WriterMode::Log => Origin::Log,
        };

        let physical_position = match self.mode {
            WriterMode::Data => buf.position,
            WriterMode::Log => self.length.fetch_add(
                storage::PAGE_SIZE as u64,
                Ordering::SeqCst,
            ),
        };
        buf.page.physical_position = physical_position;
        if self.mode == WriterMode::Log {
            buf.position = physical_position;
        }

        buf.page.seal_checksum()?;
        buf.page.encrypt(self.cipher_key.as_deref())?;

        self.stream.seek(SeekFrom::Start(physical_position))?;
        self.stream.write_all(&buf.page.data)?;

        let header = buf.page.header()?;
        if let (WriterMode::Log, Some(wal)) = (self.mode, self.wal.as_ref()) {
            wal.observe_log_page(&header, physical_position);
        }
        if header.confirmed {
            self.stream.flush()?;
            self.stream.sync_all()?;
        }

        self.bus.emit(Event::Write {
            position: buf.position,
            origin: buf.origin,
        });

        // Restore plaintext before caching: Readers expect payload() to
        // hand back content, not ciphertext.
        buf.page.decrypt(self.cipher_key.as_deref())?;
        self.store.move_to_readable(buf);
        Ok(())
    }

    fn handle_length(&mut self, len: u64) -> DbResult<()> {
        self.stream.set_len(len)?;
        self.length.store(len, Ordering::SeqCst);
        Ok(())
    }
}

/// Drains queued dirty pages and length changes to one underlying stream on
/// a single background worker thread, so producers never block on I/O.
///
/// The worker is always blocked on the channel's receiver between items, so
/// there is no separate "wake the idle worker" call: sending into the
/// channel is itself the wake-up.
pub struct FileWriter {
    tx: Sender<WriterOp>,
    handle: Mutex<Option<JoinHandle<DbResult<()>>>>,
    length: Arc<AtomicU64>,
    bus: EventBus,
}

impl FileWriter {
    pub fn spawn(
        stream: File,
        mode: WriterMode,
        store: Arc<MemoryStore>,
        wal: Option<Arc<WalCoordinator>>,
        cipher_key: Option<Vec<u8>>,
        bus: EventBus,
        initial_length: u64,
    ) -> Self {
        let (tx, rx) = unbounded::<WriterOp>();
        let length = Arc::new(AtomicU64::new(initial_length));
        let worker_length = length.clone();
        let worker_bus = bus.clone();

        let handle = std::thread::spawn(move || -> DbResult<()> {
            let mut state = WorkerState {
                stream,
                mode,
                store,
                wal,
                cipher_key,
                bus: worker_bus,
                length: worker_length,
            };
            while let Ok(op) = rx.recv() {
                match op {
                    WriterOp::Page(buf) => {
                        state.handle_page(buf)?;
                        state.bus.emit(Event::Queue { depth: rx.len() });
                    }
                    WriterOp::Length(len) => {
                        state.handle_length(len)?;
                        state.bus.emit(Event::Queue { depth: rx.len() });
                    }
                    WriterOp::Barrier(ack) => {
                        state.stream.flush()?;
                        let _ = ack.send(());
                    }
                }
            }
            state.stream.flush()?;
            Ok(())
        });

        Self {
            tx,
            handle: Mutex::new(Some(handle)),
            length,
            bus,
        }
    }

    /// Current logical length tracked by this writer.
    pub fn length(&self) -> u64 {
        self.length.load(Ordering::SeqCst)
    }

    /// Overwrite the length this writer appends at next, for when the
    /// backing file was truncated out from under it (a checkpoint
    /// truncating the log back to its header).
    pub fn reset_length(&self, new_length: u64) {
        self.length.store(new_length, Ordering::SeqCst);
    }

    pub fn queue_page(&self, buf: PageBuffer) -> DbResult<()> {
        self.tx
            .send(WriterOp::Page(buf))
            .map_err(|_| DbError::Io(closed_writer_error()))?;
        self.bus.emit(Event::Queue { depth: self.tx.len() });
        Ok(())
    }

    pub fn queue_length(&self, len: u64) -> DbResult<()> {
        self.tx
            .send(WriterOp::Length(len))
            .map_err(|_| DbError::Io(closed_writer_error()))?;
        self.bus.emit(Event::Queue { depth: self.tx.len() });
        Ok(())
    }

    /// Block until every previously queued operation has reached the OS and
    /// been flushed.
    pub fn wait_completion(&self) -> DbResult<()> {
        let (ack_tx, ack_rx) = unbounded();
        self.tx
            .send(WriterOp::Barrier(ack_tx))
            .map_err(|_| DbError::Io(closed_writer_error()))?;
        ack_rx
            .recv()
            .map_err(|_| DbError::Io(closed_writer_error()))
    }

    /// Drain, flush, and join the background worker.
    pub fn dispose(&self) -> DbResult<()> {
        self.wait_completion()?;
        let handle = self.handle.lock().unwrap().take();
        if let Some(handle) = handle {
            match handle.join() {
                Ok(result) => result?,
                Err(_) => return Err(DbError::Io(closed_writer_error())),
            }
        }
        Ok(())
    }
}

fn closed_writer_error() -> std::io::Error {
    std::io::Error::other("file writer worker is no longer running")
}
