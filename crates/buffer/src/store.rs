use crate::PageBuffer;
use common::{Config, DbError, DbResult, Event, EventBus, Origin};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Pages added to the free list per segment growth step. Memory grows by
/// whole segments and never shrinks during normal operation.
const SEGMENT_PAGES: usize = 128;

struct Inner {
    free: Vec<PageBuffer>,
    readable: HashMap<(Origin, u64), Arc<PageBuffer>>,
    segments: usize,
    next_seq: u64,
    budget_pages: usize,
}

impl Inner {
    fn grow_segment(&mut self) {
        for _ in 0..SEGMENT_PAGES {
            let page = storage::Page::new(0, storage::PageHeader::default());
            self.free.push(PageBuffer::new(page, Origin::New, 0));
        }
        self.segments += 1;
        tracing::debug!(segments = self.segments, "memory store grew by one segment");
    }

    /// Scan the readable map for the oldest unpinned entry and remove it,
    /// per the Eviction algorithm: a linear scan, not an auxiliary LRU
    /// index, since the readable map is the only structure tracking
    /// recency here.
    fn evict_one(&mut self) -> Option<PageBuffer> {
        let victim_key = self
            .readable
            .iter()
            .filter(|(_, buf)| buf.pins() == 0)
            .min_by_key(|(_, buf)| buf.seq)
            .map(|(key, _)| *key)?;

        let arc = self.readable.remove(&victim_key)?;
        match Arc::try_unwrap(arc) {
            Ok(buf) => Some(buf),
            Err(arc) => {
                // Someone pinned it between the filter and the removal;
                // put it back and give up on this eviction attempt.
                self.readable.insert(victim_key, arc);
                None
            }
        }
    }

    fn take_writable_slot(&mut self) -> Option<PageBuffer> {
        if let Some(buf) = self.free.pop() {
            return Some(buf);
        }
        self.evict_one()
    }
}

/// The Memory Store: owns every [`PageBuffer`] for the lifetime of a
/// `PagedFile`.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    bus: EventBus,
}

impl MemoryStore {
    pub fn new(config: &Config, bus: EventBus) -> Self {
        let store = Self {
            inner: Mutex::new(Inner {
                free: Vec::new(),
                readable: HashMap::new(),
                segments: 0,
                next_seq: 0,
                budget_pages: config.buffer_pool_pages,
            }),
            bus,
        };
        store.inner.lock().unwrap().grow_segment();
        store
    }

    /// `GetReadable`: return a pinned clone of the cached buffer at
    /// `(origin, position)`, or `None` on a miss.
    pub fn get_readable(&self, origin: Origin, position: u64) -> Option<Arc<PageBuffer>> {
        let inner = self.inner.lock().unwrap();
        let buf = inner.readable.get(&(origin, position))?.clone();
        buf.pin();
        self.bus.emit(Event::Read { position, origin });
        Some(buf)
    }

    /// `GetWritable`: a fresh slot not keyed in the readable map, reused
    /// from the free list or reclaimed by eviction. Grows a new segment
    /// when neither source yields one, up to `budget_pages`.
    pub fn get_writable(&self, origin: Origin, position: u64) -> DbResult<PageBuffer> {
        let mut inner = self.inner.lock().unwrap();

        let mut buf = match inner.take_writable_slot() {
            Some(buf) => buf,
            None => {
                let budget_segments = inner.budget_pages.div_ceil(SEGMENT_PAGES).max(1);
                if inner.segments >= budget_segments {
                    return Err(DbError::CapacityExhausted(format!(
                        "memory store already holds {} segments ({} pages) and every buffer is pinned",
                        inner.segments,
                        inner.segments * SEGMENT_PAGES,
                    )));
                }
                inner.grow_segment();
                inner
                    .take_writable_slot()
                    .expect("segment growth always yields a free slot")
            }
        };

        buf.origin = origin;
        buf.position = position;
        buf.page.physical_position = position;
        buf.clear_dirty();
        Ok(buf)
    }

    /// `MoveToReadable`: insert a just-written buffer into the readable map,
    /// unpin it, and clear its dirty flag. Replaces (and drops) any stale
    /// entry already cached under the same key.
    pub fn move_to_readable(&self, mut buf: PageBuffer) -> Arc<PageBuffer> {
        let mut inner = self.inner.lock().unwrap();
        buf.clear_dirty();
        buf.seq = inner.next_seq;
        inner.next_seq += 1;
        let key = (buf.origin, buf.position);
        let arc = Arc::new(buf);
        inner.readable.insert(key, arc.clone());
        self.bus.emit(Event::Write {
            position: key.1,
            origin: key.0,
        });
        arc
    }

    /// `Return`: decrement the share counter. The buffer stays resident in
    /// the readable map — available for future cache hits — until the
    /// eviction scan reclaims it; Return does not itself free-list it; see
    /// the grounding ledger for why.
    pub fn release(&self, buf: Arc<PageBuffer>) {
        buf.unpin();
    }

    /// Drop any cached entry at `(origin, position)`. Called by the WAL
    /// Coordinator whenever it promotes a new confirmed version of a
    /// logical position, so a later `GetReadable` cannot return a stale
    /// log-offset mapping.
    pub fn invalidate(&self, origin: Origin, position: u64) {
        let mut inner = self.inner.lock().unwrap();
        inner.readable.remove(&(origin, position));
    }

    /// `MemoryBufferSize`: currently allocated heap bytes across segments.
    pub fn buffer_bytes(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.segments * SEGMENT_PAGES * storage::PAGE_SIZE
    }

    pub fn segments(&self) -> usize {
        self.inner.lock().unwrap().segments
    }
}
