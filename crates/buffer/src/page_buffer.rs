use common::Origin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// An in-memory slot holding one page plus bookkeeping.
///
/// Owned by the [`crate::MemoryStore`] for its entire life. Callers only
/// ever see it wrapped in an `Arc` once it has been handed to
/// [`crate::MemoryStore::move_to_readable`]; before that it is an exclusive,
/// caller-owned writable slot.
#[derive(Debug)]
pub struct PageBuffer {
    pub page: storage::Page,
    pub origin: Origin,
    /// Logical position: the other half of the readable-map key alongside
    /// `origin`.
    pub position: u64,
    /// Monotonic stamp assigned when the buffer enters the readable map.
    /// Used as the LRU surrogate during eviction.
    pub(crate) seq: u64,
    dirty: AtomicBool,
    pins: AtomicUsize,
}

impl PageBuffer {
    pub fn new(page: storage::Page, origin: Origin, position: u64) -> Self {
        Self {
            page,
            origin,
            position,
            seq: 0,
            dirty: AtomicBool::new(false),
            pins: AtomicUsize::new(0),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release)
    }

    pub(crate) fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::Release)
    }

    /// Current share counter: how many Readers reference this buffer.
    pub fn pins(&self) -> usize {
        self.pins.load(Ordering::Acquire)
    }

    pub(crate) fn pin(&self) {
        self.pins.fetch_add(1, Ordering::AcqRel);
    }

    /// Decrement the share counter, returning its new value.
    pub(crate) fn unpin(&self) -> usize {
        self.pins.fetch_sub(1, Ordering::AcqRel) - 1
    }
}
