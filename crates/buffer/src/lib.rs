//! The Memory Store: a thread-safe, fixed-granularity pool of [`PageBuffer`]s
//! with pinning, dirty tracking, and bounded growth.
//!
//! The store owns two collections — a free list of clean unpinned buffers
//! ready for reuse, and a readable map keyed by `(Origin, logical position)`
//! giving O(1) lookup for cache hits. Memory grows by whole segments and
//! never shrinks during normal operation.
//!
//! # Example
//!
//! ```
//! use buffer::MemoryStore;
//! use common::{Config, EventBus, Origin};
//!
//! let store = MemoryStore::new(&Config::builder().build(), EventBus::new());
//!
//! // Miss: caller fills a fresh writable slot and hands it back.
//! let mut slot = store.get_writable(Origin::Data, 0).unwrap();
//! slot.page.payload_mut()[0] = 7;
//! let cached = store.move_to_readable(slot);
//!
//! // Hit: a later GetReadable finds it without touching disk.
//! let hit = store.get_readable(Origin::Data, 0).unwrap();
//! assert_eq!(hit.page.payload()[0], 7);
//! store.release(hit);
//! ```


mod page_buffer;
mod store;

pub use page_buffer::PageBuffer;
pub use store::MemoryStore;
