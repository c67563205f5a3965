//! The top-level paged-file abstraction: a fixed-size page cache backed by
//! a data file and, in `DataFile` mode, a write-ahead log.
//!
//! This crate wires together `storage` (page format), `buffer` (the Memory
//! Store), and `wal` (the confirm/checkpoint protocol) with actual
//! filesystem I/O: a [`disk::DiskFactory`] that opens streams, a lock-free
//! [`stream_pool::StreamPool`] per file, a background [`writer::FileWriter`]
//! per write stream, and a per-caller [`reader::FileReader`].
//!
//! # Example
//!
//! ```no_run
//! use common::Config;
//! use pagefile::PagedFile;
//!
//! let config = Config::builder().data_dir("./example_db".into()).build();
//! let file = PagedFile::open(config).unwrap();
//!
//! let tx = file.begin_transaction().unwrap();
//! let mut reader = file.get_reader(true).unwrap();
//! let mut page = reader.new_page(0).unwrap();
//! page.page.payload_mut()[0] = 42;
//! page.page.write_header(&storage::PageHeader::for_log(0, tx, true)).unwrap();
//! drop(reader);
//!
//! file.write_async(vec![page]).unwrap();
//! file.dispose().unwrap();
//! ```

#[cfg(test)]
mod tests;

mod disk;
mod paged_file;
mod reader;
mod stream_pool;
mod writer;

pub use disk::{DiskFactory, LocalDiskFactory};
pub use paged_file::PagedFile;
pub use reader::FileReader;
pub use stream_pool::StreamPool;
pub use writer::{FileWriter, WriterMode};
