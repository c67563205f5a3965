use bincode::config::{self, Config};
use bincode::serde::{decode_from_slice, encode_into_slice, encode_to_vec};
use common::{DbError, DbResult, TxId};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

fn bincode_config() -> impl Config {
    config::legacy()
}

/// Tags what kind of page this is. The document/collection layers built on
/// top of this subsystem are free to encode finer-grained types into the
/// payload; this tag only distinguishes what the core itself needs to
/// treat specially.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageType {
    /// An unallocated slot in a free list.
    Free,
    /// A page belonging to the data file.
    Data,
    /// A page belonging to the log file.
    Log,
}

/// Fixed header carried by every page: type tag, owning transaction,
/// logical position, confirmed flag, and content checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageHeader {
    pub page_type: PageType,
    pub tx_id: u64,
    /// The position the caller asked for, independent of where the page
    /// currently physically sits (see `Page::physical_position`).
    pub logical_position: u64,
    /// Set on the last page of a transaction. The WAL Coordinator only
    /// promotes a transaction's pages to `confirmedMap` once it observes
    /// this flag.
    pub confirmed: bool,
    pub checksum: u32,
}

impl Default for PageHeader {
    fn default() -> Self {
        Self {
            page_type: PageType::Free,
            tx_id: 0,
            logical_position: 0,
            confirmed: false,
            checksum: 0,
        }
    }
}

impl PageHeader {
    pub fn for_data(logical_position: u64) -> Self {
        Self {
            page_type: PageType::Data,
            logical_position,
            ..Self::default()
        }
    }

    pub fn for_log(logical_position: u64, tx: TxId, confirmed: bool) -> Self {
        Self {
            page_type: PageType::Log,
            tx_id: tx.0,
            logical_position,
            confirmed,
            checksum: 0,
        }
    }

    pub fn encode_into(&self, buf: &mut [u8]) -> DbResult<()> {
        encode_into_slice(self, buf, bincode_config())
            .map(|_| ())
            .map_err(|e| DbError::InvalidFormat(format!("encode page header: {e}")))
    }

    pub fn decode(buf: &[u8]) -> DbResult<Self> {
        let (header, _) = decode_from_slice(buf, bincode_config())
            .map_err(|e| DbError::InvalidFormat(format!("decode page header: {e}")))?;
        Ok(header)
    }
}

/// Size in bytes of an encoded `PageHeader`. Computed once from an actual
/// encoding rather than assumed from `size_of`, since bincode's wire layout
/// and Rust's in-memory layout are not guaranteed to match for an enum
/// field mixed with integers and a bool.
pub fn header_bytes() -> usize {
    static LEN: OnceLock<usize> = OnceLock::new();
    *LEN.get_or_init(|| {
        encode_to_vec(PageHeader::default(), bincode_config())
            .expect("encode default page header")
            .len()
    })
}
