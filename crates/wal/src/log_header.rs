use bincode::config::{self, Config};
use bincode::serde::{decode_from_slice, encode_into_slice, encode_to_vec};
use common::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const MAGIC: u32 = 0x5741_4C31; // b"WAL1" read as a little-endian u32
const VERSION: u16 = 1;

fn bincode_config() -> impl Config {
    config::legacy()
}

/// The small persisted record at the start of the log file: a magic
/// number, the format version, and the last confirmed transaction, used as
/// a recovery hint before the log is actually scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogHeader {
    magic: u32,
    version: u16,
    pub last_confirmed_tx: u64,
}

impl LogHeader {
    pub fn fresh() -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            last_confirmed_tx: 0,
        }
    }

    pub fn with_last_confirmed_tx(last_confirmed_tx: u64) -> Self {
        Self {
            last_confirmed_tx,
            ..Self::fresh()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC && self.version == VERSION
    }

    pub fn encode_into(&self, buf: &mut [u8]) -> DbResult<()> {
        encode_into_slice(self, buf, bincode_config())
            .map(|_| ())
            .map_err(|e| DbError::InvalidFormat(format!("encode log header: {e}")))
    }

    /// Decode a `LogHeader`. Returns `InvalidFormat` on a malformed encoding
    /// (truncated file, wrong layout) or when magic/version don't match —
    /// either way the caller discards the log and starts fresh.
    pub fn decode(buf: &[u8]) -> DbResult<Self> {
        let (header, _) = decode_from_slice(buf, bincode_config())
            .map_err(|e| DbError::InvalidFormat(format!("decode log header: {e}")))?;
        let header: Self = header;
        if !header.is_valid() {
            return Err(DbError::InvalidFormat(
                "log header magic/version mismatch".to_string(),
            ));
        }
        Ok(header)
    }
}

/// Size in bytes of an encoded `LogHeader`.
pub fn log_header_bytes() -> usize {
    static LEN: OnceLock<usize> = OnceLock::new();
    *LEN.get_or_init(|| {
        encode_to_vec(LogHeader::fresh(), bincode_config())
            .expect("encode fresh log header")
            .len()
    })
}
