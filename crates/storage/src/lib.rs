//! On-disk page format: fixed-size pages, their header, checksum, and
//! optional per-page encryption.
//!
//! A page is the atomic unit of I/O for the whole subsystem. Everything
//! past the header is opaque here; the collection/index layers built on top
//! of `buffer`/`wal`/`pagefile` own that interpretation.

#[cfg(test)]
mod tests;

mod cipher;
mod header;

pub use cipher::{decrypt_page, encrypt_page};
pub use header::{PageHeader, PageType, header_bytes};

use common::{DbError, DbResult};

/// Fixed page size in bytes. 8 KiB keeps pages aligned to common disk and
/// filesystem block sizes while staying small enough that a single dirty
/// page write is cheap.
pub const PAGE_SIZE: usize = 8192;

/// Bytes reserved at the tail of every page for the AEAD tag, whether or
/// not encryption is configured. Keeping the layout identical either way
/// means turning encryption on or off never changes `PAGE_SIZE` or the
/// payload capacity.
pub const TAG_BYTES: usize = 16;

/// Number of content bytes a page can hold once the header and the
/// reserved tag region are accounted for.
pub fn payload_capacity() -> usize {
    PAGE_SIZE - header_bytes() - TAG_BYTES
}

/// One fixed-size page: a header, an opaque payload, and a trailing AEAD
/// tag slot.
///
/// `physical_position` is where this page currently sits in its backing
/// stream (data file or log file). It is distinct from the header's
/// `logical_position`: the Writer rewrites `physical_position` to
/// append-at-end when queuing a page in log mode, but the logical position
/// a caller asked for is preserved in the header so readers can still find
/// it.
#[derive(Debug, Clone)]
pub struct Page {
    pub physical_position: u64,
    pub data: Vec<u8>,
}

impl Page {
    /// Build a fresh, zeroed page carrying the given header.
    pub fn new(physical_position: u64, header: PageHeader) -> Self {
        let mut page = Self {
            physical_position,
            data: vec![0u8; PAGE_SIZE],
        };
        page.write_header(&header).expect("fresh page header fits");
        page
    }

    pub fn header(&self) -> DbResult<PageHeader> {
        PageHeader::decode(&self.data[..header_bytes()])
    }

    pub fn write_header(&mut self, header: &PageHeader) -> DbResult<()> {
        header.encode_into(&mut self.data[..header_bytes()])
    }

    /// The opaque content region: everything between the header and the
    /// reserved tag bytes.
    pub fn payload(&self) -> &[u8] {
        let start = header_bytes();
        &self.data[start..start + payload_capacity()]
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        let start = header_bytes();
        let end = start + payload_capacity();
        &mut self.data[start..end]
    }

    fn tag_mut(&mut self) -> &mut [u8] {
        let start = PAGE_SIZE - TAG_BYTES;
        &mut self.data[start..]
    }

    fn tag(&self) -> &[u8] {
        let start = PAGE_SIZE - TAG_BYTES;
        &self.data[start..]
    }

    /// Checksum of the plaintext payload, computed before encryption (if
    /// any) and stored unencrypted in the header.
    pub fn compute_checksum(&self) -> u32 {
        crc32fast::hash(self.payload())
    }

    /// Verify this page's stored checksum against its current (decrypted)
    /// payload.
    pub fn verify_checksum(&self) -> DbResult<()> {
        let header = self.header()?;
        let actual = self.compute_checksum();
        if actual != header.checksum {
            return Err(DbError::ChecksumMismatch(format!(
                "page {}: expected {:#x}, got {:#x}",
                self.physical_position, header.checksum, actual
            )));
        }
        Ok(())
    }

    /// Stamp the checksum of the current plaintext payload into the header.
    /// Must be called before `encrypt` and before the page is handed to the
    /// Writer.
    pub fn seal_checksum(&mut self) -> DbResult<()> {
        let checksum = self.compute_checksum();
        let mut header = self.header()?;
        header.checksum = checksum;
        self.write_header(&header)
    }

    /// Encrypt the payload in place with the given key, keyed on this
    /// page's logical position. No-op if `key` is `None`.
    pub fn encrypt(&mut self, key: Option<&[u8]>) -> DbResult<()> {
        let Some(key) = key else { return Ok(()) };
        let header = self.header()?;
        let position = header.logical_position;
        let mut payload = self.payload().to_vec();
        let tag = encrypt_page(key, position, &mut payload)?;
        self.payload_mut().copy_from_slice(&payload);
        self.tag_mut().copy_from_slice(&tag);
        Ok(())
    }

    /// Decrypt the payload in place with the given key. No-op if `key` is
    /// `None`. Returns `ChecksumMismatch` if the key is wrong (the AEAD tag
    /// will not verify).
    pub fn decrypt(&mut self, key: Option<&[u8]>) -> DbResult<()> {
        let Some(key) = key else { return Ok(()) };
        let header = self.header()?;
        let position = header.logical_position;
        let tag = self.tag().to_vec();
        let mut payload = self.payload().to_vec();
        decrypt_page(key, position, &mut payload, &tag)?;
        self.payload_mut().copy_from_slice(&payload);
        Ok(())
    }
}
