//! Page builders for low-level tests.
//!
//! These wrap the allocate/fill/stamp-header/write dance that every test
//! exercising a `PagedFile` otherwise repeats by hand.

use common::TxId;
use pagefile::{FileReader, PagedFile};
use storage::PageHeader;

/// Allocate a page at `position`, fill its payload with `fill`, and stamp it
/// as the sole, confirmed page of a fresh transaction.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
///
/// let ctx = TestContext::new().unwrap();
/// write_confirmed_page(&ctx.file, 0, 0xAA).unwrap();
/// ```
pub fn write_confirmed_page(file: &PagedFile, position: u64, fill: u8) -> common::DbResult<()> {
    let tx = file.begin_transaction().unwrap_or(TxId(0));
    let reader = file.get_reader(true)?;
    let page = fill_page(&reader, position, fill, tx, true)?;
    drop(reader);
    file.write_async(vec![page])
}

/// Allocate a page at `position`, fill its payload with `fill`, and stamp it
/// as belonging to `tx` with the given confirmed flag -- for tests that need
/// to model a transaction spanning several pages, or one that never commits.
pub fn write_page_in_tx(
    file: &PagedFile,
    position: u64,
    fill: u8,
    tx: TxId,
    confirmed: bool,
) -> common::DbResult<()> {
    let reader = file.get_reader(true)?;
    let page = fill_page(&reader, position, fill, tx, confirmed)?;
    drop(reader);
    file.write_async(vec![page])
}

fn fill_page(
    reader: &FileReader,
    position: u64,
    fill: u8,
    tx: TxId,
    confirmed: bool,
) -> common::DbResult<buffer::PageBuffer> {
    let mut page = reader.new_page(position)?;
    page.page.payload_mut().fill(fill);
    page.page
        .write_header(&PageHeader::for_log(position, tx, confirmed))?;
    Ok(page)
}
