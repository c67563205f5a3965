use crate::PagedFile;
use common::{Config, DbError, Event};

fn config_in(dir: &std::path::Path) -> Config {
    Config::builder()
        .data_dir(dir.to_path_buf())
        .checkpoint_threshold_pages(4)
        .build()
}

fn confirm_page(file: &PagedFile, position: u64, fill: u8) {
    let tx = file.begin_transaction().unwrap();
    let reader = file.get_reader(true).unwrap();
    let mut page = reader.new_page(position).unwrap();
    page.page.payload_mut().fill(fill);
    page.page
        .write_header(&storage::PageHeader::for_log(position, tx, true))
        .unwrap();
    drop(reader);
    file.write_async(vec![page]).unwrap();
    file.dispose().unwrap();
}

#[test]
fn small_write_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let file = PagedFile::open(config_in(dir.path())).unwrap();
    confirm_page(&file, 0, 0xAA);

    let file = PagedFile::open(config_in(dir.path())).unwrap();
    let mut reader = file.get_reader(false).unwrap();
    let page = reader.read_page(0).unwrap();
    assert!(page.page.payload().iter().all(|&b| b == 0xAA));
}

#[test]
fn partial_transaction_is_invisible_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let file = PagedFile::open(config_in(dir.path())).unwrap();

    let tx = file.begin_transaction().unwrap();
    let reader = file.get_reader(true).unwrap();
    let mut pages = Vec::new();
    for i in 0..10u64 {
        let mut page = reader.new_page(i * storage::PAGE_SIZE as u64).unwrap();
        page.page.payload_mut().fill(7);
        page.page
            .write_header(&storage::PageHeader::for_log(
                i * storage::PAGE_SIZE as u64,
                tx,
                false, // never confirmed
            ))
            .unwrap();
        pages.push(page);
    }
    drop(reader);
    file.write_async(pages).unwrap();
    file.dispose().unwrap();

    let file = PagedFile::open(config_in(dir.path())).unwrap();
    let mut reader = file.get_reader(false).unwrap();
    for i in 0..10u64 {
        let page = reader.read_page(i * storage::PAGE_SIZE as u64).unwrap();
        assert!(
            page.page.payload().iter().all(|&b| b == 0),
            "page {i} from an unconfirmed transaction must read back empty"
        );
    }
}

#[test]
fn crash_mid_transaction_leaves_prior_confirmed_state() {
    let dir = tempfile::tempdir().unwrap();
    let file = PagedFile::open(config_in(dir.path())).unwrap();
    confirm_page(&file, 0, 1);

    // Reopen, start a new transaction overwriting page 0, but never confirm
    // it -- this models a producer crashing mid-stream.
    let file = PagedFile::open(config_in(dir.path())).unwrap();
    let tx = file.begin_transaction().unwrap();
    let reader = file.get_reader(true).unwrap();
    let mut page = reader.new_page(0).unwrap();
    page.page.payload_mut().fill(2);
    page.page
        .write_header(&storage::PageHeader::for_log(0, tx, false))
        .unwrap();
    drop(reader);
    file.write_async(vec![page]).unwrap();
    file.dispose().unwrap();

    let file = PagedFile::open(config_in(dir.path())).unwrap();
    let mut reader = file.get_reader(false).unwrap();
    let page = reader.read_page(0).unwrap();
    assert!(
        page.page.payload().iter().all(|&b| b == 1),
        "the never-confirmed overwrite must not be observable"
    );
}

#[test]
fn checkpoint_fires_once_the_log_crosses_the_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let file = PagedFile::open(config_in(dir.path())).unwrap();
    let events = file.subscribe();

    for i in 0..8u64 {
        confirm_page(&file, i * storage::PAGE_SIZE as u64, i as u8);
    }

    let mut saw_checkpoint = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, Event::Checkpoint { .. }) {
            saw_checkpoint = true;
        }
    }
    assert!(saw_checkpoint, "expected at least one checkpoint event");
}

#[test]
fn encryption_round_trip_then_wrong_key_reports_checksum_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::builder()
        .data_dir(dir.path().to_path_buf())
        .checkpoint_threshold_pages(1)
        .encryption_key(b"correct horse battery staple".to_vec())
        .build();
    let file = PagedFile::open(config).unwrap();
    let tx = file.begin_transaction().unwrap();
    let reader = file.get_reader(true).unwrap();
    let mut page = reader.new_page(0).unwrap();
    page.page.payload_mut().fill(0x5A);
    page.page
        .write_header(&storage::PageHeader::for_log(0, tx, true))
        .unwrap();
    drop(reader);
    file.write_async(vec![page]).unwrap();
    file.checkpoint().unwrap();
    file.dispose().unwrap();

    let same_key = Config::builder()
        .data_dir(dir.path().to_path_buf())
        .encryption_key(b"correct horse battery staple".to_vec())
        .build();
    let file = PagedFile::open(same_key).unwrap();
    let mut reader = file.get_reader(false).unwrap();
    let page = reader.read_page(0).unwrap();
    assert!(page.page.payload().iter().all(|&b| b == 0x5A));
    drop(reader);
    file.dispose().unwrap();

    let wrong_key = Config::builder()
        .data_dir(dir.path().to_path_buf())
        .encryption_key(b"a different passphrase entirely".to_vec())
        .build();
    let file = PagedFile::open(wrong_key).unwrap();
    let mut reader = file.get_reader(false).unwrap();
    let err = reader.read_page(0).unwrap_err();
    assert!(matches!(err, DbError::ChecksumMismatch(_)));
}

#[test]
fn memory_buffer_size_is_monotone_non_decreasing() {
    let dir = tempfile::tempdir().unwrap();
    let file = PagedFile::open(config_in(dir.path())).unwrap();
    let mut last = file.memory_buffer_size();
    for i in 0..50u64 {
        confirm_page(&file, i * storage::PAGE_SIZE as u64, 1);
        let now = file.memory_buffer_size();
        assert!(now >= last);
        last = now;
    }
}

#[test]
fn queuing_a_page_emits_a_queue_event() {
    let dir = tempfile::tempdir().unwrap();
    let file = PagedFile::open(config_in(dir.path())).unwrap();
    let events = file.subscribe();

    confirm_page(&file, 0, 1);

    let mut saw_queue = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, Event::Queue { .. }) {
            saw_queue = true;
        }
    }
    assert!(saw_queue, "expected at least one queue-depth event");
}

#[test]
fn set_length_async_resizes_the_data_file_not_the_log() {
    let dir = tempfile::tempdir().unwrap();
    let file = PagedFile::open(config_in(dir.path())).unwrap();

    let target = 3 * storage::PAGE_SIZE as u64;
    file.set_length_async(target).unwrap();
    assert_eq!(file.length(), target);
    file.dispose().unwrap();

    let data_len = std::fs::metadata(dir.path().join("data.pdb")).unwrap().len();
    assert_eq!(
        data_len, target,
        "SetLengthAsync must resize the data file, not the log"
    );
}
