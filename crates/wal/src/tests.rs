use crate::WalCoordinator;
use common::EventBus;
use storage::PageHeader;

#[test]
fn unconfirmed_pages_do_not_resolve() {
    let wal = WalCoordinator::new(1000, EventBus::new());
    let tx = wal.next_tx_id();

    wal.observe_log_page(&PageHeader::for_log(10, tx, false), 4096);
    assert_eq!(wal.resolve(10), None);
}

#[test]
fn confirmed_flag_promotes_the_whole_transaction() {
    let wal = WalCoordinator::new(1000, EventBus::new());
    let tx = wal.next_tx_id();

    wal.observe_log_page(&PageHeader::for_log(10, tx, false), 4096);
    wal.observe_log_page(&PageHeader::for_log(20, tx, false), 8192);
    let newly_confirmed = wal.observe_log_page(&PageHeader::for_log(30, tx, true), 12288);

    let mut sorted = newly_confirmed.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![10, 20, 30]);
    assert_eq!(wal.resolve(10), Some(4096));
    assert_eq!(wal.resolve(20), Some(8192));
    assert_eq!(wal.resolve(30), Some(12288));
}

#[test]
fn later_confirmed_write_supersedes_the_earlier_offset() {
    let wal = WalCoordinator::new(1000, EventBus::new());

    let tx1 = wal.next_tx_id();
    wal.observe_log_page(&PageHeader::for_log(10, tx1, true), 4096);
    assert_eq!(wal.resolve(10), Some(4096));

    let tx2 = wal.next_tx_id();
    wal.observe_log_page(&PageHeader::for_log(10, tx2, true), 20480);
    assert_eq!(wal.resolve(10), Some(20480));
}

#[test]
fn recovery_discards_pages_from_a_transaction_that_never_confirmed() {
    let wal = WalCoordinator::new(1000, EventBus::new());
    let tx = wal.next_tx_id();

    wal.observe_log_page(&PageHeader::for_log(1, tx, false), 4096);
    wal.observe_log_page(&PageHeader::for_log(2, tx, false), 8192);

    let outcome = wal.finish_recovery();
    assert_eq!(outcome.confirmed_pages, 0);
    assert_eq!(outcome.discarded_pages, 2);
    assert_eq!(wal.resolve(1), None);
}

#[test]
fn recovery_reports_confirmed_pages_alongside_discarded_ones() {
    let wal = WalCoordinator::new(1000, EventBus::new());

    let good = wal.next_tx_id();
    wal.observe_log_page(&PageHeader::for_log(1, good, true), 4096);

    let orphan = wal.next_tx_id();
    wal.observe_log_page(&PageHeader::for_log(2, orphan, false), 8192);

    let outcome = wal.finish_recovery();
    assert_eq!(outcome.confirmed_pages, 1);
    assert_eq!(outcome.discarded_pages, 1);
}

#[test]
fn should_checkpoint_trips_at_the_configured_threshold() {
    let wal = WalCoordinator::new(3, EventBus::new());
    let tx = wal.next_tx_id();

    assert!(!wal.should_checkpoint());
    wal.observe_log_page(&PageHeader::for_log(1, tx, false), 4096);
    wal.observe_log_page(&PageHeader::for_log(2, tx, false), 8192);
    assert!(!wal.should_checkpoint());
    wal.observe_log_page(&PageHeader::for_log(3, tx, true), 12288);
    assert!(wal.should_checkpoint());
}

#[test]
fn checkpoint_snapshot_then_finish_clears_confirmed_state_and_counter() {
    let wal = WalCoordinator::new(2, EventBus::new());
    let tx = wal.next_tx_id();
    wal.observe_log_page(&PageHeader::for_log(1, tx, true), 4096);
    assert!(wal.should_checkpoint());

    let snapshot = wal.checkpoint_snapshot();
    assert_eq!(snapshot, vec![(1, 4096)]);

    wal.finish_checkpoint();
    assert!(!wal.should_checkpoint());
    // The in-memory mapping is cleared; the data file is now the source of
    // truth for page 1 until a new log entry confirms a fresh offset.
    assert_eq!(wal.resolve(1), None);
}

#[test]
fn tx_ids_are_strictly_increasing_and_resumable_after_recovery() {
    let wal = WalCoordinator::new(1000, EventBus::new());
    let a = wal.next_tx_id();
    let b = wal.next_tx_id();
    assert!(b.0 > a.0);

    wal.resume_tx_seq_after(500);
    let c = wal.next_tx_id();
    assert_eq!(c.0, 501);
}

#[test]
fn distinct_transactions_do_not_cross_contaminate_pending_state() {
    let wal = WalCoordinator::new(1000, EventBus::new());
    let tx_a = wal.next_tx_id();
    let tx_b = wal.next_tx_id();

    wal.observe_log_page(&PageHeader::for_log(1, tx_a, false), 4096);
    wal.observe_log_page(&PageHeader::for_log(2, tx_b, true), 8192);

    assert_eq!(wal.resolve(1), None);
    assert_eq!(wal.resolve(2), Some(8192));

    let outcome = wal.finish_recovery();
    assert_eq!(outcome.confirmed_pages, 1);
    assert_eq!(outcome.discarded_pages, 1);
}
