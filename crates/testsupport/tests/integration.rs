//! Integration tests demonstrating testsupport usage.

use testsupport::prelude::*;

#[test]
fn test_context_isolation() {
    let ctx1 = TestContext::new().unwrap();
    let ctx2 = TestContext::new().unwrap();

    write_confirmed_page(&ctx1.file, 0, 0x11).unwrap();

    assert_ne!(ctx1.data_dir(), ctx2.data_dir());

    let mut reader = ctx2.file.get_reader(false).unwrap();
    let page = reader.read_page(0).unwrap();
    assert_payload_filled(page.page.payload(), 0);
}

#[test]
fn test_page_survives_reopen() {
    let ctx = TestContext::new().unwrap();
    write_confirmed_page(&ctx.file, 0, 0x5A).unwrap();
    ctx.file.dispose().unwrap();

    let reopened = ctx.reopen().unwrap();
    let mut reader = reopened.get_reader(false).unwrap();
    let page = reader.read_page(0).unwrap();
    assert_payload_filled(page.page.payload(), 0x5A);
}

#[test]
fn test_unconfirmed_transaction_does_not_survive_reopen() {
    let ctx = TestContext::new().unwrap();
    write_page_in_tx(&ctx.file, 0, 0x99, common::TxId(7), false).unwrap();
    ctx.file.dispose().unwrap();

    let reopened = ctx.reopen().unwrap();
    let mut reader = reopened.get_reader(false).unwrap();
    let page = reader.read_page(0).unwrap();
    assert_payload_filled(page.page.payload(), 0);
}

#[test]
fn test_checkpoint_event_observed_through_subscription() {
    let ctx = TestContext::new().unwrap();
    let events = ctx.file.subscribe();

    for i in 0..8u64 {
        write_confirmed_page(&ctx.file, i * storage::PAGE_SIZE as u64, i as u8).unwrap();
    }

    assert_saw_event(&events, |e| matches!(e, common::Event::Checkpoint { .. }));
}

#[test]
fn test_encryption_round_trip_then_wrong_key_fails() {
    let ctx = TestContext::with_encryption_key(b"a passphrase for testing".to_vec()).unwrap();
    write_confirmed_page(&ctx.file, 0, 0x3C).unwrap();
    ctx.file.dispose().unwrap();

    let right = ctx.reopen().unwrap();
    let mut reader = right.get_reader(false).unwrap();
    let page = reader.read_page(0).unwrap();
    assert_payload_filled(page.page.payload(), 0x3C);
    drop(reader);
    right.dispose().unwrap();

    let wrong = common::Config::builder()
        .data_dir(ctx.data_dir().to_path_buf())
        .encryption_key(b"a different passphrase".to_vec())
        .build();
    let file = pagefile::PagedFile::open(wrong).unwrap();
    let mut reader = file.get_reader(false).unwrap();
    let result = reader.read_page(0);
    assert_err_is(result, |e| matches!(e, common::DbError::ChecksumMismatch(_)));
}

mod proptest_tests {
    use proptest::prelude::*;
    use testsupport::proptest_generators::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn prop_arb_position_stays_within_bound(pos in arb_position(100)) {
            prop_assert!(pos < 100 * storage::PAGE_SIZE as u64);
        }
    }
}
