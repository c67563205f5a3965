use super::*;
use crate::header::{PageHeader, PageType};
use common::TxId;

#[test]
fn fresh_page_round_trips_header() {
    let header = PageHeader::for_data(42);
    let page = Page::new(0, header);
    let read = page.header().unwrap();
    assert_eq!(read.logical_position, 42);
    assert_eq!(read.page_type, PageType::Data);
    assert!(!read.confirmed);
}

#[test]
fn checksum_detects_payload_corruption() {
    let mut page = Page::new(0, PageHeader::for_data(0));
    page.payload_mut()[0] = 0xAA;
    page.seal_checksum().unwrap();
    assert!(page.verify_checksum().is_ok());

    page.payload_mut()[0] = 0xAB;
    assert!(page.verify_checksum().is_err());
}

#[test]
fn log_header_carries_confirmed_flag_and_tx() {
    let header = PageHeader::for_log(7, TxId(3), true);
    let page = Page::new(100, header);
    let read = page.header().unwrap();
    assert_eq!(read.page_type, PageType::Log);
    assert_eq!(read.tx_id, 3);
    assert!(read.confirmed);
}

#[test]
fn encrypt_then_decrypt_round_trips() {
    let key = b"correct horse battery staple".to_vec();
    let mut page = Page::new(0, PageHeader::for_data(5));
    page.payload_mut()[..4].copy_from_slice(&[1, 2, 3, 4]);
    page.seal_checksum().unwrap();

    let plaintext_checksum = page.header().unwrap().checksum;

    page.encrypt(Some(&key)).unwrap();
    assert_ne!(&page.payload()[..4], &[1, 2, 3, 4]);

    page.decrypt(Some(&key)).unwrap();
    assert_eq!(&page.payload()[..4], &[1, 2, 3, 4]);
    assert_eq!(page.header().unwrap().checksum, plaintext_checksum);
    assert!(page.verify_checksum().is_ok());
}

#[test]
fn decrypt_with_wrong_key_reports_checksum_mismatch() {
    let key = b"right-key".to_vec();
    let wrong_key = b"wrong-key".to_vec();
    let mut page = Page::new(0, PageHeader::for_data(9));
    page.payload_mut()[0] = 0x42;
    page.seal_checksum().unwrap();
    page.encrypt(Some(&key)).unwrap();

    let err = page.decrypt(Some(&wrong_key)).unwrap_err();
    assert!(matches!(err, common::DbError::ChecksumMismatch(_)));
}

#[test]
fn payload_capacity_leaves_room_for_header_and_tag() {
    assert!(payload_capacity() < PAGE_SIZE);
    assert!(payload_capacity() > PAGE_SIZE / 2);
}
