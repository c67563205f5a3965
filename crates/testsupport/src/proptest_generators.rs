//! Property-based test generators using proptest.
//!
//! Strategies for generating random page positions, payload bytes, and
//! `Config` variations to drive property tests of the subsystem.

use common::{Config, FileMode};
use proptest::prelude::*;

/// Strategy for a page-aligned logical position within the first `pages`
/// pages.
pub fn arb_position(pages: u64) -> impl Strategy<Value = u64> {
    (0..pages).prop_map(|i| i * storage::PAGE_SIZE as u64)
}

/// Strategy for a full page payload of arbitrary bytes.
pub fn arb_payload() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), storage::payload_capacity())
}

/// Strategy for a non-encrypted `FileMode`.
pub fn arb_file_mode() -> impl Strategy<Value = FileMode> {
    prop_oneof![
        Just(FileMode::DataFile),
        Just(FileMode::LogFile),
        Just(FileMode::TempFile),
    ]
}

/// Strategy for a `Config` rooted at `data_dir`, varying mode and checkpoint
/// threshold but leaving encryption off (callers needing encrypted configs
/// should build those by hand, since the key must survive a reopen).
pub fn arb_config(data_dir: std::path::PathBuf) -> impl Strategy<Value = Config> {
    (arb_file_mode(), 1usize..32).prop_map(move |(mode, threshold)| {
        Config::builder()
            .data_dir(data_dir.clone())
            .mode(mode)
            .checkpoint_threshold_pages(threshold)
            .build()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_arb_position_is_page_aligned(pos in arb_position(64)) {
            assert_eq!(pos % storage::PAGE_SIZE as u64, 0);
        }

        #[test]
        fn prop_arb_payload_has_capacity_len(payload in arb_payload()) {
            assert_eq!(payload.len(), storage::payload_capacity());
        }
    }
}
