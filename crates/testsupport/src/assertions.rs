//! Custom assertion helpers for testing the paged-file subsystem.

use common::{DbError, DbResult, Event};
use crossbeam::channel::Receiver;
use pretty_assertions::assert_eq;

/// Assert a page's payload is entirely filled with `expected`.
pub fn assert_payload_filled(payload: &[u8], expected: u8) {
    assert!(
        payload.iter().all(|&b| b == expected),
        "expected payload filled with {expected:#x}, found a differing byte"
    );
}

/// Assert two payloads are byte-for-byte equal, with a readable diff on
/// failure courtesy of `pretty_assertions`.
pub fn assert_payload_eq(actual: &[u8], expected: &[u8]) {
    assert_eq!(actual, expected, "page payload mismatch");
}

/// Assert a result failed with the given `DbError` variant, ignoring the
/// message's exact wording.
pub fn assert_err_is(result: DbResult<impl std::fmt::Debug>, matches: impl Fn(&DbError) -> bool) {
    match result {
        Ok(value) => panic!("expected an error, got Ok({value:?})"),
        Err(err) => assert!(
            matches(&err),
            "error did not match the expected variant: {err}"
        ),
    }
}

/// Drain every event currently queued on `events` and assert at least one
/// satisfies `matches`.
pub fn assert_saw_event(events: &Receiver<Event>, matches: impl Fn(&Event) -> bool) {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        if matches(&event) {
            return;
        }
        seen.push(event);
    }
    panic!("expected a matching event, saw: {seen:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_payload_filled() {
        assert_payload_filled(&[9u8; 16], 9);
    }

    #[test]
    #[should_panic(expected = "differing byte")]
    fn test_assert_payload_filled_fails() {
        assert_payload_filled(&[9u8, 8u8], 9);
    }

    #[test]
    fn test_assert_payload_eq() {
        assert_payload_eq(&[1, 2, 3], &[1, 2, 3]);
    }

    #[test]
    fn test_assert_err_is() {
        let result: DbResult<()> = Err(DbError::ChecksumMismatch("bad".into()));
        assert_err_is(result, |e| matches!(e, DbError::ChecksumMismatch(_)));
    }

    #[test]
    #[should_panic(expected = "expected an error")]
    fn test_assert_err_is_fails_on_ok() {
        let result: DbResult<()> = Ok(());
        assert_err_is(result, |_| true);
    }

    #[test]
    fn test_assert_saw_event() {
        let bus = common::EventBus::new();
        let rx = bus.subscribe();
        bus.emit(Event::Checkpoint { pages: 3 });
        assert_saw_event(&rx, |e| matches!(e, Event::Checkpoint { pages: 3 }));
    }
}
