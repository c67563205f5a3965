use common::{Event, EventBus, TxId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

struct State {
    /// Logical position -> confirmed log offset, i.e. the current durable
    /// mapping the Memory Store and recovery can trust.
    confirmed: HashMap<u64, u64>,
    /// Transaction id -> (logical position, log offset) pages written so
    /// far but not yet covered by a confirmed-flag page.
    pending: HashMap<u64, Vec<(u64, u64)>>,
    log_pages_since_checkpoint: usize,
}

/// Tracks confirmed transactions in the log, drives checkpoint timing, and
/// replays pending/confirmed bookkeeping during recovery. Holds no file
/// handles; `pagefile` performs the actual reads and writes and calls in
/// here to decide what they mean.
pub struct WalCoordinator {
    state: Mutex<State>,
    bus: EventBus,
    threshold_pages: usize,
    tx_seq: AtomicU64,
}

/// Tally of a recovery pass: pages promoted into the confirmed mapping
/// versus pages belonging to a transaction that never reached its
/// confirmed-flag page and so are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecoveryOutcome {
    pub confirmed_pages: usize,
    pub discarded_pages: usize,
}

impl WalCoordinator {
    pub fn new(checkpoint_threshold_pages: usize, bus: EventBus) -> Self {
        Self {
            state: Mutex::new(State {
                confirmed: HashMap::new(),
                pending: HashMap::new(),
                log_pages_since_checkpoint: 0,
            }),
            bus,
            threshold_pages: checkpoint_threshold_pages,
            tx_seq: AtomicU64::new(1),
        }
    }

    pub fn next_tx_id(&self) -> TxId {
        TxId(self.tx_seq.fetch_add(1, Ordering::SeqCst))
    }

    /// The highest transaction id handed out so far, for persisting into a
    /// fresh `LogHeader` at checkpoint time.
    pub fn current_tx_seq(&self) -> u64 {
        self.tx_seq.load(Ordering::SeqCst).saturating_sub(1)
    }

    /// Reseed the transaction counter after recovery so newly issued ids
    /// never collide with ones already present in the log.
    pub fn resume_tx_seq_after(&self, last_seen: u64) {
        let next = last_seen + 1;
        let mut current = self.tx_seq.load(Ordering::SeqCst);
        while current < next {
            match self.tx_seq.compare_exchange_weak(
                current,
                next,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }

    /// Record one log page, whether freshly written or replayed during
    /// recovery. When `header.confirmed` is set, the entire pending run
    /// for `header.tx_id` (plus this page) is promoted into the confirmed
    /// mapping. Returns the logical positions newly confirmed by this
    /// call, so the caller can invalidate any stale cache entries for
    /// them.
    pub fn observe_log_page(&self, header: &storage::PageHeader, log_offset: u64) -> Vec<u64> {
        let mut state = self.state.lock().unwrap();
        state.log_pages_since_checkpoint += 1;

        let tx = header.tx_id;
        state
            .pending
            .entry(tx)
            .or_default()
            .push((header.logical_position, log_offset));

        if !header.confirmed {
            return Vec::new();
        }

        let pages = state.pending.remove(&tx).unwrap_or_default();
        let mut newly_confirmed = Vec::with_capacity(pages.len());
        for (logical_position, offset) in pages {
            state.confirmed.insert(logical_position, offset);
            newly_confirmed.push(logical_position);
        }
        newly_confirmed
    }

    /// `Resolve`: the confirmed log offset backing a logical position, if
    /// any version of it has ever been confirmed.
    pub fn resolve(&self, logical_position: u64) -> Option<u64> {
        self.state.lock().unwrap().confirmed.get(&logical_position).copied()
    }

    pub fn should_checkpoint(&self) -> bool {
        self.state.lock().unwrap().log_pages_since_checkpoint >= self.threshold_pages
    }

    /// Snapshot the confirmed mapping for a checkpoint sweep. Emits the
    /// checkpoint-begins event; the caller writes each `(logical_position,
    /// offset)` pair's content into the data file, then calls
    /// [`Self::finish_checkpoint`].
    pub fn checkpoint_snapshot(&self) -> Vec<(u64, u64)> {
        let state = self.state.lock().unwrap();
        let snapshot: Vec<(u64, u64)> = state.confirmed.iter().map(|(&k, &v)| (k, v)).collect();
        self.bus.emit(Event::Checkpoint {
            pages: snapshot.len(),
        });
        snapshot
    }

    /// Clear the confirmed mapping and reset the checkpoint counter once
    /// the caller has durably applied every snapshotted page to the data
    /// file and truncated the log.
    pub fn finish_checkpoint(&self) {
        let mut state = self.state.lock().unwrap();
        state.confirmed.clear();
        state.log_pages_since_checkpoint = 0;
    }

    /// Called once the recovery scan has replayed every page in the log.
    /// Any transaction still in `pending` never reached a confirmed-flag
    /// page and is discarded.
    pub fn finish_recovery(&self) -> RecoveryOutcome {
        let mut state = self.state.lock().unwrap();
        let discarded_pages: usize = state.pending.values().map(Vec::len).sum();
        state.pending.clear();
        let outcome = RecoveryOutcome {
            confirmed_pages: state.confirmed.len(),
            discarded_pages,
        };
        self.bus.emit(Event::Recovery {
            confirmed: outcome.confirmed_pages,
            discarded: outcome.discarded_pages,
        });
        outcome
    }
}
