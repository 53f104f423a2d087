//! Atomically replaceable data snapshots.
//!
//! A [`Snapshot`] pairs a record store with its long form, computed once.
//! [`SnapshotHandle`] lets readers load the current snapshot without locking
//! while a reload swaps in a new one; readers holding the old `Arc` keep a
//! consistent view until they drop it.

use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::aggregate::{to_long_form, CountryYearCount};
use crate::record::RecordStore;

/// Immutable record store plus derived long form.
#[derive(Debug)]
pub struct Snapshot {
    version: u64,
    store: RecordStore,
    long_form: Arc<Vec<CountryYearCount>>,
}

impl Snapshot {
    fn new(version: u64, store: RecordStore) -> Self {
        let long_form = Arc::new(to_long_form(store.posts()));
        Self {
            version,
            store,
            long_form,
        }
    }

    /// Monotonic load counter, starting at 1.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The record store.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Content hash of the record store.
    pub fn fingerprint(&self) -> u64 {
        self.store.fingerprint()
    }

    /// Long-form country-year counts.
    pub fn long_form(&self) -> &Arc<Vec<CountryYearCount>> {
        &self.long_form
    }
}

/// Shared handle to the current snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotHandle {
    current: Arc<ArcSwap<Snapshot>>,
    next_version: Arc<AtomicU64>,
}

impl SnapshotHandle {
    /// Create a handle whose first snapshot wraps `store`.
    pub fn new(store: RecordStore) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(Snapshot::new(1, store))),
            next_version: Arc::new(AtomicU64::new(2)),
        }
    }

    /// Current snapshot.
    pub fn load(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Replace the current snapshot. Returns the new one.
    pub fn replace(&self, store: RecordStore) -> Arc<Snapshot> {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst);
        let snapshot = Arc::new(Snapshot::new(version, store));
        self.current.store(Arc::clone(&snapshot));

        info!(
            version,
            records = snapshot.store().len(),
            fingerprint = snapshot.fingerprint(),
            "Snapshot replaced"
        );
        snapshot
    }
}
