//! In-memory store holding the currently loaded result set.
//!
//! Readers take a cheap [`Arc`] snapshot and never observe a half-replaced
//! dataset: a load swaps the whole snapshot under a write lock.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{ResultsError, ResultsResult};
use crate::models::{ResultSet, RowDiagnostic};

/// One loaded dataset with its load metadata.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Monotonic load counter, starting at 1
    pub generation: u64,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
    pub result_set: Arc<ResultSet>,
    pub diagnostics: Arc<Vec<RowDiagnostic>>,
}

/// Thread-safe holder for the current [`Snapshot`].
#[derive(Debug, Default)]
pub struct ResultStore {
    current: RwLock<Option<Arc<Snapshot>>>,
    generation: AtomicU64,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current dataset, returning the new snapshot.
    pub fn load(&self, result_set: ResultSet, diagnostics: Vec<RowDiagnostic>) -> Arc<Snapshot> {
        let mut slot = self.current.write();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(Snapshot {
            generation,
            loaded_at: chrono::Utc::now(),
            result_set: Arc::new(result_set),
            diagnostics: Arc::new(diagnostics),
        });
        *slot = Some(Arc::clone(&snapshot));

        log::info!(
            "Loaded dataset '{}' as generation {} ({} records)",
            snapshot.result_set.source().name,
            generation,
            snapshot.result_set.len()
        );
        snapshot
    }

    /// Current snapshot, if any dataset was loaded.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.read().clone()
    }

    /// Current snapshot or [`ResultsError::NoDataset`].
    pub fn require(&self) -> ResultsResult<Arc<Snapshot>> {
        self.current().ok_or(ResultsError::NoDataset)
    }

    /// Drop the current dataset. Existing snapshots held by readers stay valid.
    pub fn clear(&self) {
        if self.current.write().take().is_some() {
            log::info!("Cleared loaded dataset");
        }
    }

    /// Generation of the last load, `0` when nothing was ever loaded.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
