//! Per-paper serialization locks
//!
//! Submission and release both need exactly one writer at a time per paper,
//! while status reads proceed concurrently through the store's RwLock. The
//! lock is keyed by paper id so independent papers never contend.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use paperseal_core::PaperId;

/// Map of per-paper mutexes, created on first use
#[derive(Default)]
pub struct PaperLocks {
    locks: Mutex<HashMap<PaperId, Arc<Mutex<()>>>>,
}

impl PaperLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the exclusive lock for one paper
    pub async fn acquire(&self, paper_id: PaperId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.locks.lock().await;
            map.entry(paper_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
