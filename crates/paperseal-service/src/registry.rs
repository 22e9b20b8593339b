//! Guardian assignment and share submission
//!
//! Tracks which guardians custody a paper's key shares and records their
//! submissions. Submission is a transactional check-and-set under the
//! per-paper lock: of two concurrent submissions for the same guardian,
//! exactly one succeeds and the other observes `AlreadySubmitted`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use paperseal_core::{
    schedule::ExamSchedule, shamir::KeyShare, GuardianId, PaperId, GUARDIAN_COUNT,
};

use crate::error::{Result, ServiceError};
use crate::locks::PaperLocks;
use crate::store::{GuardianAssignment, PaperStore};

/// Submission progress for one paper
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SubmissionStatus {
    pub assigned: usize,
    pub submitted: usize,
}

impl SubmissionStatus {
    pub fn outstanding(&self) -> usize {
        self.assigned.saturating_sub(self.submitted)
    }

    pub fn is_complete(&self) -> bool {
        self.submitted >= self.assigned && self.assigned > 0
    }
}

/// Per-guardian view of one assignment, backing the key-status polling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardianKeyStatus {
    pub paper_id: PaperId,
    pub exam: ExamSchedule,
    pub has_submitted: bool,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Guardian registry over the shared paper store
pub struct GuardianRegistry {
    store: Arc<RwLock<PaperStore>>,
    locks: Arc<PaperLocks>,
}

impl GuardianRegistry {
    pub fn new(store: Arc<RwLock<PaperStore>>, locks: Arc<PaperLocks>) -> Self {
        Self { store, locks }
    }

    /// Validate a guardian selection and build the assignment set
    ///
    /// Fails with `InvalidGuardianCount` unless exactly three distinct
    /// guardians are given. Called before any key material exists, so a
    /// rejected selection never costs an encryption.
    pub fn build_assignments(
        paper_id: PaperId,
        guardian_ids: &[GuardianId],
    ) -> Result<Vec<GuardianAssignment>> {
        let distinct: HashSet<_> = guardian_ids.iter().collect();
        if guardian_ids.len() != GUARDIAN_COUNT || distinct.len() != GUARDIAN_COUNT {
            return Err(ServiceError::InvalidGuardianCount {
                expected: GUARDIAN_COUNT,
                got: distinct.len().min(guardian_ids.len()),
            });
        }

        Ok(guardian_ids
            .iter()
            .enumerate()
            .map(|(i, &guardian_id)| {
                // Share indices are 1-based x-coordinates
                GuardianAssignment::new(guardian_id, paper_id, (i + 1) as u8)
            })
            .collect())
    }

    /// Record a guardian's share submission
    ///
    /// Idempotent rejection, not overwrite: a recorded share can never be
    /// resubmitted or changed. Does not trigger decryption; reconstruction
    /// is driven by exam-center requests.
    pub async fn submit_share(
        &self,
        guardian_id: GuardianId,
        paper_id: PaperId,
        share: KeyShare,
    ) -> Result<()> {
        let _guard = self.locks.acquire(paper_id).await;
        let mut store = self.store.write().await;

        let record = store.get_mut(&paper_id)?;
        let assignment = record
            .assignment_for_mut(&guardian_id)
            .ok_or(ServiceError::UnknownGuardian {
                guardian: guardian_id,
                paper: paper_id,
            })?;

        if assignment.has_submitted() {
            debug!(
                guardian = %guardian_id.short(),
                paper = %paper_id.short(),
                "rejecting repeat share submission"
            );
            return Err(ServiceError::AlreadySubmitted {
                guardian: guardian_id,
            });
        }

        if share.index != assignment.share_index {
            warn!(
                guardian = %guardian_id.short(),
                paper = %paper_id.short(),
                expected = assignment.share_index,
                got = share.index,
                "share index does not match assignment"
            );
            return Err(paperseal_core::Error::InvalidShare(format!(
                "share index {} does not match assignment",
                share.index
            ))
            .into());
        }

        assignment.submitted_at = Some(Utc::now());
        assignment.submitted_share = Some(share);

        let snapshot = record.clone();
        store.save(snapshot)?;

        info!(
            guardian = %guardian_id.short(),
            paper = %paper_id.short(),
            "guardian share recorded"
        );
        Ok(())
    }

    /// Submission progress for a paper (snapshot read)
    pub async fn status(&self, paper_id: PaperId) -> Result<SubmissionStatus> {
        let mut store = self.store.write().await;
        let record = store.load(&paper_id)?;
        Ok(SubmissionStatus {
            assigned: record.assignments.len(),
            submitted: record.submitted_count(),
        })
    }

    /// All assignments for one guardian, with submission state and schedule
    pub async fn key_status(&self, guardian_id: GuardianId) -> Result<Vec<GuardianKeyStatus>> {
        let mut store = self.store.write().await;
        let paper_ids = store.papers_for_guardian(&guardian_id)?;

        let mut statuses = Vec::with_capacity(paper_ids.len());
        for paper_id in paper_ids {
            let record = store.load(&paper_id)?;
            // papers_for_guardian only returns papers with an assignment
            if let Some(assignment) = record.assignment_for(&guardian_id) {
                statuses.push(GuardianKeyStatus {
                    paper_id,
                    exam: record.schedule.clone(),
                    has_submitted: assignment.has_submitted(),
                    submitted_at: assignment.submitted_at,
                });
            }
        }
        Ok(statuses)
    }
}
