//! Paper record storage
//!
//! One JSON file per paper, holding the sealed paper, its schedule, the
//! guardian assignments (including submitted share values), and the release
//! record once decryption has happened. Writes go to a temp file first and
//! are renamed into place; files carry owner-only permissions because they
//! hold submitted key shares. Plaintext questions and reconstructed keys are
//! never written here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use paperseal_core::{
    lifecycle::PaperPhase,
    paper::ExamPaper,
    schedule::ExamSchedule,
    shamir::{KeyShare, ShareIndex},
    window::WindowState,
    ExamCenterId, ExamId, GuardianId, PaperId,
};

use crate::error::{Result, ServiceError};

/// One guardian's assignment to a paper
///
/// Created at paper-creation time and mutated exactly once, when the owning
/// guardian submits their share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardianAssignment {
    pub guardian_id: GuardianId,
    pub paper_id: PaperId,

    /// x-index of the share dispatched to this guardian
    pub share_index: ShareIndex,

    /// Set on successful submission, never cleared or overwritten
    pub submitted_at: Option<DateTime<Utc>>,

    /// The share value the guardian submitted
    pub submitted_share: Option<KeyShare>,
}

impl GuardianAssignment {
    pub fn new(guardian_id: GuardianId, paper_id: PaperId, share_index: ShareIndex) -> Self {
        Self {
            guardian_id,
            paper_id,
            share_index,
            submitted_at: None,
            submitted_share: None,
        }
    }

    pub fn has_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }
}

/// Record of the single successful decryption for an exam
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseRecord {
    pub exam_id: ExamId,
    pub requested_by: ExamCenterId,
    pub decrypted_at: DateTime<Utc>,
}

/// Everything persisted for one paper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperRecord {
    pub paper: ExamPaper,
    pub schedule: ExamSchedule,
    pub assignments: Vec<GuardianAssignment>,
    pub release: Option<ReleaseRecord>,
}

impl PaperRecord {
    pub fn submitted_count(&self) -> usize {
        self.assignments.iter().filter(|a| a.has_submitted()).count()
    }

    pub fn assignment_for(&self, guardian_id: &GuardianId) -> Option<&GuardianAssignment> {
        self.assignments
            .iter()
            .find(|a| &a.guardian_id == guardian_id)
    }

    pub fn assignment_for_mut(
        &mut self,
        guardian_id: &GuardianId,
    ) -> Option<&mut GuardianAssignment> {
        self.assignments
            .iter_mut()
            .find(|a| &a.guardian_id == guardian_id)
    }

    /// Collect submitted share values for reconstruction
    pub fn submitted_shares(&self) -> Vec<KeyShare> {
        self.assignments
            .iter()
            .filter_map(|a| a.submitted_share.clone())
            .collect()
    }

    /// Derive the lifecycle phase at `now`
    pub fn phase(&self, now: DateTime<Utc>) -> PaperPhase {
        PaperPhase::derive(
            self.assignments.len(),
            self.submitted_count(),
            self.release.is_some(),
            WindowState::evaluate(&self.schedule, now),
        )
    }
}

/// File-backed store of paper records
pub struct PaperStore {
    store_path: PathBuf,
    cache: HashMap<PaperId, PaperRecord>,
}

impl PaperStore {
    /// Create a new store rooted at `store_path`
    pub fn new(store_path: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&store_path)?;
        Ok(Self {
            store_path,
            cache: HashMap::new(),
        })
    }

    /// Persist a new or updated record
    pub fn save(&mut self, record: PaperRecord) -> Result<()> {
        let paper_id = record.paper.id;
        self.save_to_disk(&record)?;
        self.cache.insert(paper_id, record);
        Ok(())
    }

    /// Load a record, from cache or disk
    pub fn load(&mut self, paper_id: &PaperId) -> Result<&PaperRecord> {
        if !self.cache.contains_key(paper_id) {
            let record = self.load_from_disk(paper_id)?;
            self.cache.insert(*paper_id, record);
        }
        self.cache
            .get(paper_id)
            .ok_or(ServiceError::PaperNotFound(*paper_id))
    }

    /// Mutable access to a record; callers must `save` after mutating
    pub fn get_mut(&mut self, paper_id: &PaperId) -> Result<&mut PaperRecord> {
        if !self.cache.contains_key(paper_id) {
            let record = self.load_from_disk(paper_id)?;
            self.cache.insert(*paper_id, record);
        }
        self.cache
            .get_mut(paper_id)
            .ok_or(ServiceError::PaperNotFound(*paper_id))
    }

    /// List all stored paper ids
    pub fn list_papers(&self) -> Result<Vec<PaperId>> {
        let mut papers = Vec::new();
        for entry in std::fs::read_dir(&self.store_path)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(stem) = path.file_stem() {
                    if let Ok(paper_id) = PaperId::parse(&stem.to_string_lossy()) {
                        papers.push(paper_id);
                    }
                }
            }
        }
        Ok(papers)
    }

    /// Find the paper for an exam, if one exists
    pub fn find_by_exam(&mut self, exam_id: &ExamId) -> Result<Option<PaperId>> {
        for paper_id in self.list_papers()? {
            let record = self.load(&paper_id)?;
            if record.paper.exam_id == *exam_id {
                return Ok(Some(paper_id));
            }
        }
        Ok(None)
    }

    /// All papers a guardian is assigned to
    pub fn papers_for_guardian(&mut self, guardian_id: &GuardianId) -> Result<Vec<PaperId>> {
        let mut found = Vec::new();
        for paper_id in self.list_papers()? {
            let record = self.load(&paper_id)?;
            if record.assignment_for(guardian_id).is_some() {
                found.push(paper_id);
            }
        }
        Ok(found)
    }

    fn paper_path(&self, paper_id: &PaperId) -> PathBuf {
        self.store_path.join(format!("{}.json", paper_id))
    }

    fn load_from_disk(&self, paper_id: &PaperId) -> Result<PaperRecord> {
        let path = self.paper_path(paper_id);
        if !path.exists() {
            return Err(ServiceError::PaperNotFound(*paper_id));
        }
        let content = std::fs::read_to_string(&path)?;
        let record: PaperRecord = serde_json::from_str(&content)?;
        Ok(record)
    }

    fn save_to_disk(&self, record: &PaperRecord) -> Result<()> {
        let path = self.paper_path(&record.paper.id);
        let content = serde_json::to_string_pretty(record)?;

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)?;
        std::fs::rename(&temp_path, &path)?;

        // Paper files hold submitted key shares; owner-only access
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use paperseal_core::{
        paper::{Question, QuestionSet},
        vault::{self, PaperKey},
    };
    use tempfile::TempDir;

    fn sample_record() -> PaperRecord {
        let questions = QuestionSet::new(vec![Question {
            question: "Capital of France?".into(),
            options: vec!["Paris".into(), "Lyon".into(), "Nice".into(), "Lille".into()],
            correct_option: "Paris".into(),
        }]);
        let bytes = questions.to_bytes().unwrap();
        let key = PaperKey::generate();
        let sealed = vault::encrypt(&bytes, &key).unwrap();

        let exam_id = ExamId::generate();
        let paper_id = PaperId::generate();
        let start = Utc::now() + Duration::hours(2);

        PaperRecord {
            paper: ExamPaper::new(paper_id, exam_id, sealed, &bytes),
            schedule: ExamSchedule::new(exam_id, "Geography", start, start + Duration::hours(3)),
            assignments: vec![
                GuardianAssignment::new(GuardianId::generate(), paper_id, 1),
                GuardianAssignment::new(GuardianId::generate(), paper_id, 2),
                GuardianAssignment::new(GuardianId::generate(), paper_id, 3),
            ],
            release: None,
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let mut store = PaperStore::new(dir.path().to_path_buf()).unwrap();

        let record = sample_record();
        let paper_id = record.paper.id;
        store.save(record).unwrap();

        // Fresh store instance forces a disk read
        let mut store = PaperStore::new(dir.path().to_path_buf()).unwrap();
        let loaded = store.load(&paper_id).unwrap();
        assert_eq!(loaded.paper.id, paper_id);
        assert_eq!(loaded.assignments.len(), 3);
        assert!(loaded.release.is_none());
    }

    #[test]
    fn test_load_missing_paper() {
        let dir = TempDir::new().unwrap();
        let mut store = PaperStore::new(dir.path().to_path_buf()).unwrap();
        assert!(matches!(
            store.load(&PaperId::generate()),
            Err(ServiceError::PaperNotFound(_))
        ));
    }

    #[test]
    fn test_find_by_exam_and_guardian() {
        let dir = TempDir::new().unwrap();
        let mut store = PaperStore::new(dir.path().to_path_buf()).unwrap();

        let record = sample_record();
        let paper_id = record.paper.id;
        let exam_id = record.paper.exam_id;
        let guardian = record.assignments[0].guardian_id;
        store.save(record).unwrap();

        assert_eq!(store.find_by_exam(&exam_id).unwrap(), Some(paper_id));
        assert_eq!(store.find_by_exam(&ExamId::generate()).unwrap(), None);
        assert_eq!(store.papers_for_guardian(&guardian).unwrap(), vec![paper_id]);
        assert!(store
            .papers_for_guardian(&GuardianId::generate())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_submitted_count_tracks_assignments() {
        let mut record = sample_record();
        assert_eq!(record.submitted_count(), 0);

        let guardian = record.assignments[1].guardian_id;
        let assignment = record.assignment_for_mut(&guardian).unwrap();
        assignment.submitted_at = Some(Utc::now());
        assert_eq!(record.submitted_count(), 1);
    }
}
