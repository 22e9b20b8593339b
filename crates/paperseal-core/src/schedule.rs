//! Exam schedule types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ExamId;

/// Administrative status of a scheduled exam
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    /// Scheduled but not yet started
    #[default]
    Scheduled,

    /// Currently running
    Active,

    /// Finished
    Completed,

    /// Called off; the paper is never released
    Cancelled,
}

impl ExamStatus {
    /// Whether the paper may still be requested for this exam
    pub fn allows_release(&self) -> bool {
        matches!(self, ExamStatus::Scheduled | ExamStatus::Active)
    }
}

/// Schedule for one examination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSchedule {
    pub exam_id: ExamId,

    /// Display name, e.g. "Mathematics Paper II"
    pub title: String,

    /// Scheduled start of the exam
    pub start_time: DateTime<Utc>,

    /// Scheduled end of the exam
    pub end_time: DateTime<Utc>,

    pub status: ExamStatus,
}

impl ExamSchedule {
    pub fn new(
        exam_id: ExamId,
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            exam_id,
            title: title.into(),
            start_time,
            end_time,
            status: ExamStatus::Scheduled,
        }
    }
}
