//! Paperseal Core - Shared types, secret sharing, and paper encryption
//!
//! This crate provides the foundational types and cryptographic primitives
//! for the Paperseal exam-paper custody system: a paper's content key is
//! split among guardians with threshold secret sharing and the paper is
//! decrypted only inside the release window before the exam starts.

pub mod error;
pub mod lifecycle;
pub mod paper;
pub mod schedule;
pub mod shamir;
pub mod types;
pub mod vault;
pub mod window;

pub use error::{Error, Result};
pub use lifecycle::PaperPhase;
pub use paper::{ExamPaper, Question, QuestionSet};
pub use schedule::{ExamSchedule, ExamStatus};
pub use shamir::{KeyShare, ShareIndex};
pub use types::{ExamCenterId, ExamId, GuardianId, PaperId};
pub use vault::{PaperKey, SealedPaper, KEY_SIZE, NONCE_SIZE};
pub use window::WindowState;

/// Number of guardians assigned to every paper
pub const GUARDIAN_COUNT: usize = 3;

/// Shares required to reconstruct a paper key (all guardians must submit)
pub const RECONSTRUCTION_THRESHOLD: usize = 3;

/// Length of the pre-start request window in seconds (5 minutes)
pub const RELEASE_WINDOW_SECS: i64 = 300;
