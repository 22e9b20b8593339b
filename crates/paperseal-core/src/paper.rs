//! Question paper content and the encrypted paper record
//!
//! Questions are multiple-choice: text, four options, and the correct
//! option. A question set is validated before any key is generated or any
//! ciphertext written; once sealed, the paper is immutable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::types::{ExamId, PaperId};
use crate::vault::SealedPaper;

/// Options per multiple-choice question
pub const OPTIONS_PER_QUESTION: usize = 4;

/// One multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question text
    pub question: String,

    /// Exactly four answer options
    pub options: Vec<String>,

    /// The correct option, one of `options`
    pub correct_option: String,
}

/// The plaintext content of one paper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub questions: Vec<Question>,
}

impl QuestionSet {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Validate the set before sealing
    ///
    /// Rejects empty sets, blank question text, missing or blank options,
    /// and a correct option not drawn from the options.
    pub fn validate(&self) -> Result<()> {
        if self.questions.is_empty() {
            return Err(Error::InvalidQuestions(
                "paper must contain at least one question".into(),
            ));
        }
        for (i, q) in self.questions.iter().enumerate() {
            if q.question.trim().is_empty() {
                return Err(Error::InvalidQuestions(format!(
                    "question {} has empty text",
                    i + 1
                )));
            }
            if q.options.len() != OPTIONS_PER_QUESTION {
                return Err(Error::InvalidQuestions(format!(
                    "question {} has {} options, expected {}",
                    i + 1,
                    q.options.len(),
                    OPTIONS_PER_QUESTION
                )));
            }
            if q.options.iter().any(|opt| opt.trim().is_empty()) {
                return Err(Error::InvalidQuestions(format!(
                    "question {} has an empty option",
                    i + 1
                )));
            }
            if !q.options.contains(&q.correct_option) {
                return Err(Error::InvalidQuestions(format!(
                    "question {} correct option is not among its options",
                    i + 1
                )));
            }
        }
        Ok(())
    }

    /// Serialize to the canonical byte form used for encryption
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from decrypted bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// The stored record of one encrypted paper
///
/// Immutable after creation: questions cannot be modified once submitted.
/// Only the sealed form is ever persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamPaper {
    pub id: PaperId,
    pub exam_id: ExamId,

    /// Encrypted question set plus nonce
    pub sealed: SealedPaper,

    /// SHA-256 of the plaintext, for post-decryption integrity checks
    #[serde(with = "hex::serde")]
    pub content_digest: Vec<u8>,

    pub created_at: DateTime<Utc>,
}

impl ExamPaper {
    pub fn new(id: PaperId, exam_id: ExamId, sealed: SealedPaper, plaintext: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(plaintext);
        Self {
            id,
            exam_id,
            sealed,
            content_digest: hasher.finalize().to_vec(),
            created_at: Utc::now(),
        }
    }

    /// Check decrypted content against the stored digest
    pub fn digest_matches(&self, plaintext: &[u8]) -> bool {
        let mut hasher = Sha256::new();
        hasher.update(plaintext);
        hasher.finalize().as_slice() == self.content_digest.as_slice()
    }
}
