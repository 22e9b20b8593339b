//! Error types for the Paperseal service
//!
//! The taxonomy follows three families with different caller contracts:
//! precondition-not-met (retry by waiting), request-integrity (retry with
//! corrected input), and cryptographic-integrity (non-retryable; logged
//! server-side in full, surfaced opaquely).

use thiserror::Error;

use paperseal_core::{GuardianId, PaperId};

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors that can occur in the custody and release service
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No schedule exists for the requested exam, or it was cancelled
    #[error("No active exam for this request")]
    NoActiveExam,

    /// The release window has not opened yet
    #[error("Too early: paper requestable in {secs_remaining}s")]
    TooEarly { secs_remaining: i64 },

    /// The exam has started; the release window is closed for good
    #[error("Release window expired")]
    WindowExpired,

    /// Not all guardians have submitted their key shares
    #[error("Awaiting guardian keys: {submitted} submitted, {missing} outstanding")]
    AwaitingGuardianKeys { submitted: usize, missing: usize },

    /// Paper creation requires exactly three distinct guardians
    #[error("Invalid guardian count: expected {expected} distinct guardians, got {got}")]
    InvalidGuardianCount { expected: usize, got: usize },

    /// The submitting guardian is not assigned to this paper
    #[error("Guardian {guardian} is not assigned to paper {paper}")]
    UnknownGuardian {
        guardian: GuardianId,
        paper: PaperId,
    },

    /// The guardian already has a recorded share for this paper
    #[error("Guardian {guardian} has already submitted a share for this paper")]
    AlreadySubmitted { guardian: GuardianId },

    /// No paper record with this id
    #[error("Paper not found: {0}")]
    PaperNotFound(PaperId),

    /// Core library error (share combination, decryption, validation)
    #[error("Core error: {0}")]
    Core(#[from] paperseal_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Caller-facing error family, per the propagation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Retryable by waiting (the condition is time- or submission-driven)
    Precondition,

    /// Retryable with corrected input
    RequestIntegrity,

    /// Non-retryable: corruption or tampering; escalate, never retry silently
    CryptoIntegrity,

    /// Infrastructure failure (IO, serialization, config)
    Internal,
}

impl ServiceError {
    /// Classify this error for retry and propagation decisions
    pub fn class(&self) -> ErrorClass {
        use paperseal_core::Error as CoreError;
        match self {
            ServiceError::NoActiveExam
            | ServiceError::TooEarly { .. }
            | ServiceError::WindowExpired
            | ServiceError::AwaitingGuardianKeys { .. } => ErrorClass::Precondition,

            ServiceError::InvalidGuardianCount { .. }
            | ServiceError::UnknownGuardian { .. }
            | ServiceError::AlreadySubmitted { .. }
            | ServiceError::PaperNotFound(_) => ErrorClass::RequestIntegrity,

            ServiceError::Core(e) => match e {
                // A duplicate share index is a malformed request, not corruption
                CoreError::DuplicateShare(_) => ErrorClass::RequestIntegrity,
                CoreError::InsufficientShares { .. }
                | CoreError::InvalidShare(_)
                | CoreError::AuthenticationFailed => ErrorClass::CryptoIntegrity,
                _ => ErrorClass::Internal,
            },

            ServiceError::Io(_)
            | ServiceError::Serialization(_)
            | ServiceError::Config(_) => ErrorClass::Internal,
        }
    }

    /// Whether the caller may retry without changing the request
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Precondition
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_errors_are_retryable() {
        assert!(ServiceError::TooEarly { secs_remaining: 30 }.is_retryable());
        assert!(ServiceError::AwaitingGuardianKeys {
            submitted: 2,
            missing: 1
        }
        .is_retryable());
        assert!(ServiceError::NoActiveExam.is_retryable());
    }

    #[test]
    fn test_integrity_errors_are_not_retryable() {
        let err = ServiceError::Core(paperseal_core::Error::AuthenticationFailed);
        assert_eq!(err.class(), ErrorClass::CryptoIntegrity);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_request_errors_need_corrected_input() {
        let err = ServiceError::InvalidGuardianCount {
            expected: 3,
            got: 2,
        };
        assert_eq!(err.class(), ErrorClass::RequestIntegrity);
        assert!(!err.is_retryable());
    }
}
