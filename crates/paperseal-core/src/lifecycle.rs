//! Paper lifecycle phases
//!
//! The phase of a paper is never stored; it is derived on demand from the
//! persisted facts (assignments, submissions, release record) and the
//! current window state. Transitions happen only through external events:
//! guardian submissions, exam-center requests, and the wall clock.

use serde::{Deserialize, Serialize};

use crate::window::WindowState;
use crate::GUARDIAN_COUNT;

/// Derived lifecycle phase of one paper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PaperPhase {
    /// Encrypted, guardians not yet assigned (transient during creation)
    Created,

    /// All guardians assigned, no shares submitted yet
    SharesDistributed,

    /// Some but not all shares submitted
    AwaitingSubmissions { submitted: usize },

    /// All shares in and the release window is open
    Decryptable,

    /// Decrypted once; the plaintext is served from the release record
    Released,

    /// The window closed without a successful decryption (terminal)
    Expired,
}

impl PaperPhase {
    /// Derive the phase from stored facts and the current window state
    pub fn derive(
        assigned: usize,
        submitted: usize,
        released: bool,
        window: WindowState,
    ) -> Self {
        if released {
            return PaperPhase::Released;
        }
        if window == WindowState::Expired {
            return PaperPhase::Expired;
        }
        if assigned < GUARDIAN_COUNT {
            return PaperPhase::Created;
        }
        match submitted {
            0 => PaperPhase::SharesDistributed,
            s if s < GUARDIAN_COUNT => PaperPhase::AwaitingSubmissions { submitted: s },
            _ if window.is_open() => PaperPhase::Decryptable,
            s => PaperPhase::AwaitingSubmissions { submitted: s },
        }
    }

    /// Terminal phases admit no further reconstruction attempts
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaperPhase::Released | PaperPhase::Expired)
    }
}
