//! Paperseal Service - key custody and time-gated paper release
//!
//! The async service layer over `paperseal-core`: guardian share
//! submission, release-window enforcement, key reconstruction, and the
//! persisted paper store. Transport (REST, auth, TLS) is deliberately
//! outside this crate; every operation takes the caller context it needs
//! (ids, `now`) as arguments.

pub mod config;
pub mod engine;
pub mod error;
pub mod locks;
pub mod registry;
pub mod store;

pub use config::ServiceConfig;
pub use engine::{CenterDetails, CreatedPaper, ReleaseEngine};
pub use error::{ErrorClass, Result, ServiceError};
pub use locks::PaperLocks;
pub use registry::{GuardianKeyStatus, GuardianRegistry, SubmissionStatus};
pub use store::{GuardianAssignment, PaperRecord, PaperStore, ReleaseRecord};

use std::sync::Arc;
use tokio::sync::RwLock;

/// Open the service over a configured store
///
/// The engine and registry share one store and one per-paper lock map, so
/// submissions and release attempts for the same paper serialize correctly.
pub fn open(config: &ServiceConfig) -> Result<(ReleaseEngine, GuardianRegistry)> {
    config.ensure_directories()?;

    let store = Arc::new(RwLock::new(PaperStore::new(config.store_path.clone())?));
    let locks = Arc::new(PaperLocks::new());

    Ok((
        ReleaseEngine::new(store.clone(), locks.clone()),
        GuardianRegistry::new(store, locks),
    ))
}
