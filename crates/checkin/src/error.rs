//! Checkin failures

use gtf_core::ObjectError;
use std::path::PathBuf;
use thiserror::Error;

/// Terminal failure of an analysis or of applying its result
///
/// Analysis never returns partial output: any of these aborts the whole pass.
#[derive(Debug, Error)]
pub enum CheckinError {
    /// Two target paths differ only in letter case; the server would see one item
    #[error("paths '{first}' and '{second}' differ only by case and cannot both be checked in")]
    CaseCollision { first: String, second: String },

    #[error(transparent)]
    Object(#[from] ObjectError),

    /// The workspace pended fewer items than requested
    #[error("failed to pend {operation}: {pended} of {requested} changes were pended")]
    PendFailed {
        operation: &'static str,
        requested: usize,
        pended: usize,
    },

    #[error("failed to extract {}: {source}", path.display())]
    Extraction {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The workspace service itself failed
    #[error("workspace error: {0}")]
    Workspace(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
