//! Object store failures

use crate::hash::ObjectId;
use thiserror::Error;

/// Errors raised while reading trees and blobs.
///
/// None of these are retried by the analysis; they abort it.
#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("object {0} not found")]
    Missing(ObjectId),

    #[error("object {id} is corrupt: {reason}")]
    Corrupt { id: ObjectId, reason: String },

    #[error("object {id} is not a {expected}")]
    IncorrectType { id: ObjectId, expected: &'static str },

    #[error("path of {len} bytes is too long for a tree entry")]
    PathTooLong { len: usize },

    #[error("object store I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("object database error: {0}")]
    Backend(String),
}
