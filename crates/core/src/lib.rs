//! gtf core - object identities and tree snapshots shared by the checkin engine
//!
//! This crate provides the foundational storage layer:
//! - SHA-1 object ids (Git-compatible)
//! - Flattened tree snapshots and tree diffing
//! - Content-addressed object store (in memory or on disk)
//! - The `Repository` trait the checkin analysis reads trees through

pub mod error;
pub mod hash;
pub mod repository;
pub mod store;
pub mod tree;

// Re-export main types for convenience
pub use error::ObjectError;
pub use hash::{hash_blob, ObjectId};
pub use repository::Repository;
pub use store::Store;
pub use tree::{Entry, EntryKind, Tree, TreeDiff};

/// Common result type used throughout gtf-core
pub type Result<T> = std::result::Result<T, ObjectError>;
