//! gtf checkin - turns the difference between two Git trees into pending
//! server changes
//!
//! - Slash-path helpers and the pending change model
//! - Tree differencing with similarity-based rename detection
//! - Implicit folder-delete inference
//! - Folder rename detection with depth batching
//! - Ordered application of a plan to a server workspace

pub mod analysis;
pub mod change;
pub mod config;
pub mod differ;
pub mod error;
pub mod folder_rename;
pub mod path;
pub mod pend;
pub mod plan;
pub mod similarity;

pub use analysis::CheckinAnalysis;
pub use change::{AddChange, Change, DeleteChange, EditChange, HasPath, ItemKind, RenameChange};
pub use config::{CheckinConfig, RenameMode};
pub use differ::TreeDiffer;
pub use error::CheckinError;
pub use folder_rename::{FolderRenameDetector, FolderRenameResult};
pub use pend::{PendSpec, PendSummary, PendingChangeOrchestrator, Workspace};
pub use plan::CheckinPlan;

pub type Result<T> = std::result::Result<T, CheckinError>;
