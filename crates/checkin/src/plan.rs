//! Everything needed to pend one commit against the server

use crate::analysis::CheckinAnalysis;
use crate::config::{CheckinConfig, RenameMode};
use crate::differ::TreeDiffer;
use crate::error::CheckinError;
use crate::folder_rename::{FolderRenameDetector, FolderRenameResult};
use gtf_core::{ObjectId, Repository};
use tracing::debug;

/// Analysis of `source -> target` plus its depth-batched renames
#[derive(Debug, Clone)]
pub struct CheckinPlan {
    source: Option<ObjectId>,
    target: ObjectId,
    analysis: CheckinAnalysis,
    renames: FolderRenameResult,
}

impl CheckinPlan {
    /// Diff `from` (None for an initial import) against `to`, then collapse
    /// file renames into folder renames when the rename mode allows it
    pub fn build<R: Repository + ?Sized>(
        repo: &R,
        config: &CheckinConfig,
        from: Option<&ObjectId>,
        to: &ObjectId,
    ) -> Result<Self, CheckinError> {
        let analysis = TreeDiffer::new(repo, config).analyze(from, to)?;

        let renames = match (config.rename_mode, from) {
            (RenameMode::All, Some(from)) => FolderRenameDetector::new(repo, *from, *to, analysis.renames())
                .with_deletes(analysis.deletes())
                .compute()?,
            _ => FolderRenameResult::from_renames(analysis.renames().to_vec()),
        };

        debug!(
            "plan for {}: {} changes, {} renames in {} batches",
            to.short(),
            analysis.size(),
            renames.len(),
            renames.batches().iter().filter(|b| !b.is_empty()).count()
        );

        Ok(Self {
            source: from.copied(),
            target: *to,
            analysis,
            renames,
        })
    }

    pub fn source(&self) -> Option<&ObjectId> {
        self.source.as_ref()
    }

    pub fn target(&self) -> &ObjectId {
        &self.target
    }

    pub fn analysis(&self) -> &CheckinAnalysis {
        &self.analysis
    }

    /// Renames as they will be pended (folder renames included)
    pub fn renames(&self) -> &FolderRenameResult {
        &self.renames
    }

    /// Number of pend requests: adds, edits, deletes and pended renames
    pub fn size(&self) -> usize {
        self.analysis.adds().len()
            + self.analysis.edits().len()
            + self.analysis.deletes().len()
            + self.renames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }
}
