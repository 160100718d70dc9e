use crate::identity::{Identity, ServerId, TempId};
use crate::util::errors::RemoteError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Committed {
    Created(ServerId),
    Updated(ServerId),
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Committed(Committed),
    /// Attempted and rejected by the remote.
    Failed(RemoteError),
    /// Never attempted: the master row it references was not created.
    SkippedDueToDependencyFailure(TempId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowReport {
    pub identity: Identity,
    pub outcome: RowOutcome,
}

/// Per-row result of executing one batch. Rows are atomic individually,
/// never as a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub collection: String,
    pub rows: Vec<RowReport>,
}

impl CommitOutcome {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            rows: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.rows.iter().all(|report| matches!(report.outcome, RowOutcome::Committed(_)))
    }

    pub fn committed_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|report| matches!(report.outcome, RowOutcome::Committed(_)))
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = (&Identity, &RemoteError)> {
        self.rows.iter().filter_map(|report| match &report.outcome {
            RowOutcome::Failed(error) => Some((&report.identity, error)),
            _ => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &Identity> {
        self.rows.iter().filter_map(|report| match report.outcome {
            RowOutcome::SkippedDueToDependencyFailure(_) => Some(&report.identity),
            _ => None,
        })
    }

    pub fn outcome_of(&self, identity: &Identity) -> Option<&RowOutcome> {
        self.rows
            .iter()
            .find(|report| &report.identity == identity)
            .map(|report| &report.outcome)
    }

    pub(crate) fn extend(&mut self, other: CommitOutcome) {
        self.rows.extend(other.rows);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedOutcome {
    pub master: CommitOutcome,
    pub detail: CommitOutcome,
}

impl LinkedOutcome {
    pub fn is_success(&self) -> bool {
        self.master.is_success() && self.detail.is_success()
    }

    pub fn len(&self) -> usize {
        self.master.rows.len() + self.detail.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.master.committed_count() - self.detail.committed_count()
    }
}
