use crate::identity::{Identity, ServerId, TempId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowStatus {
    Clean,
    New,
    Updated,
    Removed,
}

impl RowStatus {
    pub fn is_dirty(self) -> bool {
        self != RowStatus::Clean
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The row was never persisted and simply left the working set.
    LocalDiscard(TempId),
    /// The row will be deleted remotely on the next commit.
    MarkedForDeletion(ServerId),
}

/// A payload plus the engine-owned lifecycle metadata.
///
/// Fields are private: status transitions go through
/// [`RowStateTracker`](crate::tracker::RowStateTracker) and commit
/// reconciliation, never through rendering code.
#[derive(Debug, Clone)]
pub struct Row<E> {
    identity: Identity,
    status: RowStatus,
    payload: E,
    // Last clean payload, kept while the row is Updated or Removed.
    snapshot: Option<E>,
    error: Option<String>,
}

impl<E> Row<E> {
    pub fn from_server(id: ServerId, payload: E) -> Self {
        Self {
            identity: Identity::Server(id),
            status: RowStatus::Clean,
            payload,
            snapshot: None,
            error: None,
        }
    }

    pub(crate) fn new_local(temp: TempId, payload: E) -> Self {
        Self {
            identity: Identity::Temp(temp),
            status: RowStatus::New,
            payload,
            snapshot: None,
            error: None,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn status(&self) -> RowStatus {
        self.status
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    /// Error attached by the last commit attempt, if it failed for this row.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.status.is_dirty()
    }

    pub fn is_live(&self) -> bool {
        self.status != RowStatus::Removed
    }

    pub(crate) fn set_status(&mut self, status: RowStatus) {
        self.status = status;
    }

    pub(crate) fn payload_mut(&mut self) -> &mut E {
        &mut self.payload
    }

    pub(crate) fn replace_payload(&mut self, payload: E) -> E {
        std::mem::replace(&mut self.payload, payload)
    }

    pub(crate) fn snapshot(&self) -> Option<&E> {
        self.snapshot.as_ref()
    }

    pub(crate) fn set_snapshot(&mut self, snapshot: Option<E>) {
        self.snapshot = snapshot;
    }

    pub(crate) fn take_snapshot(&mut self) -> Option<E> {
        self.snapshot.take()
    }

    pub(crate) fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    /// Collapses the row to CLEAN under a server identity.
    pub(crate) fn commit_as(&mut self, id: ServerId) {
        self.identity = Identity::Server(id);
        self.status = RowStatus::Clean;
        self.snapshot = None;
        self.error = None;
    }
}
