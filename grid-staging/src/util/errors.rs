use crate::identity::{Identity, ServerId, TempId};
use crate::validation::ValidationReport;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StagingError>;

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("commit refused: {0}")]
    Validation(ValidationReport),
    #[error("row {0} is protected and cannot be removed")]
    ProtectedRow(Identity),
    #[error("row {0} is marked for deletion")]
    RowRemoved(Identity),
    #[error("row not found: {0}")]
    UnknownRow(Identity),
    #[error("no master row selected")]
    NoMasterSelected,
    #[error(transparent)]
    Allocator(#[from] AllocatorError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Internal invariant breaches of the temp id allocator. These end the
/// editing session; they are never shown to the user as recoverable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocatorError {
    #[error("temp id {0} was never issued")]
    UnknownTempId(TempId),
    #[error("temp id {temp} already resolved to {existing}")]
    AlreadyResolved { temp: TempId, existing: ServerId },
    #[error("temp id {0} is retired")]
    Retired(TempId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    Rejected,
    Conflict,
    NotFound,
    Unauthorized,
    Transport,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RemoteErrorKind::Rejected => "rejected",
            RemoteErrorKind::Conflict => "conflict",
            RemoteErrorKind::NotFound => "not found",
            RemoteErrorKind::Unauthorized => "unauthorized",
            RemoteErrorKind::Transport => "transport failure",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Rejected, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Conflict, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Transport, message)
    }

    /// Transport failures are worth retrying unchanged; the other kinds need
    /// the user to change something first.
    pub fn is_transient(&self) -> bool {
        self.kind == RemoteErrorKind::Transport
    }
}
