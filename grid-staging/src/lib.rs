//! Staged tabular edit engine.
//!
//! Rows are added, edited and removed locally, grouped and validated on
//! demand, and later committed as an ordered batch of remote operations.
//! A master collection may declare a detail collection that depends on it;
//! detail operations never reach the remote before the master rows they
//! reference exist there.

pub mod allocator;
pub mod collection;
pub mod config;
pub mod controller;
pub mod entity;
pub mod grouping;
pub mod identity;
pub mod planner;
pub mod row;
pub mod runtime;
pub mod selection;
pub mod tracker;
pub mod util;
pub mod validation;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(test)]
mod tests;

pub use allocator::TempIdAllocator;
pub use collection::Collection;
pub use config::EngineConfig;
pub use controller::{EditSession, MasterDetailController};
pub use entity::{DetailEntity, Entity};
pub use identity::{Identity, ServerId, TempId};
pub use planner::{CommitPlanner, LinkedPlan, Operation, OperationBatch, PlannedOp};
pub use row::{RemovalOutcome, Row, RowStatus};
pub use runtime::{
    execute, execute_linked, CommitOutcome, Committed, LinkedOutcome, RemoteCollection, RowOutcome,
    RowReport,
};
pub use selection::{BulkAction, MasterState, SelectionCoordinator};
pub use tracker::RowStateTracker;
pub use util::errors::{AllocatorError, RemoteError, RemoteErrorKind, Result, StagingError};
pub use validation::{InvariantValidator, ValidationReport, ValidationResult, Violation, ViolationKind};
