pub mod compile;
pub mod ops;

pub use compile::{CommitPlanner, LinkedPlan};
pub use ops::{Operation, OperationBatch, PlannedOp};
