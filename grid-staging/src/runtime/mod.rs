pub mod executor;
pub mod outcome;
pub mod remote;

pub use executor::{execute, execute_linked};
pub use outcome::{CommitOutcome, Committed, LinkedOutcome, RowOutcome, RowReport};
pub use remote::RemoteCollection;
