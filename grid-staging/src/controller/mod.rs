pub mod master_detail;
pub mod session;

pub use master_detail::MasterDetailController;
pub use session::EditSession;

use crate::allocator::TempIdAllocator;
use crate::identity::TempId;
use crate::row::RemovalOutcome;
use crate::util::errors::Result;
use tracing::warn;

/// Returns the temp ids of locally discarded rows to the allocator.
pub(crate) fn release_discarded(allocator: &mut TempIdAllocator, outcomes: &[Result<RemovalOutcome>]) {
    for outcome in outcomes {
        if let Ok(RemovalOutcome::LocalDiscard(temp)) = outcome {
            release(allocator, [*temp]);
        }
    }
}

pub(crate) fn release(allocator: &mut TempIdAllocator, temps: impl IntoIterator<Item = TempId>) {
    for temp in temps {
        if let Err(error) = allocator.release(temp) {
            warn!(%temp, %error, "temp id could not be released");
        }
    }
}
