use crate::allocator::TempIdAllocator;
use crate::entity::Entity;
use crate::row::{RemovalOutcome, Row, RowStatus};
use crate::util::errors::{Result, StagingError};
use crate::identity::Identity;

/// Reducer for single-row lifecycle transitions.
///
/// CLEAN -> UPDATED on edit, NEW stays NEW, anything -> REMOVED on removal
/// (or out of the working set entirely for unsaved rows). Never touches the
/// network.
pub struct RowStateTracker;

impl RowStateTracker {
    pub fn apply_edit<E: Entity>(row: &mut Row<E>, payload: E) -> Result<()> {
        match row.status() {
            RowStatus::Removed => return Err(StagingError::RowRemoved(row.identity().clone())),
            RowStatus::Clean => {
                let previous = row.replace_payload(payload);
                row.set_snapshot(Some(previous));
                row.set_status(RowStatus::Updated);
            }
            RowStatus::New | RowStatus::Updated => {
                row.replace_payload(payload);
            }
        }
        row.set_error(None);
        Ok(())
    }

    pub fn apply_add<E: Entity>(allocator: &mut TempIdAllocator, defaults: E) -> Row<E> {
        Row::new_local(allocator.allocate(), defaults)
    }

    /// Decides what removing `row` means and marks it when it stays in the
    /// working set. A `LocalDiscard` row must be dropped by the caller.
    pub fn apply_remove<E: Entity>(row: &mut Row<E>) -> Result<RemovalOutcome> {
        if row.payload().is_protected() {
            return Err(StagingError::ProtectedRow(row.identity().clone()));
        }
        match row.identity() {
            Identity::Temp(temp) => Ok(RemovalOutcome::LocalDiscard(*temp)),
            Identity::Server(id) => {
                let id = id.clone();
                if row.status() == RowStatus::Clean {
                    row.set_snapshot(Some(row.payload().clone()));
                }
                row.set_status(RowStatus::Removed);
                row.set_error(None);
                Ok(RemovalOutcome::MarkedForDeletion(id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ServerId;
    use crate::tests::fixtures::Item;

    #[test]
    fn edit_moves_clean_to_updated_and_keeps_new() {
        let mut allocator = TempIdAllocator::new();
        let mut clean = Row::from_server(ServerId::new("S1"), Item::new("G1", "A", false, 1));
        let mut fresh = RowStateTracker::apply_add(&mut allocator, Item::new("G1", "B", false, 2));

        RowStateTracker::apply_edit(&mut clean, Item::new("G1", "A2", false, 1)).unwrap();
        RowStateTracker::apply_edit(&mut fresh, Item::new("G1", "B2", false, 2)).unwrap();
        RowStateTracker::apply_edit(&mut clean, Item::new("G1", "A3", false, 1)).unwrap();

        assert_eq!(clean.status(), RowStatus::Updated);
        assert_eq!(clean.payload().code, "A3");
        assert_eq!(clean.snapshot().map(|item| item.code.as_str()), Some("A"));
        assert_eq!(fresh.status(), RowStatus::New);
        assert_eq!(fresh.payload().code, "B2");
    }

    #[test]
    fn removal_outcome_depends_on_identity() {
        let mut allocator = TempIdAllocator::new();
        let mut fresh = RowStateTracker::apply_add(&mut allocator, Item::new("G1", "N", false, 1));
        let mut stored = Row::from_server(ServerId::new("S4"), Item::new("G1", "S", false, 2));

        let temp = fresh.identity().temp_id().unwrap();
        assert_eq!(
            RowStateTracker::apply_remove(&mut fresh).unwrap(),
            RemovalOutcome::LocalDiscard(temp)
        );
        assert_eq!(
            RowStateTracker::apply_remove(&mut stored).unwrap(),
            RemovalOutcome::MarkedForDeletion(ServerId::new("S4"))
        );
        assert_eq!(stored.status(), RowStatus::Removed);
    }

    #[test]
    fn protected_rows_reject_removal() {
        let mut stored = Row::from_server(
            ServerId::new("S1"),
            Item::new("G1", "SYS", true, 1).protected(),
        );

        let err = RowStateTracker::apply_remove(&mut stored).unwrap_err();
        assert!(matches!(err, StagingError::ProtectedRow(_)));
        assert_eq!(stored.status(), RowStatus::Clean);
    }

    #[test]
    fn removed_rows_reject_edits() {
        let mut stored = Row::from_server(ServerId::new("S1"), Item::new("G1", "A", false, 1));
        RowStateTracker::apply_remove(&mut stored).unwrap();

        let err = RowStateTracker::apply_edit(&mut stored, Item::new("G1", "B", false, 1)).unwrap_err();
        assert!(matches!(err, StagingError::RowRemoved(_)));
    }
}
