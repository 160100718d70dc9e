use crate::entity::Entity;
use crate::identity::Identity;
use crate::row::{Row, RowStatus};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Delete,
    Assign,
}

/// Persistence state of the master row a detail action would attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterState {
    NoneSelected,
    Unsaved,
    Persisted,
}

impl MasterState {
    pub fn of<M>(master: Option<&Row<M>>) -> Self {
        match master {
            None => MasterState::NoneSelected,
            Some(row) if row.identity().is_temp() || row.status() == RowStatus::Removed => {
                MasterState::Unsaved
            }
            Some(_) => MasterState::Persisted,
        }
    }
}

/// The user's row selection, keyed by identity so it survives sorting,
/// filtering and regrouping.
#[derive(Debug, Clone, Default)]
pub struct SelectionCoordinator {
    selected: BTreeSet<Identity>,
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the selection.
    pub fn select(&mut self, identities: impl IntoIterator<Item = Identity>) {
        self.selected = identities.into_iter().collect();
    }

    pub fn toggle(&mut self, identity: Identity) {
        if !self.selected.remove(&identity) {
            self.selected.insert(identity);
        }
    }

    pub fn deselect(&mut self, identity: &Identity) {
        self.selected.remove(identity);
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, identity: &Identity) -> bool {
        self.selected.contains(identity)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.selected.iter()
    }

    /// Selected rows that still exist, in working-set order.
    pub fn current<'a, E>(&self, rows: &'a [Row<E>]) -> Vec<&'a Row<E>> {
        rows.iter().filter(|row| self.selected.contains(row.identity())).collect()
    }

    /// Drops identities that no longer exist in `rows`.
    pub fn retain_present<E>(&mut self, rows: &[Row<E>]) {
        self.selected.retain(|identity| rows.iter().any(|row| row.identity() == identity));
    }

    /// Follows a row whose identity changed during commit reconciliation.
    pub fn rebind(&mut self, from: &Identity, to: Identity) {
        if self.selected.remove(from) {
            self.selected.insert(to);
        }
    }

    pub fn is_bulk_action_enabled<E: Entity>(&self, action: BulkAction, rows: &[Row<E>], master: MasterState) -> bool {
        match action {
            BulkAction::Delete => {
                let current = self.current(rows);
                !current.is_empty() && current.iter().all(|row| !row.payload().is_protected())
            }
            BulkAction::Assign => master == MasterState::Persisted,
        }
    }
}
