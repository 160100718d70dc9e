use crate::allocator::TempIdAllocator;
use crate::entity::{DetailEntity, Entity};
use crate::grouping::{self, Group};
use crate::identity::{Identity, ServerId, TempId};
use crate::row::{RemovalOutcome, Row, RowStatus};
use crate::runtime::{CommitOutcome, Committed, RowOutcome};
use crate::selection::{BulkAction, MasterState, SelectionCoordinator};
use crate::tracker::RowStateTracker;
use crate::util::errors::{Result, StagingError};
use crate::validation::{InvariantValidator, ValidationResult};
use tracing::{debug, warn};

/// One named working set of rows plus the user's selection over it.
#[derive(Debug, Clone)]
pub struct Collection<E> {
    name: String,
    rows: Vec<Row<E>>,
    selection: SelectionCoordinator,
}

impl<E: Entity> Collection<E> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            selection: SelectionCoordinator::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[Row<E>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, identity: &Identity) -> Option<&Row<E>> {
        self.rows.iter().find(|row| row.identity() == identity)
    }

    pub fn dirty(&self) -> impl Iterator<Item = &Row<E>> {
        self.rows.iter().filter(|row| row.is_dirty())
    }

    pub fn is_dirty(&self) -> bool {
        self.rows.iter().any(|row| row.is_dirty())
    }

    /// Rows in presentation order: group key, representative-first, sequence.
    pub fn ordered(&self) -> Vec<&Row<E>> {
        grouping::ordered(&self.rows)
    }

    pub fn groups(&self) -> Vec<Group<'_, E, Option<E::GroupKey>>> {
        grouping::partition_by_group(self.rows.iter().filter(|row| row.is_live()))
    }

    pub fn validate(&self, validator: &InvariantValidator) -> ValidationResult {
        validator.validate(&self.rows)
    }

    pub fn selection(&self) -> &SelectionCoordinator {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionCoordinator {
        &mut self.selection
    }

    pub fn selected_rows(&self) -> Vec<&Row<E>> {
        self.selection.current(&self.rows)
    }

    pub fn is_bulk_action_enabled(&self, action: BulkAction, master: MasterState) -> bool {
        self.selection.is_bulk_action_enabled(action, &self.rows, master)
    }

    /// Adds a NEW row. With a group key the row is placed after the last
    /// sequence number currently used in that group.
    pub fn add_row(
        &mut self,
        allocator: &mut TempIdAllocator,
        group_key: Option<E::GroupKey>,
        mut defaults: E,
    ) -> &Row<E> {
        if let Some(key) = group_key {
            let sequence = self.next_sequence(&key);
            defaults.place_in_group(key, sequence);
        }
        let row = RowStateTracker::apply_add(allocator, defaults);
        debug!(collection = %self.name, identity = %row.identity(), "row added");
        self.rows.push(row);
        let last = self.rows.len() - 1;
        &self.rows[last]
    }

    pub fn edit_row(&mut self, identity: &Identity, payload: E) -> Result<&Row<E>> {
        let index = self.index_of(identity)?;
        RowStateTracker::apply_edit(&mut self.rows[index], payload)?;
        Ok(&self.rows[index])
    }

    /// Partial edit: `change` receives a copy of the current payload.
    pub fn update_row(&mut self, identity: &Identity, change: impl FnOnce(&mut E)) -> Result<&Row<E>> {
        let index = self.index_of(identity)?;
        let mut payload = self.rows[index].payload().clone();
        change(&mut payload);
        RowStateTracker::apply_edit(&mut self.rows[index], payload)?;
        Ok(&self.rows[index])
    }

    /// Flags `identity` as its group's representative and clears the flag on
    /// every other live row of the group.
    pub fn set_representative(&mut self, identity: &Identity) -> Result<()> {
        let index = self.index_of(identity)?;
        let target = &self.rows[index];
        if !target.is_live() {
            return Err(StagingError::RowRemoved(identity.clone()));
        }
        let key = target.payload().group_key();
        let others: Vec<Identity> = self
            .rows
            .iter()
            .filter(|row| row.is_live() && row.identity() != identity)
            .filter(|row| row.payload().group_key() == key && row.payload().is_representative() == Some(true))
            .map(|row| row.identity().clone())
            .collect();

        for other in &others {
            self.update_row(other, |entity| entity.set_representative(false))?;
        }
        if self.rows[index].payload().is_representative() != Some(true) {
            self.update_row(identity, |entity| entity.set_representative(true))?;
        }
        Ok(())
    }

    /// Removes each row independently; a protected or unknown row fails on
    /// its own without blocking the others.
    pub fn remove_rows(&mut self, identities: impl IntoIterator<Item = Identity>) -> Vec<Result<RemovalOutcome>> {
        identities
            .into_iter()
            .map(|identity| {
                let index = self.index_of(&identity)?;
                let outcome = RowStateTracker::apply_remove(&mut self.rows[index])?;
                if let RemovalOutcome::LocalDiscard(_) = outcome {
                    self.rows.remove(index);
                }
                self.selection.deselect(&identity);
                debug!(collection = %self.name, %identity, ?outcome, "row removed");
                Ok(outcome)
            })
            .collect()
    }

    pub fn remove_selected(&mut self) -> Vec<Result<RemovalOutcome>> {
        let selected: Vec<Identity> = self.selection.identities().cloned().collect();
        self.remove_rows(selected)
    }

    /// Replaces the working set with authoritative rows and clears the
    /// selection.
    pub fn replace_all(&mut self, rows: Vec<(ServerId, E)>) {
        self.rows = rows.into_iter().map(|(id, payload)| Row::from_server(id, payload)).collect();
        self.selection.clear();
        debug!(collection = %self.name, rows = self.rows.len(), "working set replaced");
    }

    /// Cancels every local change without any network effect. Returns the
    /// temp ids of the NEW rows that were dropped.
    pub fn discard_changes(&mut self) -> Vec<TempId> {
        let mut discarded = Vec::new();
        self.rows.retain_mut(|row| match row.status() {
            RowStatus::New => {
                discarded.extend(row.identity().temp_id());
                false
            }
            RowStatus::Updated | RowStatus::Removed => {
                if let Some(snapshot) = row.take_snapshot() {
                    row.replace_payload(snapshot);
                }
                row.set_status(RowStatus::Clean);
                row.set_error(None);
                true
            }
            RowStatus::Clean => {
                row.set_error(None);
                true
            }
        });
        self.selection.retain_present(&self.rows);
        debug!(collection = %self.name, discarded = discarded.len(), "local changes discarded");
        discarded
    }

    /// Folds a commit outcome back into row state. Succeeded rows collapse
    /// to CLEAN (or leave, for deletes); failed and skipped rows keep their
    /// status and carry the error.
    pub fn apply_outcome(&mut self, outcome: &CommitOutcome) {
        for report in &outcome.rows {
            let Some(index) = self.rows.iter().position(|row| row.identity() == &report.identity) else {
                warn!(collection = %self.name, identity = %report.identity, "outcome for a row that left the working set");
                continue;
            };
            match &report.outcome {
                RowOutcome::Committed(Committed::Created(id)) | RowOutcome::Committed(Committed::Updated(id)) => {
                    self.rows[index].commit_as(id.clone());
                    self.selection.rebind(&report.identity, Identity::Server(id.clone()));
                }
                RowOutcome::Committed(Committed::Deleted) => {
                    self.rows.remove(index);
                    self.selection.deselect(&report.identity);
                }
                RowOutcome::Failed(error) => {
                    self.rows[index].set_error(Some(error.to_string()));
                }
                RowOutcome::SkippedDueToDependencyFailure(master) => {
                    self.rows[index].set_error(Some(format!("not saved: master row {master} was not created")));
                }
            }
        }
    }

    fn index_of(&self, identity: &Identity) -> Result<usize> {
        self.rows
            .iter()
            .position(|row| row.identity() == identity)
            .ok_or_else(|| StagingError::UnknownRow(identity.clone()))
    }

    fn next_sequence(&self, key: &E::GroupKey) -> u32 {
        self.rows
            .iter()
            .filter(|row| row.is_live() && row.payload().group_key().as_ref() == Some(key))
            .map(|row| row.payload().sequence())
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }
}

impl<E: DetailEntity> Collection<E> {
    /// Points detail rows at the server ids of masters created during the
    /// last commit. Status is untouched; this is not a user edit.
    pub fn rebind_masters(&mut self, resolutions: &[(TempId, ServerId)]) {
        for row in &mut self.rows {
            let Some(temp) = row.payload().master().temp_id() else {
                continue;
            };
            if let Some((_, server)) = resolutions.iter().find(|(resolved, _)| *resolved == temp) {
                row.payload_mut().bind_master(Identity::Server(server.clone()));
            }
        }
    }

    /// Live detail rows that reference `master`.
    pub fn rows_of(&self, master: &Identity) -> Vec<&Row<E>> {
        self.rows
            .iter()
            .filter(|row| row.is_live() && row.payload().master() == master)
            .collect()
    }
}
