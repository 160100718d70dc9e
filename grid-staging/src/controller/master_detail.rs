//! Master/detail orchestration.
//!
//! The detail collection only ever holds the rows of the currently selected
//! master. Changing the selection abandons pending detail edits and reloads
//! the detail side scoped to the new master; a successful commit reloads
//! both sides from the remote.

use crate::allocator::TempIdAllocator;
use crate::collection::Collection;
use crate::config::EngineConfig;
use crate::controller::{release, release_discarded};
use crate::entity::{DetailEntity, Entity};
use crate::identity::Identity;
use crate::planner::CommitPlanner;
use crate::row::RemovalOutcome;
use crate::runtime::{execute_linked, CommitOutcome, LinkedOutcome, RemoteCollection};
use crate::selection::{BulkAction, MasterState, SelectionCoordinator};
use crate::util::errors::{Result, StagingError};
use crate::validation::{ValidationReport, ValidationResult};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct MasterDetailController<M, D, RM, RD> {
    id: Uuid,
    master: Collection<M>,
    detail: Collection<D>,
    selected_master: Option<Identity>,
    allocator: TempIdAllocator,
    planner: CommitPlanner,
    config: EngineConfig,
    master_remote: RM,
    detail_remote: RD,
}

impl<M, D, RM, RD> MasterDetailController<M, D, RM, RD>
where
    M: Entity,
    D: DetailEntity,
    RM: RemoteCollection<M>,
    RD: RemoteCollection<D>,
{
    pub fn new(
        master_name: impl Into<String>,
        detail_name: impl Into<String>,
        master_remote: RM,
        detail_remote: RD,
        config: EngineConfig,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            master: Collection::new(master_name),
            detail: Collection::new(detail_name),
            selected_master: None,
            allocator: TempIdAllocator::new(),
            planner: CommitPlanner::new(&config),
            config,
            master_remote,
            detail_remote,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn master(&self) -> &Collection<M> {
        &self.master
    }

    pub fn master_selection_mut(&mut self) -> &mut SelectionCoordinator {
        self.master.selection_mut()
    }

    pub fn edit_master(&mut self, identity: &Identity, payload: M) -> Result<()> {
        self.master.edit_row(identity, payload).map(|_| ())
    }

    pub fn detail(&self) -> &Collection<D> {
        &self.detail
    }

    pub fn detail_selection_mut(&mut self) -> &mut SelectionCoordinator {
        self.detail.selection_mut()
    }

    pub fn edit_detail(&mut self, identity: &Identity, payload: D) -> Result<()> {
        self.detail.edit_row(identity, payload).map(|_| ())
    }

    pub fn allocator(&self) -> &TempIdAllocator {
        &self.allocator
    }

    pub fn master_remote(&self) -> &RM {
        &self.master_remote
    }

    pub fn detail_remote(&self) -> &RD {
        &self.detail_remote
    }

    pub fn selected_master(&self) -> Option<&Identity> {
        self.selected_master.as_ref()
    }

    pub fn master_state(&self) -> MasterState {
        MasterState::of(self.selected_master.as_ref().and_then(|id| self.master.get(id)))
    }

    pub fn has_pending_changes(&self) -> bool {
        self.master.is_dirty() || self.detail.is_dirty()
    }

    /// Bulk action gate for the detail grid; `Assign` needs a saved master.
    pub fn is_detail_action_enabled(&self, action: BulkAction) -> bool {
        self.detail.is_bulk_action_enabled(action, self.master_state())
    }

    pub fn is_master_action_enabled(&self, action: BulkAction) -> bool {
        self.master.is_bulk_action_enabled(action, MasterState::NoneSelected)
    }

    /// Loads the master side and clears any detail state.
    pub async fn load(&mut self) -> Result<()> {
        let rows = self.master_remote.list(None).await?;
        self.master.replace_all(rows);
        self.detail.replace_all(Vec::new());
        self.selected_master = None;
        self.allocator.retire_all();
        info!(session = %self.id, master = %self.master.name(), rows = self.master.len(), "master loaded");
        Ok(())
    }

    /// Switches the detail side to `master`. Pending detail edits of the
    /// previous master are discarded. An unsaved master starts with an
    /// empty detail set, and so does a master whose detail fetch fails.
    pub async fn on_master_selected(&mut self, master: Option<Identity>) -> Result<()> {
        if master == self.selected_master {
            return Ok(());
        }
        if let Some(identity) = &master {
            if self.master.get(identity).is_none() {
                return Err(StagingError::UnknownRow(identity.clone()));
            }
        }

        let abandoned = self.detail.dirty().count();
        if abandoned > 0 {
            warn!(
                session = %self.id,
                previous = ?self.selected_master,
                abandoned,
                "unsaved detail edits abandoned on master change"
            );
        }
        self.discard_detail();
        self.detail.replace_all(Vec::new());
        self.selected_master = master;

        if let Some(Identity::Server(id)) = self.selected_master.clone() {
            let rows = self.detail_remote.list(Some(&id)).await?;
            debug!(session = %self.id, master = %id, rows = rows.len(), "detail loaded");
            self.detail.replace_all(rows);
        }
        Ok(())
    }

    pub fn add_master_row(&mut self, group_key: Option<M::GroupKey>, defaults: M) -> Identity {
        self.master.add_row(&mut self.allocator, group_key, defaults).identity().clone()
    }

    /// Adds a detail row bound to the selected master, saved or not.
    pub fn add_detail_row(&mut self, mut defaults: D) -> Result<Identity> {
        let master = self.selected_master.clone().ok_or(StagingError::NoMasterSelected)?;
        match self.master.get(&master) {
            Some(row) if !row.is_live() => return Err(StagingError::RowRemoved(master)),
            None => return Err(StagingError::UnknownRow(master)),
            Some(_) => {}
        }
        defaults.bind_master(master);
        let group_key = defaults.group_key();
        Ok(self.detail.add_row(&mut self.allocator, group_key, defaults).identity().clone())
    }

    pub fn remove_master_rows(&mut self, identities: impl IntoIterator<Item = Identity>) -> Vec<Result<RemovalOutcome>> {
        let outcomes = self.master.remove_rows(identities);
        release_discarded(&mut self.allocator, &outcomes);

        let selected_gone = self
            .selected_master
            .as_ref()
            .is_some_and(|selected| self.master.get(selected).is_none());
        if selected_gone {
            self.discard_detail();
            self.detail.replace_all(Vec::new());
            self.selected_master = None;
        }
        outcomes
    }

    pub fn remove_detail_rows(&mut self, identities: impl IntoIterator<Item = Identity>) -> Vec<Result<RemovalOutcome>> {
        let outcomes = self.detail.remove_rows(identities);
        release_discarded(&mut self.allocator, &outcomes);
        outcomes
    }

    pub fn validate(&self) -> ValidationResult {
        let mut report = ValidationReport::default();
        for result in [
            self.master.validate(self.planner.validator()),
            self.detail.validate(self.planner.validator()),
        ] {
            if let ValidationResult::Invalid(found) = result {
                report.merge(found);
            }
        }
        report.into()
    }

    /// Commits both sides. Detail rows referencing a master created in the
    /// same commit are sent once that master has its server id.
    pub async fn commit(&mut self) -> Result<LinkedOutcome> {
        let plan = self.planner.plan_linked(&self.master, &self.detail)?;
        if plan.is_empty() {
            debug!(session = %self.id, "nothing to commit");
            return Ok(LinkedOutcome {
                master: CommitOutcome::new(self.master.name()),
                detail: CommitOutcome::new(self.detail.name()),
            });
        }
        info!(session = %self.id, ops = plan.len(), "committing master and detail");

        let outcome = execute_linked(
            plan,
            &self.master_remote,
            &self.detail_remote,
            &mut self.allocator,
            &self.config,
        )
        .await?;
        self.reconcile(&outcome);

        if outcome.is_success() {
            if let Err(error) = self.on_commit_succeeded().await {
                warn!(session = %self.id, %error, "refetch after commit failed, keeping reconciled rows");
            }
        } else {
            self.allocator.retire_resolved();
            warn!(session = %self.id, failed = outcome.failure_count(), "commit finished with failures");
        }
        Ok(outcome)
    }

    /// Refetches both collections from the remote and retires every temp
    /// id. The selected master survives if it still exists. If its detail
    /// fetch fails the reconciled detail rows stay in place.
    pub async fn on_commit_succeeded(&mut self) -> Result<()> {
        self.allocator.retire_all();
        self.master.selection_mut().clear();
        self.detail.selection_mut().clear();

        let rows = self.master_remote.list(None).await?;
        self.master.replace_all(rows);

        let master = &self.master;
        self.selected_master = self.selected_master.take().filter(|id| master.get(id).is_some());
        match self.selected_master.clone() {
            Some(Identity::Server(id)) => {
                let rows = self.detail_remote.list(Some(&id)).await?;
                self.detail.replace_all(rows);
            }
            _ => self.detail.replace_all(Vec::new()),
        }
        info!(session = %self.id, master = self.master.len(), detail = self.detail.len(), "refetched after commit");
        Ok(())
    }

    /// Drops every local change on both sides with no network effect.
    pub fn cancel(&mut self) {
        let discarded = self.master.discard_changes();
        release(&mut self.allocator, discarded);
        self.discard_detail();

        let selected_gone = self
            .selected_master
            .as_ref()
            .is_some_and(|selected| self.master.get(selected).is_none());
        if selected_gone {
            self.detail.replace_all(Vec::new());
            self.selected_master = None;
        }
        debug!(session = %self.id, "edits cancelled");
    }

    fn discard_detail(&mut self) {
        let discarded = self.detail.discard_changes();
        release(&mut self.allocator, discarded);
    }

    fn reconcile(&mut self, outcome: &LinkedOutcome) {
        self.master.apply_outcome(&outcome.master);
        let resolutions = self.allocator.resolutions();
        self.detail.rebind_masters(&resolutions);
        self.detail.apply_outcome(&outcome.detail);

        if let Some(Identity::Temp(temp)) = self.selected_master {
            if let Some((_, server)) = resolutions.iter().find(|(resolved, _)| *resolved == temp) {
                self.selected_master = Some(Identity::Server(server.clone()));
            }
        }
    }
}
