use crate::allocator::TempIdAllocator;
use crate::collection::Collection;
use crate::config::EngineConfig;
use crate::controller::{release, release_discarded};
use crate::entity::Entity;
use crate::identity::{Identity, ServerId};
use crate::planner::CommitPlanner;
use crate::row::RemovalOutcome;
use crate::runtime::{execute, CommitOutcome, RemoteCollection};
use crate::selection::SelectionCoordinator;
use crate::util::errors::Result;
use crate::validation::ValidationResult;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Edit/commit cycle for a single collection without a detail side.
pub struct EditSession<E, R> {
    id: Uuid,
    collection: Collection<E>,
    allocator: TempIdAllocator,
    planner: CommitPlanner,
    config: EngineConfig,
    remote: R,
    scope: Option<ServerId>,
}

impl<E, R> EditSession<E, R>
where
    E: Entity,
    R: RemoteCollection<E>,
{
    pub fn new(name: impl Into<String>, remote: R, config: EngineConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            collection: Collection::new(name),
            allocator: TempIdAllocator::new(),
            planner: CommitPlanner::new(&config),
            config,
            remote,
            scope: None,
        }
    }

    /// Restricts `load` and post-commit refetches to rows of one master.
    pub fn scoped_to(mut self, scope: ServerId) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn collection(&self) -> &Collection<E> {
        &self.collection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionCoordinator {
        self.collection.selection_mut()
    }

    pub fn allocator(&self) -> &TempIdAllocator {
        &self.allocator
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn has_pending_changes(&self) -> bool {
        self.collection.is_dirty()
    }

    pub async fn load(&mut self) -> Result<()> {
        let rows = self.remote.list(self.scope.as_ref()).await?;
        self.collection.replace_all(rows);
        self.allocator.retire_all();
        info!(session = %self.id, collection = %self.collection.name(), rows = self.collection.len(), "loaded");
        Ok(())
    }

    pub fn add_row(&mut self, group_key: Option<E::GroupKey>, defaults: E) -> Identity {
        self.collection.add_row(&mut self.allocator, group_key, defaults).identity().clone()
    }

    pub fn edit(&mut self, identity: &Identity, payload: E) -> Result<()> {
        self.collection.edit_row(identity, payload).map(|_| ())
    }

    pub fn update(&mut self, identity: &Identity, change: impl FnOnce(&mut E)) -> Result<()> {
        self.collection.update_row(identity, change).map(|_| ())
    }

    pub fn set_representative(&mut self, identity: &Identity) -> Result<()> {
        self.collection.set_representative(identity)
    }

    pub fn remove(&mut self, identities: impl IntoIterator<Item = Identity>) -> Vec<Result<RemovalOutcome>> {
        let outcomes = self.collection.remove_rows(identities);
        release_discarded(&mut self.allocator, &outcomes);
        outcomes
    }

    pub fn remove_selected(&mut self) -> Vec<Result<RemovalOutcome>> {
        let outcomes = self.collection.remove_selected();
        release_discarded(&mut self.allocator, &outcomes);
        outcomes
    }

    pub fn validate(&self) -> ValidationResult {
        self.collection.validate(self.planner.validator())
    }

    /// Validates, plans and executes every pending change.
    ///
    /// A fully successful commit reloads the working set from the remote.
    /// Otherwise the outcome is folded into the rows that are already there:
    /// committed rows turn clean, failed rows keep their status and error.
    pub async fn commit(&mut self) -> Result<CommitOutcome> {
        let batch = self.planner.plan(&self.collection)?;
        if batch.is_empty() {
            debug!(session = %self.id, "nothing to commit");
            return Ok(CommitOutcome::new(self.collection.name()));
        }
        info!(session = %self.id, collection = %self.collection.name(), ops = batch.len(), "committing");

        let outcome = execute(batch, &self.remote, &mut self.allocator, &self.config).await?;
        self.collection.apply_outcome(&outcome);

        if outcome.is_success() {
            self.allocator.retire_all();
            match self.remote.list(self.scope.as_ref()).await {
                Ok(rows) => self.collection.replace_all(rows),
                Err(error) => {
                    warn!(session = %self.id, %error, "refetch after commit failed, keeping reconciled rows");
                    self.collection.selection_mut().clear();
                }
            }
        } else {
            self.allocator.retire_resolved();
            warn!(
                session = %self.id,
                failed = outcome.rows.len() - outcome.committed_count(),
                "commit finished with failures"
            );
        }
        Ok(outcome)
    }

    /// Drops every local change with no network effect.
    pub fn cancel(&mut self) {
        let discarded = self.collection.discard_changes();
        release(&mut self.allocator, discarded);
        debug!(session = %self.id, "edits cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::RowStatus;
    use crate::testing::InMemoryRemote;
    use crate::tests::fixtures::Item;
    use crate::util::errors::StagingError;

    async fn session_with(rows: Vec<(&str, Item)>) -> EditSession<Item, InMemoryRemote<Item>> {
        let remote = InMemoryRemote::<Item>::new("S");
        remote.seed(rows.into_iter().map(|(id, item)| (ServerId::new(id), item)).collect());
        let mut session = EditSession::new("items", remote, EngineConfig::default());
        session.load().await.unwrap();
        session
    }

    #[tokio::test]
    async fn successful_commit_reloads_clean_rows() {
        let mut session = session_with(vec![("S0", Item::new("G1", "A", true, 1))]).await;
        session.add_row(Some("G2".into()), Item::new("", "B", true, 0));

        let outcome = session.commit().await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(session.collection().len(), 2);
        assert!(session.collection().rows().iter().all(|row| row.status() == RowStatus::Clean));
        assert_eq!(session.allocator().pending_count(), 0);
    }

    #[tokio::test]
    async fn failed_refetch_keeps_reconciled_rows() {
        let remote = InMemoryRemote::<Item>::new("S").failing_list();
        let mut session = EditSession::new("items", remote, EngineConfig::default());
        let temp = session.add_row(Some("G1".into()), Item::new("", "A", true, 0));

        let outcome = session.commit().await.unwrap();
        assert!(outcome.is_success());
        assert!(session.collection().get(&temp).is_none());
        let row = session.collection().get(&Identity::Server(ServerId::new("S1"))).unwrap();
        assert_eq!(row.status(), RowStatus::Clean);
    }

    #[tokio::test]
    async fn invalid_rows_never_reach_the_remote() {
        let mut session = session_with(vec![("S0", Item::new("G1", "A", true, 1))]).await;
        session.add_row(Some("G1".into()), Item::new("", "B", true, 0));
        session.remote().clear_calls();

        let err = session.commit().await.unwrap_err();
        assert!(matches!(err, StagingError::Validation(_)));
        assert!(session.remote().calls().is_empty());
    }

    #[tokio::test]
    async fn cancel_restores_the_loaded_state() {
        let mut session = session_with(vec![("S0", Item::new("G1", "A", true, 1))]).await;
        let s0 = Identity::Server(ServerId::new("S0"));
        session.update(&s0, |item| item.name = "changed".into()).unwrap();
        session.add_row(Some("G2".into()), Item::new("", "B", true, 0));

        session.cancel();
        assert!(!session.has_pending_changes());
        assert_eq!(session.collection().len(), 1);
        assert_eq!(session.allocator().pending_count(), 0);
        assert_eq!(session.collection().get(&s0).unwrap().payload().name, "A name");
    }

    #[tokio::test]
    async fn failed_update_keeps_its_status_and_error() {
        let remote = InMemoryRemote::<Item>::new("S").fail_update_of("S0");
        remote.seed(vec![(ServerId::new("S0"), Item::new("G1", "A", true, 1))]);
        let mut session = EditSession::new("items", remote, EngineConfig::default());
        session.load().await.unwrap();
        let s0 = Identity::Server(ServerId::new("S0"));
        session.update(&s0, |item| item.name = "changed".into()).unwrap();

        let outcome = session.commit().await.unwrap();
        assert!(!outcome.is_success());
        let row = session.collection().get(&s0).unwrap();
        assert_eq!(row.status(), RowStatus::Updated);
        assert!(row.error().unwrap().contains("conflict"));
    }

    #[tokio::test]
    async fn removing_a_selected_new_row_releases_its_temp_id() {
        let mut session = session_with(vec![("S0", Item::new("G1", "A", true, 1))]).await;
        let temp = session.add_row(Some("G1".into()), Item::new("", "B", false, 0));
        assert_eq!(session.allocator().pending_count(), 1);

        session.selection_mut().select([temp.clone()]);
        let outcomes = session.remove_selected();
        assert!(matches!(outcomes.as_slice(), [Ok(RemovalOutcome::LocalDiscard(_))]));
        assert!(session.collection().get(&temp).is_none());
        assert_eq!(session.allocator().pending_count(), 0);
    }
}
