use crate::collection::Collection;
use crate::config::EngineConfig;
use crate::entity::{DetailEntity, Entity};
use crate::identity::{Identity, TempId};
use crate::planner::ops::{Operation, OperationBatch};
use crate::row::RowStatus;
use crate::util::errors::{Result, StagingError};
use crate::validation::{InvariantValidator, ValidationReport, ValidationResult};
use tracing::debug;

/// Master/detail commit plan, executed stage by stage: master creates and
/// updates, then every detail operation, then master deletes.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedPlan<M, D> {
    pub master_upserts: OperationBatch<M>,
    pub detail: OperationBatch<D>,
    pub master_deletes: OperationBatch<M>,
}

impl<M, D> LinkedPlan<M, D> {
    pub fn len(&self) -> usize {
        self.master_upserts.len() + self.detail.len() + self.master_deletes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Turns the dirty subset of a working set into ordered remote operations.
/// Validation runs first; an invalid working set yields its report and no
/// operations at all.
#[derive(Debug, Clone, Default)]
pub struct CommitPlanner {
    validator: InvariantValidator,
}

impl CommitPlanner {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            validator: InvariantValidator::new(config),
        }
    }

    pub fn validator(&self) -> &InvariantValidator {
        &self.validator
    }

    pub fn plan<E: Entity>(&self, collection: &Collection<E>) -> Result<OperationBatch<E>> {
        collection.validate(&self.validator).into_result()?;
        let batch = derive_operations(collection, |_| None);
        debug!(collection = %collection.name(), ops = batch.len(), "commit planned");
        Ok(batch)
    }

    pub fn plan_linked<M: Entity, D: DetailEntity>(
        &self,
        master: &Collection<M>,
        detail: &Collection<D>,
    ) -> Result<LinkedPlan<M, D>> {
        let mut report = ValidationReport::default();
        for result in [master.validate(&self.validator), detail.validate(&self.validator)] {
            if let ValidationResult::Invalid(found) = result {
                report.merge(found);
            }
        }
        if !report.is_empty() {
            return Err(StagingError::Validation(report));
        }

        let mut master_upserts = OperationBatch::new(master.name());
        let mut master_deletes = OperationBatch::new(master.name());
        for planned in derive_operations(master, |_| None).ops {
            match planned.op {
                Operation::Delete { .. } => master_deletes.push(planned.op, None),
                _ => master_upserts.push(planned.op, None),
            }
        }
        let detail_batch = derive_operations(detail, |entity: &D| entity.master().temp_id());

        debug!(
            master = %master.name(),
            detail = %detail.name(),
            master_upserts = master_upserts.len(),
            detail_ops = detail_batch.len(),
            master_deletes = master_deletes.len(),
            "linked commit planned"
        );
        Ok(LinkedPlan {
            master_upserts,
            detail: detail_batch,
            master_deletes,
        })
    }
}

fn derive_operations<E, F>(collection: &Collection<E>, dependency: F) -> OperationBatch<E>
where
    E: Entity,
    F: Fn(&E) -> Option<TempId>,
{
    let mut batch = OperationBatch::new(collection.name());
    for row in collection.rows() {
        match (row.status(), row.identity()) {
            (RowStatus::New, Identity::Temp(temp)) => batch.push(
                Operation::Create {
                    row: *temp,
                    entity: row.payload().clone(),
                },
                dependency(row.payload()),
            ),
            (RowStatus::Updated, Identity::Server(id)) => batch.push(
                Operation::Update {
                    id: id.clone(),
                    entity: row.payload().clone(),
                },
                dependency(row.payload()),
            ),
            (RowStatus::Removed, Identity::Server(id)) => batch.push(Operation::Delete { id: id.clone() }, None),
            _ => {}
        }
    }
    batch
}
