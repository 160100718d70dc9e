//! Commit runtime.
//!
//! Operations of one stage are dispatched through a bounded buffer, so up
//! to `max_in_flight` requests are outstanding while reports still come
//! back in plan order. Stages of a linked commit never overlap.

use crate::allocator::TempIdAllocator;
use crate::config::EngineConfig;
use crate::entity::{DetailEntity, Entity};
use crate::identity::{Identity, ServerId, TempId};
use crate::planner::{LinkedPlan, Operation, OperationBatch};
use crate::runtime::outcome::{CommitOutcome, Committed, LinkedOutcome, RowOutcome, RowReport};
use crate::runtime::remote::RemoteCollection;
use crate::util::errors::Result;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

enum Prepared<E> {
    Dispatch(Operation<E>),
    Skip { identity: Identity, master: TempId },
}

/// Executes a single-collection batch.
pub async fn execute<E, R>(
    batch: OperationBatch<E>,
    remote: &R,
    allocator: &mut TempIdAllocator,
    config: &EngineConfig,
) -> Result<CommitOutcome>
where
    E: Entity,
    R: RemoteCollection<E> + ?Sized,
{
    run_stage(batch, remote, allocator, config, |_: &mut E, _: &ServerId| {}).await
}

/// Executes a master/detail plan: master creates and updates, then detail
/// operations rebound to the master ids just created, then master deletes.
pub async fn execute_linked<M, D, RM, RD>(
    plan: LinkedPlan<M, D>,
    master_remote: &RM,
    detail_remote: &RD,
    allocator: &mut TempIdAllocator,
    config: &EngineConfig,
) -> Result<LinkedOutcome>
where
    M: Entity,
    D: DetailEntity,
    RM: RemoteCollection<M> + ?Sized,
    RD: RemoteCollection<D> + ?Sized,
{
    let no_binding = |_: &mut M, _: &ServerId| {};
    let mut master = run_stage(plan.master_upserts, master_remote, allocator, config, no_binding).await?;
    let detail = run_stage(plan.detail, detail_remote, allocator, config, |entity: &mut D, master: &ServerId| {
        entity.bind_master(Identity::Server(master.clone()))
    })
    .await?;
    let deletes = run_stage(plan.master_deletes, master_remote, allocator, config, no_binding).await?;
    master.extend(deletes);

    Ok(LinkedOutcome { master, detail })
}

async fn run_stage<E, R, B>(
    batch: OperationBatch<E>,
    remote: &R,
    allocator: &mut TempIdAllocator,
    config: &EngineConfig,
    bind: B,
) -> Result<CommitOutcome>
where
    E: Entity,
    R: RemoteCollection<E> + ?Sized,
    B: Fn(&mut E, &ServerId),
{
    let mut outcome = CommitOutcome::new(batch.collection.clone());
    if batch.is_empty() {
        return Ok(outcome);
    }
    info!(collection = %batch.collection, ops = batch.len(), kind = E::KIND, "commit stage started");

    let prepared: Vec<Prepared<E>> = batch
        .ops
        .into_iter()
        .map(|planned| {
            let Some(master) = planned.depends_on else {
                return Prepared::Dispatch(planned.op);
            };
            match allocator.resolved(master) {
                Ok(Some(server)) => {
                    let mut op = planned.op;
                    if let Operation::Create { entity, .. } | Operation::Update { entity, .. } = &mut op {
                        bind(entity, server);
                    }
                    Prepared::Dispatch(op)
                }
                _ => Prepared::Skip {
                    identity: planned.op.row(),
                    master,
                },
            }
        })
        .collect();

    let reports: Vec<RowReport> = stream::iter(prepared)
        .map(|item| async move {
            match item {
                Prepared::Dispatch(op) => dispatch(remote, op).await,
                Prepared::Skip { identity, master } => RowReport {
                    identity,
                    outcome: RowOutcome::SkippedDueToDependencyFailure(master),
                },
            }
        })
        .buffered(config.in_flight_limit())
        .collect()
        .await;

    for report in reports {
        match &report.outcome {
            RowOutcome::Committed(Committed::Created(server)) => {
                if let Identity::Temp(temp) = &report.identity {
                    allocator.resolve(*temp, server.clone())?;
                }
            }
            RowOutcome::Committed(_) => {}
            RowOutcome::Failed(error) => {
                warn!(collection = %outcome.collection, identity = %report.identity, %error, "operation failed");
            }
            RowOutcome::SkippedDueToDependencyFailure(master) => {
                warn!(collection = %outcome.collection, identity = %report.identity, %master, "operation skipped, master row was not created");
            }
        }
        outcome.rows.push(report);
    }

    info!(
        collection = %outcome.collection,
        committed = outcome.committed_count(),
        total = outcome.rows.len(),
        "commit stage finished"
    );
    Ok(outcome)
}

async fn dispatch<E, R>(remote: &R, op: Operation<E>) -> RowReport
where
    E: Entity,
    R: RemoteCollection<E> + ?Sized,
{
    let identity = op.row();
    debug!(%identity, verb = op.verb(), "dispatching");
    let result = match &op {
        Operation::Create { entity, .. } => remote.create(entity).await.map(Committed::Created),
        Operation::Update { id, entity } => remote.update(id, entity).await.map(|()| Committed::Updated(id.clone())),
        Operation::Delete { id } => remote.remove(id).await.map(|()| Committed::Deleted),
    };
    let outcome = match result {
        Ok(committed) => RowOutcome::Committed(committed),
        Err(error) => RowOutcome::Failed(error),
    };
    RowReport { identity, outcome }
}
