use crate::entity::Entity;
use crate::identity::ServerId;
use crate::util::errors::RemoteError;
use async_trait::async_trait;

/// Per-entity REST collaborator. Implementations live with the host; the
/// engine only awaits these calls from the commit runtime and refetches.
#[async_trait]
pub trait RemoteCollection<E: Entity>: Send + Sync {
    async fn create(&self, entity: &E) -> Result<ServerId, RemoteError>;

    async fn update(&self, id: &ServerId, entity: &E) -> Result<(), RemoteError>;

    async fn remove(&self, id: &ServerId) -> Result<(), RemoteError>;

    /// Authoritative rows, optionally scoped to one master row.
    async fn list(&self, scope: Option<&ServerId>) -> Result<Vec<(ServerId, E)>, RemoteError>;
}
