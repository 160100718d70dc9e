//! In-memory remote collection for tests.
//!
//! Server ids are `{prefix}{n}` with `n` counting from 1 per instance. Every
//! call is appended to a call log that several fakes can share, so tests can
//! assert cross-collection ordering.

use crate::entity::Entity;
use crate::identity::ServerId;
use crate::runtime::RemoteCollection;
use crate::util::errors::{RemoteError, RemoteErrorKind};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Predicate<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;
type ScopeFn<E> = Box<dyn Fn(&E) -> Option<ServerId> + Send + Sync>;

struct Store<E> {
    issued: u64,
    rows: Vec<(ServerId, E)>,
}

pub struct InMemoryRemote<E> {
    prefix: String,
    store: Mutex<Store<E>>,
    log: Arc<Mutex<Vec<String>>>,
    fail_create: Option<Predicate<E>>,
    fail_update: HashSet<ServerId>,
    fail_remove: HashSet<ServerId>,
    fail_list: AtomicBool,
    scope: Option<ScopeFn<E>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<E: Entity> InMemoryRemote<E> {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            store: Mutex::new(Store {
                issued: 0,
                rows: Vec::new(),
            }),
            log: Arc::new(Mutex::new(Vec::new())),
            fail_create: None,
            fail_update: HashSet::new(),
            fail_remove: HashSet::new(),
            fail_list: AtomicBool::new(false),
            scope: None,
        }
    }

    /// Appends to `other`'s call log instead of keeping a private one.
    pub fn sharing_log_with<T>(mut self, other: &InMemoryRemote<T>) -> Self {
        self.log = Arc::clone(&other.log);
        self
    }

    /// Rejects creates of entities matching `predicate`.
    pub fn fail_create_matching(mut self, predicate: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        self.fail_create = Some(Box::new(predicate));
        self
    }

    pub fn fail_update_of(mut self, id: impl Into<ServerId>) -> Self {
        self.fail_update.insert(id.into());
        self
    }

    pub fn fail_remove_of(mut self, id: impl Into<ServerId>) -> Self {
        self.fail_remove.insert(id.into());
        self
    }

    pub fn failing_list(self) -> Self {
        self.set_list_failing(true);
        self
    }

    /// Makes later `list` calls fail, or succeed again.
    pub fn set_list_failing(&self, failing: bool) {
        self.fail_list.store(failing, Ordering::SeqCst);
    }

    /// Filters scoped `list` calls by the master id an entity points at.
    pub fn scoped_by(mut self, scope: impl Fn(&E) -> Option<ServerId> + Send + Sync + 'static) -> Self {
        self.scope = Some(Box::new(scope));
        self
    }

    /// Stores rows directly without logging calls.
    pub fn seed(&self, rows: Vec<(ServerId, E)>) {
        lock(&self.store).rows.extend(rows);
    }

    pub fn stored(&self) -> Vec<(ServerId, E)> {
        lock(&self.store).rows.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.log).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.log).clear();
    }

    fn record(&self, call: String) {
        lock(&self.log).push(call);
    }
}

#[async_trait]
impl<E: Entity + 'static> RemoteCollection<E> for InMemoryRemote<E> {
    async fn create(&self, entity: &E) -> Result<ServerId, RemoteError> {
        if self.fail_create.as_ref().is_some_and(|fails| fails(entity)) {
            self.record(format!("create {} rejected", self.prefix));
            return Err(RemoteError::rejected(format!("{} refused by server", E::KIND)));
        }
        let id = {
            let mut store = lock(&self.store);
            store.issued += 1;
            let id = ServerId::new(format!("{}{}", self.prefix, store.issued));
            store.rows.push((id.clone(), entity.clone()));
            id
        };
        self.record(format!("create {id}"));
        Ok(id)
    }

    async fn update(&self, id: &ServerId, entity: &E) -> Result<(), RemoteError> {
        self.record(format!("update {id}"));
        if self.fail_update.contains(id) {
            return Err(RemoteError::conflict(format!("{id} was changed by someone else")));
        }
        let mut store = lock(&self.store);
        match store.rows.iter_mut().find(|(stored, _)| stored == id) {
            Some((_, stored)) => {
                *stored = entity.clone();
                Ok(())
            }
            None => Err(RemoteError::new(RemoteErrorKind::NotFound, id.to_string())),
        }
    }

    async fn remove(&self, id: &ServerId) -> Result<(), RemoteError> {
        self.record(format!("delete {id}"));
        if self.fail_remove.contains(id) {
            return Err(RemoteError::rejected(format!("{id} is still referenced")));
        }
        lock(&self.store).rows.retain(|(stored, _)| stored != id);
        Ok(())
    }

    async fn list(&self, scope: Option<&ServerId>) -> Result<Vec<(ServerId, E)>, RemoteError> {
        self.record(match scope {
            Some(master) => format!("list {} for {master}", self.prefix),
            None => format!("list {}", self.prefix),
        });
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(RemoteError::transport("connection reset"));
        }
        let store = lock(&self.store);
        let rows = match (scope, &self.scope) {
            (Some(master), Some(scope_of)) => store
                .rows
                .iter()
                .filter(|(_, entity)| scope_of(entity).as_ref() == Some(master))
                .cloned()
                .collect(),
            _ => store.rows.clone(),
        };
        Ok(rows)
    }
}
