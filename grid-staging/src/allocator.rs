use crate::identity::{ServerId, TempId};
use crate::util::errors::AllocatorError;
use std::collections::HashMap;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Pending,
    Resolved(ServerId),
}

/// Issues temp ids for unsaved rows and maps them to server ids once the
/// rows are created.
///
/// Ids come from a monotonic counter and are never reissued within a
/// session. An issued id that no longer has a slot has been retired; any
/// later use of it is an invariant breach.
#[derive(Debug, Default)]
pub struct TempIdAllocator {
    issued: u64,
    slots: HashMap<TempId, Slot>,
}

impl TempIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> TempId {
        self.issued += 1;
        let id = TempId::new(self.issued);
        self.slots.insert(id, Slot::Pending);
        id
    }

    /// Records the server id for a created row. Resolving the same temp id
    /// twice is reported, never ignored.
    pub fn resolve(&mut self, temp: TempId, server: ServerId) -> Result<(), AllocatorError> {
        let breach = match self.slots.get_mut(&temp) {
            Some(slot) => match slot {
                Slot::Pending => {
                    *slot = Slot::Resolved(server);
                    return Ok(());
                }
                Slot::Resolved(existing) => AllocatorError::AlreadyResolved {
                    temp,
                    existing: existing.clone(),
                },
            },
            None => self.missing(temp),
        };
        error!(%temp, %server, error = %breach, "temp id resolution rejected");
        Err(breach)
    }

    /// `Ok(None)` while the id is still waiting for its create to succeed.
    pub fn resolved(&self, temp: TempId) -> Result<Option<&ServerId>, AllocatorError> {
        match self.slots.get(&temp) {
            Some(Slot::Pending) => Ok(None),
            Some(Slot::Resolved(server)) => Ok(Some(server)),
            None => Err(self.missing(temp)),
        }
    }

    /// Retires a pending id whose row was discarded locally.
    pub fn release(&mut self, temp: TempId) -> Result<(), AllocatorError> {
        match self.slots.get(&temp) {
            Some(Slot::Pending) => {
                self.slots.remove(&temp);
                Ok(())
            }
            Some(Slot::Resolved(existing)) => Err(AllocatorError::AlreadyResolved {
                temp,
                existing: existing.clone(),
            }),
            None => Err(self.missing(temp)),
        }
    }

    /// Every resolution made since the last retirement, in issue order.
    pub fn resolutions(&self) -> Vec<(TempId, ServerId)> {
        let mut resolved: Vec<(TempId, ServerId)> = self
            .slots
            .iter()
            .filter_map(|(temp, slot)| match slot {
                Slot::Resolved(server) => Some((*temp, server.clone())),
                Slot::Pending => None,
            })
            .collect();
        resolved.sort_by_key(|(temp, _)| *temp);
        resolved
    }

    /// Retires resolved ids once their rows carry server identities.
    pub fn retire_resolved(&mut self) {
        self.slots.retain(|_, slot| matches!(slot, Slot::Pending));
    }

    /// Retires everything. Called when the working set is replaced from
    /// the server.
    pub fn retire_all(&mut self) {
        self.slots.clear();
    }

    pub fn pending_count(&self) -> usize {
        self.slots.values().filter(|slot| matches!(slot, Slot::Pending)).count()
    }

    fn missing(&self, temp: TempId) -> AllocatorError {
        if temp.raw() >= 1 && temp.raw() <= self.issued {
            AllocatorError::Retired(temp)
        } else {
            AllocatorError::UnknownTempId(temp)
        }
    }
}
