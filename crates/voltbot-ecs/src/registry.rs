//! The entity registry: live entities, their capabilities and the physics
//! bodies they reference.
//!
//! The registry never creates or destroys physics bodies. It only records
//! the [`BodyHandle`] the physics adapter returned, and hands it back on
//! [`EntityRegistry::despawn`] so the caller can release the body after the
//! step has completed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::capability::Capabilities;
use crate::entity::{EntityAllocator, EntityId};
use crate::EcsError;

// ---------------------------------------------------------------------------
// BodyHandle
// ---------------------------------------------------------------------------

/// Opaque reference to a body owned by the physics world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyHandle(u64);

impl BodyHandle {
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

// ---------------------------------------------------------------------------
// EntityRecord
// ---------------------------------------------------------------------------

/// Per-entity bookkeeping held by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub caps: Capabilities,
    pub body: Option<BodyHandle>,
}

// ---------------------------------------------------------------------------
// EntityRegistry
// ---------------------------------------------------------------------------

/// Maps living entities to their capability set and physics handle.
///
/// Records are kept in a `BTreeMap` keyed by [`EntityId`], so iteration
/// order is stable across runs.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    allocator: EntityAllocator,
    records: BTreeMap<EntityId, EntityRecord>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new entity with the given capabilities and no body.
    pub fn spawn(&mut self, caps: Capabilities) -> EntityId {
        let id = self.allocator.allocate();
        self.records.insert(id, EntityRecord { caps, body: None });
        tracing::trace!(entity = %id, ?caps, "entity spawned");
        id
    }

    /// Record the physics body backing `id`.
    pub fn attach_body(&mut self, id: EntityId, body: BodyHandle) -> Result<(), EcsError> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or(EcsError::StaleEntity { entity: id })?;
        record.body = Some(body);
        Ok(())
    }

    /// Remove `id` and return its record. The caller owns releasing the body.
    pub fn despawn(&mut self, id: EntityId) -> Result<EntityRecord, EcsError> {
        let record = self
            .records
            .remove(&id)
            .ok_or(EcsError::StaleEntity { entity: id })?;
        self.allocator.release(id);
        tracing::trace!(entity = %id, "entity despawned");
        Ok(record)
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.records.contains_key(&id)
    }

    /// Capabilities of `id`, or `None` when it no longer exists.
    pub fn caps(&self, id: EntityId) -> Option<Capabilities> {
        self.records.get(&id).map(|r| r.caps)
    }

    /// Whether `id` is alive and carries every bit of `flag`.
    pub fn has(&self, id: EntityId, flag: Capabilities) -> bool {
        self.caps(id).is_some_and(|caps| caps.contains(flag))
    }

    /// Set or clear a capability on a live entity.
    pub fn set_capability(
        &mut self,
        id: EntityId,
        flag: Capabilities,
        on: bool,
    ) -> Result<(), EcsError> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or(EcsError::StaleEntity { entity: id })?;
        record.caps.set(flag, on);
        Ok(())
    }

    /// The body handle of `id`.
    pub fn body(&self, id: EntityId) -> Result<BodyHandle, EcsError> {
        let record = self
            .records
            .get(&id)
            .ok_or(EcsError::StaleEntity { entity: id })?;
        record.body.ok_or(EcsError::MissingBody { entity: id })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Live entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &EntityRecord)> {
        self.records.iter().map(|(id, r)| (*id, r))
    }

    /// Live entities carrying every bit of `flag`, in id order.
    pub fn with_capability(&self, flag: Capabilities) -> impl Iterator<Item = EntityId> + '_ {
        self.records
            .iter()
            .filter(move |(_, r)| r.caps.contains(flag))
            .map(|(id, _)| *id)
    }
}
