//! Voltbot ECS -- entity identity, capability tags and deferred destruction.
//!
//! This crate knows nothing about physics engines or gameplay rules. It
//! provides the bookkeeping every simulated object shares:
//!
//! - [`EntityId`](entity::EntityId): generational handles, so a reference to a
//!   destroyed entity is detected instead of silently aliasing a new one.
//! - [`Capabilities`](capability::Capabilities): the classification attached
//!   to an entity at spawn time and queried once per contact.
//! - [`EntityRegistry`](registry::EntityRegistry): living entities and the
//!   physics bodies they reference (but do not own).
//! - [`DeferredDestructionQueue`](destruction::DeferredDestructionQueue):
//!   removals requested while the physics step is being resolved, applied
//!   after it completes.
//!
//! # Quick Start
//!
//! ```
//! use voltbot_ecs::prelude::*;
//!
//! let mut registry = EntityRegistry::new();
//! let crate_box = registry.spawn(Capabilities::GROUND | Capabilities::PUSHABLE);
//! registry.attach_body(crate_box, BodyHandle::from_raw(7)).unwrap();
//!
//! let mut queue = DeferredDestructionQueue::new();
//! assert!(queue.mark(crate_box));
//! assert!(!queue.mark(crate_box)); // already pending
//!
//! for id in queue.drain() {
//!     let record = registry.despawn(id).unwrap();
//!     assert_eq!(record.body, Some(BodyHandle::from_raw(7)));
//! }
//! assert!(!registry.is_alive(crate_box));
//! ```

#![deny(unsafe_code)]

pub mod capability;
pub mod destruction;
pub mod entity;
pub mod registry;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The entity does not exist (stale generation or never allocated).
    #[error("entity {entity:?} does not exist (stale or never allocated)")]
    StaleEntity { entity: entity::EntityId },

    /// The entity is alive but has no physics body attached.
    #[error("entity {entity:?} has no physics body attached")]
    MissingBody { entity: entity::EntityId },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::capability::Capabilities;
    pub use crate::destruction::DeferredDestructionQueue;
    pub use crate::entity::{EntityAllocator, EntityId};
    pub use crate::registry::{BodyHandle, EntityRecord, EntityRegistry};
    pub use crate::EcsError;
}
