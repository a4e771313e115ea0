//! Entity identifiers and slot recycling.
//!
//! Bullets come and go every few ticks, so slots are reused aggressively.
//! Each slot carries a generation that is bumped on release; an id is only
//! current while its generation matches the slot's. A contact event that
//! still names a destroyed bullet therefore never resolves to the enemy that
//! later takes over the slot.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Slot index plus generation, packed as `generation << 32 | slot`.
///
/// The derived ordering is on the packed value. Contact sorting and every
/// `BTreeMap<EntityId, _>` in the engine rely on it being total and stable.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    pub const fn new(slot: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | slot as u64)
    }

    pub fn index(self) -> u32 {
        (self.0 & u64::from(u32::MAX)) as u32
    }

    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({self})")
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

/// Hands out ids and takes them back.
///
/// Freed slots are reused oldest first, which spreads generation bumps over
/// many slots when bullets churn.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    /// Current generation of every slot ever handed out.
    generations: Vec<u32>,
    free: VecDeque<u32>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> EntityId {
        if let Some(slot) = self.free.pop_front() {
            return EntityId::new(slot, self.generations[slot as usize]);
        }
        let slot = self.generations.len() as u32;
        self.generations.push(0);
        EntityId::new(slot, 0)
    }

    /// Give `id` back. Its generation moves on, so every copy of `id` still
    /// held elsewhere goes stale at once. Returns `false` for an id that is
    /// already stale.
    pub fn release(&mut self, id: EntityId) -> bool {
        if !self.is_current(id) {
            return false;
        }
        let slot = id.index();
        let generation = &mut self.generations[slot as usize];
        *generation = generation.wrapping_add(1);
        self.free.push_back(slot);
        true
    }

    /// Whether `id` carries its slot's current generation. Only meaningful
    /// for ids this allocator handed out.
    pub fn is_current(&self, id: EntityId) -> bool {
        self.generations.get(id.index() as usize) == Some(&id.generation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_use_distinct_slots() {
        let mut alloc = EntityAllocator::new();
        let ids: Vec<EntityId> = (0..16).map(|_| alloc.allocate()).collect();
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(id.index(), i as u32);
            assert_eq!(id.generation(), 0);
        }
    }

    #[test]
    fn reused_slot_invalidates_the_old_id() {
        let mut alloc = EntityAllocator::new();
        let bullet = alloc.allocate();
        assert!(alloc.release(bullet));

        let enemy = alloc.allocate();
        assert_eq!(enemy.index(), bullet.index());
        assert_ne!(enemy, bullet);
        assert!(!alloc.is_current(bullet));
        assert!(alloc.is_current(enemy));
    }

    #[test]
    fn second_release_is_refused() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.allocate();
        assert!(alloc.release(e));
        assert!(!alloc.release(e));
        // the slot went on the free list once only
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert_eq!(a.index(), e.index());
        assert_ne!(b.index(), e.index());
    }

    #[test]
    fn slots_never_handed_out_are_not_current() {
        assert!(!EntityAllocator::new().is_current(EntityId::new(9, 0)));
    }

    #[test]
    fn formatting_and_order() {
        let id = EntityId::new(12, 3);
        assert_eq!(id.to_string(), "12v3");
        assert_eq!(format!("{id:?}"), "EntityId(12v3)");
        assert!(EntityId::new(5, 0) < EntityId::new(1, 1), "generation dominates");
    }
}
