//! Property tests for entity lifecycle bookkeeping.

use proptest::prelude::*;
use std::collections::HashSet;
use voltbot_ecs::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Spawn,
    Mark(usize),
    Flush,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Spawn),
        5 => (0usize..32).prop_map(Op::Mark),
        1 => Just(Op::Flush),
    ]
}

fn flush(
    registry: &mut EntityRegistry,
    queue: &mut DeferredDestructionQueue<EntityId>,
    destroyed: &mut HashSet<EntityId>,
) -> Result<(), TestCaseError> {
    for id in queue.drain() {
        prop_assert!(destroyed.insert(id), "entity {} destroyed twice", id);
        prop_assert!(registry.despawn(id).is_ok());
    }
    Ok(())
}

proptest! {
    /// However many times an entity is marked between flushes, it is
    /// despawned exactly once and never again afterwards.
    #[test]
    fn each_entity_is_destroyed_at_most_once(ops in prop::collection::vec(op_strategy(), 1..200)) {
        let mut registry = EntityRegistry::new();
        let mut queue = DeferredDestructionQueue::new();
        let mut spawned: Vec<EntityId> = Vec::new();
        let mut destroyed: HashSet<EntityId> = HashSet::new();

        for op in ops {
            match op {
                Op::Spawn => {
                    let id = registry.spawn(Capabilities::PROJECTILE);
                    registry.attach_body(id, BodyHandle::from_raw(spawned.len() as u64)).unwrap();
                    spawned.push(id);
                }
                Op::Mark(i) => {
                    if let Some(&id) = spawned.get(i) {
                        if registry.is_alive(id) {
                            queue.mark(id);
                        }
                    }
                }
                Op::Flush => flush(&mut registry, &mut queue, &mut destroyed)?,
            }
        }
        flush(&mut registry, &mut queue, &mut destroyed)?;

        prop_assert_eq!(registry.len() + destroyed.len(), spawned.len());
    }

    #[test]
    fn generations_keep_ids_unique(cycles in 1usize..64) {
        let mut alloc = EntityAllocator::new();
        let mut seen = HashSet::new();
        for _ in 0..cycles {
            let id = alloc.allocate();
            prop_assert!(seen.insert(id));
            alloc.release(id);
        }
    }
}
