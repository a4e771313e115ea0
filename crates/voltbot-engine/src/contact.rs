//! Routing physics contacts to gameplay handlers.
//!
//! [`ContactDispatcher::dispatch`] classifies both sides of a contact by the
//! capability set registered for their entity and calls the matching
//! [`ContactContext`] handlers. Rules, in priority order:
//!
//! 1. A bullet on either side: on begin, the other side's projectile handler
//!    runs if it has one, otherwise the bullet is destroyed unless the other
//!    side is traversable. Nothing else applies to the contact.
//! 2. The player's feet on either side: landing on ground or the ground
//!    boundary counts an object below the feet (and the ground boundary sends
//!    the player back to its checkpoint). The matching end contact uncounts
//!    it, once per counted begin.
//! 3. The player on either side: the other side's player-contact handler
//!    runs for both begin and end.
//!
//! Rules 2 and 3 may both apply to one contact. Sides without a tag, or
//! whose entity is gone, are ignored. Handlers never create or destroy
//! bodies; they only mark things for deferred destruction.

use std::collections::BTreeMap;

use voltbot_ecs::capability::Capabilities;
use voltbot_ecs::entity::EntityId;

use crate::physics::{BodyPart, BoundaryKind, ContactEvent, ContactPhase, FixtureTag, Owner};

/// The gameplay side of contact handling.
pub trait ContactContext {
    /// Capabilities of a live entity, `None` if it no longer exists.
    fn capabilities(&self, id: EntityId) -> Option<Capabilities>;

    /// Whether `bullet` is already waiting to be destroyed.
    fn projectile_pending(&self, bullet: EntityId) -> bool;

    /// `bullet` hit `target`, which can be hit by projectiles.
    fn projectile_hit(&mut self, target: EntityId, bullet: EntityId);

    fn destroy_projectile(&mut self, bullet: EntityId);

    /// The player's feet started touching ground owned by `ground`.
    fn feet_landed(&mut self, ground: Owner);

    /// The player's feet stopped touching something counted by
    /// [`ContactContext::feet_landed`].
    fn feet_left(&mut self);

    /// The player's `part` started or stopped touching `other`.
    fn player_contact(&mut self, phase: ContactPhase, other: EntityId, part: Option<BodyPart>);
}

/// What one side of a contact is.
#[derive(Debug, Clone, Copy)]
enum Side {
    Entity {
        tag: FixtureTag,
        id: EntityId,
        caps: Capabilities,
    },
    Boundary {
        tag: FixtureTag,
        kind: BoundaryKind,
    },
    /// Tagged, but the entity is gone.
    Stale { tag: FixtureTag },
}

impl Side {
    fn classify(tag: FixtureTag, ctx: &dyn ContactContext) -> Self {
        match tag.owner {
            Owner::Boundary(kind) => Side::Boundary { tag, kind },
            Owner::Entity(id) => match ctx.capabilities(id) {
                Some(caps) => Side::Entity { tag, id, caps },
                None => Side::Stale { tag },
            },
        }
    }

    fn tag(&self) -> FixtureTag {
        match *self {
            Side::Entity { tag, .. } | Side::Boundary { tag, .. } | Side::Stale { tag } => tag,
        }
    }

    fn has(&self, flag: Capabilities) -> bool {
        matches!(self, Side::Entity { caps, .. } if caps.contains(flag))
    }

    fn is_feet(&self) -> bool {
        matches!(self, Side::Entity { tag, caps, .. }
            if tag.part == Some(BodyPart::Feet) && caps.contains(Capabilities::PLAYER))
    }

    /// Whether feet standing on this side count as standing on something.
    fn is_ground(&self) -> bool {
        match self {
            Side::Boundary { kind, .. } => *kind == BoundaryKind::Ground,
            _ => self.has(Capabilities::GROUND),
        }
    }
}

/// Stateful contact router.
///
/// The only state is the set of feet contacts that were counted, so that
/// every end contact uncounts exactly what its begin counted, even when the
/// ground's entity was destroyed in between.
#[derive(Debug, Default)]
pub struct ContactDispatcher {
    /// Counted feet contacts, keyed by the ground-side fixture.
    feet_contacts: BTreeMap<FixtureTag, u32>,
}

impl ContactDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ground contacts currently counted under the player's feet.
    pub fn feet_contacts(&self) -> u32 {
        self.feet_contacts.values().sum()
    }

    /// Forget every counted feet contact.
    pub fn clear(&mut self) {
        self.feet_contacts.clear();
    }

    pub fn dispatch(&mut self, ctx: &mut dyn ContactContext, event: ContactEvent) {
        let (Some(a), Some(b)) = (event.a, event.b) else {
            tracing::trace!(?event, "contact with untagged fixture ignored");
            return;
        };
        let a = Side::classify(a, ctx);
        let b = Side::classify(b, ctx);

        // Rule 1
        if let Some((bullet, other)) = Self::pick(a, b, |s| s.has(Capabilities::PROJECTILE)) {
            if event.phase == ContactPhase::Begin {
                Self::bullet_hit(ctx, bullet, other);
            }
            return;
        }

        // Rule 2
        if let Some((_, other)) = Self::pick(a, b, Side::is_feet) {
            self.feet(ctx, event.phase, other);
        }

        // Rule 3
        if let Some((player, other)) = Self::pick(a, b, |s| s.has(Capabilities::PLAYER)) {
            if let Side::Entity { id, .. } = other {
                tracing::trace!(other = %id, phase = ?event.phase, "player contact");
                ctx.player_contact(event.phase, id, player.tag().part);
            }
        }
    }

    /// Order a pair so the side matching `pred` comes first.
    fn pick(a: Side, b: Side, pred: impl Fn(&Side) -> bool) -> Option<(Side, Side)> {
        if pred(&a) {
            Some((a, b))
        } else if pred(&b) {
            Some((b, a))
        } else {
            None
        }
    }

    fn bullet_hit(ctx: &mut dyn ContactContext, bullet: Side, other: Side) {
        let Side::Entity { id: bullet, .. } = bullet else {
            return;
        };
        if ctx.projectile_pending(bullet) {
            tracing::trace!(bullet = %bullet, "bullet already destroyed this tick");
            return;
        }
        match other {
            Side::Entity { id, caps, .. } if caps.contains(Capabilities::HIT_BY_PROJECTILE) => {
                tracing::trace!(bullet = %bullet, target = %id, "bullet hit");
                ctx.projectile_hit(id, bullet);
            }
            Side::Entity { caps, .. } if caps.contains(Capabilities::TRAVERSABLE) => {}
            Side::Entity { .. } | Side::Boundary { .. } => ctx.destroy_projectile(bullet),
            Side::Stale { .. } => {}
        }
    }

    fn feet(&mut self, ctx: &mut dyn ContactContext, phase: ContactPhase, other: Side) {
        let key = other.tag();
        match phase {
            ContactPhase::Begin => {
                if !other.is_ground() {
                    return;
                }
                *self.feet_contacts.entry(key).or_insert(0) += 1;
                ctx.feet_landed(key.owner);
            }
            ContactPhase::End => {
                let Some(count) = self.feet_contacts.get_mut(&key) else {
                    return;
                };
                *count -= 1;
                if *count == 0 {
                    self.feet_contacts.remove(&key);
                }
                ctx.feet_left();
            }
        }
    }
}
