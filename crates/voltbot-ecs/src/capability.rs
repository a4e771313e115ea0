//! Capability flags attached to entities at spawn time.
//!
//! Contact resolution asks "what can this party do?" once per event by
//! testing bits, instead of inspecting concrete object types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Bit set of entity capabilities.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capabilities(pub u16);

impl Capabilities {
    pub const NONE: Self = Self(0);
    /// The player singleton.
    pub const PLAYER: Self = Self(1 << 0);
    /// A bullet.
    pub const PROJECTILE: Self = Self(1 << 1);
    /// Reacts when a bullet touches it.
    pub const HIT_BY_PROJECTILE: Self = Self(1 << 2);
    /// Reacts to begin/end contact with the player.
    pub const HANDLES_PLAYER_CONTACT: Self = Self(1 << 3);
    /// Owns a behavior evaluated every tick.
    pub const MOVABLE: Self = Self(1 << 4);
    /// Offers an `interact` action to the player.
    pub const INTERACTABLE: Self = Self(1 << 5);
    /// Bullets and the player pass through it.
    pub const TRAVERSABLE: Self = Self(1 << 6);
    /// Supports the player's feet.
    pub const GROUND: Self = Self(1 << 7);
    /// Can be pushed along by the player.
    pub const PUSHABLE: Self = Self(1 << 8);

    /// Whether every bit of `other` is set.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any bit of `other` is set.
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Set or clear the bits of `flag`.
    pub fn set(&mut self, flag: Self, on: bool) {
        if on {
            self.0 |= flag.0;
        } else {
            self.0 &= !flag.0;
        }
    }

    /// Copy of `self` with the bits of `flag` cleared.
    #[inline]
    pub fn without(self, flag: Self) -> Self {
        Self(self.0 & !flag.0)
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Capabilities {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Capabilities {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

const NAMES: [(Capabilities, &str); 9] = [
    (Capabilities::PLAYER, "PLAYER"),
    (Capabilities::PROJECTILE, "PROJECTILE"),
    (Capabilities::HIT_BY_PROJECTILE, "HIT_BY_PROJECTILE"),
    (Capabilities::HANDLES_PLAYER_CONTACT, "HANDLES_PLAYER_CONTACT"),
    (Capabilities::MOVABLE, "MOVABLE"),
    (Capabilities::INTERACTABLE, "INTERACTABLE"),
    (Capabilities::TRAVERSABLE, "TRAVERSABLE"),
    (Capabilities::GROUND, "GROUND"),
    (Capabilities::PUSHABLE, "PUSHABLE"),
];

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Capabilities(NONE)");
        }
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "Capabilities({})", names.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_requires_all_bits() {
        let door = Capabilities::GROUND | Capabilities::TRAVERSABLE;
        assert!(door.contains(Capabilities::GROUND));
        assert!(!door.contains(Capabilities::GROUND | Capabilities::PLAYER));
        assert!(door.intersects(Capabilities::GROUND | Capabilities::PLAYER));
    }

    #[test]
    fn set_toggles_single_flag() {
        let mut caps = Capabilities::GROUND;
        caps.set(Capabilities::TRAVERSABLE, true);
        assert!(caps.contains(Capabilities::TRAVERSABLE));
        caps.set(Capabilities::TRAVERSABLE, false);
        assert_eq!(caps, Capabilities::GROUND);
        assert_eq!(caps.without(Capabilities::GROUND), Capabilities::NONE);
    }

    #[test]
    fn debug_lists_flag_names() {
        let caps = Capabilities::PLAYER | Capabilities::MOVABLE;
        assert_eq!(format!("{caps:?}"), "Capabilities(PLAYER | MOVABLE)");
        assert_eq!(format!("{:?}", Capabilities::NONE), "Capabilities(NONE)");
    }
}
