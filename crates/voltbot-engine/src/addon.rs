//! Player addons and the inventory that selects between them.

use serde::{Deserialize, Serialize};

/// Battery capacity of every addon.
pub const ADDON_MAX_BATTERY: i32 = 1000;

/// Each unit drained from an addon costs this many battery points.
pub const ADDON_DRAIN_MULTIPLIER: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddonKind {
    /// Absorbs every hit while selected.
    Shield,
    /// Faster running, higher jumps and animation.
    Speed,
    /// Stronger shots paid from the addon's battery.
    Strength,
}

/// An addon owned by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addon {
    pub kind: AddonKind,
    pub battery: i32,
}

impl Addon {
    pub fn full(kind: AddonKind) -> Self {
        Self {
            kind,
            battery: ADDON_MAX_BATTERY,
        }
    }

    /// Drain `amount` units. Returns `false` once the battery is empty.
    pub fn drain(&mut self, amount: i32) -> bool {
        self.battery = (self.battery - amount * ADDON_DRAIN_MULTIPLIER).max(0);
        self.battery > 0
    }

    pub fn battery_percent(&self) -> i32 {
        self.battery * 100 / ADDON_MAX_BATTERY
    }
}

/// Ordered addons, at most one per kind, plus the current selection.
///
/// `current` is either `None` or a valid index into `addons`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    addons: Vec<Addon>,
    current: Option<usize>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from saved parts. An out-of-range selection or duplicate kinds
    /// are dropped.
    pub fn from_parts(addons: Vec<Addon>, current: Option<usize>) -> Self {
        let mut inventory = Self::new();
        for addon in addons {
            if !inventory.addons.iter().any(|a| a.kind == addon.kind) {
                inventory.addons.push(Addon {
                    kind: addon.kind,
                    battery: addon.battery.clamp(0, ADDON_MAX_BATTERY),
                });
            }
        }
        inventory.current = current.filter(|&i| i < inventory.addons.len());
        inventory
    }

    pub fn addons(&self) -> &[Addon] {
        &self.addons
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&Addon> {
        self.current.and_then(|i| self.addons.get(i))
    }

    /// Whether `kind` is owned and selected.
    pub fn is_using(&self, kind: AddonKind) -> bool {
        self.current().is_some_and(|a| a.kind == kind)
    }

    /// Collect an addon: refill and select it if already owned, otherwise
    /// append it and select it.
    pub fn collect(&mut self, kind: AddonKind) {
        match self.addons.iter().position(|a| a.kind == kind) {
            Some(index) => {
                self.addons[index].battery = ADDON_MAX_BATTERY;
                self.current = Some(index);
            }
            None => {
                self.addons.push(Addon::full(kind));
                self.current = Some(self.addons.len() - 1);
            }
        }
    }

    /// Step the selection forwards or backwards through the addons and an
    /// extra "no addon" slot.
    pub fn cycle(&mut self, backwards: bool) {
        let len = self.addons.len();
        self.current = match (self.current, backwards) {
            (None, false) if len > 0 => Some(0),
            (None, true) if len > 0 => Some(len - 1),
            (None, _) => None,
            (Some(i), false) if i + 1 < len => Some(i + 1),
            (Some(_), false) => None,
            (Some(0), true) => None,
            (Some(i), true) => Some(i - 1),
        };
    }

    /// Drain the selected addon. An emptied addon is removed and the
    /// selection reset. Returns the kind that was dropped, if any.
    pub fn drain_current(&mut self, amount: i32) -> Option<AddonKind> {
        let index = self.current?;
        let addon = self.addons.get_mut(index)?;
        if addon.drain(amount) {
            return None;
        }
        let dropped = self.addons.remove(index);
        self.current = None;
        Some(dropped.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_new_kind_appends_and_selects() {
        let mut inv = Inventory::new();
        inv.collect(AddonKind::Shield);
        inv.collect(AddonKind::Speed);
        assert_eq!(inv.addons().len(), 2);
        assert_eq!(inv.addons()[1].kind, AddonKind::Speed);
        assert!(inv.is_using(AddonKind::Speed));
    }

    #[test]
    fn collecting_owned_kind_refills_and_selects() {
        let mut inv = Inventory::new();
        inv.collect(AddonKind::Shield);
        inv.collect(AddonKind::Speed);
        inv.cycle(false); // -> none
        inv.drain_current(1);
        inv.cycle(false); // -> shield
        inv.drain_current(10);
        assert_eq!(inv.addons()[0].battery, ADDON_MAX_BATTERY - 30);

        inv.collect(AddonKind::Shield);
        assert_eq!(inv.addons().len(), 2);
        assert_eq!(inv.addons()[0].battery, ADDON_MAX_BATTERY);
        assert_eq!(inv.current_index(), Some(0));
    }

    #[test]
    fn cycle_passes_through_no_addon_slot() {
        let mut inv = Inventory::new();
        inv.collect(AddonKind::Shield);
        inv.collect(AddonKind::Speed);
        // selection is on index 1
        inv.cycle(false);
        assert_eq!(inv.current_index(), None);
        inv.cycle(false);
        assert_eq!(inv.current_index(), Some(0));
        inv.cycle(true);
        assert_eq!(inv.current_index(), None);
        inv.cycle(true);
        assert_eq!(inv.current_index(), Some(1));
    }

    #[test]
    fn cycle_on_empty_inventory_stays_none() {
        let mut inv = Inventory::new();
        inv.cycle(false);
        inv.cycle(true);
        assert_eq!(inv.current_index(), None);
    }

    #[test]
    fn emptied_addon_is_dropped() {
        let mut inv = Inventory::new();
        inv.collect(AddonKind::Strength);
        // 1000 / (30 * 3) -> the 12th drain empties it
        let mut dropped = None;
        for _ in 0..12 {
            dropped = inv.drain_current(30);
        }
        assert_eq!(dropped, Some(AddonKind::Strength));
        assert!(inv.addons().is_empty());
        assert_eq!(inv.current_index(), None);
    }

    #[test]
    fn from_parts_sanitizes_selection() {
        let inv = Inventory::from_parts(
            vec![Addon::full(AddonKind::Speed), Addon::full(AddonKind::Speed)],
            Some(3),
        );
        assert_eq!(inv.addons().len(), 1);
        assert_eq!(inv.current_index(), None);
    }
}
