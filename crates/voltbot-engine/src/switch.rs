//! Switches and the doors they open.
//!
//! A door needs every switch wired to it to be on. Wiring happens once at
//! load time: [`wire`] counts, per door number, how many switches target it
//! and links each switch to its door's entity. During play, toggling a switch
//! only moves the door's "on" counter; the door is open exactly when that
//! counter equals its opener count.

use std::collections::BTreeMap;

use voltbot_ecs::entity::EntityId;

use crate::config::WiringPolicy;
use crate::error::LevelError;

// ---------------------------------------------------------------------------
// Door
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorTransition {
    Opened,
    Closed,
}

/// A door opened by a fixed set of switches.
///
/// Invariant: `openers_on <= max_openers`.
#[derive(Debug, Clone, PartialEq)]
pub struct Door {
    pub number: u32,
    max_openers: u32,
    openers_on: u32,
}

impl Door {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            max_openers: 0,
            openers_on: 0,
        }
    }

    pub fn max_openers(&self) -> u32 {
        self.max_openers
    }

    pub fn openers_on(&self) -> u32 {
        self.openers_on
    }

    pub fn is_open(&self) -> bool {
        self.openers_on == self.max_openers
    }

    /// Count one more switch wired to this door. Load time only.
    fn add_opener(&mut self) {
        self.max_openers += 1;
    }

    /// A wired switch turned on.
    pub fn opener_on(&mut self) -> Option<DoorTransition> {
        if self.openers_on >= self.max_openers {
            tracing::warn!(door = self.number, "more switches on than wired to this door");
            return None;
        }
        self.openers_on += 1;
        self.is_open().then_some(DoorTransition::Opened)
    }

    /// A wired switch turned off.
    pub fn opener_off(&mut self) -> Option<DoorTransition> {
        if self.openers_on == 0 {
            tracing::warn!(door = self.number, "switch turned off with no opener on");
            return None;
        }
        let was_open = self.is_open();
        self.openers_on -= 1;
        was_open.then_some(DoorTransition::Closed)
    }
}

// ---------------------------------------------------------------------------
// Switch
// ---------------------------------------------------------------------------

/// A block that toggles when shot.
#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    /// Door number this switch targets, as written in the level.
    pub door_number: u32,
    /// The linked door entity, once wired. Unknown doors leave it `None`.
    pub door: Option<EntityId>,
    on: bool,
    /// Seconds after which an "on" switch turns itself off.
    timeout: Option<f32>,
    on_for: f32,
}

impl Switch {
    pub fn new(door_number: u32, timeout: Option<f32>) -> Self {
        Self {
            door_number,
            door: None,
            on: false,
            timeout: timeout.filter(|t| *t > 0.0),
            on_for: 0.0,
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Flip the state and return the new one.
    pub fn invert(&mut self) -> bool {
        self.on = !self.on;
        self.on_for = 0.0;
        self.on
    }

    /// Advance the auto-off timer. Returns `true` on the tick the switch
    /// turns itself off; the caller releases its door opener.
    pub fn tick(&mut self, dt: f32) -> bool {
        let Some(timeout) = self.timeout else {
            return false;
        };
        if !self.on {
            return false;
        }
        self.on_for += dt;
        if self.on_for <= timeout {
            return false;
        }
        self.on = false;
        self.on_for = 0.0;
        true
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Link every switch to its door and count openers.
///
/// Runs once per level load, before the first tick. Doors left without any
/// switch are open from the start, since zero of zero openers are on.
pub fn wire(
    doors: &mut BTreeMap<EntityId, &mut Door>,
    switches: &mut BTreeMap<EntityId, &mut Switch>,
    policy: WiringPolicy,
) -> Result<(), LevelError> {
    let mut by_number: BTreeMap<u32, EntityId> = BTreeMap::new();
    for (id, door) in doors.iter() {
        if by_number.insert(door.number, *id).is_some() {
            return Err(LevelError::DuplicateDoor { door: door.number });
        }
    }

    for (switch_id, switch) in switches.iter_mut() {
        let target = by_number
            .get(&switch.door_number)
            .and_then(|id| doors.get_mut(id).map(|door| (*id, door)));
        match target {
            Some((door_id, door)) => {
                door.add_opener();
                switch.door = Some(door_id);
                tracing::debug!(switch = %switch_id, door = door.number, "switch wired");
            }
            None => match policy {
                WiringPolicy::Strict => {
                    return Err(LevelError::UnknownDoor {
                        door: switch.door_number,
                    })
                }
                WiringPolicy::Lenient => {
                    tracing::warn!(
                        switch = %switch_id,
                        door = switch.door_number,
                        "switch targets unknown door; left unlinked"
                    );
                }
            },
        }
    }

    for door in doors.values() {
        if door.max_openers == 0 {
            tracing::warn!(door = door.number, "door has no switches and starts open");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(i: u32) -> EntityId {
        EntityId::new(i, 0)
    }

    fn wired(door_numbers: &[u32], switch_targets: &[u32], policy: WiringPolicy) -> Result<(Vec<Door>, Vec<Switch>), LevelError> {
        let mut doors: Vec<Door> = door_numbers.iter().map(|n| Door::new(*n)).collect();
        let mut switches: Vec<Switch> = switch_targets.iter().map(|n| Switch::new(*n, None)).collect();
        {
            let mut door_map: BTreeMap<EntityId, &mut Door> =
                doors.iter_mut().enumerate().map(|(i, d)| (id(i as u32), d)).collect();
            let mut switch_map: BTreeMap<EntityId, &mut Switch> = switches
                .iter_mut()
                .enumerate()
                .map(|(i, s)| (id(100 + i as u32), s))
                .collect();
            wire(&mut door_map, &mut switch_map, policy)?;
        }
        Ok((doors, switches))
    }

    #[test]
    fn three_switches_require_all_on() {
        let (mut doors, switches) = wired(&[4], &[4, 4, 4], WiringPolicy::Lenient).unwrap();
        let door = &mut doors[0];
        assert_eq!(door.max_openers(), 3);
        assert!(switches.iter().all(|s| s.door == Some(id(0))));

        assert_eq!(door.opener_on(), None);
        assert_eq!(door.opener_on(), None);
        assert!(!door.is_open());
        assert_eq!(door.opener_on(), Some(DoorTransition::Opened));
        assert!(door.is_open());
        assert_eq!(door.opener_off(), Some(DoorTransition::Closed));
        assert!(!door.is_open());
        assert_eq!(door.opener_off(), None);
    }

    #[test]
    fn counter_never_exceeds_max() {
        let (mut doors, _) = wired(&[1], &[1], WiringPolicy::Lenient).unwrap();
        let door = &mut doors[0];
        door.opener_on();
        assert_eq!(door.opener_on(), None);
        assert_eq!(door.openers_on(), 1);
        door.opener_off();
        door.opener_off();
        assert_eq!(door.openers_on(), 0);
    }

    #[test]
    fn unknown_door_is_tolerated_when_lenient() {
        let (doors, switches) = wired(&[1], &[2], WiringPolicy::Lenient).unwrap();
        assert_eq!(switches[0].door, None);
        assert_eq!(doors[0].max_openers(), 0);
        assert!(doors[0].is_open());
    }

    #[test]
    fn unknown_door_fails_when_strict() {
        let err = wired(&[1], &[2], WiringPolicy::Strict).unwrap_err();
        assert!(matches!(err, LevelError::UnknownDoor { door: 2 }));
    }

    #[test]
    fn duplicate_door_numbers_are_rejected() {
        let err = wired(&[3, 3], &[], WiringPolicy::Lenient).unwrap_err();
        assert!(matches!(err, LevelError::DuplicateDoor { door: 3 }));
    }

    #[test]
    fn switch_timeout_turns_it_off() {
        let mut s = Switch::new(1, Some(1.0));
        assert!(!s.tick(5.0), "off switches do not time out");
        s.invert();
        assert!(!s.tick(0.6));
        assert!(s.tick(0.6));
        assert!(!s.is_on());
        assert!(!s.tick(5.0), "fires once, then stays off");

        // a fresh activation starts the timer from zero
        assert!(s.invert());
        assert!(!s.tick(0.6));
        assert!(s.is_on());
    }

    #[test]
    fn zero_timeout_means_never() {
        let mut s = Switch::new(1, Some(0.0));
        s.invert();
        assert!(!s.tick(100.0));
        assert!(s.is_on());
    }
}
