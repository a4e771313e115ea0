//! Scripted input: decoded player intents keyed by the tick they apply on.
//!
//! An [`InputScript`] is the headless counterpart of a keyboard. It is fully
//! serializable, so test fixtures and the headless runner can load one from
//! JSON:
//!
//! ```
//! use voltbot_engine::script::{InputScript, Intent};
//! use voltbot_engine::math::Direction;
//!
//! let script = InputScript::from_json_str(r#"[
//!     { "tick": 0, "intent": "start-move", "direction": "right" },
//!     { "tick": 30, "intent": "jump" },
//!     { "tick": 60, "intent": "stop-move", "direction": "right" }
//! ]"#).unwrap();
//!
//! assert_eq!(script.len(), 3);
//! assert_eq!(script.at(30).collect::<Vec<_>>(), vec![Intent::Jump]);
//! assert_eq!(script.last_tick(), Some(60));
//! ```

use serde::{Deserialize, Serialize};

use crate::math::Direction;

/// A discrete, already-decoded player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "kebab-case")]
pub enum Intent {
    StartMove { direction: Direction },
    StopMove { direction: Direction },
    Jump,
    Shoot,
    Interact,
    StartPush,
    StopPush,
    CycleAddon {
        #[serde(default)]
        backwards: bool,
    },
    TogglePause,
}

/// One intent and the tick, counted from zero, before which it applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub tick: u64,
    #[serde(flatten)]
    pub intent: Intent,
}

/// Intents ordered by tick. Entries sharing a tick keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputScript {
    entries: Vec<ScriptEntry>,
}

impl InputScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON array of entries. Out-of-order entries are sorted by
    /// tick.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let mut script: Self = serde_json::from_str(json)?;
        script.entries.sort_by_key(|e| e.tick);
        Ok(script)
    }

    /// Add an intent. Inserting before existing later entries keeps the
    /// script ordered.
    pub fn push(&mut self, tick: u64, intent: Intent) {
        let at = self.entries.partition_point(|e| e.tick <= tick);
        self.entries.insert(at, ScriptEntry { tick, intent });
    }

    /// Builder form of [`push`](Self::push).
    pub fn with(mut self, tick: u64, intent: Intent) -> Self {
        self.push(tick, intent);
        self
    }

    /// Intents that apply on `tick`, in order.
    pub fn at(&self, tick: u64) -> impl Iterator<Item = Intent> + '_ {
        let start = self.entries.partition_point(|e| e.tick < tick);
        self.entries[start..]
            .iter()
            .take_while(move |e| e.tick == tick)
            .map(|e| e.intent)
    }

    pub fn last_tick(&self) -> Option<u64> {
        self.entries.last().map(|e| e.tick)
    }

    pub fn entries(&self) -> &[ScriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
