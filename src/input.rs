//! Keyboard → pad mapping with key-repeat suppression.
//!
//! One physical press fires one trigger. Auto-repeat events never fire, and
//! neither does a second press of a key that has not been released.
//!
//! Some inputs (plain terminals) report neither releases nor repeats, only a
//! stream of presses. For those, `with_release_timeout` treats a key as
//! released once it has been quiet for the timeout; presses arriving faster
//! than that are taken to be auto-repeat.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::kit::{Kit, PadId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Repeat,
    Release,
}

#[derive(Debug, Clone)]
pub struct KeyTriggerMap {
    bindings: HashMap<char, PadId>,
    /// Held keys and when they were last seen
    held: HashMap<char, Instant>,
    release_timeout: Option<Duration>,
}

impl KeyTriggerMap {
    pub fn from_kit(kit: &Kit) -> Self {
        let mut map = Self {
            bindings: HashMap::new(),
            held: HashMap::new(),
            release_timeout: None,
        };
        map.rebind(kit);
        map
    }

    pub fn with_release_timeout(mut self, timeout: Duration) -> Self {
        self.release_timeout = Some(timeout);
        self
    }

    /// Follow a kit change. Keys held now stay held.
    pub fn rebind(&mut self, kit: &Kit) {
        self.bindings = kit
            .pads()
            .iter()
            .map(|pad| (pad.key_trigger().to_ascii_lowercase(), pad.id()))
            .collect();
    }

    pub fn pad_for(&self, key: char) -> Option<PadId> {
        self.bindings.get(&key.to_ascii_lowercase()).copied()
    }

    /// Feed one key event; returns the pad to trigger, if any.
    pub fn handle(&mut self, key: char, action: KeyAction, now: Instant) -> Option<PadId> {
        let key = key.to_ascii_lowercase();
        let pad = self.pad_for(key)?;

        match action {
            KeyAction::Press => {
                let fresh = match self.held.get(&key) {
                    None => true,
                    Some(&seen) => self
                        .release_timeout
                        .is_some_and(|timeout| now.duration_since(seen) >= timeout),
                };
                self.held.insert(key, now);
                fresh.then_some(pad)
            }
            KeyAction::Repeat => {
                self.held.insert(key, now);
                None
            }
            KeyAction::Release => {
                self.held.remove(&key);
                None
            }
        }
    }

    /// Forget every held key, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.held.clear();
    }
}
