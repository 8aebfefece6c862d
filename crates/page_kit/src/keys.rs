//! Pressed-key tracking fed by keyboard events.

use std::collections::HashMap;

use log::{trace, warn};
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::context::PageContext;

/// Keyboard modifier flags for key events.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyMods {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeyEventKind {
    Down,
    Up,
}

/// A keydown or keyup delivered to the page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyboardEvent {
    pub kind: KeyEventKind,
    /// Logical key value, e.g. `"a"` or `"Shift"`.
    pub key: String,
    /// Physical key code, e.g. `"KeyA"`.
    pub code: String,
    pub mods: KeyMods,
}

/// Fan-out of keyboard events to every tracker.
#[derive(Debug)]
pub struct KeyboardEvents {
    sender: broadcast::Sender<KeyboardEvent>,
}

impl KeyboardEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Deliver an event; returns how many trackers will see it.
    pub fn dispatch(&self, event: KeyboardEvent) -> usize {
        self.sender.send(event).unwrap_or_default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<KeyboardEvent> {
        self.sender.subscribe()
    }
}

/// Key state built from the events seen since the tracker was created.
///
/// Events queue on the tracker's subscription and are folded into the state
/// on each query, so a query always reflects every event dispatched before it.
#[derive(Debug)]
pub struct PressedKeys {
    events: broadcast::Receiver<KeyboardEvent>,
    state: HashMap<String, bool>,
}

impl PressedKeys {
    pub fn new(events: broadcast::Receiver<KeyboardEvent>) -> Self {
        Self {
            events,
            state: HashMap::new(),
        }
    }

    /// Whether `key` has been pressed and not released since tracking began.
    pub fn is_pressed(&mut self, key: &str) -> bool {
        self.sync();
        self.state.get(key).copied().unwrap_or(false)
    }

    /// Every currently held key, sorted.
    pub fn pressed_keys(&mut self) -> Vec<String> {
        self.sync();
        let mut held: Vec<String> = self
            .state
            .iter()
            .filter(|&(_, &down)| down)
            .map(|(key, _)| key.clone())
            .collect();
        held.sort();
        held
    }

    /// Stop listening. Later events are not observed by anyone through this tracker.
    pub fn detach(self) {
        trace!(target: "page_kit::keys", "tracker detached with {} known keys", self.state.len());
    }

    /// Drain queued events into the key state.
    fn sync(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    let down = event.kind == KeyEventKind::Down;
                    let state = if down { "down" } else { "up" };
                    trace!(target: "page_kit::keys", "{} {state}", event.key);
                    self.state.insert(event.key, down);
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(target: "page_kit::keys", "key tracker lagged, skipped {skipped} events");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }
}

impl PageContext {
    /// Start tracking pressed keys from this point on.
    pub fn track_keys(&self) -> PressedKeys {
        PressedKeys::new(self.keyboard().subscribe())
    }

    pub fn dispatch_key_event(&self, event: KeyboardEvent) -> usize {
        self.keyboard().dispatch(event)
    }

    /// Dispatch a synthetic keydown event with optional modifier flags.
    pub fn dispatch_key_down(&self, key: &str, code: &str, mods: KeyMods) -> usize {
        self.dispatch_key_event(KeyboardEvent {
            kind: KeyEventKind::Down,
            key: key.to_owned(),
            code: code.to_owned(),
            mods,
        })
    }

    /// Dispatch a synthetic keyup event with optional modifier flags.
    pub fn dispatch_key_up(&self, key: &str, code: &str, mods: KeyMods) -> usize {
        self.dispatch_key_event(KeyboardEvent {
            kind: KeyEventKind::Up,
            key: key.to_owned(),
            code: code.to_owned(),
            mods,
        })
    }
}
