//! # Input Events
//!
//! The channel from the renderer back to the simulation. Delivery must
//! never block the render side, so the silo is backed by an unbounded
//! lock-free channel: the renderer pushes, the simulation thread polls
//! whenever it feels like it.
//!
//! A [`InputListener`] sees events in registration order until one
//! consumes the event. [`InputSilo`] is the "just queue everything"
//! listener most simulations want.

use crossbeam_channel::{unbounded, Receiver, Sender};

/// Modifier-key flags accompanying a key press.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyModifiers(pub u8);

impl KeyModifiers {
    /// No modifiers held.
    pub const NONE: Self = Self(0);
    /// Shift was down.
    pub const SHIFT: Self = Self(0x01);
    /// Control was down.
    pub const CONTROL: Self = Self(0x02);
    /// Alt was down.
    pub const ALT: Self = Self(0x04);

    /// Whether all flags in `other` are set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two flag sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// A user-driven event reported by the renderer.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// A key was hit in the render window.
    KeyPressed {
        /// Key code as reported by the renderer.
        key: u32,
        /// Modifier keys held at the time.
        modifiers: KeyModifiers,
    },
    /// A menu item was picked.
    MenuSelected {
        /// Id of the menu the item belongs to.
        menu: i32,
        /// Id of the picked item.
        item: i32,
    },
    /// A slider was moved by the user.
    SliderMoved {
        /// Slider id.
        slider: i32,
        /// New slider value.
        value: f64,
    },
}

/// Receives user events as they arrive from the renderer.
///
/// Returning `true` consumes the event and stops propagation to later
/// listeners. Implementations must not block: they run on the delivery
/// path.
pub trait InputListener: Send {
    /// Handles one event; returns whether it was consumed.
    fn handle(&mut self, event: &InputEvent) -> bool;
}

/// An [`InputListener`] that captures and queues every event.
///
/// Clone it before registering; all clones share one queue, so the
/// simulation keeps a clone to poll while the scheduler owns the
/// registered one.
#[derive(Clone, Debug)]
pub struct InputSilo {
    tx: Sender<InputEvent>,
    rx: Receiver<InputEvent>,
}

impl InputSilo {
    /// Creates an empty silo.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Takes the oldest queued event, if any.
    #[must_use]
    pub fn pop(&self) -> Option<InputEvent> {
        self.rx.try_recv().ok()
    }

    /// Blocks until an event arrives, then takes it.
    #[must_use]
    pub fn wait(&self) -> InputEvent {
        // Both channel ends live in every clone, so recv cannot disconnect.
        self.rx.recv().expect("input silo channel disconnected")
    }

    /// Takes every queued event.
    #[must_use]
    pub fn drain(&self) -> Vec<InputEvent> {
        self.rx.try_iter().collect()
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for InputSilo {
    fn default() -> Self {
        Self::new()
    }
}

impl InputListener for InputSilo {
    fn handle(&mut self, event: &InputEvent) -> bool {
        // Unbounded channel: send never blocks.
        let _ = self.tx.send(event.clone());
        true
    }
}
