//! Per-object publish/subscribe event tables.
//!
//! Every runtime object carries an [`EventHub`]: a map from event name to an
//! ordered list of (callback, target) registrations. Publishing is driven
//! from [`Composition::publish`](crate::composition::Composition::publish),
//! which snapshots the registration list before invoking anything, so
//! callbacks are free to subscribe and unsubscribe while a publish is in
//! flight.
//!
//! Callbacks are plain function pointers. Pointer identity is what makes a
//! (callback, target) pair unique: registering the same pair twice keeps a
//! single registration.

use std::collections::HashMap;

use carta_geo::Bounds;

use crate::error::CoreError;
use crate::composition::Composition;
use crate::object::{ModelStatus, ObjectId};

/// A subscriber callback, invoked with the target it was registered for.
pub type Callback = fn(&mut Composition, ObjectId, &EventValue) -> Result<(), CoreError>;

/// The payload carried by a published event or a keyed value.
#[derive(Clone, Debug, PartialEq)]
pub enum EventValue {
    /// No payload.
    Null,
    /// A boolean flag, e.g. the `hidden` value.
    Bool(bool),
    /// An integer payload.
    Integer(i64),
    /// A floating-point payload.
    Float(f64),
    /// A text payload.
    Text(String),
    /// A projection or geographic coordinate pair.
    Position([f64; 2]),
    /// A geographic window.
    Bounds(Bounds),
    /// A model lifecycle status.
    Status(ModelStatus),
    /// A normalized pointer event.
    Pointer(PointerEvent),
}

/// Pointer event kinds, named after the values they publish under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    /// Button press.
    Down,
    /// Pointer motion.
    Move,
    /// Button release.
    Up,
    /// Pointer entered the viewport.
    Over,
    /// Pointer left the viewport.
    Out,
}

impl PointerKind {
    /// The event name this kind publishes under.
    pub fn event_name(self) -> &'static str {
        match self {
            Self::Down => "mousedown",
            Self::Move => "mousemove",
            Self::Up => "mouseup",
            Self::Over => "mouseover",
            Self::Out => "mouseout",
        }
    }
}

/// Keyboard modifier state accompanying a pointer event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

/// A normalized host pointer event in viewport pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerEvent {
    /// Pixel/line position, origin at the viewport's top-left.
    pub pixel: [i64; 2],
    /// What happened.
    pub kind: PointerKind,
    /// Kind of document element under the pointer, when the host knows it.
    pub element_kind: Option<String>,
    /// Modifier keys held at the time.
    pub modifiers: Modifiers,
}

/// The subscriber table of a single runtime object.
#[derive(Debug, Default)]
pub struct EventHub {
    listeners: HashMap<String, Vec<(Callback, ObjectId)>>,
}

impl EventHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (callback, target) at the end of the list for `event`.
    ///
    /// If the pair is already registered, the old entry is removed first,
    /// so re-subscribing moves the pair to the end without duplicating it.
    pub fn subscribe(&mut self, event: &str, callback: Callback, target: ObjectId) {
        let list = self.listeners.entry(event.to_string()).or_default();
        list.retain(|&(cb, t)| !(cb == callback && t == target));
        list.push((callback, target));
    }

    /// Registers (callback, target) at the head of the list for `event`.
    ///
    /// Same uniqueness rule as [`subscribe`](Self::subscribe); the pair ends
    /// up first regardless of any prior position.
    pub fn subscribe_first(&mut self, event: &str, callback: Callback, target: ObjectId) {
        let list = self.listeners.entry(event.to_string()).or_default();
        list.retain(|&(cb, t)| !(cb == callback && t == target));
        list.insert(0, (callback, target));
    }

    /// Removes the (callback, target) registration. No-op if absent.
    pub fn unsubscribe(&mut self, event: &str, callback: Callback, target: ObjectId) {
        if let Some(list) = self.listeners.get_mut(event) {
            list.retain(|&(cb, t)| !(cb == callback && t == target));
        }
    }

    /// The registrations for `event` at this instant, in dispatch order.
    pub fn snapshot(&self, event: &str) -> Vec<(Callback, ObjectId)> {
        self.listeners.get(event).cloned().unwrap_or_default()
    }

    /// Number of registrations for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<ObjectId> {
        let mut arena: SlotMap<ObjectId, ()> = SlotMap::with_key();
        (0..n).map(|_| arena.insert(())).collect()
    }

    fn cb_a(_: &mut Composition, _: ObjectId, _: &EventValue) -> Result<(), CoreError> {
        Ok(())
    }

    fn cb_b(_: &mut Composition, _: ObjectId, _: &EventValue) -> Result<(), CoreError> {
        Ok(())
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let ids = ids(1);
        let mut hub = EventHub::new();
        hub.subscribe("refresh", cb_a, ids[0]);
        hub.subscribe("refresh", cb_a, ids[0]);
        assert_eq!(hub.listener_count("refresh"), 1);
    }

    #[test]
    fn test_dispatch_order_and_priority() {
        let ids = ids(4);
        let mut hub = EventHub::new();
        hub.subscribe("init", cb_a, ids[0]);
        hub.subscribe("init", cb_a, ids[1]);
        hub.subscribe("init", cb_b, ids[2]);
        hub.subscribe_first("init", cb_b, ids[3]);
        let order: Vec<ObjectId> = hub.snapshot("init").iter().map(|&(_, t)| t).collect();
        assert_eq!(order, vec![ids[3], ids[0], ids[1], ids[2]]);
    }

    #[test]
    fn test_same_callback_different_targets() {
        let ids = ids(2);
        let mut hub = EventHub::new();
        hub.subscribe("refresh", cb_a, ids[0]);
        hub.subscribe("refresh", cb_a, ids[1]);
        assert_eq!(hub.listener_count("refresh"), 2);
    }

    #[test]
    fn test_unsubscribe() {
        let ids = ids(2);
        let mut hub = EventHub::new();
        hub.subscribe("refresh", cb_a, ids[0]);
        hub.subscribe("refresh", cb_b, ids[1]);
        hub.unsubscribe("refresh", cb_a, ids[0]);
        assert_eq!(hub.listener_count("refresh"), 1);
        // Removing an absent pair is a no-op.
        hub.unsubscribe("refresh", cb_a, ids[0]);
        hub.unsubscribe("missing", cb_a, ids[0]);
        assert_eq!(hub.listener_count("refresh"), 1);
    }

    #[test]
    fn test_resubscribe_moves_to_end() {
        let ids = ids(2);
        let mut hub = EventHub::new();
        hub.subscribe("init", cb_a, ids[0]);
        hub.subscribe("init", cb_b, ids[1]);
        hub.subscribe("init", cb_a, ids[0]);
        let order: Vec<ObjectId> = hub.snapshot("init").iter().map(|&(_, t)| t).collect();
        assert_eq!(order, vec![ids[1], ids[0]]);
        assert_eq!(hub.listener_count("init"), 2);
    }

    #[test]
    fn test_snapshot_of_unknown_event_is_empty() {
        let hub = EventHub::new();
        assert!(hub.snapshot("nothing").is_empty());
    }
}
