//! The composition: owner of every runtime object.
//!
//! There is no global registry. A [`Composition`] owns the object arena,
//! the id table, and the document fetcher, and is threaded explicitly
//! through every operation, including into subscriber callbacks, which
//! receive `&mut Composition` and may publish further events, mutate
//! values, or change subscriptions while a publish is in flight.

use std::collections::HashMap;

use slotmap::SlotMap;
use tracing::{debug, warn};

use crate::config::ConfigError;
use crate::error::{CoreError, Result};
use crate::fetch::DocumentFetcher;
use crate::hub::{Callback, EventValue};
use crate::logging::targets;
use crate::object::{ObjectId, RuntimeObject};

/// The object graph built from one configuration document.
pub struct Composition {
    pub(crate) objects: SlotMap<ObjectId, RuntimeObject>,
    pub(crate) ids: HashMap<String, ObjectId>,
    /// Definition (pre-)order over all objects.
    pub(crate) order: Vec<ObjectId>,
    pub(crate) fetcher: Box<dyn DocumentFetcher>,
    next_auto_id: u64,
    pub(crate) next_seq: u64,
}

impl Composition {
    /// Creates an empty composition around a fetcher.
    ///
    /// Usually reached through [`Composition::build`], which populates the
    /// graph from a configuration document.
    pub fn new(fetcher: Box<dyn DocumentFetcher>) -> Self {
        Self {
            objects: SlotMap::with_key(),
            ids: HashMap::new(),
            order: Vec::new(),
            fetcher,
            next_auto_id: 0,
            next_seq: 0,
        }
    }

    /// The object for an id.
    pub fn object(&self, id: ObjectId) -> Result<&RuntimeObject> {
        self.objects.get(id).ok_or(CoreError::InvalidObjectId)
    }

    /// Mutable variant of [`object`](Self::object).
    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut RuntimeObject> {
        self.objects.get_mut(id).ok_or(CoreError::InvalidObjectId)
    }

    /// Resolves a configuration id to its arena key.
    pub fn lookup(&self, name: &str) -> Option<ObjectId> {
        self.ids.get(name).copied()
    }

    /// All object ids in definition order.
    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.order.iter().copied()
    }

    /// Root objects (no parent) in definition order.
    pub fn roots(&self) -> Vec<ObjectId> {
        self.order
            .iter()
            .copied()
            .filter(|&id| self.objects[id].parent.is_none())
            .collect()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the composition holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Allocates an id for an entry that declared none.
    pub(crate) fn auto_id(&mut self) -> String {
        self.next_auto_id += 1;
        format!("carta_obj_{}", self.next_auto_id)
    }

    /// Registers an object, refusing to overwrite an existing id.
    pub(crate) fn register(
        &mut self,
        object: RuntimeObject,
    ) -> std::result::Result<ObjectId, ConfigError> {
        if self.ids.contains_key(&object.id) {
            return Err(ConfigError::DuplicateId(object.id.clone()));
        }
        let name = object.id.clone();
        let id = self.objects.insert(object);
        self.ids.insert(name, id);
        self.order.push(id);
        Ok(id)
    }

    /// Subscribes (callback, target) to `event` on `id`.
    pub fn subscribe(
        &mut self,
        id: ObjectId,
        event: &str,
        callback: Callback,
        target: ObjectId,
    ) -> Result<()> {
        self.object_mut(id)?.hub.subscribe(event, callback, target);
        Ok(())
    }

    /// Subscribes at the head of the list, ahead of earlier registrations.
    pub fn subscribe_first(
        &mut self,
        id: ObjectId,
        event: &str,
        callback: Callback,
        target: ObjectId,
    ) -> Result<()> {
        self.object_mut(id)?
            .hub
            .subscribe_first(event, callback, target);
        Ok(())
    }

    /// Removes a (callback, target) registration.
    pub fn unsubscribe(
        &mut self,
        id: ObjectId,
        event: &str,
        callback: Callback,
        target: ObjectId,
    ) -> Result<()> {
        self.object_mut(id)?.hub.unsubscribe(event, callback, target);
        Ok(())
    }

    /// Publishes `event` on `id` to all current subscribers, in order.
    ///
    /// The subscriber list is snapshotted at entry; registrations changed by
    /// a callback take effect from the next publish. A callback error is
    /// logged and does not stop the remaining subscribers. Zero subscribers
    /// is not an error.
    pub fn publish(&mut self, id: ObjectId, event: &str, value: &EventValue) -> Result<()> {
        let subscribers = self.object(id)?.hub.snapshot(event);
        debug!(
            target: targets::HUB,
            source = %self.objects[id].id,
            event,
            count = subscribers.len(),
            "publish"
        );
        for (callback, target) in subscribers {
            if let Err(err) = callback(self, target, value) {
                let target_id = self
                    .objects
                    .get(target)
                    .map_or_else(|| "<removed>".to_string(), |o| o.id.clone());
                warn!(
                    target: targets::HUB,
                    event,
                    target = %target_id,
                    error = %err,
                    "subscriber failed; continuing with remaining subscribers"
                );
            }
        }
        Ok(())
    }

    /// Stores a keyed value on `id` and publishes an event of the same name.
    pub fn set_value(&mut self, id: ObjectId, name: &str, value: EventValue) -> Result<()> {
        self.object_mut(id)?
            .values
            .insert(name.to_string(), value.clone());
        self.publish(id, name, &value)
    }

    /// Reads a keyed value from `id`.
    pub fn get_value(&self, id: ObjectId, name: &str) -> Result<Option<&EventValue>> {
        Ok(self.object(id)?.value(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::fetch::StaticFetcher;
    use crate::object::{ModelKind, ObjectKind};
    use crate::xml::parse_xml;

    fn empty_composition() -> Composition {
        Composition::new(Box::new(StaticFetcher::new()))
    }

    fn add_object(comp: &mut Composition, id: &str) -> ObjectId {
        let def = Arc::new(parse_xml(&format!("<Context id=\"{id}\"/>")).unwrap().root().clone());
        comp.register(RuntimeObject::new(
            id.to_string(),
            ObjectKind::Model(ModelKind::Context),
            def,
        ))
        .unwrap()
    }

    /// Appends a marker to the target's "log" text value.
    fn append_log(comp: &mut Composition, target: ObjectId, marker: &str) {
        let obj = comp.object_mut(target).unwrap();
        let log = match obj.values.get("log") {
            Some(EventValue::Text(s)) => format!("{s}{marker}"),
            _ => marker.to_string(),
        };
        obj.values.insert("log".to_string(), EventValue::Text(log));
    }

    fn mark_a(comp: &mut Composition, target: ObjectId, _: &EventValue) -> Result<()> {
        append_log(comp, target, "A");
        Ok(())
    }

    fn mark_b(comp: &mut Composition, target: ObjectId, _: &EventValue) -> Result<()> {
        append_log(comp, target, "B");
        Ok(())
    }

    fn mark_c(comp: &mut Composition, target: ObjectId, _: &EventValue) -> Result<()> {
        append_log(comp, target, "C");
        Ok(())
    }

    fn failing(_: &mut Composition, _: ObjectId, _: &EventValue) -> Result<()> {
        Err(CoreError::InvalidObjectId)
    }

    fn subscribing(comp: &mut Composition, target: ObjectId, _: &EventValue) -> Result<()> {
        append_log(comp, target, "S");
        comp.subscribe(target, "ping", mark_a, target)
    }

    fn log_of(comp: &Composition, id: ObjectId) -> String {
        match comp.get_value(id, "log").unwrap() {
            Some(EventValue::Text(s)) => s.clone(),
            _ => String::new(),
        }
    }

    #[test]
    fn test_publish_runs_in_registration_order() {
        let mut comp = empty_composition();
        let id = add_object(&mut comp, "m");
        comp.subscribe(id, "ping", mark_a, id).unwrap();
        comp.subscribe(id, "ping", mark_b, id).unwrap();
        comp.subscribe_first(id, "ping", mark_c, id).unwrap();
        comp.publish(id, "ping", &EventValue::Null).unwrap();
        assert_eq!(log_of(&comp, id), "CAB");
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let mut comp = empty_composition();
        let id = add_object(&mut comp, "m");
        comp.publish(id, "nothing", &EventValue::Null).unwrap();
    }

    #[test]
    fn test_subscriber_error_is_contained() {
        let mut comp = empty_composition();
        let id = add_object(&mut comp, "m");
        comp.subscribe(id, "ping", mark_a, id).unwrap();
        comp.subscribe(id, "ping", failing, id).unwrap();
        comp.subscribe(id, "ping", mark_b, id).unwrap();
        comp.publish(id, "ping", &EventValue::Null).unwrap();
        // The failure in the middle does not stop the tail.
        assert_eq!(log_of(&comp, id), "AB");
    }

    #[test]
    fn test_mid_publish_subscription_takes_effect_next_time() {
        let mut comp = empty_composition();
        let id = add_object(&mut comp, "m");
        comp.subscribe(id, "ping", subscribing, id).unwrap();
        comp.publish(id, "ping", &EventValue::Null).unwrap();
        // mark_a was registered during the publish, so it did not run yet.
        assert_eq!(log_of(&comp, id), "S");
        comp.publish(id, "ping", &EventValue::Null).unwrap();
        assert_eq!(log_of(&comp, id), "SSA");
    }

    #[test]
    fn test_set_value_stores_and_publishes() {
        let mut comp = empty_composition();
        let id = add_object(&mut comp, "m");
        comp.subscribe(id, "hidden", mark_a, id).unwrap();
        comp.set_value(id, "hidden", EventValue::Bool(true)).unwrap();
        assert_eq!(
            comp.get_value(id, "hidden").unwrap(),
            Some(&EventValue::Bool(true))
        );
        assert_eq!(log_of(&comp, id), "A");
    }

    #[test]
    fn test_invalid_id_is_an_error() {
        let mut comp = empty_composition();
        add_object(&mut comp, "m");
        // The null key never names a live object.
        let bogus = ObjectId::default();
        assert!(matches!(
            comp.publish(bogus, "ping", &EventValue::Null),
            Err(CoreError::InvalidObjectId)
        ));
    }
}
