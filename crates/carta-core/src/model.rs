//! Model lifecycle, content-document access, and viewport binding.
//!
//! Loading a model publishes a fixed event sequence on the model object:
//! `"modelStatus"` with [`ModelStatus::Loading`], then `"newModel"`, then,
//! once the fetched document has been swapped in, `"loadModel"` and
//! `"refresh"`. Subscribers to `"loadModel"` always observe the new content
//! document.
//!
//! Every request carries a sequence number. The split entry points
//! [`Composition::begin_load`] and [`Composition::finish_load`] let a host
//! fetch on its own schedule while keeping last-write-wins semantics: a
//! completion whose [`LoadTicket`] is no longer current is discarded.

use carta_geo::{Bounds, Extent, Projection};
use tracing::{debug, error};

use crate::composition::Composition;
use crate::error::{CoreError, EditError, Result};
use crate::fetch::{ContentDocument, FetchError, PayloadKind, TransferMethod};
use crate::hub::{EventValue, PointerEvent};
use crate::logging::targets;
use crate::object::{ModelKind, ModelState, ModelStatus, ObjectId, ObjectKind};
use crate::xml::XmlDocument;

/// Pairs a load completion with the request it answers.
///
/// Issued by [`Composition::begin_load`]; consumed by
/// [`Composition::finish_load`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
}

impl Composition {
    fn model_state(&self, id: ObjectId) -> Result<&ModelState> {
        let object = self.object(id)?;
        object
            .model
            .as_ref()
            .ok_or_else(|| EditError::NotAModel(object.id.clone()).into())
    }

    fn model_state_mut(&mut self, id: ObjectId) -> Result<&mut ModelState> {
        let object = self.objects.get_mut(id).ok_or(CoreError::InvalidObjectId)?;
        let name = object.id.clone();
        object
            .model
            .as_mut()
            .ok_or_else(|| EditError::NotAModel(name).into())
    }

    /// Points the model at a new source, superseding any in-flight load.
    ///
    /// Completions for earlier requests are discarded by
    /// [`finish_load`](Self::finish_load).
    pub fn new_request(
        &mut self,
        id: ObjectId,
        url: impl Into<String>,
        method: TransferMethod,
        body: Option<XmlDocument>,
    ) -> Result<()> {
        self.next_seq += 1;
        let seq = self.next_seq;
        let state = self.model_state_mut(id)?;
        state.source_url = Some(url.into());
        state.method = method;
        state.post_body = body;
        state.seq = seq;
        Ok(())
    }

    /// Starts a load: publishes `"modelStatus"` (loading) and `"newModel"`,
    /// and returns the ticket the completion must present.
    pub fn begin_load(&mut self, id: ObjectId) -> Result<LoadTicket> {
        self.next_seq += 1;
        let seq = self.next_seq;
        let state = self.model_state_mut(id)?;
        state.status = ModelStatus::Loading;
        state.seq = seq;
        self.publish(id, "modelStatus", &EventValue::Status(ModelStatus::Loading))?;
        self.publish(id, "newModel", &EventValue::Null)?;
        Ok(LoadTicket { seq })
    }

    /// Applies a load completion, if its ticket is still current.
    ///
    /// Returns `Ok(false)` for a stale ticket, discarding the result. On
    /// success the content document is swapped in before `"loadModel"` and
    /// `"refresh"` are published. On failure the model returns to idle, no
    /// further event fires, and the error is propagated.
    pub fn finish_load(
        &mut self,
        id: ObjectId,
        ticket: LoadTicket,
        result: std::result::Result<ContentDocument, FetchError>,
    ) -> Result<bool> {
        let current = self.model_state(id)?.seq;
        if ticket.seq != current {
            debug!(
                target: targets::MODEL,
                model = %self.objects[id].id,
                ticket = ticket.seq,
                current,
                "discarding stale load completion"
            );
            return Ok(false);
        }
        match result {
            Ok(mut content) => {
                let state = self.model_state_mut(id)?;
                if let (Some(xml), Some(ns)) =
                    (content.as_xml_mut(), state.namespace.clone())
                {
                    if xml.root().prefix().is_none() {
                        xml.root_mut().set_prefix(Some(ns));
                    }
                }
                state.status = ModelStatus::Loaded;
                self.objects[id].content = Some(content);
                self.publish(id, "loadModel", &EventValue::Null)?;
                self.publish(id, "refresh", &EventValue::Null)?;
                Ok(true)
            }
            Err(err) => {
                self.model_state_mut(id)?.status = ModelStatus::Idle;
                error!(
                    target: targets::MODEL,
                    model = %self.objects[id].id,
                    error = %err,
                    "model load failed"
                );
                Err(err.into())
            }
        }
    }

    /// The declared payload expectation: image models bypass structural
    /// parsing no matter how the server labels the response.
    pub fn payload_kind(&self, id: ObjectId) -> Result<PayloadKind> {
        Ok(match self.object(id)?.kind {
            ObjectKind::Model(ModelKind::Image) => PayloadKind::Image,
            _ => PayloadKind::Document,
        })
    }

    /// Loads the model's source document synchronously.
    ///
    /// A model with no source URL is skipped, so cascaded loads over child
    /// models are safe regardless of their configuration.
    pub fn load_model_doc(&mut self, id: ObjectId) -> Result<()> {
        let state = self.model_state(id)?;
        let Some(url) = state.source_url.clone() else {
            debug!(target: targets::MODEL, model = %self.objects[id].id, "no source url, skipping load");
            return Ok(());
        };
        let method = state.method;
        let body = state.post_body.clone();
        let payload = self.payload_kind(id)?;

        let ticket = self.begin_load(id)?;
        let result = self.fetcher.fetch(&url, method, body.as_ref(), payload);
        self.finish_load(id, ticket, result).map(|_| ())
    }

    /// Sets the text of the first node at `path` in the content document.
    ///
    /// Returns `true` and publishes `"refresh"` when the path matched;
    /// returns `false` and publishes nothing when it did not.
    pub fn set_node_value(&mut self, id: ObjectId, path: &str, value: &str) -> Result<bool> {
        let object = self.objects.get_mut(id).ok_or(CoreError::InvalidObjectId)?;
        let name = object.id.clone();
        if object.model.is_none() {
            return Err(EditError::NotAModel(name).into());
        }
        let content = object
            .content
            .as_mut()
            .ok_or_else(|| EditError::NoContent(name.clone()))?;
        let xml = content
            .as_xml_mut()
            .ok_or(EditError::NotStructured(name))?;
        match xml.get_mut(path) {
            Some(element) => {
                element.set_text(value);
                if let Some(state) = object.model.as_mut() {
                    state.status = ModelStatus::Edited;
                }
                self.publish(id, "refresh", &EventValue::Null)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn content_xml(&self, id: ObjectId) -> Result<&XmlDocument> {
        let object = self.object(id)?;
        if object.model.is_none() {
            return Err(EditError::NotAModel(object.id.clone()).into());
        }
        let content = object
            .content
            .as_ref()
            .ok_or_else(|| EditError::NoContent(object.id.clone()))?;
        content
            .as_xml()
            .ok_or_else(|| EditError::NotStructured(object.id.clone()).into())
    }

    /// The first `BoundingBox` element's window, if the document has one
    /// with parseable `minx`/`miny`/`maxx`/`maxy` attributes.
    pub fn bounding_box(&self, id: ObjectId) -> Result<Option<Bounds>> {
        let doc = self.content_xml(id)?;
        let Some(bb) = doc.find_first("BoundingBox") else {
            return Ok(None);
        };
        let coord = |name: &str| bb.attribute(name).and_then(|v| v.parse::<f64>().ok());
        let (Some(min_x), Some(min_y), Some(max_x), Some(max_y)) =
            (coord("minx"), coord("miny"), coord("maxx"), coord("maxy"))
        else {
            return Ok(None);
        };
        Ok(Some(Bounds::new(min_x, min_y, max_x, max_y)))
    }

    /// The spatial reference declared on the first `BoundingBox` element.
    pub fn srs(&self, id: ObjectId) -> Result<Option<String>> {
        Ok(self
            .content_xml(id)?
            .find_first("BoundingBox")
            .and_then(|bb| bb.attribute("SRS"))
            .map(str::to_string))
    }

    /// The `width`/`height` of the document's first `Window` element.
    pub fn window_size(&self, id: ObjectId) -> Result<Option<[f64; 2]>> {
        let doc = self.content_xml(id)?;
        let Some(window) = doc.find_first("Window") else {
            return Ok(None);
        };
        let dim = |name: &str| window.attribute(name).and_then(|v| v.parse::<f64>().ok());
        match (dim("width"), dim("height")) {
            (Some(w), Some(h)) => Ok(Some([w, h])),
            _ => Ok(None),
        }
    }

    /// Writes a bounding box into the content document.
    ///
    /// Publishes `"refresh"` and returns `true` when a `BoundingBox`
    /// element was present; returns `false` and publishes nothing when the
    /// document has none.
    pub fn set_bounding_box(&mut self, id: ObjectId, bounds: Bounds) -> Result<bool> {
        let object = self.objects.get_mut(id).ok_or(CoreError::InvalidObjectId)?;
        let updated = object
            .content
            .as_mut()
            .and_then(ContentDocument::as_xml_mut)
            .and_then(|xml| xml.find_first_mut("BoundingBox"))
            .map(|bb| {
                bb.set_attribute("minx", bounds.min_x.to_string());
                bb.set_attribute("miny", bounds.min_y.to_string());
                bb.set_attribute("maxx", bounds.max_x.to_string());
                bb.set_attribute("maxy", bounds.max_y.to_string());
            })
            .is_some();
        if updated {
            self.publish(id, "refresh", &EventValue::Null)?;
        }
        Ok(updated)
    }

    /// Creates the model's viewport extent from its current bounding box.
    ///
    /// The extent's spatial reference comes from the bounding box `SRS`
    /// (geographic when absent). The extent re-initializes automatically on
    /// every subsequent `"loadModel"`, keeping the pixel size.
    pub fn attach_viewport(
        &mut self,
        id: ObjectId,
        window: [f64; 2],
        resolution: Option<f64>,
    ) -> Result<()> {
        let bounds = self
            .bounding_box(id)?
            .ok_or_else(|| EditError::NoContent(self.objects[id].id.clone()))?;
        let srs = self
            .srs(id)?
            .unwrap_or_else(|| "EPSG:4326".to_string());
        let projection = Projection::for_srs(&srs)?;
        let mut extent = Extent::new(projection);
        extent.init(bounds, window, resolution);
        self.model_state_mut(id)?.extent = Some(extent);
        self.subscribe(id, "loadModel", on_model_reloaded, id)
    }

    /// Recomputes the extent's resolution for new viewport dimensions.
    pub fn resize_viewport(&mut self, id: ObjectId, window: [f64; 2]) -> Result<()> {
        self.extent_mut(id)?.set_resolution(window);
        Ok(())
    }

    /// The model's viewport extent, once attached.
    pub fn extent(&self, id: ObjectId) -> Result<Option<&Extent>> {
        Ok(self.model_state(id)?.extent.as_ref())
    }

    fn extent_mut(&mut self, id: ObjectId) -> Result<&mut Extent> {
        let name = self.object(id)?.id.clone();
        let state = self.model_state_mut(id)?;
        state
            .extent
            .as_mut()
            .ok_or_else(|| EditError::NoViewport(name).into())
    }

    /// Re-centers the viewport and writes the new box back to the document.
    pub fn center_at(&mut self, id: ObjectId, center: [f64; 2], resolution: f64) -> Result<()> {
        let window = self.extent_mut(id)?.center_at(center, resolution, None);
        self.set_bounding_box(id, window).map(|_| ())
    }

    /// Zooms the viewport to a box and writes the result to the document.
    pub fn zoom_to_box(&mut self, id: ObjectId, ul: [f64; 2], lr: [f64; 2]) -> Result<()> {
        let window = self.extent_mut(id)?.zoom_to_box(ul, lr);
        self.set_bounding_box(id, window).map(|_| ())
    }

    /// Current map-scale denominator of the viewport.
    pub fn get_scale(&self, id: ObjectId) -> Result<f64> {
        let name = self.object(id)?.id.clone();
        match self.model_state(id)?.extent.as_ref() {
            Some(extent) => Ok(extent.get_scale()),
            None => Err(EditError::NoViewport(name).into()),
        }
    }

    /// Sets the map scale and writes the new box back to the document.
    pub fn set_scale(&mut self, id: ObjectId, scale: f64) -> Result<()> {
        let window = self.extent_mut(id)?.set_scale(scale);
        self.set_bounding_box(id, window).map(|_| ())
    }

    /// The single host input entry point: stores and publishes the pointer
    /// event under its kind's name (`"mousedown"`, `"mousemove"`, …).
    pub fn pointer_event(&mut self, id: ObjectId, event: PointerEvent) -> Result<()> {
        self.set_value(id, event.kind.event_name(), EventValue::Pointer(event))
    }
}

/// Re-initializes the viewport from the freshly loaded document.
fn on_model_reloaded(comp: &mut Composition, target: ObjectId, _: &EventValue) -> Result<()> {
    let Some(bounds) = comp.bounding_box(target)? else {
        return Ok(());
    };
    let state = comp.model_state_mut(target)?;
    if let Some(extent) = state.extent.as_mut() {
        let window = extent.size();
        extent.init(bounds, window, None);
    }
    Ok(())
}
