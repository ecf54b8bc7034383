//! Runtime objects and their identifiers.
//!
//! Every entry in the configuration document becomes one [`RuntimeObject`]
//! in the composition's arena: a model holding a fetched content document, a
//! widget presenting some model, or a tool translating input into model
//! edits. Objects are addressed by [`ObjectId`] arena keys; the string ids
//! from the configuration resolve through the composition's id table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use carta_geo::Extent;
use slotmap::new_key_type;

use crate::fetch::{ContentDocument, TransferMethod};
use crate::hub::{EventHub, EventValue};
use crate::xml::{XmlDocument, XmlElement};

new_key_type! {
    /// Arena key identifying a runtime object within its composition.
    pub struct ObjectId;
}

/// The closed set of runtime object categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    /// Holds a content document and a lifecycle.
    Model(ModelKind),
    /// Presents a model.
    Widget(WidgetKind),
    /// Translates user interaction into model edits.
    Tool(ToolKind),
}

impl ObjectKind {
    /// Whether this object carries model state.
    pub fn is_model(self) -> bool {
        matches!(self, Self::Model(_))
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model(k) => write!(f, "{k:?} model"),
            Self::Widget(k) => write!(f, "{k:?} widget"),
            Self::Tool(k) => write!(f, "{k:?} tool"),
        }
    }
}

/// Model flavors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelKind {
    /// A map context document listing layers and a view window.
    Context,
    /// A feature collection document.
    FeatureCollection,
    /// An opaque image source.
    Image,
}

/// Widget flavors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidgetKind {
    /// The main map viewport.
    MapPane,
    /// A layer legend.
    Legend,
    /// A status readout (coordinates, scale).
    MapStatus,
}

/// Tool flavors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolKind {
    /// Area-of-interest drag handling.
    AoiHandler,
    /// Feature editing.
    EditTool,
}

/// Model lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelStatus {
    /// No load has happened or the last one failed.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The content document is current.
    Loaded,
    /// The content document has local edits.
    Edited,
}

/// Per-model state: source request, lifecycle status, viewport extent.
#[derive(Debug)]
pub struct ModelState {
    pub(crate) status: ModelStatus,
    pub(crate) source_url: Option<String>,
    pub(crate) method: TransferMethod,
    pub(crate) post_body: Option<XmlDocument>,
    pub(crate) namespace: Option<String>,
    /// Sequence number of the most recent request; stale completions
    /// carrying an older number are discarded.
    pub(crate) seq: u64,
    pub(crate) extent: Option<Extent>,
}

impl ModelState {
    pub(crate) fn new(
        source_url: Option<String>,
        method: TransferMethod,
        namespace: Option<String>,
    ) -> Self {
        Self {
            status: ModelStatus::Idle,
            source_url,
            method,
            post_body: None,
            namespace,
            seq: 0,
            extent: None,
        }
    }

    /// Current lifecycle status.
    pub fn status(&self) -> ModelStatus {
        self.status
    }

    /// The configured or most recently requested source URL.
    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    /// The viewport extent, once attached.
    pub fn extent(&self) -> Option<&Extent> {
        self.extent.as_ref()
    }
}

/// One object in the composition graph.
#[derive(Debug)]
pub struct RuntimeObject {
    pub(crate) id: String,
    pub(crate) kind: ObjectKind,
    pub(crate) parent: Option<ObjectId>,
    pub(crate) children: Vec<ObjectId>,
    /// The configuration element this object was built from.
    pub(crate) def: Arc<XmlElement>,
    pub(crate) hub: EventHub,
    pub(crate) values: HashMap<String, EventValue>,
    pub(crate) content: Option<ContentDocument>,
    pub(crate) model: Option<ModelState>,
    /// Unresolved `targetModel` parameter, resolved at init.
    pub(crate) target_model_name: Option<String>,
    pub(crate) target_model: Option<ObjectId>,
    /// Unresolved `mouseHandler` parameter, resolved at init.
    pub(crate) mouse_handler_name: Option<String>,
    pub(crate) mouse_handler: Option<ObjectId>,
}

impl RuntimeObject {
    pub(crate) fn new(id: String, kind: ObjectKind, def: Arc<XmlElement>) -> Self {
        let param = |name: &str| def.child(name).map(|el| el.text());
        let model = match kind {
            ObjectKind::Model(_) => Some(ModelState::new(
                param("url"),
                TransferMethod::from_param(param("method").as_deref()),
                param("namespace"),
            )),
            ObjectKind::Widget(_) | ObjectKind::Tool(_) => None,
        };
        Self {
            id,
            kind,
            parent: None,
            children: Vec::new(),
            target_model_name: param("targetModel"),
            target_model: None,
            mouse_handler_name: param("mouseHandler"),
            mouse_handler: None,
            def,
            hub: EventHub::new(),
            values: HashMap::new(),
            content: None,
            model,
        }
    }

    /// The configuration id (explicit or auto-generated).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The object's category.
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Parent in the definition tree, if any.
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Children in definition order.
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    /// The configuration element this object was built from.
    pub fn def(&self) -> &XmlElement {
        &self.def
    }

    /// The `title` parameter, if configured.
    pub fn title(&self) -> Option<String> {
        self.def.child("title").map(|el| el.text())
    }

    /// The `nodeSelectXpath` parameter: the content-document path an edit
    /// tool targets with `set_node_value`.
    pub fn node_select_path(&self) -> Option<String> {
        self.def.child("nodeSelectXpath").map(|el| el.text())
    }

    /// The model's content document, once loaded.
    pub fn content(&self) -> Option<&ContentDocument> {
        self.content.as_ref()
    }

    /// Model state, for model objects.
    pub fn model(&self) -> Option<&ModelState> {
        self.model.as_ref()
    }

    /// The resolved `targetModel` reference, after init.
    pub fn target_model(&self) -> Option<ObjectId> {
        self.target_model
    }

    /// The resolved `mouseHandler` reference, after init.
    pub fn mouse_handler(&self) -> Option<ObjectId> {
        self.mouse_handler
    }

    /// A keyed value previously stored with `set_value`.
    pub fn value(&self, name: &str) -> Option<&EventValue> {
        self.values.get(name)
    }
}
