//! Core runtime for Carta.
//!
//! Carta is a declarative, configuration-driven runtime for composing
//! interactive map-viewing widgets. This crate provides its foundations:
//!
//! - **Configuration**: a single XML document describing a tree of model,
//!   widget and tool objects
//! - **Composition**: the owner of every runtime object; no global state
//! - **Event Hub**: per-object publish/subscribe with snapshot dispatch
//! - **Model Lifecycle**: ordered load events with stale-response guarding
//! - **Fetching**: pluggable content-document transport
//! - **Viewport**: pixel ↔ projection extents bound to model documents
//!
//! # Example
//!
//! ```no_run
//! use carta_core::{Composition, ConfigDocument, HttpFetcher, NoopLoader, TypeRegistry};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigDocument::parse(
//!         r#"<composition>
//!             <models>
//!                 <Context id="mainMap">
//!                     <url>http://example.com/context.xml</url>
//!                 </Context>
//!             </models>
//!             <widgets>
//!                 <MapPane id="pane"><targetModel>mainMap</targetModel></MapPane>
//!             </widgets>
//!         </composition>"#,
//!     )?;
//!
//!     let fetcher = Box::new(HttpFetcher::new()?);
//!     let (mut comp, diagnostics) =
//!         Composition::build(&config, &TypeRegistry::default(), &mut NoopLoader, fetcher);
//!     for diag in &diagnostics {
//!         eprintln!("config: {diag}");
//!     }
//!
//!     comp.init();
//!     let main_map = comp.lookup("mainMap").unwrap();
//!     comp.load_model_doc(main_map)?;
//!     comp.attach_viewport(main_map, [800.0, 600.0], None)?;
//!     Ok(())
//! }
//! ```

mod builder;
mod composition;
mod config;
mod error;
mod fetch;
mod hub;
pub mod logging;
mod model;
mod object;
pub mod xml;

pub use builder::{ModuleLoader, NoopLoader, TypeRegistry};
pub use composition::Composition;
pub use config::{ConfigDocument, ConfigError};
pub use error::{CoreError, EditError, Result};
pub use fetch::{
    ContentDocument, DocumentFetcher, FetchError, HttpFetcher, PayloadKind, StaticFetcher,
    TransferMethod,
};
pub use hub::{Callback, EventHub, EventValue, Modifiers, PointerEvent, PointerKind};
pub use model::LoadTicket;
pub use object::{
    ModelKind, ModelState, ModelStatus, ObjectId, ObjectKind, RuntimeObject, ToolKind, WidgetKind,
};
pub use xml::{parse_xml, XmlDocument, XmlElement, XmlError, XmlNode};
