//! Graph construction from the configuration document.
//!
//! Building walks the configuration's entry groups, resolves each tag
//! through the [`TypeRegistry`], and registers one [`RuntimeObject`] per
//! entry. Wiring happens as objects are created: every child subscribes to
//! its parent's `"init"` event, and model children of models follow their
//! parent's `"loadModel"`, so loading a context document cascades into its
//! dependent models.
//!
//! Configuration errors are fatal to the affected object only. Sibling
//! construction continues, and all diagnostics come back alongside the
//! composition.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::composition::Composition;
use crate::config::{entries, ConfigDocument, ConfigError};
use crate::error::{CoreError, Result};
use crate::fetch::DocumentFetcher;
use crate::hub::EventValue;
use crate::logging::targets;
use crate::object::{ModelKind, ObjectId, ObjectKind, RuntimeObject, ToolKind, WidgetKind};
use crate::xml::XmlElement;

/// Maps configuration entry tags to runtime object kinds.
///
/// Starts with the built-in tags; hosts may register more against the
/// existing kinds.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    tags: HashMap<String, ObjectKind>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        let mut registry = Self {
            tags: HashMap::new(),
        };
        registry.register("Context", ObjectKind::Model(ModelKind::Context));
        registry.register(
            "FeatureCollection",
            ObjectKind::Model(ModelKind::FeatureCollection),
        );
        registry.register("ImageModel", ObjectKind::Model(ModelKind::Image));
        registry.register("MapPane", ObjectKind::Widget(WidgetKind::MapPane));
        registry.register("Legend", ObjectKind::Widget(WidgetKind::Legend));
        registry.register("MapStatus", ObjectKind::Widget(WidgetKind::MapStatus));
        registry.register("AoiHandler", ObjectKind::Tool(ToolKind::AoiHandler));
        registry.register("EditTool", ObjectKind::Tool(ToolKind::EditTool));
        registry
    }
}

impl TypeRegistry {
    /// An empty registry with no known tags.
    pub fn empty() -> Self {
        Self {
            tags: HashMap::new(),
        }
    }

    /// Registers (or overrides) a tag.
    pub fn register(&mut self, tag: impl Into<String>, kind: ObjectKind) {
        self.tags.insert(tag.into(), kind);
    }

    /// The kind for a tag, if registered.
    pub fn resolve(&self, tag: &str) -> Option<ObjectKind> {
        self.tags.get(tag).copied()
    }
}

/// Prepares host-side resources for an entry tag before its object is
/// constructed. Called once per entry; implementations must be idempotent.
pub trait ModuleLoader {
    fn ensure_loaded(&mut self, tag: &str) -> std::result::Result<(), ConfigError>;
}

/// A loader for hosts with nothing to prepare.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLoader;

impl ModuleLoader for NoopLoader {
    fn ensure_loaded(&mut self, _tag: &str) -> std::result::Result<(), ConfigError> {
        Ok(())
    }
}

impl Composition {
    /// Builds the object graph from a parsed configuration.
    ///
    /// Returns the composition together with the diagnostics for every
    /// entry that could not be constructed.
    pub fn build(
        config: &ConfigDocument,
        registry: &TypeRegistry,
        loader: &mut dyn ModuleLoader,
        fetcher: Box<dyn DocumentFetcher>,
    ) -> (Self, Vec<ConfigError>) {
        let mut comp = Self::new(fetcher);
        let mut diagnostics = Vec::new();
        for def in entries(config.root()) {
            build_object(&mut comp, registry, loader, def, None, &mut diagnostics);
        }
        debug!(
            target: targets::BUILDER,
            objects = comp.len(),
            diagnostics = diagnostics.len(),
            "composition built"
        );
        (comp, diagnostics)
    }

    /// Publishes `"init"` on every root in definition order.
    ///
    /// Children follow through their parent-init subscription, so the
    /// whole graph initializes in pre-order. Named references that do not
    /// resolve are returned as diagnostics for the roots and logged for
    /// nested objects; they never abort initialization.
    pub fn init(&mut self) -> Vec<ConfigError> {
        let mut diagnostics = Vec::new();
        for root in self.roots() {
            if let Err(CoreError::Config(err)) = self.resolve_references(root) {
                warn!(target: targets::BUILDER, error = %err, "unresolved reference");
                diagnostics.push(err);
            }
            // Roots are live by construction.
            let _ = self.publish(root, "init", &EventValue::Null);
        }
        diagnostics
    }

    /// Resolves the late-bound `targetModel` and `mouseHandler` names.
    pub(crate) fn resolve_references(&mut self, id: ObjectId) -> Result<()> {
        let object = self.object(id)?;
        let from = object.id.clone();
        let target_name = object.target_model_name.clone();
        let handler_name = object.mouse_handler_name.clone();

        let mut first_miss = None;
        if let Some(name) = target_name {
            match self.lookup(&name) {
                Some(resolved) => self.objects[id].target_model = Some(resolved),
                None => {
                    first_miss = Some(ConfigError::UnknownReference {
                        from: from.clone(),
                        name,
                    })
                }
            }
        }
        if let Some(name) = handler_name {
            match self.lookup(&name) {
                Some(resolved) => self.objects[id].mouse_handler = Some(resolved),
                None => {
                    first_miss
                        .get_or_insert(ConfigError::UnknownReference { from, name });
                }
            }
        }
        match first_miss {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

/// Constructs one entry and recurses into its nested groups.
fn build_object(
    comp: &mut Composition,
    registry: &TypeRegistry,
    loader: &mut dyn ModuleLoader,
    def: &XmlElement,
    parent: Option<ObjectId>,
    diagnostics: &mut Vec<ConfigError>,
) {
    let tag = def.name();
    if let Err(err) = loader.ensure_loaded(tag) {
        diagnostics.push(err);
        return;
    }
    let Some(kind) = registry.resolve(tag) else {
        diagnostics.push(ConfigError::UnknownTag(tag.to_string()));
        return;
    };

    let id_string = match def.attribute("id") {
        Some(explicit) => explicit.to_string(),
        None => comp.auto_id(),
    };
    let object = RuntimeObject::new(id_string, kind, Arc::new(def.clone()));
    let id = match comp.register(object) {
        Ok(id) => id,
        Err(err) => {
            diagnostics.push(err);
            return;
        }
    };
    debug!(target: targets::BUILDER, id = %comp.objects[id].id, kind = %kind, "object registered");

    if let Some(parent_id) = parent {
        comp.objects[id].parent = Some(parent_id);
        comp.objects[parent_id].children.push(id);
        // Children initialize right after their parent.
        let _ = comp.subscribe(parent_id, "init", on_parent_init, id);
        // A model nested in a model reloads whenever the parent does.
        if kind.is_model() && comp.objects[parent_id].kind.is_model() {
            let _ = comp.subscribe(parent_id, "loadModel", on_parent_load, id);
        }
    }

    for child_def in entries(def) {
        build_object(comp, registry, loader, child_def, Some(id), diagnostics);
    }
}

/// Resolves the child's references, then initializes it.
fn on_parent_init(comp: &mut Composition, target: ObjectId, value: &EventValue) -> Result<()> {
    let resolution = comp.resolve_references(target);
    comp.publish(target, "init", value)?;
    resolution
}

/// Cascades a parent model load into a dependent child model.
fn on_parent_load(comp: &mut Composition, target: ObjectId, _: &EventValue) -> Result<()> {
    comp.load_model_doc(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticFetcher;

    fn build(source: &str) -> (Composition, Vec<ConfigError>) {
        build_with_fetcher(source, StaticFetcher::new())
    }

    fn build_with_fetcher(
        source: &str,
        fetcher: StaticFetcher,
    ) -> (Composition, Vec<ConfigError>) {
        let config = ConfigDocument::parse(source).unwrap();
        Composition::build(
            &config,
            &TypeRegistry::default(),
            &mut NoopLoader,
            Box::new(fetcher),
        )
    }

    #[test]
    fn test_build_registers_nested_objects_in_preorder() {
        let (comp, diags) = build(
            r#"<composition>
                <models>
                    <Context id="mainMap">
                        <widgets><MapPane id="pane"/></widgets>
                    </Context>
                </models>
                <tools><AoiHandler id="aoi"/></tools>
            </composition>"#,
        );
        assert!(diags.is_empty());
        let ids: Vec<&str> = comp
            .object_ids()
            .map(|id| comp.object(id).unwrap().id())
            .collect();
        assert_eq!(ids, vec!["mainMap", "pane", "aoi"]);

        let main = comp.lookup("mainMap").unwrap();
        let pane = comp.lookup("pane").unwrap();
        assert_eq!(comp.object(pane).unwrap().parent(), Some(main));
        assert_eq!(comp.object(main).unwrap().children(), &[pane]);
    }

    #[test]
    fn test_duplicate_id_keeps_first_entry() {
        let (comp, diags) = build(
            r#"<composition>
                <models>
                    <Context id="map"><url>http://one</url></Context>
                    <Context id="map"><url>http://two</url></Context>
                    <Context id="other"/>
                </models>
            </composition>"#,
        );
        assert_eq!(diags, vec![ConfigError::DuplicateId("map".to_string())]);
        // The first definition wins and the sibling after the clash exists.
        let map = comp.lookup("map").unwrap();
        assert_eq!(
            comp.object(map).unwrap().model().unwrap().source_url(),
            Some("http://one")
        );
        assert!(comp.lookup("other").is_some());
        assert_eq!(comp.len(), 2);
    }

    #[test]
    fn test_unknown_tag_is_isolated() {
        let (comp, diags) = build(
            r#"<composition>
                <widgets>
                    <Gizmo id="bad"/>
                    <MapPane id="pane"/>
                </widgets>
            </composition>"#,
        );
        assert_eq!(diags, vec![ConfigError::UnknownTag("Gizmo".to_string())]);
        assert!(comp.lookup("pane").is_some());
    }

    #[test]
    fn test_auto_ids_for_anonymous_entries() {
        let (comp, diags) = build(
            r#"<composition>
                <widgets><Legend/><Legend/></widgets>
            </composition>"#,
        );
        assert!(diags.is_empty());
        assert!(comp.lookup("carta_obj_1").is_some());
        assert!(comp.lookup("carta_obj_2").is_some());
    }

    #[test]
    fn test_init_resolves_references_preorder() {
        let (mut comp, _) = build(
            r#"<composition>
                <models><Context id="mainMap"/></models>
                <widgets>
                    <MapPane id="pane"><targetModel>mainMap</targetModel></MapPane>
                </widgets>
                <tools>
                    <AoiHandler id="aoi">
                        <targetModel>mainMap</targetModel>
                        <mouseHandler>pane</mouseHandler>
                    </AoiHandler>
                </tools>
            </composition>"#,
        );
        let diags = comp.init();
        assert!(diags.is_empty());
        let main = comp.lookup("mainMap").unwrap();
        let pane = comp.lookup("pane").unwrap();
        let aoi = comp.lookup("aoi").unwrap();
        assert_eq!(comp.object(pane).unwrap().target_model(), Some(main));
        assert_eq!(comp.object(aoi).unwrap().target_model(), Some(main));
        assert_eq!(comp.object(aoi).unwrap().mouse_handler(), Some(pane));
    }

    #[test]
    fn test_unknown_reference_is_a_diagnostic() {
        let (mut comp, _) = build(
            r#"<composition>
                <widgets>
                    <MapPane id="pane"><targetModel>missing</targetModel></MapPane>
                </widgets>
            </composition>"#,
        );
        let diags = comp.init();
        assert_eq!(
            diags,
            vec![ConfigError::UnknownReference {
                from: "pane".to_string(),
                name: "missing".to_string(),
            }]
        );
        let pane = comp.lookup("pane").unwrap();
        assert!(comp.object(pane).unwrap().target_model().is_none());
    }

    #[test]
    fn test_loader_failure_skips_entry() {
        struct Failing;
        impl ModuleLoader for Failing {
            fn ensure_loaded(&mut self, tag: &str) -> std::result::Result<(), ConfigError> {
                if tag == "Legend" {
                    Err(ConfigError::Loader {
                        tag: tag.to_string(),
                        message: "module missing".to_string(),
                    })
                } else {
                    Ok(())
                }
            }
        }
        let config = ConfigDocument::parse(
            r#"<composition>
                <widgets><Legend id="legend"/><MapPane id="pane"/></widgets>
            </composition>"#,
        )
        .unwrap();
        let (comp, diags) = Composition::build(
            &config,
            &TypeRegistry::default(),
            &mut Failing,
            Box::new(StaticFetcher::new()),
        );
        assert!(matches!(diags.as_slice(), [ConfigError::Loader { .. }]));
        assert!(comp.lookup("legend").is_none());
        assert!(comp.lookup("pane").is_some());
    }

    #[test]
    fn test_model_load_cascades_to_child_models() {
        let mut fetcher = StaticFetcher::new();
        fetcher.insert_xml("http://test/ctx.xml", "<ViewContext/>");
        fetcher.insert_xml("http://test/features.xml", "<FeatureCollection/>");
        let (mut comp, diags) = build_with_fetcher(
            r#"<composition>
                <models>
                    <Context id="mainMap">
                        <url>http://test/ctx.xml</url>
                        <models>
                            <FeatureCollection id="features">
                                <url>http://test/features.xml</url>
                            </FeatureCollection>
                        </models>
                    </Context>
                </models>
            </composition>"#,
            fetcher,
        );
        assert!(diags.is_empty());
        comp.init();
        let main = comp.lookup("mainMap").unwrap();
        comp.load_model_doc(main).unwrap();

        let features = comp.lookup("features").unwrap();
        assert!(comp.object(features).unwrap().content().is_some());
    }
}
