//! Logging and debugging facilities for the Carta runtime.
//!
//! Carta instruments itself with the `tracing` crate. Hosts install a
//! subscriber (`tracing_subscriber::fmt::init()` or similar) and can filter
//! by the [`targets`] constants to watch a single subsystem, e.g. only the
//! event traffic on `carta_core::hub`.
//!
//! [`composition_tree`] renders the object graph for debug output:
//!
//! ```ignore
//! println!("{}", carta_core::logging::composition_tree(&composition));
//! ```

use std::fmt::Write as FmtWrite;

use crate::composition::Composition;
use crate::object::ObjectId;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Event hub publish/subscribe traffic.
    pub const HUB: &str = "carta_core::hub";
    /// Object registration and lookup.
    pub const OBJECT: &str = "carta_core::object";
    /// Graph construction and reference resolution.
    pub const BUILDER: &str = "carta_core::builder";
    /// Model lifecycle and document loading.
    pub const MODEL: &str = "carta_core::model";
}

/// Renders the composition's object graph as an indented tree.
///
/// One line per object: id, kind, and (for models) lifecycle status.
pub fn composition_tree(comp: &Composition) -> String {
    let mut out = String::new();
    for root in comp.roots() {
        write_subtree(comp, root, 0, &mut out);
    }
    out
}

fn write_subtree(comp: &Composition, id: ObjectId, depth: usize, out: &mut String) {
    let Ok(object) = comp.object(id) else {
        return;
    };
    let indent = "  ".repeat(depth);
    let _ = write!(out, "{indent}{} ({})", object.id(), object.kind());
    if let Some(model) = object.model() {
        let _ = write!(out, " [{:?}]", model.status());
    }
    out.push('\n');
    for &child in object.children() {
        write_subtree(comp, child, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{NoopLoader, TypeRegistry};
    use crate::config::ConfigDocument;
    use crate::fetch::StaticFetcher;

    #[test]
    fn test_composition_tree_rendering() {
        let config = ConfigDocument::parse(
            r#"<composition>
                <models>
                    <Context id="mainMap">
                        <widgets><MapPane id="pane"/></widgets>
                    </Context>
                </models>
            </composition>"#,
        )
        .unwrap();
        let (comp, _) = Composition::build(
            &config,
            &TypeRegistry::default(),
            &mut NoopLoader,
            Box::new(StaticFetcher::new()),
        );
        let tree = composition_tree(&comp);
        assert_eq!(
            tree,
            "mainMap (Context model) [Idle]\n  pane (MapPane widget)\n"
        );
    }
}
