//! The startup configuration document.
//!
//! A composition is described by a single XML document, parsed once and
//! never mutated:
//!
//! ```xml
//! <composition>
//!   <models>
//!     <Context id="mainMap">
//!       <url>http://example.com/context.xml</url>
//!       <widgets>
//!         <MapPane id="pane"/>
//!       </widgets>
//!     </Context>
//!   </models>
//!   <widgets>…</widgets>
//!   <tools>…</tools>
//! </composition>
//! ```
//!
//! Entry tags (`Context`, `MapPane`, …) select the runtime type; nested
//! `models`/`widgets`/`tools` groups under an entry define its children.

use std::fmt;

use crate::xml::{parse_xml, XmlDocument, XmlElement};

/// The group elements that hold object entries, in definition order.
pub(crate) const ENTRY_GROUPS: [&str; 3] = ["models", "widgets", "tools"];

/// Configuration errors, collected per object during graph construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The document did not parse as XML.
    Parse(String),
    /// The document root is not `<composition>`.
    InvalidRoot(String),
    /// An entry tag is not registered with the type registry.
    UnknownTag(String),
    /// Two entries declare the same explicit id.
    DuplicateId(String),
    /// A named reference does not resolve to a registered object.
    UnknownReference { from: String, name: String },
    /// The module loader failed for an entry tag.
    Loader { tag: String, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "Configuration does not parse: {msg}"),
            Self::InvalidRoot(name) => {
                write!(f, "Expected <composition> root, found <{name}>")
            }
            Self::UnknownTag(tag) => write!(f, "Unknown object tag <{tag}>"),
            Self::DuplicateId(id) => {
                write!(f, "Object id '{id}' is already registered")
            }
            Self::UnknownReference { from, name } => {
                write!(f, "Object '{from}' references unknown id '{name}'")
            }
            Self::Loader { tag, message } => {
                write!(f, "Module loader failed for <{tag}>: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// The parsed, immutable composition configuration.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    doc: XmlDocument,
}

impl ConfigDocument {
    /// Parses a configuration source and checks the root element.
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let doc = parse_xml(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if doc.root().name() != "composition" {
            return Err(ConfigError::InvalidRoot(doc.root().name().to_string()));
        }
        Ok(Self { doc })
    }

    /// The `<composition>` root element.
    pub fn root(&self) -> &XmlElement {
        self.doc.root()
    }
}

/// Object entries declared under an element's group children, in
/// definition order (`models`, then `widgets`, then `tools`).
pub(crate) fn entries(parent: &XmlElement) -> Vec<&XmlElement> {
    let mut out = Vec::new();
    for group in ENTRY_GROUPS {
        if let Some(group_el) = parent.child(group) {
            out.extend(group_el.child_elements());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_checks_root() {
        assert!(ConfigDocument::parse("<composition/>").is_ok());
        assert!(matches!(
            ConfigDocument::parse("<other/>"),
            Err(ConfigError::InvalidRoot(_))
        ));
        assert!(matches!(
            ConfigDocument::parse("not xml <"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_entries_in_definition_order() {
        let config = ConfigDocument::parse(
            r#"<composition>
                <tools><AoiHandler id="aoi"/></tools>
                <models><Context id="a"/><Context id="b"/></models>
                <widgets><MapPane id="pane"/></widgets>
            </composition>"#,
        )
        .unwrap();
        let tags: Vec<&str> = entries(config.root()).iter().map(|e| e.name()).collect();
        // Group order is fixed regardless of document order.
        assert_eq!(tags, vec!["Context", "Context", "MapPane", "AoiHandler"]);
    }
}
