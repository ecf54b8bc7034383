//! Owned XML document trees for configuration and model content.
//!
//! Carta keeps two kinds of XML in memory: the immutable configuration
//! document parsed once at startup, and the per-model content documents
//! swapped in on every successful fetch. Both use the same owned tree,
//! parsed eagerly with `quick-xml`; the documents involved are small and
//! the runtime queries them repeatedly by path.
//!
//! Element paths are slash-separated local names, matched against either
//! the local or prefixed name, so `"ViewContext/General/BoundingBox"` finds
//! the element whether or not the document carries a namespace prefix.

use std::fmt;
use std::io::Write;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// An XML parse failure, with the reader's position where available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlError {
    message: String,
}

impl XmlError {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XML error: {}", self.message)
    }
}

impl std::error::Error for XmlError {}

/// An XML document: declaration plus a root element.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    version: String,
    encoding: Option<String>,
    root: XmlElement,
}

impl XmlDocument {
    /// Creates a document with the given root element.
    pub fn with_root(root: XmlElement) -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: Some("UTF-8".to_string()),
            root,
        }
    }

    /// The root element.
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Mutable access to the root element.
    pub fn root_mut(&mut self) -> &mut XmlElement {
        &mut self.root
    }

    /// First element at the slash-separated path, starting at the root.
    pub fn get(&self, path: &str) -> Option<&XmlElement> {
        self.root.get(path)
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut(&mut self, path: &str) -> Option<&mut XmlElement> {
        self.root.get_mut(path)
    }

    /// All elements matching the slash-separated path.
    pub fn get_all(&self, path: &str) -> Vec<&XmlElement> {
        self.root.get_all(path)
    }

    /// First descendant with the given local name, in document order.
    pub fn find_first(&self, name: &str) -> Option<&XmlElement> {
        self.root.find_first(name)
    }

    /// Mutable variant of [`find_first`](Self::find_first).
    pub fn find_first_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.root.find_first_mut(name)
    }

    /// Serializes the document, declaration included.
    pub fn to_xml(&self) -> String {
        let mut writer = Writer::new(Vec::new());
        let decl = BytesDecl::new(&self.version, self.encoding.as_deref(), None);
        let _ = writer.write_event(Event::Decl(decl));
        self.root.write_to(&mut writer);
        String::from_utf8(writer.into_inner()).unwrap_or_default()
    }
}

impl fmt::Display for XmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

/// An element: qualified name, ordered attributes, child nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    name: String,
    prefix: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// Creates an element; a `prefix:local` name is split at the colon.
    pub fn new(name: impl Into<String>) -> Self {
        let qualified = name.into();
        let (prefix, local) = match qualified.find(':') {
            Some(pos) => (Some(qualified[..pos].to_string()), qualified[pos + 1..].to_string()),
            None => (None, qualified),
        };
        Self {
            name: local,
            prefix,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Local name, without any namespace prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Qualified name (`prefix:local`, or just the local name).
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name),
            None => self.name.clone(),
        }
    }

    /// The namespace prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Sets or clears the namespace prefix.
    pub fn set_prefix(&mut self, prefix: Option<String>) {
        self.prefix = prefix;
    }

    /// Attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Sets an attribute, replacing any existing value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Iterator over attributes in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Child nodes in document order.
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Child elements only.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    /// Mutable child elements only.
    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(XmlNode::as_element_mut)
    }

    /// First child element with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements().find(|el| el.name == name)
    }

    /// Appends a child element.
    pub fn add_child(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Appends a child element carrying only text content.
    pub fn add_child_text(&mut self, name: impl Into<String>, text: impl Into<String>) {
        let mut child = XmlElement::new(name);
        child.set_text(text);
        self.children.push(XmlNode::Element(child));
    }

    /// Concatenated text and CDATA content of this element.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                XmlNode::Element(_) | XmlNode::Comment(_) => {}
            }
        }
        out
    }

    /// Replaces all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.clear();
        self.children.push(XmlNode::Text(text.into()));
    }

    /// First element at the slash-separated path.
    ///
    /// A path segment matches the element's local or qualified name. The
    /// first segment may name this element itself or any descendant.
    pub fn get(&self, path: &str) -> Option<&XmlElement> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.get_by_parts(&parts)
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut(&mut self, path: &str) -> Option<&mut XmlElement> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.get_mut_by_parts(&parts)
    }

    /// All elements matching the slash-separated path.
    pub fn get_all(&self, path: &str) -> Vec<&XmlElement> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut results = Vec::new();
        self.collect_by_parts(&parts, &mut results);
        results
    }

    /// First descendant (or self) with the given local name, depth-first.
    pub fn find_first(&self, name: &str) -> Option<&XmlElement> {
        if self.name == name {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find_first(name))
    }

    /// Mutable variant of [`find_first`](Self::find_first).
    pub fn find_first_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        if self.name == name {
            return Some(self);
        }
        self.children
            .iter_mut()
            .filter_map(XmlNode::as_element_mut)
            .find_map(|child| child.find_first_mut(name))
    }

    fn matches(&self, segment: &str) -> bool {
        self.name == segment || self.qualified_name() == segment
    }

    fn get_by_parts(&self, parts: &[&str]) -> Option<&XmlElement> {
        let (first, rest) = parts.split_first()?;
        if self.matches(first) {
            if rest.is_empty() {
                return Some(self);
            }
            self.child_elements().find_map(|c| c.get_by_parts(rest))
        } else {
            self.child_elements().find_map(|c| c.get_by_parts(parts))
        }
    }

    fn get_mut_by_parts(&mut self, parts: &[&str]) -> Option<&mut XmlElement> {
        let (first, rest) = parts.split_first()?;
        if self.matches(first) {
            if rest.is_empty() {
                return Some(self);
            }
            self.child_elements_mut().find_map(|c| c.get_mut_by_parts(rest))
        } else {
            self.child_elements_mut().find_map(|c| c.get_mut_by_parts(parts))
        }
    }

    fn collect_by_parts<'a>(&'a self, parts: &[&str], results: &mut Vec<&'a XmlElement>) {
        let Some((first, rest)) = parts.split_first() else {
            results.push(self);
            return;
        };
        if self.matches(first) {
            if rest.is_empty() {
                results.push(self);
            } else {
                for child in self.child_elements() {
                    child.collect_by_parts(rest, results);
                }
            }
        } else {
            for child in self.child_elements() {
                child.collect_by_parts(parts, results);
            }
        }
    }

    /// Serializes the element subtree.
    pub fn to_xml(&self) -> String {
        let mut writer = Writer::new(Vec::new());
        self.write_to(&mut writer);
        String::from_utf8(writer.into_inner()).unwrap_or_default()
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) {
        let qualified = self.qualified_name();
        let mut start = BytesStart::new(&qualified);
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        if self.children.is_empty() {
            let _ = writer.write_event(Event::Empty(start));
            return;
        }
        let _ = writer.write_event(Event::Start(start));
        for child in &self.children {
            match child {
                XmlNode::Element(el) => el.write_to(writer),
                XmlNode::Text(text) => {
                    let _ = writer.write_event(Event::Text(BytesText::new(text)));
                }
                XmlNode::CData(content) => {
                    let _ = writer.write_event(Event::CData(BytesCData::new(content)));
                }
                XmlNode::Comment(comment) => {
                    let _ = writer.write_event(Event::Comment(BytesText::new(comment)));
                }
            }
        }
        let _ = writer.write_event(Event::End(BytesEnd::new(&qualified)));
    }
}

/// A node in an element's child list.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// A nested element.
    Element(XmlElement),
    /// Character data.
    Text(String),
    /// A CDATA section.
    CData(String),
    /// A comment.
    Comment(String),
}

impl XmlNode {
    /// This node as an element, if it is one.
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Mutable variant of [`as_element`](Self::as_element).
    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// Parses an XML string into an owned document tree.
pub fn parse_xml(source: &str) -> Result<XmlDocument, XmlError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);

    let mut version = "1.0".to_string();
    let mut encoding = None;
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Decl(decl)) => {
                if let Ok(v) = decl.version() {
                    version = String::from_utf8_lossy(&v).to_string();
                }
                if let Some(Ok(e)) = decl.encoding() {
                    encoding = Some(String::from_utf8_lossy(&e).to_string());
                }
            }
            Ok(Event::Start(start)) => {
                stack.push(element_from_start(&start)?);
            }
            Ok(Event::End(_)) => {
                let element = stack.pop().ok_or_else(|| {
                    XmlError::new("closing tag without a matching opening tag")
                })?;
                match stack.last_mut() {
                    Some(parent) => parent.add_child(element),
                    None => root = Some(element),
                }
            }
            Ok(Event::Empty(start)) => {
                let element = element_from_start(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.add_child(element),
                    None => root = Some(element),
                }
            }
            Ok(Event::Text(text)) => {
                let content = text
                    .unescape()
                    .map_err(|e| XmlError::new(e.to_string()))?
                    .to_string();
                if !content.is_empty() {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Text(content));
                    }
                }
            }
            Ok(Event::CData(cdata)) => {
                if let Some(parent) = stack.last_mut() {
                    let content = String::from_utf8_lossy(&cdata).to_string();
                    parent.children.push(XmlNode::CData(content));
                }
            }
            Ok(Event::Comment(comment)) => {
                if let Some(parent) = stack.last_mut() {
                    let content = String::from_utf8_lossy(&comment).to_string();
                    parent.children.push(XmlNode::Comment(content));
                }
            }
            Ok(Event::PI(_) | Event::DocType(_)) => {}
            Err(e) => return Err(XmlError::new(e.to_string())),
        }
    }

    if !stack.is_empty() {
        return Err(XmlError::new("unclosed elements at end of document"));
    }
    let root = root.ok_or_else(|| XmlError::new("document has no root element"))?;
    Ok(XmlDocument {
        version,
        encoding,
        root,
    })
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, XmlError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
    let mut element = XmlElement::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::new(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::new(e.to_string()))?
            .to_string();
        element.set_attribute(key, value);
    }
    Ok(element)
}
