//! Minimal owned XML tree for package parts
//!
//! Parts are parsed with `quick-xml` into a tree of elements, text nodes and
//! opaque events (declarations, comments, processing instructions, CDATA), and
//! written back with `quick_xml::Writer`. Attribute order and element nesting are
//! preserved; byte-identical output is not a goal.

use crate::domain::errors::DocumentError;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A node in the tree
#[derive(Debug, Clone)]
pub enum XmlNode {
    /// Element with attributes and children
    Element(XmlElement),
    /// Unescaped character data
    Text(String),
    /// Anything else, replayed verbatim on write
    Other(Event<'static>),
}

impl XmlNode {
    /// Returns the element if this node is one
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Mutable variant of [`as_element`](Self::as_element)
    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// An XML element
#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    /// Qualified name, e.g. `w:p`
    pub name: String,
    /// Attributes in document order, values unescaped
    pub attributes: Vec<(String, String)>,
    /// Child nodes in document order
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Creates an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Checks the qualified name
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Attribute value by qualified name
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets or replaces an attribute
    pub fn set_attr(&mut self, key: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attributes.push((key.to_string(), value.to_string())),
        }
    }

    /// Child elements paired with their index in `children`
    pub fn child_elements(&self) -> impl Iterator<Item = (usize, &XmlElement)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, node)| node.as_element().map(|el| (i, el)))
    }

    /// First child element with the given name
    pub fn first_child(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements()
            .map(|(_, el)| el)
            .find(|el| el.is(name))
    }

    /// Follows a path of child indices
    pub fn descendant(&self, path: &[usize]) -> Option<&XmlElement> {
        let mut current = self;
        for &idx in path {
            current = current.children.get(idx)?.as_element()?;
        }
        Some(current)
    }

    /// Mutable variant of [`descendant`](Self::descendant)
    pub fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut XmlElement> {
        let mut current = self;
        for &idx in path {
            current = current.children.get_mut(idx)?.as_element_mut()?;
        }
        Some(current)
    }

    /// Concatenated direct text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replaces all children with a single text node
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.children.clear();
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text));
        }
    }

    /// True if any child is an element
    pub fn has_element_children(&self) -> bool {
        self.children
            .iter()
            .any(|node| matches!(node, XmlNode::Element(_)))
    }
}

/// A parsed package part
#[derive(Debug, Clone)]
pub struct XmlDocument {
    prolog: Vec<XmlNode>,
    /// Document element
    pub root: XmlElement,
    epilog: Vec<XmlNode>,
}

impl XmlDocument {
    /// Parses a part. `part` is only used in error messages.
    pub fn parse(part: &str, bytes: &[u8]) -> Result<Self, DocumentError> {
        let malformed = |message: String| DocumentError::MalformedXml {
            part: part.to_string(),
            message,
        };

        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| malformed(format!("at byte {}: {e}", reader.buffer_position())))?;

            let node = match event {
                Event::Start(start) => {
                    stack.push(element_from_start(&start).map_err(malformed)?);
                    None
                }
                Event::Empty(start) => Some(XmlNode::Element(
                    element_from_start(&start).map_err(malformed)?,
                )),
                Event::End(_) => {
                    let el = stack
                        .pop()
                        .ok_or_else(|| malformed("unbalanced end tag".to_string()))?;
                    Some(XmlNode::Element(el))
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| malformed(e.to_string()))?;
                    Some(XmlNode::Text(text.into_owned()))
                }
                Event::Eof => break,
                other => Some(XmlNode::Other(other.into_owned())),
            };

            if let Some(node) = node {
                match (stack.last_mut(), node) {
                    (Some(parent), node) => parent.children.push(node),
                    (None, XmlNode::Element(el)) if root.is_none() => root = Some(el),
                    (None, node) if root.is_none() => prolog.push(node),
                    (None, node) => epilog.push(node),
                }
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(malformed("unclosed element at end of input".to_string()));
        }
        let root = root.ok_or_else(|| malformed("no document element".to_string()))?;

        Ok(Self {
            prolog,
            root,
            epilog,
        })
    }

    /// Serializes the tree.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut writer, node)?;
        }
        Ok(writer.into_inner())
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, String> {
    let mut el = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        el.attributes.push((key, value.into_owned()));
    }
    Ok(el)
}

fn write_err(e: impl std::fmt::Display) -> DocumentError {
    DocumentError::Structure(format!("failed to serialize XML: {e}"))
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<(), DocumentError> {
    match node {
        XmlNode::Element(el) => write_element(writer, el),
        XmlNode::Text(text) => writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(write_err),
        XmlNode::Other(event) => writer.write_event(event.clone()).map_err(write_err),
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, el: &XmlElement) -> Result<(), DocumentError> {
    let mut start = BytesStart::new(el.name.as_str());
    for (key, value) in &el.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if el.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_err);
    }

    writer.write_event(Event::Start(start)).map_err(write_err)?;
    for child in &el.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(el.name.as_str())))
        .map_err(write_err)
}
