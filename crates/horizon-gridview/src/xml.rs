//! Owned XML tree for query documents.
//!
//! A small DOM built on `quick-xml`: [`XmlDocument`] holds a root
//! [`XmlElement`], elements keep their attributes in source order and their
//! children as [`XmlNode`]s. Documents round-trip through [`parse_xml`] and
//! [`XmlDocument::to_xml_string`].
//!
//! ```
//! use horizon_gridview::xml::parse_xml;
//!
//! let doc = parse_xml(r#"<fetch><entity name="account"><attribute name="name"/></entity></fetch>"#)?;
//! let entity = doc.root().child("entity").unwrap();
//! assert_eq!(entity.attribute("name"), Some("account"));
//! # Ok::<(), horizon_gridview::xml::XmlError>(())
//! ```

use std::fmt;
use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};

/// Errors produced while reading XML text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XmlError {
    /// The text is not well-formed.
    #[error("XML syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    /// The text contains no element at all.
    #[error("document has no root element")]
    NoRoot,

    /// The text ended before an element was closed.
    #[error("element <{0}> is never closed")]
    Unclosed(String),
}

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    /// Creates a document around an existing root element.
    pub fn with_root(root: XmlElement) -> Self {
        Self { root }
    }

    /// The root element.
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Mutable access to the root element.
    pub fn root_mut(&mut self) -> &mut XmlElement {
        &mut self.root
    }

    /// Serializes the document (without declaration) in compact form.
    pub fn to_xml_string(&self) -> String {
        self.root.to_xml_string()
    }
}

impl fmt::Display for XmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml_string())
    }
}

/// An XML element with a name, ordered attributes, and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// Creates an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// The tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets an attribute, replacing an existing value in place.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Builder-style [`set_attribute`](Self::set_attribute).
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// All attributes in source order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// All child nodes.
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Mutable access to the child nodes.
    pub fn children_mut(&mut self) -> &mut Vec<XmlNode> {
        &mut self.children
    }

    /// Child elements, skipping text and comments.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    /// Child elements with the given tag name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.child_elements().filter(move |el| el.name == name)
    }

    /// First child element with the given tag name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements().find(|el| el.name == name)
    }

    /// Mutable first child element with the given tag name.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.children
            .iter_mut()
            .filter_map(XmlNode::as_element_mut)
            .find(|el| el.name == name)
    }

    /// Appends a child node.
    pub fn add_child(&mut self, child: impl Into<XmlNode>) {
        self.children.push(child.into());
    }

    /// Depth-first search for the first element named `name`, including `self`.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        if self.name == name {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find(name))
    }

    /// Concatenated text of direct text and CDATA children.
    pub fn text(&self) -> String {
        self.children.iter().filter_map(XmlNode::text).collect()
    }

    /// Serializes the element in compact form.
    pub fn to_xml_string(&self) -> String {
        let mut writer = Writer::new(Vec::new());
        self.write_to(&mut writer);
        String::from_utf8(writer.into_inner()).unwrap_or_default()
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>) {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        // Writing into a Vec cannot fail.
        if self.children.is_empty() {
            let _ = writer.write_event(Event::Empty(start));
        } else {
            let _ = writer.write_event(Event::Start(start));
            for child in &self.children {
                child.write_to(writer);
            }
            let _ = writer.write_event(Event::End(BytesEnd::new(self.name.as_str())));
        }
    }
}

impl From<XmlElement> for XmlNode {
    fn from(element: XmlElement) -> Self {
        XmlNode::Element(element)
    }
}

/// A node in an XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// An element node
    Element(XmlElement),
    /// A text node
    Text(String),
    /// A comment node
    Comment(String),
    /// A CDATA section
    CData(String),
}

impl XmlNode {
    /// Returns this node as an element, if it is one.
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Returns this node as a mutable element, if it is one.
    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Returns the text content of this node (if text or CDATA).
    pub fn text(&self) -> Option<&str> {
        match self {
            XmlNode::Text(t) | XmlNode::CData(t) => Some(t),
            _ => None,
        }
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>) {
        match self {
            XmlNode::Element(el) => el.write_to(writer),
            XmlNode::Text(text) => {
                let _ = writer.write_event(Event::Text(BytesText::new(text)));
            }
            XmlNode::Comment(comment) => {
                let _ = writer.write_event(Event::Comment(BytesText::from_escaped(comment.as_str())));
            }
            XmlNode::CData(content) => {
                let _ = writer.write_event(Event::CData(BytesCData::new(content)));
            }
        }
    }
}

/// Parses XML text into a document.
///
/// Whitespace-only text is dropped. Declarations, doctypes and processing
/// instructions are accepted and discarded.
pub fn parse_xml(s: &str) -> Result<XmlDocument, XmlError> {
    let mut reader = Reader::from_str(s);
    reader.config_mut().trim_text(true);
    parse_document(&mut reader)
}

fn syntax_error<R>(reader: &Reader<R>, err: impl std::fmt::Display) -> XmlError {
    XmlError::Syntax {
        position: reader.buffer_position() as u64,
        message: err.to_string(),
    }
}

fn element_from<R>(reader: &Reader<R>, start: &BytesStart<'_>) -> Result<XmlElement, XmlError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
    let mut element = XmlElement::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| syntax_error(reader, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value().map_err(|e| syntax_error(reader, e))?;
        element.set_attribute(key, value.into_owned());
    }
    Ok(element)
}

fn parse_document<R: BufRead>(reader: &mut Reader<R>) -> Result<XmlDocument, XmlError> {
    let mut buf = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut element_stack: Vec<XmlElement> = Vec::new();

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf).map_err(|e| syntax_error(reader, e))?;

        match event {
            Event::Eof => break,
            Event::Start(start) => {
                element_stack.push(element_from(reader, &start)?);
            }
            Event::End(_) => {
                if let Some(element) = element_stack.pop() {
                    match element_stack.last_mut() {
                        Some(parent) => parent.add_child(element),
                        None if root.is_none() => root = Some(element),
                        None => {}
                    }
                }
            }
            Event::Empty(empty) => {
                let element = element_from(reader, &empty)?;
                match element_stack.last_mut() {
                    Some(parent) => parent.add_child(element),
                    None if root.is_none() => root = Some(element),
                    None => {}
                }
            }
            Event::Text(text) => {
                let content = text.unescape().map_err(|e| syntax_error(reader, e))?;
                if let Some(parent) = element_stack.last_mut()
                    && !content.is_empty()
                {
                    parent.add_child(XmlNode::Text(content.into_owned()));
                }
            }
            Event::CData(cdata) => {
                if let Some(parent) = element_stack.last_mut() {
                    let content = String::from_utf8_lossy(&cdata).to_string();
                    parent.add_child(XmlNode::CData(content));
                }
            }
            Event::Comment(comment) => {
                if let Some(parent) = element_stack.last_mut() {
                    let content = String::from_utf8_lossy(&comment).to_string();
                    parent.add_child(XmlNode::Comment(content));
                }
            }
            _ => {}
        }
    }

    if let Some(open) = element_stack.pop() {
        return Err(XmlError::Unclosed(open.name));
    }
    root.map(XmlDocument::with_root).ok_or(XmlError::NoRoot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch_document() {
        let xml = r#"<?xml version="1.0"?>
            <fetch version="1.0" mapping="logical">
                <entity name="account">
                    <attribute name="name" />
                    <order attribute="name" descending="false" />
                </entity>
            </fetch>"#;

        let doc = parse_xml(xml).unwrap();
        assert_eq!(doc.root().name(), "fetch");
        let entity = doc.root().child("entity").unwrap();
        assert_eq!(entity.attribute("name"), Some("account"));
        assert_eq!(entity.child_elements().count(), 2);
    }

    #[test]
    fn test_attribute_order_preserved_on_write() {
        let xml = r#"<condition attribute="statecode" operator="eq" value="0"/>"#;
        let doc = parse_xml(xml).unwrap();
        assert_eq!(doc.to_xml_string(), xml);
    }

    #[test]
    fn test_attribute_values_are_unescaped_and_reescaped() {
        let doc = parse_xml(r#"<condition attribute="name" operator="like" value="A&amp;B%"/>"#).unwrap();
        assert_eq!(doc.root().attribute("value"), Some("A&B%"));
        assert!(doc.to_xml_string().contains("value=\"A&amp;B%\""));
    }

    #[test]
    fn test_text_and_nested_round_trip() {
        let xml = "<filter type=\"or\"><condition attribute=\"a\" operator=\"in\"><value>1</value><value>2</value></condition></filter>";
        let doc = parse_xml(xml).unwrap();
        assert_eq!(doc.to_xml_string(), xml);
        let values: Vec<String> = doc
            .root()
            .find("condition")
            .unwrap()
            .children_named("value")
            .map(XmlElement::text)
            .collect();
        assert_eq!(values, vec!["1", "2"]);
    }

    #[test]
    fn test_set_attribute_replaces_in_place() {
        let mut el = XmlElement::new("filter").with_attribute("type", "or").with_attribute("hint", "x");
        el.set_attribute("type", "and");
        let attrs: Vec<_> = el.attributes().collect();
        assert_eq!(attrs, vec![("type", "and"), ("hint", "x")]);
    }

    #[test]
    fn test_mismatched_end_is_syntax_error() {
        let err = parse_xml("<fetch><entity></fetch>").unwrap_err();
        assert!(matches!(err, XmlError::Syntax { .. }));
    }

    #[test]
    fn test_undefined_entity_is_syntax_error() {
        let err = parse_xml("<filter><value>&foo;</value></filter>").unwrap_err();
        assert!(matches!(err, XmlError::Syntax { .. }));
        let err = parse_xml(r#"<condition attribute="name" value="&foo;"/>"#).unwrap_err();
        assert!(matches!(err, XmlError::Syntax { .. }));
    }

    #[test]
    fn test_unclosed_and_empty_input() {
        assert_eq!(parse_xml("<fetch><entity>").unwrap_err(), XmlError::Unclosed("entity".into()));
        assert_eq!(parse_xml("   ").unwrap_err(), XmlError::NoRoot);
        assert_eq!(parse_xml("just text").unwrap_err(), XmlError::NoRoot);
    }
}
