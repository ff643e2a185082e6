//! Minimal element tree on top of `quick-xml` events.
//!
//! RSS producers are inconsistent about which fields repeat, carry
//! attributes or wrap their text in CDATA. Parsing into a small generic tree
//! first lets the RSS mapping treat "one child" and "many children" the same
//! way and ask for attributes and inner text independently.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::types::ParseError;

/// SEC-003: Maximum element nesting accepted before the document is rejected.
/// Real feeds nest 4-5 levels deep.
const MAX_DEPTH: usize = 256;

/// An XML element with its attributes, trimmed inner text and child elements.
///
/// Names are kept fully qualified (`content:encoded`), without namespace
/// resolution, which is how feeds refer to module fields in practice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Concatenated text and CDATA content directly inside this element.
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    fn new(name: String, attributes: Vec<(String, String)>) -> Self {
        Self {
            name,
            attributes,
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Value of the attribute `name`, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First child element called `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All child elements called `name`, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Inner text of the first child called `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }
}

/// Parses `xml` into its root [`Element`].
///
/// # Errors
///
/// Returns [`ParseError::Xml`] for syntax errors, mismatched or unclosed
/// tags, missing or multiple root elements, stray text outside the root, and
/// documents nested deeper than [`MAX_DEPTH`].
///
/// # Security
///
/// SEC-002: `quick-xml` (0.37) never expands `<!ENTITY>` declarations; only
/// the five predefined entities and character references are resolved, so
/// entity-expansion attacks surface as parse errors.
pub fn parse_document(xml: &str) -> Result<Element, ParseError> {
    // Text is trimmed once per element on close, not per event, so spaces
    // next to CDATA sections and child elements survive
    let mut reader = Reader::from_str(xml.trim_start_matches('\u{feff}'));

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_error(format!("{} at position {}", e, reader.error_position())))?;

        match event {
            Event::Start(e) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(xml_error(format!(
                        "nesting depth exceeds maximum of {} levels",
                        MAX_DEPTH
                    )));
                }
                let element = start_element(&e, &reader)?;
                if root.is_some() && stack.is_empty() {
                    return Err(xml_error("multiple root elements"));
                }
                stack.push(element);
            }
            Event::Empty(e) => {
                let element = start_element(&e, &reader)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                // quick-xml already rejects mismatched end names
                let Some(mut element) = stack.pop() else {
                    return Err(xml_error("unexpected closing tag"));
                };
                let trimmed = element.text.trim();
                if trimmed.len() != element.text.len() {
                    element.text = trimmed.to_string();
                }
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|e| xml_error(format!("{} at position {}", e, reader.buffer_position())))?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e);
                push_text(&mut stack, &text)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and DOCTYPE carry no feed data
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(xml_error(format!("unclosed element <{}>", open.name)));
    }

    root.ok_or_else(|| xml_error("document has no root element"))
}

fn start_element(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Element, ParseError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();

    for attr in e.attributes() {
        let attr = attr.map_err(|err| xml_error(format!("malformed attribute on <{}>: {}", name, err)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|err| xml_error(format!("invalid value for attribute {}: {}", key, err)))?;
        attributes.push((key, value.into_owned()));
    }

    Ok(Element::new(name, attributes))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(xml_error("multiple root elements")),
    }
}

fn push_text(stack: &mut [Element], text: &str) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(current) => {
            current.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(xml_error("text outside of the root element")),
    }
}

fn xml_error(message: impl Into<String>) -> ParseError {
    ParseError::Xml(message.into())
}
