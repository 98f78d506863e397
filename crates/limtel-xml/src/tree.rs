//! Response tree: a minimal DOM over the API's XML replies.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

/// Errors from response parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("response is empty")]
    Empty,
    #[error("malformed XML at byte {position}: {message}")]
    Syntax { position: u64, message: String },
    #[error("response contains no root element")]
    NoRoot,
    #[error("response contains more than one root element")]
    MultipleRoots,
}

/// A parsed XML element.
///
/// Text content is the concatenation of the element's direct text and CDATA
/// nodes with surrounding XML whitespace removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Element {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

impl Element {
    /// Create an element with no content.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse a complete XML document and return its root element.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Empty`] for blank input, [`ParseError::Syntax`]
    /// for malformed markup, and [`ParseError::NoRoot`] or
    /// [`ParseError::MultipleRoots`] when the document does not have exactly
    /// one top-level element.
    pub fn parse(xml: &str) -> Result<Self, ParseError> {
        if xml.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Self> = Vec::new();
        let mut root: Option<Self> = None;

        loop {
            let event = reader.read_event().map_err(|e| syntax(&reader, e))?;

            match event {
                Event::Start(ref e) => {
                    if stack.is_empty() && root.is_some() {
                        return Err(ParseError::MultipleRoots);
                    }
                    stack.push(Self::from_start(e, &reader)?);
                }
                Event::Empty(ref e) => {
                    let element = Self::from_start(e, &reader)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    if let Some(mut element) = stack.pop() {
                        element.text = trim_xml_whitespace(&element.text).to_string();
                        attach(&mut stack, &mut root, element)?;
                    }
                }
                Event::Text(ref e) => {
                    if let Some(current) = stack.last_mut() {
                        let text = e.unescape().map_err(|err| syntax(&reader, err))?;
                        current.text.push_str(&text);
                    } else if root.is_some() && !is_xml_whitespace(e) {
                        return Err(syntax(&reader, "content after root element"));
                    }
                }
                Event::CData(e) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(syntax(&reader, "unexpected end of document"));
        }

        root.ok_or(ParseError::NoRoot)
    }

    fn from_start(start: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Self, ParseError> {
        let mut element = Self::new(String::from_utf8_lossy(start.name().as_ref()));

        for attr in start.attributes() {
            let attr = attr.map_err(|e| syntax(reader, e))?;
            let value = attr.unescape_value().map_err(|e| syntax(reader, e))?;
            element.attributes.push((
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                value.into_owned(),
            ));
        }

        Ok(element)
    }

    /// Trimmed text content.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// First direct child with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follow a dotted path of child names, e.g. `"data.userid"`.
    ///
    /// Each segment selects the first matching child. An empty path returns
    /// `self`.
    #[must_use]
    pub fn path(&self, path: &str) -> Option<&Self> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| node.child(segment))
    }

    /// Text of the element at `path`, if present.
    #[must_use]
    pub fn text_at(&self, path: &str) -> Option<&str> {
        self.path(path).map(Self::text)
    }

    /// Attribute value by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// True when the element carries no text, attributes, or children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.attributes.is_empty() && self.children.is_empty()
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<(), ParseError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_some() {
        Err(ParseError::MultipleRoots)
    } else {
        *root = Some(element);
        Ok(())
    }
}

#[allow(clippy::cast_lossless, clippy::unnecessary_cast)]
fn syntax(reader: &Reader<&[u8]>, message: impl std::fmt::Display) -> ParseError {
    ParseError::Syntax {
        position: reader.buffer_position() as u64,
        message: message.to_string(),
    }
}

fn trim_xml_whitespace(text: &str) -> &str {
    text.trim_matches(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}

fn is_xml_whitespace(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
}
