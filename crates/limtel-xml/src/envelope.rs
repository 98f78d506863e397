//! Request envelope, the flat XML document posted as the `dane` form field.
//!
//! Layout:
//!
//! ```text
//! <limtel><tag1>val1</tag1><tag2>val2</tag2>...</limtel>
//! ```
//!
//! No XML declaration and no whitespace between elements. Field order follows
//! insertion order. Values are escaped; tag names are validated.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

/// Errors from envelope construction.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("invalid XML tag name: {0:?}")]
    InvalidTag(String),
    #[error("failed to write XML: {0}")]
    Write(String),
}

/// An ordered set of fields wrapped in one root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    root: String,
    fields: Vec<(String, String)>,
}

impl Envelope {
    /// Create an empty envelope with the given root element name.
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field. Duplicate tags are written as repeated elements.
    pub fn push(&mut self, tag: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.push((tag.into(), value.into()));
        self
    }

    /// Builder-style variant of [`Envelope::push`].
    #[must_use]
    pub fn with(mut self, tag: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(tag, value);
        self
    }

    /// Root element name.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize the envelope to its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::InvalidTag`] if the root or any field name is
    /// not a valid XML element name.
    pub fn to_xml(&self) -> Result<String, EnvelopeError> {
        validate_tag(&self.root)?;

        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer
            .write_event(Event::Start(BytesStart::new(self.root.as_str())))
            .map_err(|e| EnvelopeError::Write(e.to_string()))?;

        for (tag, value) in &self.fields {
            validate_tag(tag)?;
            writer
                .write_event(Event::Start(BytesStart::new(tag.as_str())))
                .map_err(|e| EnvelopeError::Write(e.to_string()))?;
            if !value.is_empty() {
                writer
                    .write_event(Event::Text(BytesText::new(value)))
                    .map_err(|e| EnvelopeError::Write(e.to_string()))?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(tag.as_str())))
                .map_err(|e| EnvelopeError::Write(e.to_string()))?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(self.root.as_str())))
            .map_err(|e| EnvelopeError::Write(e.to_string()))?;

        let xml = writer.into_inner().into_inner();
        String::from_utf8(xml).map_err(|e| EnvelopeError::Write(e.to_string()))
    }
}

impl<K, V> FromIterator<(K, V)> for Envelope
where
    K: Into<String>,
    V: Into<String>,
{
    /// Collect fields into an envelope rooted at [`crate::ROOT_ELEMENT`].
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut envelope = Self::new(crate::ROOT_ELEMENT);
        for (tag, value) in iter {
            envelope.push(tag, value);
        }
        envelope
    }
}

/// Check that `tag` is a plain (unprefixed) XML element name.
fn validate_tag(tag: &str) -> Result<(), EnvelopeError> {
    let mut chars = tag.chars();
    let valid = match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(EnvelopeError::InvalidTag(tag.to_string()))
    }
}
