//! XML codec for the Limtel API.
//!
//! The remote service speaks a small bespoke dialect: every request is a flat
//! list of `<tag>value</tag>` pairs under a single root element, and every
//! response is an arbitrary XML document whose success is signalled by a
//! `status` element.
//!
//! - [`Envelope`] builds the request document.
//! - [`Element`] is the parsed response tree.

mod envelope;
pub use envelope::{Envelope, EnvelopeError};

mod tree;
pub use tree::{Element, ParseError};

/// Root element name used for every request envelope.
pub const ROOT_ELEMENT: &str = "limtel";
