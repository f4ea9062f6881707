//! # Helios XML
//!
//! Schema-driven streaming XML encoding and decoding for serde types.
//!
//! ## Features
//!
//! - **Streaming**: custom `serde::Serializer` and `serde::Deserializer`
//!   implementations that go straight between typed values and XML text,
//!   without building a document tree.
//! - **Field roles**: every struct field is an attribute, a child element or the
//!   element's text content. Roles come from the serde key (`@name`, `$text`)
//!   or from a [`Schema`](schema::Schema) registered with the format.
//! - **Namespaces**: prefixes resolve through inherited scopes on decode, and
//!   the encoder declares every namespace an element needs on its own start tag.
//! - **Document tree**: [`entity::XmlDocument`] for schema-free documents.
//!
//! ## Architecture
//!
//! - **Tokenizer** ([`xml::lexer`]): one pass over the text, one token per call.
//! - **Namespace scopes** ([`xml::namespace`]): immutable, copy-on-extend.
//! - **Decoder** ([`xml::de`]): an explicit stack of element frames, one per struct.
//! - **Encoder** ([`xml::ser`]): writes through a [`Composer`](xml::composer::Composer),
//!   compact or pretty.
//!
//! ## Field Key Mapping
//!
//! | serde key | XML |
//! |-----------|-----|
//! | `@from` | `from="..."` attribute |
//! | `$text` | text content |
//! | `message` | `<message>...</message>` child |
//! | `{urn:x}message` | `<p:message>` child with `p` bound to `urn:x` |
//!
//! ## Examples
//!
//! ```rust
//! use helios_xml::{from_xml_str, to_xml_string};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Message {
//!     #[serde(rename = "$text")]
//!     content: String,
//! }
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Greeting {
//!     #[serde(rename = "@from")]
//!     from: String,
//!     #[serde(rename = "@to")]
//!     to: String,
//!     #[serde(rename = "Message")]
//!     message: Message,
//! }
//!
//! let greeting = Greeting {
//!     from: "Ryan".to_string(),
//!     to: "Bill".to_string(),
//!     message: Message { content: "Hi".to_string() },
//! };
//!
//! let xml = to_xml_string(&greeting)?;
//! assert_eq!(xml, r#"<Greeting from="Ryan" to="Bill"><Message>Hi</Message></Greeting>"#);
//!
//! let decoded: Greeting = from_xml_str(&xml)?;
//! assert_eq!(decoded, greeting);
//! # Ok::<(), helios_xml::XmlError>(())
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod schema;
pub mod xml;

// Re-export common types and functions
pub use config::{UnknownFieldPolicy, Xml, XmlConfig};
pub use error::{Result, XmlError};
pub use schema::{FieldDescriptor, Role, Schema, SchemaProvider, TypeDescriptor};

pub use xml::{
    from_xml_reader, from_xml_slice, from_xml_str, to_xml_string, to_xml_string_pretty,
    to_xml_vec, to_xml_writer,
};
