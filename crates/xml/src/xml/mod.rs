//! Streaming XML encoding and decoding.
//!
//! ## Architecture
//!
//! - **Deserialization**: the [`lexer::Tokenizer`] turns text into tokens one at
//!   a time. The `Deserializer` keeps an explicit stack of open elements; each
//!   token read inside an element is matched against that element's
//!   [`TypeDescriptor`](crate::schema::TypeDescriptor) to find the field it
//!   populates. Namespace declarations on a start tag are collected by scanning
//!   ahead on a snapshot of the tokenizer before any attribute is decoded, so a
//!   prefixed attribute may come before the `xmlns:` attribute that binds it.
//!
//! - **Serialization**: before a struct's start tag is written its field list is
//!   probed, the attribute order is checked, and every namespace the element and
//!   its direct fields need is declared on the start tag. Text goes through a
//!   [`composer::Composer`], compact or pretty.
//!
//! ## Mapping
//!
//! ### Attributes and Text
//!
//! ```xml
//! <ContentAsText first="one" second="two">three<fourth>four</fourth></ContentAsText>
//! ```
//!
//! `first` and `second` are `@first` / `@second` fields, `three` fills the
//! `$text` field and `fourth` is an element field.
//!
//! ### Boolean Presence
//!
//! A boolean field whose attribute or element is present without a value
//! decodes to `true`:
//!
//! ```xml
//! <data required snakeCount="4"/>
//! <data><required/></data>
//! ```
//!
//! ### Repeated Elements
//!
//! A `Vec` element field writes one element per item and reads consecutive
//! siblings with the same resolved name, whatever prefix each one uses:
//!
//! ```xml
//! <list><item>a</item><item>b</item></list>
//! ```
//!
//! ### Optional Fields
//!
//! `None` leaves the attribute or element out; a missing field decodes to `None`.
//!
//! ## Namespace Handling
//!
//! - Unprefixed element names take the default namespace in scope; unprefixed
//!   attributes have no namespace.
//! - A prefix without a declaration in scope fails with
//!   [`XmlError::UndefinedNamespace`](crate::XmlError::UndefinedNamespace).
//! - Declarations apply to the declaring element and its descendants, never to
//!   siblings.
//! - A nested struct is written in its field's namespace, or in its type's own
//!   namespace when the field has none.

pub mod composer;
pub mod de;
pub mod lexer;
pub mod namespace;
pub(crate) mod probe;
pub mod ser;
pub(crate) mod utils;

// Re-export serialization functions
pub use ser::{to_xml_string, to_xml_string_pretty, to_xml_vec, to_xml_writer};

// Re-export deserialization functions
pub use de::{from_xml_reader, from_xml_slice, from_xml_str};
