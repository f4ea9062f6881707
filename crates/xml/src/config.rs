//! Format configuration and the [`Xml`] format object.
//!
//! [`XmlConfig`] holds the knobs that change output layout and decoding
//! strictness. [`Xml`] pairs a configuration with a [`Schema`] and is the entry
//! point every free function in this crate delegates to.
//!
//! # Options
//!
//! | Field | Default | Description |
//! |-------|---------|-------------|
//! | `pretty_print` | `false` | Line breaks and indentation between elements |
//! | `indent` | `2` | Spaces per nesting level when pretty printing |
//! | `xml_declaration` | `false` | Prepend `<?xml version="1.0" encoding="UTF-8"?>` |
//! | `unknown_fields` | `skip` | `skip` or `error` on names the schema does not know |
//!
//! `XmlConfig` implements `Deserialize` with every field optional, so it can be
//! embedded in an application's own configuration file.
//!
//! # Example
//!
//! ```rust
//! use helios_xml::{UnknownFieldPolicy, Xml, XmlConfig};
//! use helios_xml::schema::Schema;
//!
//! let xml = Xml::new(
//!     XmlConfig::default()
//!         .with_pretty_print(true)
//!         .with_indent(4)
//!         .with_unknown_fields(UnknownFieldPolicy::Error),
//!     Schema::new(),
//! );
//! assert!(xml.config().pretty_print);
//! ```

use std::io::{Read, Write};

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::Schema;
use crate::xml::{de, ser};

/// What the decoder does with an attribute, element or text run that matches
/// no field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFieldPolicy {
    /// Consume and discard the unmatched value.
    #[default]
    Skip,
    /// Fail with [`crate::XmlError::UnknownField`].
    Error,
}

/// Output layout and decoding options.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct XmlConfig {
    pub pretty_print: bool,
    pub indent: usize,
    pub xml_declaration: bool,
    pub unknown_fields: UnknownFieldPolicy,
}

impl Default for XmlConfig {
    fn default() -> Self {
        Self {
            pretty_print: false,
            indent: 2,
            xml_declaration: false,
            unknown_fields: UnknownFieldPolicy::Skip,
        }
    }
}

impl XmlConfig {
    pub fn with_pretty_print(mut self, pretty_print: bool) -> Self {
        self.pretty_print = pretty_print;
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_xml_declaration(mut self, xml_declaration: bool) -> Self {
        self.xml_declaration = xml_declaration;
        self
    }

    pub fn with_unknown_fields(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_fields = policy;
        self
    }
}

static SHARED: Lazy<Xml> = Lazy::new(Xml::default);

/// XML format: configuration plus schema overrides.
///
/// An `Xml` is immutable once built and can be shared between threads; every
/// call works on its own input and output buffers.
#[derive(Clone, Debug, Default)]
pub struct Xml {
    config: XmlConfig,
    schema: Schema,
}

impl Xml {
    pub fn new(config: XmlConfig, schema: Schema) -> Self {
        Self { config, schema }
    }

    /// Process-wide default format used by the free functions.
    pub fn shared() -> &'static Xml {
        &SHARED
    }

    pub fn config(&self) -> &XmlConfig {
        &self.config
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Serialize `value` to an XML string.
    pub fn to_xml_string<T>(&self, value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        ser::serialize_document(value, &self.schema, &self.config)
    }

    /// Serialize `value` to UTF-8 encoded XML bytes.
    pub fn to_xml_vec<T>(&self, value: &T) -> Result<Vec<u8>>
    where
        T: ?Sized + Serialize,
    {
        self.to_xml_string(value).map(String::into_bytes)
    }

    /// Serialize `value` and write the document to `writer`.
    pub fn to_xml_writer<W, T>(&self, mut writer: W, value: &T) -> Result<()>
    where
        W: Write,
        T: ?Sized + Serialize,
    {
        let xml = self.to_xml_string(value)?;
        writer.write_all(xml.as_bytes())?;
        Ok(())
    }

    /// Deserialize a value from an XML string.
    pub fn from_xml_str<'a, T>(&self, xml: &'a str) -> Result<T>
    where
        T: Deserialize<'a>,
    {
        de::deserialize_document(xml, &self.schema, self.config.unknown_fields)
    }

    /// Deserialize a value from UTF-8 encoded XML bytes.
    pub fn from_xml_slice<'a, T>(&self, xml: &'a [u8]) -> Result<T>
    where
        T: Deserialize<'a>,
    {
        self.from_xml_str(de::utf8(xml)?)
    }

    /// Read `reader` to the end, then deserialize the document.
    pub fn from_xml_reader<R, T>(&self, mut reader: R) -> Result<T>
    where
        R: Read,
        T: DeserializeOwned,
    {
        let mut xml = String::new();
        reader.read_to_string(&mut xml)?;
        self.from_xml_str(&xml)
    }
}
