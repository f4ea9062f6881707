//! Utility functions and constants for XML serialization/deserialization.
//!
//! This module provides helpers for namespace declarations, boolean text forms
//! and escaping of character data.

use std::borrow::Cow;

use crate::error::{Result, XmlError};

/// Prefix (or bare attribute name) that introduces a namespace declaration.
pub const XMLNS: &str = "xmlns";

/// The `xml` prefix is bound to this URI in every document without a declaration.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefix of the implicitly bound `xml` namespace.
pub const XML_PREFIX: &str = "xml";

/// Checks if an attribute name is a namespace declaration.
///
/// `xmlns="..."` declares the default namespace and `xmlns:p="..."` binds `p`.
pub fn is_namespace_declaration(local_name: &str, prefix: Option<&str>) -> bool {
    match prefix {
        Some(prefix) => prefix == XMLNS,
        None => local_name == XMLNS,
    }
}

/// Returns the prefix bound by a namespace declaration attribute.
///
/// The empty string stands for the default namespace.
pub fn declared_prefix<'a>(local_name: &'a str, prefix: Option<&str>) -> &'a str {
    match prefix {
        Some(_) => local_name,
        None => "",
    }
}

/// Converts a Rust boolean to its string representation for XML.
pub fn bool_to_string(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}

/// Parses an `xsd:boolean` lexical form.
pub fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(XmlError::invalid_value(value, "expected a boolean")),
    }
}

/// Escapes character data for use in text content or a quoted attribute value.
pub fn escape(raw: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(raw)
}

/// Resolves predefined entity and character references.
///
/// `position` is the offset of `raw` in the source document and is only used
/// for error reporting.
pub fn unescape(raw: &str, position: usize) -> Result<Cow<'_, str>> {
    quick_xml::escape::unescape(raw).map_err(|e| XmlError::malformed(position, e.to_string()))
}

/// Writes a qualified name, `prefix:local` or just `local`.
pub fn qualify(prefix: &str, local_name: &str) -> String {
    if prefix.is_empty() {
        local_name.to_string()
    } else {
        format!("{}:{}", prefix, local_name)
    }
}
