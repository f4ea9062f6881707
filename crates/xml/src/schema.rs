//! Schema descriptions consumed by the XML encoder and decoder.
//!
//! serde derive supplies the ordered field keys of every struct. This module
//! turns them into [`TypeDescriptor`]s that say how each field maps to XML:
//! as an attribute, a child element or the element's text content, and in
//! which namespace.
//!
//! Without any registration, roles come from the serde key itself:
//!
//! | serde key           | role      | XML name             |
//! |---------------------|-----------|----------------------|
//! | `@name`             | Attribute | `name`               |
//! | `$text`, `$value`   | Content   | (none)               |
//! | `{urn:x}name`       | Element   | `name` in `urn:x`    |
//! | `@{urn:x}name`      | Attribute | `name` in `urn:x`    |
//! | `name`              | Element   | `name`               |
//!
//! so a type only needs `#[serde(rename = "@from")]` to turn a field into an
//! attribute. [`Schema`] adds per-type overrides on top of that: the type's own
//! namespace, a default namespace declaration and per-field roles, names and
//! namespaces, plus preferred prefixes for namespace URIs.
//!
//! ```rust
//! use helios_xml::schema::{FieldDescriptor, Schema, TypeDescriptor};
//!
//! let schema = Schema::new()
//!     .with_prefix("stream", "http://etherx.jabber.org/streams")
//!     .with_type(
//!         TypeDescriptor::new("stream")
//!             .with_namespace("http://etherx.jabber.org/streams")
//!             .with_default_namespace("jabber:client")
//!             .with_field(FieldDescriptor::attribute("from")),
//!     );
//! # let _ = schema;
//! ```

use std::collections::HashMap;

use crate::error::{Result, XmlError};

/// How a field is represented inside its parent element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// `name="value"` inside the start tag.
    Attribute,
    /// A nested `<name>...</name>` child.
    Element,
    /// Text directly inside the parent element.
    Content,
}

/// Mapping of one serde field to XML.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// The serde field key, as produced by derive (after `rename`).
    pub key: String,
    /// Local XML name.
    pub name: String,
    pub role: Role,
    pub namespace_uri: Option<String>,
}

impl FieldDescriptor {
    /// Derives role, name and namespace from the key conventions.
    pub fn from_key(key: &str) -> Self {
        let (role, rest) = if let Some(rest) = key.strip_prefix('@') {
            (Role::Attribute, rest)
        } else if let Some(rest) = key.strip_prefix('$') {
            (Role::Content, rest)
        } else {
            (Role::Element, key)
        };
        let (namespace_uri, name) = split_namespace(rest);
        Self {
            key: key.to_string(),
            name: name.to_string(),
            role,
            namespace_uri: namespace_uri.map(str::to_string),
        }
    }

    /// Field `key` forced to be an attribute.
    pub fn attribute(key: &str) -> Self {
        Self::from_key(key).with_role(Role::Attribute)
    }

    /// Field `key` forced to be a child element.
    pub fn element(key: &str) -> Self {
        Self::from_key(key).with_role(Role::Element)
    }

    /// Field `key` forced to be text content.
    pub fn content(key: &str) -> Self {
        Self::from_key(key).with_role(Role::Content)
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Uses `name` as the XML local name instead of the one derived from the key.
    pub fn renamed(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_namespace(mut self, uri: &str) -> Self {
        self.namespace_uri = Some(uri.to_string());
        self
    }

    /// Whether a name read from the document refers to this field.
    ///
    /// `namespace` is the resolved URI of the name. Unprefixed names also match
    /// fields without a namespace, since an in-scope default namespace applies
    /// to unprefixed element names.
    fn matches(&self, local_name: &str, namespace: Option<&str>, prefixed: bool) -> bool {
        self.role != Role::Content
            && self.name == local_name
            && (self.namespace_uri.as_deref() == namespace
                || (!prefixed && self.namespace_uri.is_none()))
    }
}

/// `{uri}name` → `(Some(uri), name)`.
fn split_namespace(raw: &str) -> (Option<&str>, &str) {
    raw.strip_prefix('{')
        .and_then(|rest| rest.split_once('}'))
        .map_or((None, raw), |(uri, name)| (Some(uri), name))
}

/// Mapping of one struct type to XML.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Element name used when the type is the document root.
    pub name: String,
    /// Namespace of the type's own element.
    pub namespace: Option<String>,
    /// Default namespace declared (`xmlns="..."`) on the type's element.
    pub default_namespace: Option<String>,
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: None,
            default_namespace: None,
            fields: Vec::new(),
        }
    }

    /// Descriptor built purely from the key conventions.
    pub fn from_keys(name: &str, keys: &[&str]) -> Self {
        Self {
            fields: keys.iter().map(|key| FieldDescriptor::from_key(key)).collect(),
            ..Self::new(name)
        }
    }

    pub fn with_namespace(mut self, uri: &str) -> Self {
        self.namespace = Some(uri.to_string());
        self
    }

    pub fn with_default_namespace(mut self, uri: &str) -> Self {
        self.default_namespace = Some(uri.to_string());
        self
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Descriptor of the field with serde key `key`.
    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.key == key)
    }

    /// Index of the content-role field, if the type has one.
    pub fn content_index(&self) -> Option<usize> {
        self.fields
            .iter()
            .position(|field| field.role == Role::Content)
    }

    /// First field, in declared order, referred to by a document name.
    pub fn find_field(
        &self,
        local_name: &str,
        namespace: Option<&str>,
        prefixed: bool,
    ) -> Option<usize> {
        self.fields
            .iter()
            .position(|field| field.matches(local_name, namespace, prefixed))
    }

    /// Element field without a namespace of its own, named `local_name`.
    ///
    /// Such a field written as a nested struct takes the namespace of the
    /// struct's type, which only the type's descriptor can confirm.
    pub fn find_typed_element(&self, local_name: &str) -> Option<usize> {
        self.fields.iter().position(|field| {
            field.role == Role::Element
                && field.namespace_uri.is_none()
                && field.name == local_name
        })
    }

    /// Fails if an attribute field is declared after an element or content field.
    pub fn check_attribute_order(&self) -> Result<()> {
        let mut seen_child = false;
        for field in &self.fields {
            match field.role {
                Role::Attribute if seen_child => {
                    return Err(XmlError::SchemaOrder {
                        field_name: field.name.clone(),
                    });
                }
                Role::Attribute => {}
                Role::Element | Role::Content => seen_child = true,
            }
        }
        Ok(())
    }
}

/// Source of type descriptions for the encoder and decoder.
pub trait SchemaProvider {
    /// Describes the struct `type_name` whose serde field keys are `keys`, in order.
    fn describe(&self, type_name: &str, keys: &[&str]) -> TypeDescriptor;

    /// Preferred prefix for a namespace URI.
    fn prefix_for(&self, _uri: &str) -> Option<&str> {
        None
    }
}

/// Registry of per-type overrides on top of the key conventions.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    types: HashMap<String, TypeDescriptor>,
    prefixes: HashMap<String, String>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers overrides for the serde type named `descriptor.name`.
    ///
    /// Fields listed in the descriptor replace the conventions for their key;
    /// other keys keep them. Field order always follows serde.
    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.insert(descriptor.name.clone(), descriptor);
        self
    }

    /// Prefers `prefix` when declaring `uri` on output.
    pub fn with_prefix(mut self, prefix: &str, uri: &str) -> Self {
        self.prefixes.insert(uri.to_string(), prefix.to_string());
        self
    }
}

impl SchemaProvider for Schema {
    fn describe(&self, type_name: &str, keys: &[&str]) -> TypeDescriptor {
        let Some(registered) = self.types.get(type_name) else {
            return TypeDescriptor::from_keys(type_name, keys);
        };
        TypeDescriptor {
            name: registered.name.clone(),
            namespace: registered.namespace.clone(),
            default_namespace: registered.default_namespace.clone(),
            fields: keys
                .iter()
                .map(|key| {
                    registered
                        .field(key)
                        .cloned()
                        .unwrap_or_else(|| FieldDescriptor::from_key(key))
                })
                .collect(),
        }
    }

    fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.prefixes.get(uri).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_conventions() {
        let attribute = FieldDescriptor::from_key("@from");
        assert_eq!(attribute.role, Role::Attribute);
        assert_eq!(attribute.name, "from");
        assert_eq!(attribute.namespace_uri, None);

        let content = FieldDescriptor::from_key("$text");
        assert_eq!(content.role, Role::Content);

        let element = FieldDescriptor::from_key("{urn:x}message");
        assert_eq!(element.role, Role::Element);
        assert_eq!(element.name, "message");
        assert_eq!(element.namespace_uri.as_deref(), Some("urn:x"));

        let namespaced = FieldDescriptor::from_key("@{urn:x}lang");
        assert_eq!(namespaced.role, Role::Attribute);
        assert_eq!(namespaced.name, "lang");
        assert_eq!(namespaced.key, "@{urn:x}lang");
    }

    #[test]
    fn test_unterminated_namespace_is_a_plain_name() {
        let field = FieldDescriptor::from_key("{oops");
        assert_eq!(field.name, "{oops");
        assert_eq!(field.namespace_uri, None);
    }

    #[test]
    fn test_check_attribute_order() {
        let ok = TypeDescriptor::from_keys("Greeting", &["@from", "@to", "message"]);
        assert!(ok.check_attribute_order().is_ok());

        let bad = TypeDescriptor::from_keys("Greeting", &["@from", "message", "@to"]);
        match bad.check_attribute_order() {
            Err(XmlError::SchemaOrder { field_name }) => assert_eq!(field_name, "to"),
            other => panic!("expected schema order error, got {:?}", other),
        }
    }

    #[test]
    fn test_find_field_ignores_role_and_takes_first_match() {
        let descriptor = TypeDescriptor::from_keys("data", &["required", "@required", "$text"]);
        assert_eq!(descriptor.find_field("required", None, false), Some(0));
        assert_eq!(descriptor.find_field("text", None, false), None);
        assert_eq!(descriptor.content_index(), Some(2));
    }

    #[test]
    fn test_find_field_namespaces() {
        let descriptor = TypeDescriptor::from_keys("a", &["@b", "@{urn:x}c", "d"]);
        assert_eq!(descriptor.find_field("c", Some("urn:x"), true), Some(1));
        assert_eq!(descriptor.find_field("c", None, false), None);
        assert_eq!(descriptor.find_field("c", Some("urn:y"), true), None);
        // Unprefixed element under a default namespace still finds plain fields.
        assert_eq!(descriptor.find_field("d", Some("urn:d"), false), Some(2));
        assert_eq!(descriptor.find_field("d", Some("urn:d"), true), None);

        assert_eq!(descriptor.find_typed_element("d"), Some(2));
        assert_eq!(descriptor.find_typed_element("b"), None);
        assert_eq!(descriptor.find_typed_element("c"), None);
    }

    #[test]
    fn test_schema_overrides_keep_serde_order() {
        let schema = Schema::new()
            .with_prefix("p", "urn:p")
            .with_type(
                TypeDescriptor::new("Greeting")
                    .with_namespace("urn:p")
                    .with_field(FieldDescriptor::attribute("from").renamed("sender")),
            );
        let descriptor = schema.describe("Greeting", &["from", "message"]);
        assert_eq!(descriptor.namespace.as_deref(), Some("urn:p"));
        assert_eq!(descriptor.fields[0].role, Role::Attribute);
        assert_eq!(descriptor.fields[0].name, "sender");
        assert_eq!(descriptor.fields[1], FieldDescriptor::from_key("message"));
        assert_eq!(schema.prefix_for("urn:p"), Some("p"));
        assert_eq!(schema.prefix_for("urn:q"), None);

        let plain = schema.describe("Other", &["@a"]);
        assert_eq!(plain, TypeDescriptor::from_keys("Other", &["@a"]));
    }
}
