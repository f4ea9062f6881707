//! XML serialization implementation using custom serde::Serializer.
//!
//! Every struct becomes one element. Before its start tag is written, the
//! struct's field list is probed (see [`crate::xml::probe`]) so that the
//! attribute order can be checked and every namespace the element and its
//! direct fields need can be declared on the start tag itself. Output goes
//! through a [`Composer`], which owns all whitespace decisions.

use std::io::Write;

use serde::ser::{self, Impossible, Serialize};
use tracing::{debug, trace};

use crate::config::{Xml, XmlConfig};
use crate::error::{Result, XmlError};
use crate::schema::{FieldDescriptor, Role, SchemaProvider, TypeDescriptor};
use crate::xml::composer::{CompactComposer, Composer, PrettyComposer};
use crate::xml::namespace::NamespaceScope;
use crate::xml::probe::{self, Shape};
use crate::xml::utils::{self, XMLNS};

/// Written before the document element when `xml_declaration` is enabled.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Serialize a value to a compact XML string using the shared default format.
///
/// # Examples
///
/// ```rust
/// use helios_xml::to_xml_string;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Greeting {
///     #[serde(rename = "@from")]
///     from: String,
///     #[serde(rename = "@to")]
///     to: String,
///     message: String,
/// }
///
/// let greeting = Greeting {
///     from: "Ryan".to_string(),
///     to: "Bill".to_string(),
///     message: "Hi".to_string(),
/// };
/// assert_eq!(
///     to_xml_string(&greeting)?,
///     r#"<Greeting from="Ryan" to="Bill"><message>Hi</message></Greeting>"#
/// );
/// # Ok::<(), helios_xml::XmlError>(())
/// ```
pub fn to_xml_string<T>(value: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    Xml::shared().to_xml_string(value)
}

/// Serialize a value to an indented XML string.
pub fn to_xml_string_pretty<T>(value: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    let config = XmlConfig::default().with_pretty_print(true);
    serialize_document(value, Xml::shared().schema(), &config)
}

/// Serialize a value to an XML byte vector.
pub fn to_xml_vec<T>(value: &T) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    Xml::shared().to_xml_vec(value)
}

/// Serialize a value to an XML writer.
pub fn to_xml_writer<T, W>(value: &T, writer: W) -> Result<()>
where
    T: Serialize + ?Sized,
    W: Write,
{
    Xml::shared().to_xml_writer(writer, value)
}

/// Encodes one document with an explicit schema and configuration.
pub(crate) fn serialize_document<T, S>(value: &T, schema: &S, config: &XmlConfig) -> Result<String>
where
    T: Serialize + ?Sized,
    S: SchemaProvider + ?Sized,
{
    if config.pretty_print {
        write_document(value, schema, config, PrettyComposer::new(config.indent))
    } else {
        write_document(value, schema, config, CompactComposer::new())
    }
}

fn write_document<T, S, C>(value: &T, schema: &S, config: &XmlConfig, mut composer: C) -> Result<String>
where
    T: Serialize + ?Sized,
    S: SchemaProvider + ?Sized,
    C: Composer,
{
    if config.xml_declaration {
        composer.append(XML_DECLARATION);
    }
    let mut serializer = XmlSerializer::new(composer, schema);
    let shape = probe::shape_of(value)?;
    value.serialize(FieldSerializer::root(&mut serializer, shape))?;
    Ok(serializer.finish())
}

/// One open element being written.
#[derive(Debug)]
struct Frame {
    /// Qualified tag name, reused for the closing tag.
    tag: String,
    scope: NamespaceScope,
    descriptor: TypeDescriptor,
    start_tag_closed: bool,
    has_children: bool,
}

/// XML Serializer that writes through a [`Composer`].
struct XmlSerializer<'s, C: Composer, S: SchemaProvider + ?Sized> {
    composer: C,
    schema: &'s S,
    frames: Vec<Frame>,
    /// Counter for `ns{n}` prefixes invented for URIs without a preferred prefix.
    generated_prefixes: usize,
}

impl<'s, C: Composer, S: SchemaProvider + ?Sized> XmlSerializer<'s, C, S> {
    fn new(composer: C, schema: &'s S) -> Self {
        Self {
            composer,
            schema,
            frames: Vec::new(),
            generated_prefixes: 0,
        }
    }

    /// Returns the written document.
    fn finish(self) -> String {
        self.composer.finish()
    }

    fn current_scope(&self) -> NamespaceScope {
        self.frames
            .last()
            .map(|frame| frame.scope.clone())
            .unwrap_or_default()
    }

    /// Closes the innermost start tag before non-attribute output.
    fn close_start_tag(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            if !frame.start_tag_closed {
                self.composer.append(">");
                self.composer.indent();
                frame.start_tag_closed = true;
            }
        }
    }

    /// Marks the innermost element as having element children and closes its start tag.
    fn begin_child_element(&mut self) {
        self.close_start_tag();
        if let Some(frame) = self.frames.last_mut() {
            frame.has_children = true;
        }
    }

    /// A prefix for `uri` that is unbound in `scope`.
    fn fresh_prefix(&mut self, uri: &str, scope: &NamespaceScope) -> String {
        if let Some(preferred) = self.schema.prefix_for(uri) {
            if !preferred.is_empty() && scope.resolve(preferred).is_none() {
                return preferred.to_string();
            }
        }
        loop {
            self.generated_prefixes += 1;
            let candidate = format!("ns{}", self.generated_prefixes);
            if scope.resolve(&candidate).is_none() {
                return candidate;
            }
        }
    }

    /// Prefix for `uri` in `scope`, declaring a new one when none is usable.
    ///
    /// Attributes cannot use the default namespace, so `allow_default` is false for them.
    fn prefix_or_declare(
        &mut self,
        uri: &str,
        allow_default: bool,
        scope: &mut NamespaceScope,
        declarations: &mut Vec<(String, String)>,
    ) -> String {
        if let Some(prefix) = scope.prefix_of(uri, allow_default) {
            return prefix.to_string();
        }
        let prefix = self.fresh_prefix(uri, scope);
        declare(&prefix, uri, scope, declarations);
        prefix
    }

    /// Writes a struct's start tag with all namespace declarations it needs and
    /// pushes its frame.
    ///
    /// `field` is the parent's field the struct is written for; `None` for the
    /// document element, which takes its name from the type descriptor.
    fn start_element(&mut self, field: Option<&FieldDescriptor>, shape: &Shape) -> Result<()> {
        let descriptor = self.schema.describe(shape.type_name, &shape.keys);
        descriptor.check_attribute_order()?;

        let mut scope = self.current_scope();
        let mut declarations = Vec::new();
        let (local_name, namespace) = match field {
            Some(field) => (
                field.name.as_str(),
                field
                    .namespace_uri
                    .as_deref()
                    .or(descriptor.namespace.as_deref()),
            ),
            None => (descriptor.name.as_str(), descriptor.namespace.as_deref()),
        };
        let default_namespace = descriptor.default_namespace.as_deref();

        let prefix = match namespace {
            Some(uri) if default_namespace == Some(uri) => String::new(),
            Some(uri) => self.prefix_or_declare(
                uri,
                default_namespace.is_none(),
                &mut scope,
                &mut declarations,
            ),
            None => String::new(),
        };
        if let Some(uri) = default_namespace {
            if scope.default_namespace() != Some(uri) {
                declare("", uri, &mut scope, &mut declarations);
            }
        }
        for (index, field) in descriptor.fields.iter().enumerate() {
            let uri = match &field.namespace_uri {
                Some(uri) => Some(uri.clone()),
                // A nested struct without a field namespace is written in its type's.
                None if field.role == Role::Element => shape
                    .field_types
                    .get(index)
                    .copied()
                    .flatten()
                    .and_then(|type_name| self.schema.describe(type_name, &[]).namespace),
                None => None,
            };
            if let Some(uri) = uri {
                let allow_default = field.role != Role::Attribute;
                self.prefix_or_declare(&uri, allow_default, &mut scope, &mut declarations);
            }
        }

        self.begin_child_element();
        let tag = utils::qualify(&prefix, local_name);
        trace!(element = %tag, type_name = shape.type_name, "opening element");
        self.composer.new_element();
        self.composer.append("<");
        self.composer.append(&tag);
        for (prefix, uri) in &declarations {
            debug!(prefix = %prefix, uri = %uri, element = %tag, "declaring namespace");
            let name = if prefix.is_empty() {
                XMLNS.to_string()
            } else {
                utils::qualify(XMLNS, prefix)
            };
            self.composer.new_attribute();
            self.composer.append(&name);
            self.composer.append("=\"");
            self.composer.append(&utils::escape(uri));
            self.composer.append("\"");
        }
        self.frames.push(Frame {
            tag,
            scope,
            descriptor,
            start_tag_closed: false,
            has_children: false,
        });
        Ok(())
    }

    /// Pops the innermost frame and closes its element.
    fn end_element(&mut self) -> Result<()> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| XmlError::Custom("no open element to close".to_string()))?;
        if !frame.start_tag_closed {
            self.composer.append("/>");
        } else {
            self.composer.unindent();
            if frame.has_children {
                self.composer.append_line();
            }
            self.composer.append("</");
            self.composer.append(&frame.tag);
            self.composer.append(">");
        }
        trace!(element = %frame.tag, "closed element");
        Ok(())
    }

    fn write_attribute<T>(&mut self, field: &FieldDescriptor, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let Some(text) = probe::scalar_text(value)? else {
            return Ok(());
        };
        let frame = self
            .frames
            .last()
            .ok_or_else(|| XmlError::Custom("attribute outside of an element".to_string()))?;
        if frame.start_tag_closed {
            return Err(XmlError::SchemaOrder {
                field_name: field.name.clone(),
            });
        }
        let prefix = match field.namespace_uri.as_deref() {
            Some(uri) => frame
                .scope
                .prefix_of(uri, false)
                .ok_or_else(|| XmlError::UndefinedNamespace {
                    reference: uri.to_string(),
                })?
                .to_string(),
            None => String::new(),
        };
        self.composer.new_attribute();
        self.composer.append(&utils::qualify(&prefix, &field.name));
        self.composer.append("=\"");
        self.composer.append(&utils::escape(&text));
        self.composer.append("\"");
        Ok(())
    }

    fn write_content<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        if let Some(text) = probe::scalar_text(value)? {
            self.close_start_tag();
            self.composer.append(&utils::escape(&text));
        }
        Ok(())
    }

    /// Writes `<name>text</name>` for a primitive element field.
    fn write_simple_element(&mut self, field: &FieldDescriptor, text: &str) -> Result<()> {
        let tag = self.element_tag(field)?;
        self.begin_child_element();
        self.composer.new_element();
        self.composer.append("<");
        self.composer.append(&tag);
        self.composer.append(">");
        self.composer.append(&utils::escape(text));
        self.composer.append("</");
        self.composer.append(&tag);
        self.composer.append(">");
        Ok(())
    }

    fn write_empty_element(&mut self, field: &FieldDescriptor) -> Result<()> {
        let tag = self.element_tag(field)?;
        self.begin_child_element();
        self.composer.new_element();
        self.composer.append("<");
        self.composer.append(&tag);
        self.composer.append("/>");
        Ok(())
    }

    /// Qualified name of an element field, using the prefix declared on the parent.
    fn element_tag(&self, field: &FieldDescriptor) -> Result<String> {
        match field.namespace_uri.as_deref() {
            Some(uri) => {
                let scope = self.current_scope();
                let prefix = scope.prefix_of(uri, true).ok_or_else(|| {
                    XmlError::UndefinedNamespace {
                        reference: uri.to_string(),
                    }
                })?;
                Ok(utils::qualify(prefix, &field.name))
            }
            None => Ok(field.name.clone()),
        }
    }
}

fn declare(
    prefix: &str,
    uri: &str,
    scope: &mut NamespaceScope,
    declarations: &mut Vec<(String, String)>,
) {
    *scope = scope.extend([(prefix.to_string(), uri.to_string())]);
    declarations.push((prefix.to_string(), uri.to_string()));
}

/// Serializer for one value written as an element: the document element, an
/// element-role field, or one item of a repeated field.
struct FieldSerializer<'a, 's, C: Composer, S: SchemaProvider + ?Sized> {
    ser: &'a mut XmlSerializer<'s, C, S>,
    /// `None` for the document element.
    field: Option<FieldDescriptor>,
    /// Field list of the value when it is a struct.
    shape: Option<Shape>,
    /// Whether `None` may be written by leaving the element out.
    omit_none: bool,
}

impl<'a, 's, C: Composer, S: SchemaProvider + ?Sized> FieldSerializer<'a, 's, C, S> {
    fn root(ser: &'a mut XmlSerializer<'s, C, S>, shape: Option<Shape>) -> Self {
        Self {
            ser,
            field: None,
            shape,
            omit_none: false,
        }
    }

    fn field(
        ser: &'a mut XmlSerializer<'s, C, S>,
        field: FieldDescriptor,
        shape: Option<Shape>,
        omit_none: bool,
    ) -> Self {
        Self {
            ser,
            field: Some(field),
            shape,
            omit_none,
        }
    }

    fn write_scalar(self, text: String) -> Result<()> {
        match &self.field {
            Some(field) => self.ser.write_simple_element(field, &text),
            None => Err(XmlError::Unsupported(
                "the document element must be a struct".to_string(),
            )),
        }
    }

    fn unsupported(&self, what: &str) -> XmlError {
        match &self.field {
            Some(field) => XmlError::Unsupported(format!("{} in field '{}'", what, field.name)),
            None => XmlError::Unsupported(format!("{} as the document element", what)),
        }
    }
}

impl<'a, 's, C: Composer, S: SchemaProvider + ?Sized> ser::Serializer
    for FieldSerializer<'a, 's, C, S>
{
    type Ok = ();
    type Error = XmlError;
    type SerializeSeq = ElementSeqSerializer<'a, 's, C, S>;
    type SerializeTuple = Impossible<(), XmlError>;
    type SerializeTupleStruct = Impossible<(), XmlError>;
    type SerializeTupleVariant = Impossible<(), XmlError>;
    type SerializeMap = Impossible<(), XmlError>;
    type SerializeStruct = StructSerializer<'a, 's, C, S>;
    type SerializeStructVariant = Impossible<(), XmlError>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.write_scalar(utils::bool_to_string(v).to_string())
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.write_scalar(v.to_string())
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.write_scalar(v.to_string())
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.write_scalar(v.to_string())
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.write_scalar(v.to_string())
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.write_scalar(v.to_string())
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.write_scalar(v.to_string())
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.write_scalar(v.to_string())
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.write_scalar(v.to_string())
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.write_scalar(v.to_string())
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.write_scalar(v.to_string())
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.write_scalar(v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.write_scalar(v.to_string())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<()> {
        Err(self.unsupported("bytes"))
    }

    fn serialize_none(self) -> Result<()> {
        if self.omit_none {
            Ok(())
        } else {
            Err(XmlError::UnsupportedNull)
        }
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        match &self.field {
            Some(field) => self.ser.write_empty_element(field),
            None => Err(self.unsupported("unit")),
        }
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        ser::Serializer::serialize_unit(self)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.write_scalar(variant.to_string())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        Err(self.unsupported(&format!("enum variant {}::{}", name, variant)))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        match self.field {
            Some(field) => Ok(ElementSeqSerializer {
                ser: self.ser,
                field,
            }),
            None => Err(XmlError::Unsupported(
                "a sequence as the document element".to_string(),
            )),
        }
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(self.unsupported("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(self.unsupported(&format!("tuple struct {}", name)))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(self.unsupported(&format!("enum variant {}::{}", name, variant)))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(self.unsupported("map"))
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        let shape = self.shape.ok_or_else(|| {
            XmlError::Custom(format!("could not determine the fields of {}", name))
        })?;
        self.ser.start_element(self.field.as_ref(), &shape)?;
        Ok(StructSerializer { ser: self.ser })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(self.unsupported(&format!("enum variant {}::{}", name, variant)))
    }
}

/// Writes the fields of one struct inside its already opened start tag.
struct StructSerializer<'a, 's, C: Composer, S: SchemaProvider + ?Sized> {
    ser: &'a mut XmlSerializer<'s, C, S>,
}

impl<'a, 's, C: Composer, S: SchemaProvider + ?Sized> ser::SerializeStruct
    for StructSerializer<'a, 's, C, S>
{
    type Ok = ();
    type Error = XmlError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let field = self
            .ser
            .frames
            .last()
            .and_then(|frame| frame.descriptor.field(key))
            .cloned()
            .ok_or_else(|| XmlError::Custom(format!("field '{}' was not announced", key)))?;
        match field.role {
            Role::Attribute => self.ser.write_attribute(&field, value),
            Role::Content => self.ser.write_content(value),
            Role::Element => {
                let shape = probe::shape_of(value)?;
                value.serialize(FieldSerializer::field(&mut *self.ser, field, shape, true))
            }
        }
    }

    fn end(self) -> Result<()> {
        self.ser.end_element()
    }
}

/// Writes each item of a repeated field as its own element.
struct ElementSeqSerializer<'a, 's, C: Composer, S: SchemaProvider + ?Sized> {
    ser: &'a mut XmlSerializer<'s, C, S>,
    field: FieldDescriptor,
}

impl<'a, 's, C: Composer, S: SchemaProvider + ?Sized> ser::SerializeSeq
    for ElementSeqSerializer<'a, 's, C, S>
{
    type Ok = ();
    type Error = XmlError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let shape = probe::shape_of(value)?;
        value.serialize(FieldSerializer::field(
            &mut *self.ser,
            self.field.clone(),
            shape,
            false,
        ))
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}
