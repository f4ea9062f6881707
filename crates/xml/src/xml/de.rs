//! XML deserialization implementation using custom serde::Deserializer.
//!
//! This module implements streaming deserialization from XML text to typed
//! values. The [`Tokenizer`] is pulled one token at a time; every struct that
//! serde asks for becomes one frame on an explicit stack, and each token read
//! inside that frame is matched against the frame's [`TypeDescriptor`] to find
//! the field it populates.

use std::io::Read;

use serde::de::{self, Deserialize, DeserializeOwned, IntoDeserializer, Visitor};
use tracing::{debug, trace};

use crate::config::{UnknownFieldPolicy, Xml};
use crate::error::{Result, XmlError};
use crate::schema::{SchemaProvider, TypeDescriptor};
use crate::xml::lexer::{QualifiedName, Token, Tokenizer};
use crate::xml::namespace::NamespaceScope;
use crate::xml::utils;

/// Deserialize a value from an XML string using the shared default format.
///
/// # Examples
///
/// ```rust
/// use helios_xml::from_xml_str;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Greeting {
///     #[serde(rename = "@from")]
///     from: String,
///     message: String,
/// }
///
/// let xml = r#"<Greeting from="Ryan"><message>Hi</message></Greeting>"#;
/// let greeting: Greeting = from_xml_str(xml)?;
/// assert_eq!(greeting.from, "Ryan");
/// assert_eq!(greeting.message, "Hi");
/// # Ok::<(), helios_xml::XmlError>(())
/// ```
pub fn from_xml_str<'a, T>(xml: &'a str) -> Result<T>
where
    T: Deserialize<'a>,
{
    Xml::shared().from_xml_str(xml)
}

/// Deserialize a value from XML bytes.
pub fn from_xml_slice<'a, T>(xml: &'a [u8]) -> Result<T>
where
    T: Deserialize<'a>,
{
    Xml::shared().from_xml_slice(xml)
}

/// Deserialize a value from an XML reader.
///
/// The whole input is read into memory before decoding starts.
pub fn from_xml_reader<R: Read, T: DeserializeOwned>(reader: R) -> Result<T> {
    Xml::shared().from_xml_reader(reader)
}

/// Decodes one document with an explicit schema and unknown-field policy.
pub(crate) fn deserialize_document<'a, T, S>(
    xml: &'a str,
    schema: &S,
    unknown_fields: UnknownFieldPolicy,
) -> Result<T>
where
    T: Deserialize<'a>,
    S: SchemaProvider + ?Sized,
{
    let mut deserializer = XmlDeserializer::new(xml, schema, unknown_fields);
    let value = T::deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(value)
}

pub(crate) fn utf8(xml: &[u8]) -> Result<&str> {
    std::str::from_utf8(xml).map_err(|e| XmlError::malformed(e.valid_up_to(), e.to_string()))
}

/// Where the next `deserialize_*` call takes its value from.
#[derive(Debug, Default)]
enum ValueSource {
    /// Nothing read yet; the value is the document element.
    #[default]
    Root,
    /// The attribute whose name token was just consumed.
    Attribute,
    /// A text run that was already consumed.
    Text(String),
    /// Content field of an element that closed without text.
    Absent,
    /// A child element whose start token was consumed, with its own scope.
    Element {
        name: QualifiedName,
        scope: NamespaceScope,
        /// Set when the element matched a plain field by local name only; the
        /// value must then be a struct whose type lives in this namespace.
        type_namespace: Option<String>,
    },
}

/// One open element being decoded into a struct.
#[derive(Debug)]
struct Frame {
    name: QualifiedName,
    scope: NamespaceScope,
    descriptor: TypeDescriptor,
}

/// XML Deserializer that pulls tokens from a [`Tokenizer`].
pub struct XmlDeserializer<'x, 's, S: SchemaProvider + ?Sized> {
    tokenizer: Tokenizer<'x>,
    /// One token of pushback.
    peeked: Option<Token>,
    schema: &'s S,
    unknown_fields: UnknownFieldPolicy,
    frames: Vec<Frame>,
    source: ValueSource,
}

impl<'x, 's, S: SchemaProvider + ?Sized> XmlDeserializer<'x, 's, S> {
    pub fn new(xml: &'x str, schema: &'s S, unknown_fields: UnknownFieldPolicy) -> Self {
        Self {
            tokenizer: Tokenizer::new(xml),
            peeked: None,
            schema,
            unknown_fields,
            frames: Vec::new(),
            source: ValueSource::Root,
        }
    }

    /// Checks that nothing but insignificant markup follows the document element.
    pub fn end(&mut self) -> Result<()> {
        match self.next_token()? {
            Token::DocumentEnd => Ok(()),
            other => Err(XmlError::malformed(
                self.tokenizer.position(),
                format!("unexpected {} after the document element", other),
            )),
        }
    }

    fn peek_token(&mut self) -> Result<&Token> {
        if self.peeked.is_none() {
            self.peeked = Some(self.tokenizer.next_token()?);
        }
        self.peeked
            .as_ref()
            .ok_or_else(|| XmlError::malformed(self.tokenizer.position(), "no token available"))
    }

    fn next_token(&mut self) -> Result<Token> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.tokenizer.next_token(),
        }
    }

    /// Scope of the innermost open element.
    fn current_scope(&self) -> NamespaceScope {
        self.frames
            .last()
            .map(|frame| frame.scope.clone())
            .unwrap_or_default()
    }

    /// Consumes the value of the attribute whose name was just read, if it has one.
    fn take_attribute_value(&mut self) -> Result<Option<String>> {
        if matches!(self.peek_token()?, Token::AttributeValue(_)) {
            if let Token::AttributeValue(value) = self.next_token()? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn check_close(&self, opened: &QualifiedName, closing: Option<&QualifiedName>) -> Result<()> {
        match closing {
            Some(closing) if closing != opened => Err(XmlError::malformed(
                self.tokenizer.position(),
                format!("expected </{}>, found </{}>", opened, closing),
            )),
            _ => Ok(()),
        }
    }

    /// Reads up to and including the document element's start token.
    fn read_root_start(&mut self) -> Result<(QualifiedName, NamespaceScope)> {
        match self.next_token()? {
            Token::ElementStart(name) => {
                let scope = NamespaceScope::root().enter_start_tag(&self.tokenizer)?;
                scope.resolve_element(&name)?;
                Ok((name, scope))
            }
            Token::DocumentEnd => Err(XmlError::malformed(
                self.tokenizer.position(),
                "document has no root element",
            )),
            other => Err(XmlError::malformed(
                self.tokenizer.position(),
                format!("unexpected {} before the document element", other),
            )),
        }
    }

    /// Skips the rest of an element whose start token was consumed.
    fn skip_element(&mut self) -> Result<()> {
        let mut depth = 1usize;
        loop {
            match self.next_token()? {
                Token::ElementStart(_) => depth += 1,
                Token::ElementEnd(_) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Token::DocumentEnd => {
                    return Err(XmlError::malformed(
                        self.tokenizer.position(),
                        "unexpected end of input inside an element",
                    ));
                }
                _ => {}
            }
        }
    }

    /// Reads the text of a simple element whose start token was consumed.
    ///
    /// Attributes are ignored. Returns `None` for `<name/>` and `<name></name>`.
    fn read_element_text(&mut self, name: &QualifiedName) -> Result<Option<String>> {
        let mut text = None;
        loop {
            match self.next_token()? {
                Token::AttributeName(_) => {
                    self.take_attribute_value()?;
                }
                Token::ElementStartEnd => {}
                Token::Text(content) if text.is_none() => text = Some(content),
                Token::ElementEnd(closing) => {
                    self.check_close(name, closing.as_ref())?;
                    return Ok(text);
                }
                other => return Err(XmlError::unexpected("text or end of element", other)),
            }
        }
    }

    /// Raw string of the current value. A valueless attribute is an error.
    fn read_string(&mut self) -> Result<String> {
        match std::mem::take(&mut self.source) {
            ValueSource::Attribute => match self.next_token()? {
                Token::AttributeValue(value) => Ok(value),
                other => Err(XmlError::unexpected("attribute value", other)),
            },
            ValueSource::Text(text) => Ok(text),
            ValueSource::Absent => Ok(String::new()),
            ValueSource::Element {
                name,
                type_namespace: Some(uri),
                ..
            } => Err(namespaced_scalar(&name, &uri)),
            ValueSource::Element { name, .. } => {
                Ok(self.read_element_text(&name)?.unwrap_or_default())
            }
            ValueSource::Root => Err(XmlError::Unsupported(
                "a scalar value cannot be the document element".to_string(),
            )),
        }
    }

    /// Raw string of the current value, or `None` when the attribute or element
    /// is present without one.
    fn read_flag(&mut self) -> Result<Option<String>> {
        match std::mem::take(&mut self.source) {
            ValueSource::Attribute => self.take_attribute_value(),
            ValueSource::Text(text) => Ok(Some(text)),
            ValueSource::Absent => Ok(None),
            ValueSource::Element {
                name,
                type_namespace: Some(uri),
                ..
            } => Err(namespaced_scalar(&name, &uri)),
            ValueSource::Element { name, .. } => self.read_element_text(&name),
            ValueSource::Root => Err(XmlError::Unsupported(
                "a scalar value cannot be the document element".to_string(),
            )),
        }
    }

    fn parse_scalar<T>(&mut self, expected: &str) -> Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.read_string()?;
        raw.trim()
            .parse()
            .map_err(|e| XmlError::invalid_value(&raw, format!("expected {}: {}", expected, e)))
    }

    /// Consumes the current value without decoding it.
    fn skip_value(&mut self) -> Result<()> {
        match std::mem::take(&mut self.source) {
            ValueSource::Attribute => {
                self.take_attribute_value()?;
            }
            ValueSource::Text(_) | ValueSource::Absent => {}
            ValueSource::Element { .. } => self.skip_element()?,
            ValueSource::Root => {
                self.read_root_start()?;
                self.skip_element()?;
            }
        }
        Ok(())
    }
}

fn namespaced_scalar(name: &QualifiedName, uri: &str) -> XmlError {
    XmlError::unexpected(
        format!("a struct in namespace '{}'", uri),
        format!("text element <{}>", name),
    )
}

impl<'de, 'a, 'x, 's, S: SchemaProvider + ?Sized> de::Deserializer<'de>
    for &'a mut XmlDeserializer<'x, 's, S>
{
    type Error = XmlError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        // Without type information the only self-describing value is text.
        visitor.visit_string(self.read_string()?)
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        // Presence alone (`<data required/>`, `<data><required/></data>`) means true.
        match self.read_flag()? {
            None => visitor.visit_bool(true),
            Some(value) => visitor.visit_bool(utils::parse_bool(value.trim())?),
        }
    }

    fn deserialize_i8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i8(self.parse_scalar("i8")?)
    }

    fn deserialize_i16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i16(self.parse_scalar("i16")?)
    }

    fn deserialize_i32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i32(self.parse_scalar("i32")?)
    }

    fn deserialize_i64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i64(self.parse_scalar("i64")?)
    }

    fn deserialize_u8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u8(self.parse_scalar("u8")?)
    }

    fn deserialize_u16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u16(self.parse_scalar("u16")?)
    }

    fn deserialize_u32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u32(self.parse_scalar("u32")?)
    }

    fn deserialize_u64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u64(self.parse_scalar("u64")?)
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_f32(self.parse_scalar("f32")?)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_f64(self.parse_scalar("f64")?)
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let value = self.read_string()?;
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(XmlError::invalid_value(&value, "expected a single character")),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let value = self.read_string()?;
        visitor.visit_str(&value)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_string(self.read_string()?)
    }

    fn deserialize_bytes<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(XmlError::Unsupported("bytes".to_string()))
    }

    fn deserialize_byte_buf<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(XmlError::Unsupported("byte buffers".to_string()))
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        // Absent fields never reach the deserializer; serde fills them with None.
        // Content of an element without text is the one absence seen here.
        if matches!(self.source, ValueSource::Absent) {
            self.source = ValueSource::Root;
            return visitor.visit_none();
        }
        visitor.visit_some(self)
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.skip_value()?;
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.skip_value()?;
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match std::mem::take(&mut self.source) {
            ValueSource::Element {
                name,
                scope,
                type_namespace,
            } => {
                let access = ElementSeqAccess::new(self, name, scope, type_namespace)?;
                visitor.visit_seq(access)
            }
            _ => Err(XmlError::Unsupported(
                "sequences must be repeated child elements".to_string(),
            )),
        }
    }

    fn deserialize_tuple<V>(self, _len: usize, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(XmlError::Unsupported("tuples".to_string()))
    }

    fn deserialize_tuple_struct<V>(
        self,
        name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(XmlError::Unsupported(format!("tuple struct {}", name)))
    }

    fn deserialize_map<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(XmlError::Unsupported("maps".to_string()))
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let descriptor = self.schema.describe(name, fields);
        let (element, scope) = match std::mem::take(&mut self.source) {
            ValueSource::Root => self.read_root_start()?,
            ValueSource::Element {
                name: element,
                scope,
                type_namespace,
            } => {
                if type_namespace.is_some() && type_namespace != descriptor.namespace {
                    let expected = match &descriptor.namespace {
                        Some(uri) => format!("struct {} in namespace '{}'", name, uri),
                        None => format!("struct {} without a namespace", name),
                    };
                    return Err(XmlError::unexpected(
                        expected,
                        format!("element <{}>", element),
                    ));
                }
                (element, scope)
            }
            ValueSource::Attribute | ValueSource::Text(_) | ValueSource::Absent => {
                return Err(XmlError::Unsupported(format!(
                    "struct {} can only be decoded from an element",
                    name
                )));
            }
        };
        trace!(element = %element, type_name = name, "entering element");
        self.frames.push(Frame {
            name: element,
            scope,
            descriptor,
        });
        let mut access = ElementMapAccess::new(self);
        let value = visitor.visit_map(&mut access)?;
        access.finish()?;
        Ok(value)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let variant = self.read_string()?;
        visitor.visit_enum(variant.into_deserializer())
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_string(self.read_string()?)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.skip_value()?;
        visitor.visit_unit()
    }
}

/// MapAccess implementation for decoding an element's attributes, children and
/// text as struct fields.
struct ElementMapAccess<'a, 'x, 's, S: SchemaProvider + ?Sized> {
    de: &'a mut XmlDeserializer<'x, 's, S>,
    /// Index of this element's frame.
    frame: usize,
    /// Whether the element's end token has been consumed.
    finished: bool,
    /// Whether a text run was handed to the content field.
    content_seen: bool,
}

impl<'a, 'x, 's, S: SchemaProvider + ?Sized> ElementMapAccess<'a, 'x, 's, S> {
    fn new(de: &'a mut XmlDeserializer<'x, 's, S>) -> Self {
        let frame = de.frames.len() - 1;
        Self {
            de,
            frame,
            finished: false,
            content_seen: false,
        }
    }

    /// Reads tokens until one populates a field, returning that field's index
    /// with the value source set up, or `None` at the end of the element.
    fn next_field(&mut self) -> Result<Option<usize>> {
        if self.finished {
            return Ok(None);
        }
        loop {
            match self.de.next_token()? {
                Token::ElementStartEnd => continue,
                Token::ElementEnd(closing) => {
                    let frame = &self.de.frames[self.frame];
                    self.de.check_close(&frame.name, closing.as_ref())?;
                    trace!(element = %frame.name, "leaving element");
                    self.finished = true;
                    // An element closed without text still has empty content.
                    let content = frame.descriptor.content_index();
                    if let (Some(index), false) = (content, self.content_seen) {
                        self.content_seen = true;
                        self.de.source = ValueSource::Absent;
                        return Ok(Some(index));
                    }
                    return Ok(None);
                }
                Token::AttributeName(name) => {
                    if name.is_namespace_declaration() {
                        // Already applied to this frame's scope by the pre-scan.
                        self.de.take_attribute_value()?;
                        continue;
                    }
                    let frame = &self.de.frames[self.frame];
                    let namespace = frame.scope.resolve_attribute(&name)?;
                    let index = frame.descriptor.find_field(
                        &name.local_name,
                        namespace.as_deref(),
                        name.prefix.is_some(),
                    );
                    self.de.source = ValueSource::Attribute;
                    match index {
                        Some(index) => return Ok(Some(index)),
                        None => self.unknown_field(name.to_string())?,
                    }
                }
                Token::ElementStart(name) => {
                    let frame = &self.de.frames[self.frame];
                    let scope = frame.scope.enter_start_tag(&self.de.tokenizer)?;
                    let namespace = scope.resolve_element(&name)?;
                    let exact = frame.descriptor.find_field(
                        &name.local_name,
                        namespace.as_deref(),
                        name.prefix.is_some(),
                    );
                    let (index, type_namespace) = match (exact, namespace) {
                        (Some(index), _) => (Some(index), None),
                        (None, Some(uri)) => {
                            (frame.descriptor.find_typed_element(&name.local_name), Some(uri))
                        }
                        (None, None) => (None, None),
                    };
                    let display_name = name.to_string();
                    self.de.source = ValueSource::Element {
                        name,
                        scope,
                        type_namespace,
                    };
                    match index {
                        Some(index) => return Ok(Some(index)),
                        None => self.unknown_field(display_name)?,
                    }
                }
                Token::Text(text) => {
                    let index = self.de.frames[self.frame].descriptor.content_index();
                    self.content_seen |= index.is_some();
                    self.de.source = ValueSource::Text(text);
                    match index {
                        Some(index) => return Ok(Some(index)),
                        None => self.unknown_field("text content".to_string())?,
                    }
                }
                Token::DocumentEnd => {
                    return Err(XmlError::malformed(
                        self.de.tokenizer.position(),
                        format!(
                            "unexpected end of input, expecting </{}>",
                            self.de.frames[self.frame].name
                        ),
                    ));
                }
                other => return Err(XmlError::unexpected("attribute, element or text", other)),
            }
        }
    }

    /// Applies the unknown-field policy to the pending value source.
    fn unknown_field(&mut self, name: String) -> Result<()> {
        match self.de.unknown_fields {
            UnknownFieldPolicy::Error => Err(XmlError::UnknownField { name }),
            UnknownFieldPolicy::Skip => {
                debug!(
                    field = %name,
                    element = %self.de.frames[self.frame].name,
                    "skipping unknown field"
                );
                self.de.skip_value()
            }
        }
    }

    /// Consumes whatever the visitor did not read, up to the element's end.
    fn finish(&mut self) -> Result<()> {
        while self.next_field()?.is_some() {
            self.de.skip_value()?;
        }
        Ok(())
    }
}

impl<'a, 'x, 's, S: SchemaProvider + ?Sized> Drop for ElementMapAccess<'a, 'x, 's, S> {
    fn drop(&mut self) {
        self.de.frames.truncate(self.frame);
    }
}

impl<'de, 'a, 'x, 's, S: SchemaProvider + ?Sized> de::MapAccess<'de>
    for ElementMapAccess<'a, 'x, 's, S>
{
    type Error = XmlError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.next_field()? {
            Some(index) => {
                let key = self.de.frames[self.frame].descriptor.fields[index]
                    .key
                    .clone();
                seed.deserialize(de::value::StringDeserializer::<XmlError>::new(key))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        seed.deserialize(&mut *self.de)
    }
}

/// SeqAccess implementation for decoding consecutive sibling elements with the
/// same name as one sequence.
///
/// Siblings belong to the sequence when their resolved names match, whatever
/// prefix they are written with.
struct ElementSeqAccess<'a, 'x, 's, S: SchemaProvider + ?Sized> {
    de: &'a mut XmlDeserializer<'x, 's, S>,
    local_name: String,
    namespace: Option<String>,
    type_namespace: Option<String>,
    /// First item, whose start token was already consumed.
    first: Option<(QualifiedName, NamespaceScope)>,
}

impl<'a, 'x, 's, S: SchemaProvider + ?Sized> ElementSeqAccess<'a, 'x, 's, S> {
    fn new(
        de: &'a mut XmlDeserializer<'x, 's, S>,
        name: QualifiedName,
        scope: NamespaceScope,
        type_namespace: Option<String>,
    ) -> Result<Self> {
        let namespace = scope.resolve_element(&name)?;
        Ok(Self {
            de,
            local_name: name.local_name.clone(),
            namespace,
            type_namespace,
            first: Some((name, scope)),
        })
    }

    /// Consumes the next sibling's start token if it continues the sequence.
    fn next_sibling(&mut self) -> Result<Option<(QualifiedName, NamespaceScope)>> {
        let name = match self.de.peek_token()? {
            Token::ElementStart(next) if next.local_name == self.local_name => next.clone(),
            _ => return Ok(None),
        };
        let scope = self.de.current_scope().enter_start_tag(&self.de.tokenizer)?;
        if scope.resolve_element(&name)? != self.namespace {
            return Ok(None);
        }
        self.de.next_token()?;
        Ok(Some((name, scope)))
    }
}

impl<'de, 'a, 'x, 's, S: SchemaProvider + ?Sized> de::SeqAccess<'de>
    for ElementSeqAccess<'a, 'x, 's, S>
{
    type Error = XmlError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        let item = match self.first.take() {
            Some(first) => Some(first),
            None => self.next_sibling()?,
        };
        let Some((name, scope)) = item else {
            return Ok(None);
        };
        self.de.source = ValueSource::Element {
            name,
            scope,
            type_namespace: self.type_namespace.clone(),
        };
        seed.deserialize(&mut *self.de).map(Some)
    }
}
