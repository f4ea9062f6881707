//! Schema-free XML document tree.
//!
//! For documents whose shape is not known ahead of time. Decoding uses the same
//! [`Tokenizer`] as the typed decoder, so the same lexical rules apply: comments
//! and processing instructions are dropped, CDATA is inlined into text, and
//! text runs are trimmed. Namespace prefixes are checked against the
//! declarations in scope but kept as written; declarations stay in the tree as
//! ordinary attributes so a decoded document encodes back to the same bindings.
//!
//! ```rust
//! use helios_xml::entity::XmlDocument;
//! use helios_xml::XmlConfig;
//!
//! let doc: XmlDocument = r#"<greeting from="Ryan">Hi</greeting>"#.parse()?;
//! assert_eq!(doc.root.name, "greeting");
//! assert_eq!(doc.root.attribute("from"), Some("Ryan"));
//! assert_eq!(
//!     doc.to_xml_string(&XmlConfig::default()),
//!     r#"<greeting from="Ryan">Hi</greeting>"#
//! );
//! # Ok::<(), helios_xml::XmlError>(())
//! ```

use std::fmt;
use std::str::FromStr;

use crate::config::XmlConfig;
use crate::error::{Result, XmlError};
use crate::xml::composer::{CompactComposer, Composer, PrettyComposer};
use crate::xml::lexer::{QualifiedName, Token, Tokenizer};
use crate::xml::namespace::NamespaceScope;
use crate::xml::ser::XML_DECLARATION;
use crate::xml::utils;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlDocument {
    pub root: XmlElement,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub prefix: Option<String>,
    pub attributes: Vec<XmlAttribute>,
    pub content: Vec<XmlContent>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
    pub prefix: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XmlContent {
    Element(XmlElement),
    Value(XmlValue),
    Comment(XmlComment),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlValue {
    pub text: String,
}

/// Comment node. Only produced by hand; decoding drops comments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlComment {
    pub text: String,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            attributes: Vec::new(),
            content: Vec::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(XmlAttribute::new(name, value));
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.content.push(XmlContent::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content.push(XmlContent::Value(XmlValue { text: text.into() }));
        self
    }

    pub fn with_comment(mut self, text: impl Into<String>) -> Self {
        self.content
            .push(XmlContent::Comment(XmlComment { text: text.into() }));
        self
    }

    /// Value of the first unprefixed attribute called `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.prefix.is_none() && attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }

    /// Child elements, in document order.
    pub fn children(&self) -> impl Iterator<Item = &XmlElement> {
        self.content.iter().filter_map(|content| match content {
            XmlContent::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Concatenated text directly inside this element.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|content| match content {
                XmlContent::Value(value) => Some(value.text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn qualified_name(&self) -> String {
        utils::qualify(self.prefix.as_deref().unwrap_or(""), &self.name)
    }

    fn from_name(name: QualifiedName) -> Self {
        Self {
            name: name.local_name,
            prefix: name.prefix,
            attributes: Vec::new(),
            content: Vec::new(),
        }
    }
}

impl XmlAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            prefix: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// Element under construction while decoding.
struct OpenElement {
    element: XmlElement,
    scope: NamespaceScope,
}

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        Self { root }
    }

    /// Decodes a whole document into a tree.
    pub fn from_xml_str(xml: &str) -> Result<Self> {
        let mut tokenizer = Tokenizer::new(xml);
        let mut open: Vec<OpenElement> = Vec::new();
        let mut root = None;
        loop {
            let token = tokenizer.next_token()?;
            match token {
                Token::ElementStart(name) => {
                    if root.is_some() {
                        return Err(XmlError::malformed(
                            tokenizer.position(),
                            "more than one document element",
                        ));
                    }
                    let parent = open
                        .last()
                        .map(|parent| parent.scope.clone())
                        .unwrap_or_default();
                    let scope = parent.enter_start_tag(&tokenizer)?;
                    scope.resolve_element(&name)?;
                    open.push(OpenElement {
                        element: XmlElement::from_name(name),
                        scope,
                    });
                }
                Token::AttributeName(name) => {
                    let current = innermost(&mut open, &tokenizer)?;
                    if !name.is_namespace_declaration() {
                        current.scope.resolve_attribute(&name)?;
                    }
                    current.element.attributes.push(XmlAttribute {
                        name: name.local_name,
                        value: String::new(),
                        prefix: name.prefix,
                    });
                }
                Token::AttributeValue(value) => {
                    let current = innermost(&mut open, &tokenizer)?;
                    if let Some(attribute) = current.element.attributes.last_mut() {
                        attribute.value = value;
                    }
                }
                Token::ElementStartEnd => {}
                Token::Text(text) => {
                    let current = innermost(&mut open, &tokenizer)?;
                    current.element.content.push(XmlContent::Value(XmlValue { text }));
                }
                Token::ElementEnd(closing) => {
                    let finished = open.pop().ok_or_else(|| {
                        XmlError::malformed(tokenizer.position(), "closing tag without an open element")
                    })?;
                    if let Some(closing) = closing {
                        if closing.local_name != finished.element.name
                            || closing.prefix != finished.element.prefix
                        {
                            return Err(XmlError::malformed(
                                tokenizer.position(),
                                format!(
                                    "expected </{}>, found </{}>",
                                    finished.element.qualified_name(),
                                    closing
                                ),
                            ));
                        }
                    }
                    match open.last_mut() {
                        Some(parent) => parent
                            .element
                            .content
                            .push(XmlContent::Element(finished.element)),
                        None => root = Some(finished.element),
                    }
                }
                Token::DocumentEnd => break,
                Token::None => {}
            }
        }
        if let Some(unclosed) = open.last() {
            return Err(XmlError::malformed(
                tokenizer.position(),
                format!("element <{}> is never closed", unclosed.element.qualified_name()),
            ));
        }
        root.map(XmlDocument::new).ok_or_else(|| {
            XmlError::malformed(tokenizer.position(), "document has no root element")
        })
    }

    /// Encodes the tree, honoring the layout options of `config`.
    pub fn to_xml_string(&self, config: &XmlConfig) -> String {
        if config.pretty_print {
            self.compose(config, PrettyComposer::new(config.indent))
        } else {
            self.compose(config, CompactComposer::new())
        }
    }

    fn compose<C: Composer>(&self, config: &XmlConfig, mut composer: C) -> String {
        if config.xml_declaration {
            composer.append(XML_DECLARATION);
        }
        write_element(&self.root, &mut composer);
        composer.finish()
    }
}

fn innermost<'o>(open: &'o mut [OpenElement], tokenizer: &Tokenizer<'_>) -> Result<&'o mut OpenElement> {
    open.last_mut()
        .ok_or_else(|| XmlError::malformed(tokenizer.position(), "content outside of the document element"))
}

fn write_element<C: Composer>(element: &XmlElement, composer: &mut C) {
    let tag = element.qualified_name();
    composer.new_element();
    composer.append("<");
    composer.append(&tag);
    for attribute in &element.attributes {
        composer.new_attribute();
        composer.append(&utils::qualify(
            attribute.prefix.as_deref().unwrap_or(""),
            &attribute.name,
        ));
        composer.append("=\"");
        composer.append(&utils::escape(&attribute.value));
        composer.append("\"");
    }
    if element.content.is_empty() {
        composer.append("/>");
        return;
    }
    composer.append(">");
    composer.indent();
    let mut has_children = false;
    for content in &element.content {
        match content {
            XmlContent::Element(child) => {
                has_children = true;
                write_element(child, composer);
            }
            XmlContent::Value(value) => composer.append(&utils::escape(&value.text)),
            XmlContent::Comment(comment) => {
                has_children = true;
                composer.new_element();
                composer.append("<!--");
                composer.append(&comment.text);
                composer.append("-->");
            }
        }
    }
    composer.unindent();
    if has_children {
        composer.append_line();
    }
    composer.append("</");
    composer.append(&tag);
    composer.append(">");
}

impl FromStr for XmlDocument {
    type Err = XmlError;

    fn from_str(xml: &str) -> Result<Self> {
        XmlDocument::from_xml_str(xml)
    }
}

impl fmt::Display for XmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml_string(&XmlConfig::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let element = XmlElement::new("data")
            .with_attribute("id", "1")
            .with_text("a")
            .with_child(XmlElement::new("b"))
            .with_text("c");
        assert_eq!(element.attribute("id"), Some("1"));
        assert_eq!(element.text(), "ac");
        assert_eq!(element.children().count(), 1);
    }

    #[test]
    fn test_comment_is_written() {
        let doc = XmlDocument::new(XmlElement::new("a").with_comment(" note "));
        assert_eq!(doc.to_string(), "<a><!-- note --></a>");
    }
}
