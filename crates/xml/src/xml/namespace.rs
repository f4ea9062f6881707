//! Namespace scopes: prefix to URI bindings visible at one nesting level.
//!
//! A scope is immutable. Entering an element produces a child scope that shares
//! the parent's map when nothing new is declared and copies it otherwise, so
//! sibling elements never observe each other's declarations.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{Result, XmlError};
use crate::xml::lexer::{QualifiedName, Token, Tokenizer};
use crate::xml::utils::{self, XML_NAMESPACE, XML_PREFIX};

/// Prefix to URI bindings. The empty prefix holds the default namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceScope {
    bindings: Rc<BTreeMap<String, String>>,
}

impl Default for NamespaceScope {
    fn default() -> Self {
        Self::root()
    }
}

impl NamespaceScope {
    /// Document-level scope, with only the `xml` prefix bound.
    pub fn root() -> Self {
        let mut bindings = BTreeMap::new();
        bindings.insert(XML_PREFIX.to_string(), XML_NAMESPACE.to_string());
        Self {
            bindings: Rc::new(bindings),
        }
    }

    /// URI bound to `prefix`; the empty prefix looks up the default namespace.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.bindings.get(prefix).map(String::as_str)
    }

    /// The in-scope default namespace. An empty declaration (`xmlns=""`) unsets it.
    pub fn default_namespace(&self) -> Option<&str> {
        self.resolve("").filter(|uri| !uri.is_empty())
    }

    /// Child scope overlaying `declarations` (prefix, uri) on this one.
    pub fn extend<I>(&self, declarations: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut declarations = declarations.into_iter().peekable();
        if declarations.peek().is_none() {
            return self.clone();
        }
        let mut bindings = (*self.bindings).clone();
        bindings.extend(declarations);
        Self {
            bindings: Rc::new(bindings),
        }
    }

    /// Namespace URI of an element name. Unprefixed names take the default namespace.
    pub fn resolve_element(&self, name: &QualifiedName) -> Result<Option<String>> {
        match &name.prefix {
            Some(prefix) => self.resolve_prefix(prefix).map(Some),
            None => Ok(self.default_namespace().map(str::to_string)),
        }
    }

    /// Namespace URI of an attribute name. Unprefixed attributes have no namespace.
    pub fn resolve_attribute(&self, name: &QualifiedName) -> Result<Option<String>> {
        match &name.prefix {
            Some(prefix) => self.resolve_prefix(prefix).map(Some),
            None => Ok(None),
        }
    }

    fn resolve_prefix(&self, prefix: &str) -> Result<String> {
        self.resolve(prefix)
            .filter(|uri| !uri.is_empty())
            .map(str::to_string)
            .ok_or_else(|| XmlError::UndefinedNamespace {
                reference: prefix.to_string(),
            })
    }

    /// A prefix bound to `uri`, if any. The default binding (empty prefix) is
    /// only returned when `allow_default` is set, since attributes cannot use it.
    pub fn prefix_of(&self, uri: &str, allow_default: bool) -> Option<&str> {
        if allow_default && self.default_namespace() == Some(uri) {
            return Some("");
        }
        self.bindings
            .iter()
            .find(|(prefix, bound)| !prefix.is_empty() && bound.as_str() == uri)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// Child scope for the start tag the tokenizer currently stands in.
    ///
    /// The tag's attributes are scanned on a snapshot, so a prefixed attribute
    /// written before its own `xmlns:` declaration still resolves. The primary
    /// cursor does not move.
    pub fn enter_start_tag(&self, tokenizer: &Tokenizer<'_>) -> Result<Self> {
        Ok(self.extend(scan_declarations(tokenizer)?))
    }
}

/// Collects the `(prefix, uri)` namespace declarations of the current start tag.
pub fn scan_declarations(tokenizer: &Tokenizer<'_>) -> Result<Vec<(String, String)>> {
    let mut probe = tokenizer.snapshot();
    let mut declarations = Vec::new();
    let mut pending: Option<String> = None;
    loop {
        match probe.next_token()? {
            Token::AttributeName(name) => {
                pending = name
                    .is_namespace_declaration()
                    .then(|| declared_prefix(&name));
            }
            Token::AttributeValue(uri) => {
                if let Some(prefix) = pending.take() {
                    declarations.push((prefix, uri));
                }
            }
            Token::ElementStartEnd | Token::ElementEnd(None) => return Ok(declarations),
            other => {
                return Err(XmlError::malformed(
                    probe.position(),
                    format!("unexpected {} inside a start tag", other),
                ));
            }
        }
    }
}

fn declared_prefix(name: &QualifiedName) -> String {
    utils::declared_prefix(&name.local_name, name.prefix.as_deref()).to_string()
}
