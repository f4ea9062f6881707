//! Single-pass tokenizer that turns XML text into structural tokens.
//!
//! The tokenizer is a pull source: every call to [`Tokenizer::next_token`]
//! produces exactly one [`Token`]. Which tokens may come next depends only on
//! the previously produced token, so the whole state is a cursor position and
//! the last token. That makes [`Tokenizer::snapshot`] cheap, which the decoder
//! uses to look ahead through a start tag for namespace declarations.
//!
//! Comments, processing instructions and doctype declarations are skipped and
//! never tokenized. CDATA sections are inlined into the surrounding text.

use std::fmt;

use crate::error::{Result, XmlError};
use crate::xml::utils;

const CDATA_START: &str = "<![CDATA[";
const CDATA_END: &str = "]]>";

/// A name as written in the document, not yet resolved against a namespace scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QualifiedName {
    pub local_name: String,
    pub prefix: Option<String>,
}

impl QualifiedName {
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            prefix: None,
        }
    }

    pub fn prefixed(prefix: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            prefix: Some(prefix.into()),
        }
    }

    /// Splits `prefix:local` on the first colon.
    fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((prefix, local_name)) => Self::prefixed(prefix, local_name),
            None => Self::new(raw),
        }
    }

    /// Whether this attribute name declares a namespace (`xmlns` or `xmlns:p`).
    pub fn is_namespace_declaration(&self) -> bool {
        utils::is_namespace_declaration(&self.local_name, self.prefix.as_deref())
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

/// Structural unit of an XML document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// Initial state, never returned.
    None,
    /// `<name` of a start tag.
    ElementStart(QualifiedName),
    /// `>` closing a start tag that has content.
    ElementStartEnd,
    /// `</name>`, or the nameless terminator of a self-closing `/>`.
    ElementEnd(Option<QualifiedName>),
    AttributeName(QualifiedName),
    /// Unescaped attribute value.
    AttributeValue(String),
    /// Trimmed text content with CDATA sections inlined.
    Text(String),
    /// End of input. Returned again on every later call.
    DocumentEnd,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::None => f.write_str("nothing"),
            Token::ElementStart(name) => write!(f, "start of element <{}>", name),
            Token::ElementStartEnd => f.write_str("end of start tag '>'"),
            Token::ElementEnd(Some(name)) => write!(f, "end of element </{}>", name),
            Token::ElementEnd(None) => f.write_str("end of element '/>'"),
            Token::AttributeName(name) => write!(f, "attribute '{}'", name),
            Token::AttributeValue(value) => write!(f, "attribute value \"{}\"", value),
            Token::Text(text) => write!(f, "text \"{}\"", text),
            Token::DocumentEnd => f.write_str("end of document"),
        }
    }
}

/// Cursor over XML source text producing [`Token`]s.
#[derive(Clone, Debug)]
pub struct Tokenizer<'a> {
    source: &'a str,
    position: usize,
    last_token: Token,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
            last_token: Token::None,
        }
    }

    /// Current byte offset into the source.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Independent cursor over the same source, starting where this one stands.
    pub fn snapshot(&self) -> Tokenizer<'a> {
        self.clone()
    }

    pub fn peek_char(&self) -> Option<char> {
        self.source[self.position..].chars().next()
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn upcoming(&self, expected: &str) -> bool {
        self.source[self.position..].starts_with(expected)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !is_whitespace(c) {
                return;
            }
            self.position += 1;
        }
    }

    /// Moves the cursor past the next occurrence of `terminator`.
    fn skip_past(&mut self, terminator: &str) -> Result<()> {
        match self.source[self.position..].find(terminator) {
            Some(offset) => {
                self.position += offset + terminator.len();
                Ok(())
            }
            None => Err(XmlError::malformed(
                self.position,
                format!("unexpected end of input, expecting '{}'", terminator),
            )),
        }
    }

    /// Skips a comment, processing instruction or doctype starting at `<`.
    fn skip_markup(&mut self) -> Result<()> {
        if self.upcoming("<!--") {
            self.skip_past("-->")
        } else if self.upcoming("<?") {
            self.skip_past("?>")
        } else {
            self.skip_past(">")
        }
    }

    fn at_skippable_markup(&self) -> bool {
        (self.upcoming("<!") && !self.upcoming(CDATA_START)) || self.upcoming("<?")
    }

    pub fn next_token(&mut self) -> Result<Token> {
        let token = match self.last_token {
            Token::DocumentEnd => return Ok(Token::DocumentEnd),
            Token::None | Token::ElementStartEnd | Token::ElementEnd(_) | Token::Text(_) => {
                self.read_content()?
            }
            Token::ElementStart(_) | Token::AttributeValue(_) => self.read_in_tag()?,
            Token::AttributeName(_) => {
                self.skip_whitespace();
                if self.peek_char() == Some('=') {
                    self.position += 1;
                    Token::AttributeValue(self.read_attribute_value()?)
                } else {
                    // Valueless attribute, e.g. `<input required/>`.
                    self.read_in_tag()?
                }
            }
        };
        self.last_token = token.clone();
        Ok(token)
    }

    /// Reads the next token between structures.
    fn read_content(&mut self) -> Result<Token> {
        loop {
            self.skip_whitespace();
            match self.peek_char() {
                None => return Ok(Token::DocumentEnd),
                Some('<') if self.at_skippable_markup() => self.skip_markup()?,
                Some('<') if self.upcoming(CDATA_START) => return self.read_text(),
                Some('<') => {
                    self.position += 1;
                    if self.peek_char() == Some('/') {
                        self.position += 1;
                        let name = self.read_element_name()?;
                        self.skip_whitespace();
                        self.expect_char('>')?;
                        return Ok(Token::ElementEnd(Some(name)));
                    }
                    return Ok(Token::ElementStart(self.read_element_name()?));
                }
                Some(_) => return self.read_text(),
            }
        }
    }

    /// Reads the next token inside a start tag.
    fn read_in_tag(&mut self) -> Result<Token> {
        self.skip_whitespace();
        match self.peek_char() {
            None => Err(XmlError::malformed(
                self.position,
                "unexpected end of input inside a start tag",
            )),
            Some('/') => {
                self.position += 1;
                self.expect_char('>')?;
                Ok(Token::ElementEnd(None))
            }
            Some('>') => {
                self.position += 1;
                Ok(Token::ElementStartEnd)
            }
            Some(_) => Ok(Token::AttributeName(self.read_attribute_name()?)),
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<()> {
        let position = self.position;
        match self.next_char() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(XmlError::malformed(
                position,
                format!("unexpected character '{}', expecting '{}'", c, expected),
            )),
            None => Err(XmlError::malformed(
                position,
                format!("unexpected end of input, expecting '{}'", expected),
            )),
        }
    }

    fn read_name(&mut self, is_terminator: fn(char) -> bool, what: &str) -> Result<QualifiedName> {
        let start = self.position;
        loop {
            match self.peek_char() {
                None => {
                    return Err(XmlError::malformed(
                        self.position,
                        format!("unexpected end of input in {}", what),
                    ));
                }
                Some(c) if is_terminator(c) => break,
                Some(c) => self.position += c.len_utf8(),
            }
        }
        let raw = &self.source[start..self.position];
        if raw.is_empty() {
            return Err(XmlError::malformed(start, format!("empty {}", what)));
        }
        Ok(QualifiedName::parse(raw))
    }

    fn read_element_name(&mut self) -> Result<QualifiedName> {
        self.read_name(|c| is_whitespace(c) || c == '>' || c == '/', "element name")
    }

    fn read_attribute_name(&mut self) -> Result<QualifiedName> {
        self.read_name(
            |c| is_whitespace(c) || c == '=' || c == '>' || c == '/',
            "attribute name",
        )
    }

    fn read_attribute_value(&mut self) -> Result<String> {
        self.skip_whitespace();
        let quote_position = self.position;
        let quote = match self.next_char() {
            Some(c @ ('"' | '\'')) => c,
            Some(c) => {
                return Err(XmlError::malformed(
                    quote_position,
                    format!("unexpected character '{}', expecting a quote", c),
                ));
            }
            None => {
                return Err(XmlError::malformed(
                    quote_position,
                    "unexpected end of input, expecting an attribute value",
                ));
            }
        };
        let start = self.position;
        loop {
            match self.next_char() {
                None => {
                    return Err(XmlError::malformed(
                        quote_position,
                        "unterminated attribute value",
                    ));
                }
                Some('<') => {
                    return Err(XmlError::malformed(
                        self.position - 1,
                        "invalid character '<' in attribute value",
                    ));
                }
                Some(c) if c == quote => break,
                Some(_) => {}
            }
        }
        let raw = &self.source[start..self.position - quote.len_utf8()];
        Ok(utils::unescape(raw, start)?.into_owned())
    }

    /// Reads a text run up to the next markup that is neither CDATA nor skippable.
    fn read_text(&mut self) -> Result<Token> {
        let mut segments: Vec<Segment> = Vec::new();
        let mut run_start = self.position;
        loop {
            match self.peek_char() {
                None => {
                    return Err(XmlError::malformed(
                        self.position,
                        "unexpected end of input in text content",
                    ));
                }
                Some('<') => {
                    push_raw(&mut segments, &self.source[run_start..self.position], run_start)?;
                    if self.upcoming(CDATA_START) {
                        self.position += CDATA_START.len();
                        let start = self.position;
                        self.skip_past(CDATA_END)?;
                        let end = self.position - CDATA_END.len();
                        segments.push(Segment::Cdata(self.source[start..end].to_string()));
                    } else if self.at_skippable_markup() {
                        self.skip_markup()?;
                    } else {
                        break;
                    }
                    run_start = self.position;
                }
                Some(c) => self.position += c.len_utf8(),
            }
        }
        Ok(Token::Text(join_trimmed(segments)))
    }
}

enum Segment {
    Raw(String),
    Cdata(String),
}

fn push_raw(segments: &mut Vec<Segment>, raw: &str, position: usize) -> Result<()> {
    if !raw.is_empty() {
        segments.push(Segment::Raw(utils::unescape(raw, position)?.into_owned()));
    }
    Ok(())
}

/// Joins text segments, trimming whitespace only where raw text forms the edge.
fn join_trimmed(mut segments: Vec<Segment>) -> String {
    for segment in segments.iter_mut() {
        match segment {
            Segment::Raw(text) => {
                *text = text.trim_start().to_string();
                if !text.is_empty() {
                    break;
                }
            }
            Segment::Cdata(_) => break,
        }
    }
    for segment in segments.iter_mut().rev() {
        match segment {
            Segment::Raw(text) => {
                *text = text.trim_end().to_string();
                if !text.is_empty() {
                    break;
                }
            }
            Segment::Cdata(_) => break,
        }
    }
    segments
        .into_iter()
        .map(|segment| match segment {
            Segment::Raw(text) | Segment::Cdata(text) => text,
        })
        .collect()
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\n' | '\t' | '\r')
}
