//! Error types for XML encoding and decoding.
//!
//! Every failure is fatal for the document being processed: there is no partial
//! result and nothing is retried. Errors fall into three groups:
//!
//! - **Lexical**: [`XmlError::MalformedInput`] carries the byte offset of the problem.
//! - **Semantic**: [`XmlError::UndefinedNamespace`], [`XmlError::UnexpectedToken`],
//!   [`XmlError::InvalidValue`] and [`XmlError::UnknownField`] name the offending
//!   prefix, token or value.
//! - **Contract**: [`XmlError::SchemaOrder`] and [`XmlError::UnsupportedNull`] point at
//!   a schema or caller mistake rather than bad input.

use thiserror::Error;

/// Error raised while encoding a value to XML or decoding one from XML.
#[derive(Error, Debug)]
pub enum XmlError {
    /// The input text is not well-formed at `position` (byte offset).
    #[error("malformed XML at position {position}: {message}")]
    MalformedInput { position: usize, message: String },

    /// A namespace prefix was used without a declaration in scope.
    #[error("namespace '{reference}' used, but no definition found")]
    UndefinedNamespace { reference: String },

    /// The token stream did not contain what the schema required at this point.
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    /// A `null` value was written where XML has no way to represent it.
    #[error("'null' is not supported outside of an optional field")]
    UnsupportedNull,

    /// An attribute field is declared after an element or content field.
    #[error("attribute field '{field_name}' is declared after element or content fields")]
    SchemaOrder { field_name: String },

    /// A textual value could not be parsed into the requested type.
    #[error("invalid value '{value}': {message}")]
    InvalidValue { value: String, message: String },

    /// An element, attribute or text run matched no field of the schema.
    #[error("unknown field '{name}'")]
    UnknownField { name: String },

    /// The serde data model shape has no XML mapping.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// IO error while reading input or writing output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Custom error message, usually raised by serde derive code.
    #[error("{0}")]
    Custom(String),
}

impl XmlError {
    pub(crate) fn malformed(position: usize, message: impl Into<String>) -> Self {
        XmlError::MalformedInput {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn unexpected(expected: impl Into<String>, found: impl ToString) -> Self {
        XmlError::UnexpectedToken {
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    pub(crate) fn invalid_value(value: &str, message: impl ToString) -> Self {
        XmlError::InvalidValue {
            value: value.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<String> for XmlError {
    fn from(msg: String) -> Self {
        XmlError::Custom(msg)
    }
}

impl From<&str> for XmlError {
    fn from(msg: &str) -> Self {
        XmlError::Custom(msg.to_string())
    }
}

impl serde::ser::Error for XmlError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        XmlError::Custom(msg.to_string())
    }
}

impl serde::de::Error for XmlError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        XmlError::Custom(msg.to_string())
    }
}

/// Result type alias for XML operations
pub type Result<T> = std::result::Result<T, XmlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message_names_position() {
        let err = XmlError::malformed(17, "unterminated attribute value");
        assert_eq!(
            err.to_string(),
            "malformed XML at position 17: unterminated attribute value"
        );
    }

    #[test]
    fn test_undefined_namespace_message() {
        let err = XmlError::UndefinedNamespace {
            reference: "other".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "namespace 'other' used, but no definition found"
        );
    }

    #[test]
    fn test_serde_custom_errors() {
        let err = <XmlError as serde::de::Error>::missing_field("from");
        assert!(matches!(err, XmlError::Custom(_)));
        assert!(err.to_string().contains("from"));
    }
}
