//! The parser seam.
//!
//! Text parsing lives outside the runtime. Embedders supply a [`Parser`];
//! the interpreter only calls it from `execute`.

use crate::ast::TopLevelStatement;

/// A syntax error, with the byte offset it was found at when known.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("parse error: {message}")]
pub struct ParseError {
    pub message: String,
    pub offset: Option<usize>,
}

impl ParseError {
    #[cold]
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
            offset: None,
        }
    }

    #[cold]
    pub fn at(message: impl Into<String>, offset: usize) -> Self {
        ParseError {
            message: message.into(),
            offset: Some(offset),
        }
    }
}

/// Turns statement text into top-level statements.
pub trait Parser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Vec<TopLevelStatement>, ParseError>;
}
