//! Parse-time errors: a single `thiserror` enum with a span-aware `Display`
//! impl instead of a hand-rolled pretty-printer.

use thiserror::Error;

use crate::location::TextRange;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{range}: unexpected character '{found}'")]
    UnexpectedChar { found: char, range: TextRange },
    #[error("{range}: inconsistent dedent (does not match any enclosing indentation level)")]
    InconsistentDedent { range: TextRange },
    #[error("{range}: unterminated string literal")]
    UnterminatedString { range: TextRange },
    #[error("{range}: unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String, range: TextRange },
    #[error("{range}: expected an indented block")]
    ExpectedIndent { range: TextRange },
    #[error("{range}: invalid numeric literal '{text}'")]
    InvalidNumber { text: String, range: TextRange },
}

impl ParseError {
    pub fn range(&self) -> TextRange {
        match self {
            ParseError::UnexpectedChar { range, .. }
            | ParseError::InconsistentDedent { range }
            | ParseError::UnterminatedString { range }
            | ParseError::UnexpectedToken { range, .. }
            | ParseError::ExpectedIndent { range }
            | ParseError::InvalidNumber { range, .. } => *range,
        }
    }
}
