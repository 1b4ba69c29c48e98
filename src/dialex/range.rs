//! Repetition-bound parsing
//!
//! This module turns the textual repetition bounds used by `repeat` rule
//! descriptors into machine-checkable bounds. The raw tokenization is handled
//! entirely by logos; a shape match on the resulting token sequence decides
//! which of the accepted forms was written.
//!
//! Accepted forms (case-insensitive):
//! - a single integer: `"2"` means exactly two iterations
//! - a single infinity token (`n`, `inf`, `infinity`, `∞`): at least one
//! - `min..max`, `min-max` or `min,max`, where `max` is an integer or an
//!   infinity token

use logos::Logos;
use std::fmt;

/// The upper bound of a repetition constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// At most this many iterations
    Finite(u32),
    /// No upper limit
    Unbounded,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Finite(n) => write!(f, "{}", n),
            Bound::Unbounded => write!(f, "n"),
        }
    }
}

/// Errors that can occur when parsing a repetition bound
#[derive(Debug, Clone, PartialEq)]
pub enum RangeError {
    /// The text is not one of the accepted bound forms
    Malformed(String),
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::Malformed(text) => write!(f, "Malformed repetition bound: {:?}", text),
        }
    }
}

impl std::error::Error for RangeError {}

/// Raw tokens of the repetition-bound micro-syntax
///
/// The scanner runs over the lower-cased input, so the token set only needs
/// the lower-case spellings.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t]+")]
enum BoundToken {
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u32>().ok())]
    Number(u32),

    #[token("..")]
    DotDot,

    #[token("-")]
    Dash,

    #[token(",")]
    Comma,

    #[token("n")]
    #[token("inf")]
    #[token("infinity")]
    #[token("∞")]
    Infinity,
}

impl BoundToken {
    /// Whether this token separates the min part from the max part
    fn is_separator(&self) -> bool {
        matches!(self, BoundToken::DotDot | BoundToken::Dash | BoundToken::Comma)
    }
}

/// Parse a textual repetition bound into `(min, max)`.
///
/// This is a pure function: same input, same output, no side effects.
/// Unparseable text is a `RangeError::Malformed`, never a panic.
pub fn parse(text: &str) -> Result<(u32, Bound), RangeError> {
    let lowered = text.to_lowercase();
    let mut tokens = Vec::new();
    for token in BoundToken::lexer(&lowered) {
        match token {
            Ok(token) => tokens.push(token),
            Err(()) => return Err(RangeError::Malformed(text.to_string())),
        }
    }

    match tokens.as_slice() {
        [BoundToken::Number(n)] => Ok((*n, Bound::Finite(*n))),
        [BoundToken::Infinity] => Ok((1, Bound::Unbounded)),
        [BoundToken::Number(min), sep, BoundToken::Number(max)] if sep.is_separator() => {
            Ok((*min, Bound::Finite(*max)))
        }
        [BoundToken::Number(min), sep, BoundToken::Infinity] if sep.is_separator() => {
            Ok((*min, Bound::Unbounded))
        }
        _ => Err(RangeError::Malformed(text.to_string())),
    }
}
