//! Error types for access expression operations.

use thiserror::Error;

/// Errors surfaced by access expression parsing, evaluation, and quoting.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// The expression violates the access expression grammar.
    ///
    /// Carries the machine-readable reason and the byte offset at which the
    /// problem was detected. For truncated input the offset is the input
    /// length.
    #[error("invalid access expression at byte {offset}: {kind}")]
    InvalidExpression {
        /// Why the expression was rejected.
        kind: ParseErrorKind,
        /// Byte offset into the expression where the problem was detected.
        offset: usize,
    },

    /// An empty string was passed where an authorization term is required.
    #[error("empty strings are not legal authorizations")]
    EmptyTerm,
}

impl AccessError {
    /// Creates an [`AccessError::InvalidExpression`] for the given reason
    /// and byte offset.
    pub(crate) fn invalid(kind: ParseErrorKind, offset: usize) -> Self {
        Self::InvalidExpression { kind, offset }
    }
}

/// The reason an expression failed to parse.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Input ended where a term, operator, or closing parenthesis was required.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// A byte that cannot start or continue the expected construct.
    #[error("unexpected character")]
    UnexpectedCharacter,

    /// A parenthesized subexpression was never closed.
    #[error("missing closing parenthesis")]
    MissingCloseParen,

    /// A closing parenthesis without a matching opening one.
    #[error("unbalanced parenthesis")]
    UnbalancedParen,

    /// Both `&` and `|` were used at the same nesting level.
    #[error("cannot mix & and | without parentheses")]
    MixedOperators,

    /// A quoted authorization with no content.
    #[error("empty authorization")]
    EmptyAuthorization,

    /// A backslash followed by anything other than `"` or `\`.
    #[error("invalid escape sequence")]
    BadEscape,

    /// A quoted authorization with no closing quote.
    #[error("unterminated quote")]
    UnterminatedQuote,

    /// Parenthesis nesting exceeded the supported depth.
    #[error("parenthesis nesting too deep")]
    NestingTooDeep,
}

/// Result type for access expression operations.
pub type AccessResult<T> = Result<T, AccessError>;
