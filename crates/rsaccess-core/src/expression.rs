//! Validated access expression values.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AccessError, AccessResult};
use crate::parser;
use crate::quoting::unescape;
use crate::tree::{self, ParsedExpression};

/// An immutable, validated access expression.
///
/// Prefer passing this type over raw strings: holders know the expression
/// is valid and need not revalidate. Two expressions are equal iff their
/// byte representations are equal.
///
/// ```
/// use rsaccess_core::{quote, AccessExpression};
///
/// let auth1 = quote("CAT")?;
/// let auth2 = quote("\u{1F995}")?;
/// let expression = AccessExpression::new(&format!("{auth1}&{auth2}"))?;
/// assert_eq!(expression.to_string(), "CAT&\"\u{1F995}\"");
/// # Ok::<(), rsaccess_core::AccessError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessExpression {
    bytes: Vec<u8>,
}

impl AccessExpression {
    /// Validates `expression` and wraps it.
    pub fn new(expression: &str) -> AccessResult<Self> {
        Self::from_bytes(expression.as_bytes().to_vec())
    }

    /// Validates `expression` bytes and wraps them.
    pub fn from_bytes(expression: impl Into<Vec<u8>>) -> AccessResult<Self> {
        let bytes = expression.into();
        Self::validate_bytes(&bytes)?;
        Ok(Self { bytes })
    }

    /// The empty expression, accessible with any authorizations.
    pub fn empty() -> Self {
        Self { bytes: Vec::new() }
    }

    /// The expression's byte representation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Checks that an expression is properly formed, without constructing
    /// anything.
    pub fn validate(expression: &str) -> AccessResult<()> {
        Self::validate_bytes(expression.as_bytes())
    }

    /// Byte-level form of [`Self::validate`].
    pub fn validate_bytes(expression: &[u8]) -> AccessResult<()> {
        parser::evaluate(expression, &mut |_| true).map(|_| ())
    }

    /// Validates `expression` and builds its parse tree. This is more
    /// expensive than [`Self::validate`] or evaluation; use it only when
    /// the tree is needed.
    pub fn parse(expression: &str) -> AccessResult<ParsedExpression> {
        tree::parse_tree(expression.as_bytes())
    }

    /// Byte-level form of [`Self::parse`].
    pub fn parse_bytes(expression: &[u8]) -> AccessResult<ParsedExpression> {
        tree::parse_tree(expression)
    }

    /// Builds this expression's parse tree.
    pub fn to_parsed(&self) -> ParsedExpression {
        // self is already validated, so the builder cannot fail
        tree::parse_tree(&self.bytes).unwrap_or(ParsedExpression::Empty)
    }

    /// Validates `expression` and passes each authorization it mentions to
    /// `found`, unescaped, in left-to-right order, duplicates included.
    ///
    /// For `(A&B)|(A&C)` the sink receives `A`, `B`, `A`, `C`. This walks
    /// the expression without building a parse tree; if a tree is already
    /// at hand, walking it directly is cheaper.
    pub fn find_authorizations<F>(expression: &str, mut found: F) -> AccessResult<()>
    where
        F: FnMut(&str),
    {
        Self::find_authorizations_bytes(expression.as_bytes(), |auth| {
            found(&String::from_utf8_lossy(auth))
        })
    }

    /// Byte-level form of [`Self::find_authorizations`].
    pub fn find_authorizations_bytes<F>(expression: &[u8], mut found: F) -> AccessResult<()>
    where
        F: FnMut(&[u8]),
    {
        parser::evaluate(expression, &mut |token| {
            found(&unescape(token.bytes));
            true
        })
        .map(|_| ())
    }
}

impl fmt::Display for AccessExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes))
    }
}

impl FromStr for AccessExpression {
    type Err = AccessError;

    fn from_str(expression: &str) -> AccessResult<Self> {
        Self::new(expression)
    }
}

impl Serialize for AccessExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.bytes)
    }
}

impl<'de> Deserialize<'de> for AccessExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ExpressionVisitor;

        impl<'de> Visitor<'de> for ExpressionVisitor {
            type Value = AccessExpression;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an access expression as bytes or a string")
            }

            fn visit_bytes<E: de::Error>(self, bytes: &[u8]) -> Result<Self::Value, E> {
                AccessExpression::from_bytes(bytes.to_vec()).map_err(de::Error::custom)
            }

            fn visit_byte_buf<E: de::Error>(self, bytes: Vec<u8>) -> Result<Self::Value, E> {
                AccessExpression::from_bytes(bytes).map_err(de::Error::custom)
            }

            fn visit_str<E: de::Error>(self, expression: &str) -> Result<Self::Value, E> {
                AccessExpression::new(expression).map_err(de::Error::custom)
            }

            fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(byte) = seq.next_element::<u8>()? {
                    bytes.push(byte);
                }
                AccessExpression::from_bytes(bytes).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_bytes(ExpressionVisitor)
    }
}
