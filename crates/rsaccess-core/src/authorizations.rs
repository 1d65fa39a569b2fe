//! Authorization sets.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A set of authorizations held by one principal.
///
/// Members are stored in their unescaped byte form; duplicates are ignored.
/// Membership is tested against the unescaped, unquoted form of the terms
/// appearing in an access expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorizations {
    auths: BTreeSet<Vec<u8>>,
}

impl Authorizations {
    /// Creates an empty authorization set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an authorization set from string authorizations, encoded as
    /// UTF-8.
    pub fn of<I, S>(authorizations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            auths: authorizations
                .into_iter()
                .map(|auth| auth.as_ref().as_bytes().to_vec())
                .collect(),
        }
    }

    /// Creates an authorization set from raw byte authorizations.
    pub fn from_bytes<I, B>(authorizations: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        Self {
            auths: authorizations.into_iter().map(Into::into).collect(),
        }
    }

    /// True if the set holds the given authorization bytes.
    pub fn contains(&self, authorization: &[u8]) -> bool {
        self.auths.contains(authorization)
    }

    /// Iterates the authorizations in byte order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.auths.iter().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.auths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.auths.is_empty()
    }
}

impl fmt::Display for Authorizations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, auth) in self.auths.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", String::from_utf8_lossy(auth))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_are_ignored() {
        let auths = Authorizations::of(["A", "B", "A"]);
        assert_eq!(auths.len(), 2);
    }

    #[test]
    fn test_contains_tests_raw_bytes() {
        let auths = Authorizations::of(["CAT", "\u{1F995}"]);
        assert!(auths.contains(b"CAT"));
        assert!(auths.contains("\u{1F995}".as_bytes()));
        assert!(!auths.contains(b"DOG"));
    }

    #[test]
    fn test_from_bytes_accepts_non_utf8() {
        let auths = Authorizations::from_bytes([vec![0xFF, 0x00], b"A".to_vec()]);
        assert!(auths.contains(&[0xFF, 0x00]));
        assert!(auths.contains(b"A"));
    }

    #[test]
    fn test_display_joins_members() {
        let auths = Authorizations::of(["B", "A"]);
        assert_eq!(auths.to_string(), "A,B");
    }
}
