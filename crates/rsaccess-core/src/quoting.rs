//! Quoting and escaping of authorization terms.
//!
//! Authorizations appearing in an expression may only contain the permitted
//! character class unless surrounded by quotes. Inside quotes, `"` and `\`
//! are escaped with a backslash; no other escape exists. [`quote`] wraps a
//! term only when it has to, and [`unquote`] reverses it.

use std::borrow::Cow;

use crate::error::{AccessError, AccessResult, ParseErrorKind};

/// True for the characters allowed in a bare (unquoted) authorization:
/// ASCII letters, digits, `_`, `-`, `.`, `:`, and `/`.
pub const fn is_valid_auth_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.' | b':' | b'/')
}

/// Quotes an authorization term if it contains characters outside the
/// permitted class. Terms that need no quoting are returned unchanged.
///
/// # Errors
///
/// Returns [`AccessError::EmptyTerm`] for an empty term.
pub fn quote(term: &str) -> AccessResult<Cow<'_, str>> {
    if term.is_empty() {
        return Err(AccessError::EmptyTerm);
    }
    if term.bytes().all(is_valid_auth_char) {
        return Ok(Cow::Borrowed(term));
    }
    let mut quoted = String::with_capacity(term.len() + 2);
    quoted.push('"');
    let mut rest = term;
    while let Some(position) = rest.find(['"', '\\']) {
        quoted.push_str(&rest[..position]);
        quoted.push('\\');
        quoted.push_str(&rest[position..=position]);
        rest = &rest[position + 1..];
    }
    quoted.push_str(rest);
    quoted.push('"');
    Ok(Cow::Owned(quoted))
}

/// Byte-level form of [`quote`].
pub fn quote_bytes(term: &[u8]) -> AccessResult<Cow<'_, [u8]>> {
    if term.is_empty() {
        return Err(AccessError::EmptyTerm);
    }
    if term.iter().all(|&byte| is_valid_auth_char(byte)) {
        return Ok(Cow::Borrowed(term));
    }
    let mut quoted = Vec::with_capacity(term.len() + 2);
    quoted.push(b'"');
    escape_into(term, &mut quoted);
    quoted.push(b'"');
    Ok(Cow::Owned(quoted))
}

/// Reverses [`quote`]: strips enclosing quotes and unescapes if the term is
/// quoted, otherwise returns it as-is.
///
/// # Errors
///
/// Returns [`AccessError::EmptyTerm`] for an empty term or the literal
/// `""`, and an invalid-expression error for a malformed escape inside a
/// quoted term.
pub fn unquote(term: &str) -> AccessResult<Cow<'_, str>> {
    if term.is_empty() || term == "\"\"" {
        return Err(AccessError::EmptyTerm);
    }
    if term.len() < 2 || !term.starts_with('"') || !term.ends_with('"') {
        return Ok(Cow::Borrowed(term));
    }
    let interior = &term[1..term.len() - 1];
    check_escapes(interior.as_bytes(), 1)?;
    if !interior.contains('\\') {
        return Ok(Cow::Borrowed(interior));
    }
    Ok(Cow::Owned(unescape_str(interior)))
}

/// Byte-level form of [`unquote`].
pub fn unquote_bytes(term: &[u8]) -> AccessResult<Cow<'_, [u8]>> {
    if term.is_empty() || term == b"\"\"" {
        return Err(AccessError::EmptyTerm);
    }
    if term.len() < 2 || term[0] != b'"' || term[term.len() - 1] != b'"' {
        return Ok(Cow::Borrowed(term));
    }
    let interior = &term[1..term.len() - 1];
    check_escapes(interior, 1)?;
    Ok(unescape(interior))
}

/// Escapes `"` and `\` in `term`, appending the result to `out`.
pub(crate) fn escape_into(term: &[u8], out: &mut Vec<u8>) {
    for &byte in term {
        if matches!(byte, b'"' | b'\\') {
            out.push(b'\\');
        }
        out.push(byte);
    }
}

/// Unescapes the interior bytes of a quoted authorization, borrowing when
/// the input contains no escapes.
///
/// The input must already be escape-valid (the tokenizer and
/// [`check_escapes`] enforce this); a stray trailing backslash is dropped.
pub(crate) fn unescape(bytes: &[u8]) -> Cow<'_, [u8]> {
    if !bytes.contains(&b'\\') {
        return Cow::Borrowed(bytes);
    }
    let mut unescaped = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'\\' {
            index += 1;
            if index == bytes.len() {
                break;
            }
        }
        unescaped.push(bytes[index]);
        index += 1;
    }
    Cow::Owned(unescaped)
}

/// Validates that every backslash in `bytes` introduces `\"` or `\\`.
/// Reported offsets are shifted by `base` to point into the original term.
fn check_escapes(bytes: &[u8], base: usize) -> AccessResult<()> {
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'\\' {
            if index + 1 == bytes.len() || !matches!(bytes[index + 1], b'"' | b'\\') {
                return Err(AccessError::invalid(ParseErrorKind::BadEscape, base + index));
            }
            index += 1;
        }
        index += 1;
    }
    Ok(())
}

// Escapes are ASCII, so removing backslashes preserves str boundaries.
fn unescape_str(interior: &str) -> String {
    let mut unescaped = String::with_capacity(interior.len());
    let mut rest = interior;
    while let Some(position) = rest.find('\\') {
        unescaped.push_str(&rest[..position]);
        if position + 1 < rest.len() {
            unescaped.push_str(&rest[position + 1..=position + 1]);
            rest = &rest[position + 2..];
        } else {
            rest = "";
        }
    }
    unescaped.push_str(rest);
    unescaped
}
