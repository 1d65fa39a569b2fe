//! Recursive-descent parser and evaluator for access expressions.
//!
//! The grammar:
//!
//! ```text
//! expression    := node
//! node          := term (("&" term)+ | ("|" term)+)?
//! term          := "(" node ")" | authorization
//! authorization := bare_auth | quoted_auth
//! ```
//!
//! A single pass both validates the expression and folds a boolean result
//! through the supplied predicate, with no allocation for bare tokens. The
//! predicate is invoked for every authorization encountered, even once the
//! outcome of the surrounding node is fixed; validation always runs to the
//! natural end of the expression, so a malformed tail is an error rather
//! than a short-circuited `false`.
//!
//! Within one nesting level only a single operator kind may appear; `A&B|C`
//! is rejected and must be written as `A&(B|C)` or `(A&B)|C`.

use crate::error::{AccessError, AccessResult, ParseErrorKind};
use crate::tokenizer::{AuthorizationToken, Tokenizer};

/// Parenthesis nesting bound; recursion depth tracks nesting depth, so
/// adversarial inputs must not be allowed to grow the host stack unbounded.
pub(crate) const MAX_NESTING_DEPTH: usize = 1000;

/// Validates `expression` and evaluates it against `authorized`, which
/// decides each authorization encountered. The empty expression is valid
/// and evaluates to `true`.
pub(crate) fn evaluate<F>(expression: &[u8], authorized: &mut F) -> AccessResult<bool>
where
    F: FnMut(&AuthorizationToken<'_>) -> bool,
{
    if expression.is_empty() {
        return Ok(true);
    }
    let mut tokenizer = Tokenizer::new(expression);
    let granted = parse_node(&mut tokenizer, authorized, 0)?;
    if !tokenizer.at_end() {
        // parse_node only stops early at ')'; with no enclosing term open,
        // that parenthesis has no match
        return Err(AccessError::invalid(
            ParseErrorKind::UnbalancedParen,
            tokenizer.offset(),
        ));
    }
    Ok(granted)
}

fn parse_node<F>(
    tokenizer: &mut Tokenizer<'_>,
    authorized: &mut F,
    depth: usize,
) -> AccessResult<bool>
where
    F: FnMut(&AuthorizationToken<'_>) -> bool,
{
    let mut granted = parse_term(tokenizer, authorized, depth)?;
    let mut operator = None;
    loop {
        if tokenizer.at_end() {
            return Ok(granted);
        }
        match tokenizer.peek()? {
            b')' => return Ok(granted),
            byte @ (b'&' | b'|') => {
                if operator.is_some() && operator != Some(byte) {
                    return Err(AccessError::invalid(
                        ParseErrorKind::MixedOperators,
                        tokenizer.offset(),
                    ));
                }
                operator = Some(byte);
                tokenizer.advance();
                let term = parse_term(tokenizer, authorized, depth)?;
                if byte == b'&' {
                    granted &= term;
                } else {
                    granted |= term;
                }
            }
            _ => {
                return Err(AccessError::invalid(
                    ParseErrorKind::UnexpectedCharacter,
                    tokenizer.offset(),
                ))
            }
        }
    }
}

fn parse_term<F>(
    tokenizer: &mut Tokenizer<'_>,
    authorized: &mut F,
    depth: usize,
) -> AccessResult<bool>
where
    F: FnMut(&AuthorizationToken<'_>) -> bool,
{
    if tokenizer.peek()? == b'(' {
        if depth == MAX_NESTING_DEPTH {
            return Err(AccessError::invalid(
                ParseErrorKind::NestingTooDeep,
                tokenizer.offset(),
            ));
        }
        tokenizer.advance();
        let granted = parse_node(tokenizer, authorized, depth + 1)?;
        if tokenizer.at_end() {
            return Err(AccessError::invalid(
                ParseErrorKind::MissingCloseParen,
                tokenizer.offset(),
            ));
        }
        tokenizer.expect(b')')?;
        Ok(granted)
    } else {
        let token = tokenizer.next_authorization()?;
        Ok(authorized(&token))
    }
}
