//! Parse trees for access expressions.
//!
//! The tree builder consumes the same grammar as the evaluator but
//! materializes an immutable tree instead of folding a boolean. Building a
//! tree costs allocations the evaluation path avoids, so it is reserved for
//! callers that actually need structure (rewriters, analyzers, UIs).
//!
//! Trees are normalized: runs of the same operator collapse into one
//! multi-child node, and parentheses leave no trace. `A&B&C`, `A&(B&C)`,
//! and `(A&B)&C` all produce the same tree.

use serde::{Deserialize, Serialize};

use crate::error::{AccessError, AccessResult, ParseErrorKind};
use crate::parser::MAX_NESTING_DEPTH;
use crate::quoting::{escape_into, unescape};
use crate::tokenizer::Tokenizer;

/// An immutable access expression parse tree.
///
/// `And`/`Or` nodes always have at least two children, and never a child of
/// their own kind. Authorization leaves own their unescaped bytes and
/// remember whether the source form was quoted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParsedExpression {
    /// The empty expression, which grants access to everyone.
    Empty,
    /// A single authorization.
    Authorization {
        /// The unescaped authorization bytes.
        authorization: Vec<u8>,
        /// Whether the source form was quoted.
        quoted: bool,
    },
    /// A conjunction of two or more subexpressions.
    And(Vec<ParsedExpression>),
    /// A disjunction of two or more subexpressions.
    Or(Vec<ParsedExpression>),
}

impl ParsedExpression {
    /// Renders the minimal byte form that reproduces this tree: children
    /// are joined by their operator, and a child is parenthesized only when
    /// it is itself an operator node.
    pub fn expression(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write(&mut out);
        out
    }

    /// Visits every authorization leaf in left-to-right order.
    pub fn for_each_authorization<F>(&self, visit: &mut F)
    where
        F: FnMut(&[u8]),
    {
        match self {
            Self::Empty => {}
            Self::Authorization { authorization, .. } => visit(authorization),
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.for_each_authorization(visit);
                }
            }
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        match self {
            Self::Empty => {}
            Self::Authorization {
                authorization,
                quoted,
            } => {
                if *quoted {
                    out.push(b'"');
                    escape_into(authorization, out);
                    out.push(b'"');
                } else {
                    out.extend_from_slice(authorization);
                }
            }
            Self::And(children) => write_children(children, b'&', out),
            Self::Or(children) => write_children(children, b'|', out),
        }
    }
}

fn write_children(children: &[ParsedExpression], operator: u8, out: &mut Vec<u8>) {
    for (index, child) in children.iter().enumerate() {
        if index > 0 {
            out.push(operator);
        }
        let needs_parens = matches!(
            child,
            ParsedExpression::And(_) | ParsedExpression::Or(_)
        );
        if needs_parens {
            out.push(b'(');
        }
        child.write(out);
        if needs_parens {
            out.push(b')');
        }
    }
}

/// Parses `expression` into a [`ParsedExpression`], validating it in the
/// process.
pub(crate) fn parse_tree(expression: &[u8]) -> AccessResult<ParsedExpression> {
    if expression.is_empty() {
        return Ok(ParsedExpression::Empty);
    }
    let mut tokenizer = Tokenizer::new(expression);
    let node = parse_node(&mut tokenizer, 0)?;
    if !tokenizer.at_end() {
        return Err(AccessError::invalid(
            ParseErrorKind::UnbalancedParen,
            tokenizer.offset(),
        ));
    }
    Ok(node)
}

fn parse_node(tokenizer: &mut Tokenizer<'_>, depth: usize) -> AccessResult<ParsedExpression> {
    let mut children = vec![parse_term(tokenizer, depth)?];
    let mut operator = None;
    loop {
        if tokenizer.at_end() {
            break;
        }
        match tokenizer.peek()? {
            b')' => break,
            byte @ (b'&' | b'|') => {
                if operator.is_some() && operator != Some(byte) {
                    return Err(AccessError::invalid(
                        ParseErrorKind::MixedOperators,
                        tokenizer.offset(),
                    ));
                }
                operator = Some(byte);
                tokenizer.advance();
                children.push(parse_term(tokenizer, depth)?);
            }
            _ => {
                return Err(AccessError::invalid(
                    ParseErrorKind::UnexpectedCharacter,
                    tokenizer.offset(),
                ))
            }
        }
    }
    if children.len() == 1 {
        return Ok(children.remove(0));
    }
    Ok(match operator {
        Some(b'&') => ParsedExpression::And(flatten(children, true)),
        _ => ParsedExpression::Or(flatten(children, false)),
    })
}

/// Splices children of the node's own kind into the node, so parenthesized
/// same-operator groups collapse.
fn flatten(children: Vec<ParsedExpression>, conjunction: bool) -> Vec<ParsedExpression> {
    let mut flat = Vec::with_capacity(children.len());
    for child in children {
        match child {
            ParsedExpression::And(grandchildren) if conjunction => flat.extend(grandchildren),
            ParsedExpression::Or(grandchildren) if !conjunction => flat.extend(grandchildren),
            other => flat.push(other),
        }
    }
    flat
}

fn parse_term(tokenizer: &mut Tokenizer<'_>, depth: usize) -> AccessResult<ParsedExpression> {
    if tokenizer.peek()? == b'(' {
        if depth == MAX_NESTING_DEPTH {
            return Err(AccessError::invalid(
                ParseErrorKind::NestingTooDeep,
                tokenizer.offset(),
            ));
        }
        tokenizer.advance();
        let node = parse_node(tokenizer, depth + 1)?;
        if tokenizer.at_end() {
            return Err(AccessError::invalid(
                ParseErrorKind::MissingCloseParen,
                tokenizer.offset(),
            ));
        }
        tokenizer.expect(b')')?;
        Ok(node)
    } else {
        let token = tokenizer.next_authorization()?;
        Ok(ParsedExpression::Authorization {
            authorization: unescape(token.bytes).into_owned(),
            quoted: token.quoted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(name: &str) -> ParsedExpression {
        ParsedExpression::Authorization {
            authorization: name.as_bytes().to_vec(),
            quoted: false,
        }
    }

    #[test]
    fn test_empty_expression_parses_to_empty() {
        assert_eq!(parse_tree(b"").unwrap(), ParsedExpression::Empty);
        assert_eq!(ParsedExpression::Empty.expression(), b"");
    }

    #[test]
    fn test_single_authorization_is_a_leaf() {
        assert_eq!(parse_tree(b"A").unwrap(), auth("A"));
        assert_eq!(parse_tree(b"(A)").unwrap(), auth("A"));
    }

    #[test]
    fn test_quoted_leaf_holds_unescaped_bytes() {
        let tree = parse_tree(br#""a\"b""#).unwrap();
        assert_eq!(
            tree,
            ParsedExpression::Authorization {
                authorization: b"a\"b".to_vec(),
                quoted: true,
            }
        );
        assert_eq!(tree.expression(), br#""a\"b""#);
    }

    #[test]
    fn test_same_operator_runs_flatten() {
        let expected = ParsedExpression::And(vec![auth("A"), auth("B"), auth("C")]);
        assert_eq!(parse_tree(b"A&B&C").unwrap(), expected);
        assert_eq!(parse_tree(b"A&(B&C)").unwrap(), expected);
        assert_eq!(parse_tree(b"(A&B)&C").unwrap(), expected);
        assert_eq!(parse_tree(b"((A)&(B))&(C)").unwrap(), expected);
    }

    #[test]
    fn test_differing_operators_stay_nested() {
        let tree = parse_tree(b"A&(B|C)").unwrap();
        assert_eq!(
            tree,
            ParsedExpression::And(vec![
                auth("A"),
                ParsedExpression::Or(vec![auth("B"), auth("C")]),
            ])
        );
    }

    #[test]
    fn test_expression_renders_minimal_form() {
        for (source, minimal) in [
            ("A&B&C", "A&B&C"),
            ("A&(B&C)", "A&B&C"),
            ("(A|B)&C", "(A|B)&C"),
            ("((A|B))&((C))", "(A|B)&C"),
            ("(CAT&DOG)|(CAT&EWE)", "(CAT&DOG)|(CAT&EWE)"),
        ] {
            let tree = parse_tree(source.as_bytes()).unwrap();
            assert_eq!(tree.expression(), minimal.as_bytes(), "source {source:?}");
        }
    }

    #[test]
    fn test_rendered_expression_reparses_to_same_tree() {
        for source in ["A", "A&B&C", "(A|B)&C", "A|(B&C)|D", r#"(CAT&"a b")|X"#] {
            let tree = parse_tree(source.as_bytes()).unwrap();
            let rendered = tree.expression();
            assert_eq!(parse_tree(&rendered).unwrap(), tree, "source {source:?}");
        }
    }

    #[test]
    fn test_mixed_operators_rejected() {
        let err = parse_tree(b"A&B|C").unwrap_err();
        assert_eq!(
            err,
            AccessError::InvalidExpression {
                kind: ParseErrorKind::MixedOperators,
                offset: 3,
            }
        );
    }

    #[test]
    fn test_authorization_walk_is_in_order_with_duplicates() {
        let tree = parse_tree(b"(A&B)|(A&C)|(A&D)").unwrap();
        let mut seen = Vec::new();
        tree.for_each_authorization(&mut |auth| seen.push(auth.to_vec()));
        assert_eq!(seen, [b"A", b"B", b"A", b"C", b"A", b"D"]);
    }
}
