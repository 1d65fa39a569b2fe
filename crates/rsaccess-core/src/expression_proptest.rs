//! Property-based tests for quoting and the expression grammar.

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use proptest::prelude::*;

    use crate::{
        quote, quote_bytes, unquote, unquote_bytes, AccessEvaluator, AccessExpression,
        Authorizations,
    };

    /// Strategy for terms made only of bare-authorization characters.
    fn bare_term_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_.:/-]{1,20}"
    }

    /// A generated expression shape, rendered to text two ways below.
    #[derive(Debug, Clone)]
    enum Expr {
        Auth(String),
        And(Vec<Expr>),
        Or(Vec<Expr>),
    }

    fn expr_strategy() -> impl Strategy<Value = Expr> {
        let leaf = "[A-Za-z0-9]{1,6}".prop_map(Expr::Auth);
        leaf.prop_recursive(4, 48, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 2..4).prop_map(Expr::And),
                prop::collection::vec(inner, 2..4).prop_map(Expr::Or),
            ]
        })
    }

    /// Renders with parentheses only where required (operator children).
    /// With `redundant` set, every child and the whole expression are
    /// parenthesized as well.
    fn render(expr: &Expr, out: &mut String, redundant: bool) {
        match expr {
            Expr::Auth(name) => out.push_str(name),
            Expr::And(children) | Expr::Or(children) => {
                let operator = if matches!(expr, Expr::And(_)) { '&' } else { '|' };
                for (index, child) in children.iter().enumerate() {
                    if index > 0 {
                        out.push(operator);
                    }
                    let parens = redundant || matches!(child, Expr::And(_) | Expr::Or(_));
                    if parens {
                        out.push('(');
                    }
                    render(child, out, redundant);
                    if parens {
                        out.push(')');
                    }
                }
            }
        }
    }

    fn leaf_names(expr: &Expr, names: &mut Vec<String>) {
        match expr {
            Expr::Auth(name) => names.push(name.clone()),
            Expr::And(children) | Expr::Or(children) => {
                for child in children {
                    leaf_names(child, names);
                }
            }
        }
    }

    /// Deterministically picks roughly half the names, seeded per case.
    fn pick_authorizations(names: &[String], seed: u64) -> Authorizations {
        Authorizations::of(names.iter().filter(|name| {
            let mut hasher = DefaultHasher::new();
            name.hash(&mut hasher);
            (hasher.finish() ^ seed) & 1 == 0
        }))
    }

    proptest! {
        #[test]
        fn test_unquote_reverses_quote_for_strings(term in ".{1,40}") {
            let quoted = quote(&term).unwrap();
            let unquoted = unquote(&quoted).unwrap();
            prop_assert_eq!(unquoted, term.clone());
        }

        #[test]
        fn test_unquote_reverses_quote_for_bytes(
            term in prop::collection::vec(any::<u8>(), 1..40)
        ) {
            let quoted = quote_bytes(&term).unwrap();
            let unquoted = unquote_bytes(&quoted).unwrap();
            prop_assert_eq!(unquoted.as_ref(), &term[..]);
        }

        #[test]
        fn test_quote_is_identity_on_bare_terms(term in bare_term_strategy()) {
            let quoted = quote(&term).unwrap();
            prop_assert_eq!(quoted.as_ref(), &term[..]);
            // and therefore idempotent
            let requoted = quote(&quoted).unwrap();
            prop_assert_eq!(requoted.as_ref(), &term[..]);
        }

        #[test]
        fn test_quoted_terms_are_valid_expression_atoms(term in ".{1,20}") {
            let quoted = quote(&term).unwrap();
            prop_assert!(AccessExpression::validate(&quoted).is_ok());
        }

        #[test]
        fn test_parentheses_are_structural(expr in expr_strategy(), seed in any::<u64>()) {
            let mut minimal = String::new();
            render(&expr, &mut minimal, false);
            let mut redundant = String::new();
            redundant.push('(');
            render(&expr, &mut redundant, true);
            redundant.push(')');

            prop_assert!(AccessExpression::validate(&minimal).is_ok(), "{}", minimal);
            prop_assert!(AccessExpression::validate(&redundant).is_ok(), "{}", redundant);

            // identical trees regardless of grouping noise
            prop_assert_eq!(
                AccessExpression::parse(&minimal).unwrap(),
                AccessExpression::parse(&redundant).unwrap()
            );

            // identical decisions for any holder
            let mut names = Vec::new();
            leaf_names(&expr, &mut names);
            let evaluator = AccessEvaluator::new(pick_authorizations(&names, seed));
            prop_assert_eq!(
                evaluator.can_access(&minimal).unwrap(),
                evaluator.can_access(&redundant).unwrap()
            );
        }

        #[test]
        fn test_validate_parse_and_can_access_accept_the_same_inputs(
            bytes in prop::collection::vec(any::<u8>(), 0..48)
        ) {
            let validated = AccessExpression::validate_bytes(&bytes).is_ok();
            let parsed = AccessExpression::parse_bytes(&bytes).is_ok();
            let evaluated = AccessEvaluator::new(Authorizations::new())
                .can_access_bytes(&bytes)
                .is_ok();
            prop_assert_eq!(validated, parsed);
            prop_assert_eq!(validated, evaluated);
        }

        #[test]
        fn test_rendered_tree_reproduces_the_tree(expr in expr_strategy()) {
            let mut source = String::new();
            render(&expr, &mut source, false);
            let tree = AccessExpression::parse(&source).unwrap();
            let rendered = tree.expression();
            prop_assert_eq!(AccessExpression::parse_bytes(&rendered).unwrap(), tree);
        }
    }
}
