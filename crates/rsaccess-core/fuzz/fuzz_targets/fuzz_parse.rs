//! Fuzz target for the expression parser.
//!
//! Feeds arbitrary bytes through validation, tree building, and evaluation
//! and checks that the three paths accept exactly the same inputs, that
//! accepted trees re-render to an equivalent tree, and that nothing panics.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rsaccess_core::{AccessEvaluator, AccessExpression, Authorizations};

fuzz_target!(|data: &[u8]| {
    let validated = AccessExpression::validate_bytes(data).is_ok();
    let tree = AccessExpression::parse_bytes(data);
    assert_eq!(validated, tree.is_ok());

    let evaluator = AccessEvaluator::new(Authorizations::of(["A", "B", "C"]));
    assert_eq!(validated, evaluator.can_access_bytes(data).is_ok());

    if let Ok(tree) = tree {
        let rendered = tree.expression();
        let reparsed = AccessExpression::parse_bytes(&rendered)
            .expect("rendered form of a valid tree must be valid");
        assert_eq!(reparsed, tree);
    }
});
