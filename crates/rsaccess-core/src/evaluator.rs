//! Access decision facade.
//!
//! An [`AccessEvaluator`] bundles the authorizations a principal holds and
//! answers `can_access` for expressions guarding data. Evaluation is a
//! single validating pass per authorization set; no parse tree is built.
//!
//! Evaluators are immutable and safe to share across threads. For workloads
//! where the same expressions repeat, wrap the evaluator in
//! [`crate::cache::CachedAccessEvaluator`].

use std::fmt;

use tracing::instrument;

use crate::authorizations::Authorizations;
use crate::error::AccessResult;
use crate::expression::AccessExpression;
use crate::parser;
use crate::quoting::unescape;
use crate::tokenizer::AuthorizationToken;

/// Decides whether a single authorization is held.
///
/// Implementations receive the unescaped authorization as UTF-8 text (bytes
/// outside UTF-8 are replaced). A blanket implementation covers closures:
///
/// ```
/// use rsaccess_core::AccessEvaluator;
///
/// let evaluator = AccessEvaluator::with_authorizer(|auth: &str| auth.starts_with("grp/"));
/// assert!(evaluator.can_access("grp/dev&grp/ops").unwrap());
/// ```
pub trait Authorizer: Send + Sync {
    /// True if the principal holds `authorization`.
    fn is_authorized(&self, authorization: &str) -> bool;
}

impl<F> Authorizer for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_authorized(&self, authorization: &str) -> bool {
        self(authorization)
    }
}

enum Access {
    Sets(Vec<Authorizations>),
    Delegate(Box<dyn Authorizer>),
}

/// Evaluates access expressions against one or more authorization sets.
///
/// With multiple sets, an expression is accessible only if it evaluates to
/// true against every set independently:
///
/// ```
/// use rsaccess_core::{AccessEvaluator, Authorizations};
///
/// let evaluator = AccessEvaluator::with_sets([
///     Authorizations::of(["A", "B"]),
///     Authorizations::of(["C", "D"]),
/// ]);
///
/// assert!(!evaluator.can_access("A").unwrap());
/// assert!(evaluator.can_access("A|D").unwrap());
/// assert!(!evaluator.can_access("A&D").unwrap());
/// ```
pub struct AccessEvaluator {
    access: Access,
}

impl AccessEvaluator {
    /// Creates an evaluator over a single authorization set.
    pub fn new(authorizations: Authorizations) -> Self {
        Self {
            access: Access::Sets(vec![authorizations]),
        }
    }

    /// Creates an evaluator over multiple authorization sets, conjoining
    /// the per-set results. An empty collection degrades to one empty set,
    /// which denies everything except the empty expression.
    pub fn with_sets<I>(authorization_sets: I) -> Self
    where
        I: IntoIterator<Item = Authorizations>,
    {
        let mut sets: Vec<Authorizations> = authorization_sets.into_iter().collect();
        if sets.is_empty() {
            sets.push(Authorizations::new());
        }
        Self {
            access: Access::Sets(sets),
        }
    }

    /// Creates an evaluator that delegates membership decisions to an
    /// [`Authorizer`].
    pub fn with_authorizer<A>(authorizer: A) -> Self
    where
        A: Authorizer + 'static,
    {
        Self {
            access: Access::Delegate(Box::new(authorizer)),
        }
    }

    /// Validates `expression` and decides whether the held authorizations
    /// grant access. Malformed expressions are an error, never a denial.
    pub fn can_access(&self, expression: &str) -> AccessResult<bool> {
        self.can_access_bytes(expression.as_bytes())
    }

    /// Byte-level form of [`Self::can_access`].
    #[instrument(skip_all, level = "trace", fields(expression_len = expression.len()))]
    pub fn can_access_bytes(&self, expression: &[u8]) -> AccessResult<bool> {
        match &self.access {
            Access::Sets(sets) => {
                for set in sets {
                    // each pass validates the whole expression, so a false
                    // result is already safe to return early
                    let granted =
                        parser::evaluate(expression, &mut |token| is_authorized(set, token))?;
                    if !granted {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Access::Delegate(authorizer) => parser::evaluate(expression, &mut |token| {
                let unescaped = unescape(token.bytes);
                authorizer.is_authorized(&String::from_utf8_lossy(&unescaped))
            }),
        }
    }

    /// Evaluates a previously validated expression.
    pub fn can_access_expression(&self, expression: &AccessExpression) -> AccessResult<bool> {
        self.can_access_bytes(expression.as_bytes())
    }
}

impl fmt::Debug for AccessEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.access {
            Access::Sets(sets) => f.debug_struct("AccessEvaluator").field("sets", sets).finish(),
            Access::Delegate(_) => f
                .debug_struct("AccessEvaluator")
                .field("authorizer", &"<delegate>")
                .finish(),
        }
    }
}

/// Escape-aware membership test. Bare tokens compare raw; quoted tokens are
/// unescaped first, borrowing when they contain no escapes.
fn is_authorized(authorizations: &Authorizations, token: &AuthorizationToken<'_>) -> bool {
    if !token.quoted {
        return authorizations.contains(token.bytes);
    }
    authorizations.contains(&unescape(token.bytes))
}
