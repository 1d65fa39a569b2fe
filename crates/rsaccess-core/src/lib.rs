//! rsaccess-core: access expression parsing and evaluation
//!
//! An access expression is a compact boolean formula over authorization
//! tokens (`(ALPHA|BETA)&OMEGA`) attached to a piece of data. This crate
//! decides whether a principal holding one or more sets of authorizations
//! may read data tagged with such an expression.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  rsaccess-core                   │
//! ├──────────────────────────────────────────────────┤
//! │  tokenizer   - byte cursor over expression text  │
//! │  parser      - validate + evaluate in one pass   │
//! │  tree        - on-demand parse trees             │
//! │  quoting     - quote/unquote/escape helpers      │
//! │  evaluator   - authorization sets, can_access    │
//! │  cache       - bounded decision caching          │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Evaluation never builds a parse tree: validation and the boolean
//! decision happen in a single linear pass over the bytes, with no
//! allocation for unquoted terms. [`AccessExpression::parse`] builds a tree
//! when callers need structure.
//!
//! # Example
//!
//! ```
//! use rsaccess_core::{AccessEvaluator, AccessExpression, Authorizations};
//!
//! let evaluator = AccessEvaluator::new(Authorizations::of(["ALPHA", "OMEGA"]));
//! assert!(!evaluator.can_access("ALPHA&BETA")?);
//! assert!(evaluator.can_access("(ALPHA|BETA)&(OMEGA|EPSILON)")?);
//!
//! // terms outside the bare character class must be quoted
//! let dinosaur = rsaccess_core::quote("\u{1F996}")?;
//! AccessExpression::validate(&format!("ALPHA&{dinosaur}"))?;
//! # Ok::<(), rsaccess_core::AccessError>(())
//! ```

pub mod authorizations;
pub mod cache;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod quoting;
pub mod tree;

mod parser;
mod tokenizer;

#[cfg(test)]
mod expression_proptest;

pub use authorizations::Authorizations;
pub use cache::{CacheConfig, CachedAccessEvaluator};
pub use error::{AccessError, AccessResult, ParseErrorKind};
pub use evaluator::{AccessEvaluator, Authorizer};
pub use expression::AccessExpression;
pub use quoting::{quote, quote_bytes, unquote, unquote_bytes};
pub use tree::ParsedExpression;
