//! Syntax-tree data model for the Tessa test-automation DSL.
//!
//! The parser produces immutable [`Node`] trees whose leaves are [`Token`]
//! values; everything downstream (indexing, queries, semantic tokens)
//! consumes them read-only. Tokens are never mutated in place: call sites
//! that need a re-tagged or re-sliced token derive a copy instead.

pub mod dump;
pub mod node;
pub mod token;
pub mod walk;

pub use node::{Node, Position, Span};
pub use token::{Token, TokenKind, VariableSyntaxError, VARIABLE_PREFIXES};
pub use walk::try_visit;
