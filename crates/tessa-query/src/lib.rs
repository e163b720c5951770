//! Indexed queries over parsed Tessa trees.
//!
//! The entry point is [`AstIndex`]: a per-tree cache handle the document
//! owner keeps next to the tree itself and discards wholesale on re-parse.
//! Query functions layer typed accessors, keyword-usage enumeration and
//! variable extraction on top of it.

pub mod error;
pub mod index;
pub mod keyword_usage;
pub mod located;
pub mod monitor;
pub mod queries;
pub mod variables;

#[cfg(test)]
mod fixtures;

pub use error::QueryError;
pub use index::{AstIndex, CacheKey};
pub use keyword_usage::{
    keyword_name_token, keyword_usage_for_token, iter_keyword_usages, strip_bdd_prefix,
    ArgKeywordNames, BDD_PREFIXES,
};
pub use located::{KeywordUsageInfo, NodeInfo, TokenInfo};
pub use monitor::{CancelFlag, Monitor, NullMonitor};
