use std::sync::Arc;

use tessa_syntax::{Node, Token};

/// A node paired with its ancestor stack, ordered outermost first. The stack
/// is relative to the walked origin; the origin itself is not included.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub stack: Vec<Arc<Node>>,
    pub node: Arc<Node>,
}

/// A token located within its owning node.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenInfo {
    pub stack: Vec<Arc<Node>>,
    pub node: Arc<Node>,
    pub token: Token,
}

/// One place where a keyword name is referenced: directly by a call-like
/// node, or embedded in the argument list of a keyword that takes other
/// keywords as arguments (`from_argument` distinguishes the two).
///
/// `node` may be a synthesized view (name token re-tagged, leading arguments
/// dropped); the tree's own node is never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordUsageInfo {
    pub stack: Vec<Arc<Node>>,
    pub node: Arc<Node>,
    pub token: Token,
    pub name: String,
    pub from_argument: bool,
}
