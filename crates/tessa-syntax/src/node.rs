use std::sync::Arc;

use crate::token::{Token, TokenKind};

/// Source position: 1-based line, 0-based column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub col: u32,
}

impl Position {
    pub fn new(line: u32, col: u32) -> Position {
        Position { line, col }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// One syntax-tree element: a class tag, child nodes, and the tokens the
/// element owns directly.
///
/// Tags are plain strings (`"KeywordCall"`, `"LibraryImport"`, ...) so that
/// consumers written against one parser version keep working when new node
/// kinds appear; unknown tags flow through the index fallback unchanged.
///
/// A tree is built once per document parse and superseded wholesale on
/// re-parse; nothing mutates it in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub tag: String,
    pub children: Vec<Arc<Node>>,
    pub tokens: Vec<Token>,
}

impl Node {
    pub fn new(tag: impl Into<String>, children: Vec<Arc<Node>>, tokens: Vec<Token>) -> Node {
        Node {
            tag: tag.into(),
            children,
            tokens,
        }
    }

    /// A statement node: tokens only, no children.
    pub fn leaf(tag: impl Into<String>, tokens: Vec<Token>) -> Node {
        Node::new(tag, Vec::new(), tokens)
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    /// First token of the given kind.
    pub fn token_of_kind(&self, kind: TokenKind) -> Option<&Token> {
        self.tokens.iter().find(|t| t.kind == kind)
    }

    pub fn tokens_of_kind(&self, kind: TokenKind) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(move |t| t.kind == kind)
    }

    /// Value of the first token of the given kind.
    pub fn value_of_kind(&self, kind: TokenKind) -> Option<&str> {
        self.token_of_kind(kind).map(|t| t.value.as_str())
    }

    /// Derived copy with the same tag and a replacement token list. Used when
    /// a synthesized view of a statement is needed (e.g. a re-tagged name
    /// token); the original node stays untouched.
    pub fn with_tokens(&self, tokens: Vec<Token>) -> Node {
        Node {
            tag: self.tag.clone(),
            children: Vec::new(),
            tokens,
        }
    }

    /// Source span covering this node's tokens and children. A node with no
    /// tokens anywhere reports the zero span (line 0).
    pub fn span(&self) -> Span {
        let token_start = self.tokens.first().map(|t| Position::new(t.line, t.col));
        let child_start = self.children.first().map(|c| c.span().start);
        let start = match (token_start, child_start) {
            (Some(a), Some(b)) => a.min(b),
            (a, b) => a.or(b).unwrap_or_default(),
        };
        let token_end = self.tokens.last().map(|t| Position::new(t.line, t.end_col()));
        let child_end = self.children.last().map(|c| c.span().end);
        let end = match (token_end, child_end) {
            (Some(a), Some(b)) => a.max(b),
            (a, b) => a.or(b).unwrap_or_default(),
        };
        Span { start, end }
    }
}
