//! Hand-built trees shaped like parser output, shared by the unit tests.

use std::sync::Arc;

use tessa_syntax::{Node, Token, TokenKind};

pub(crate) fn tok(kind: TokenKind, value: &str, line: u32, col: u32) -> Token {
    Token::new(kind, value, line, col)
}

/// Statement tokens laid out left to right on one line, starting at `col`.
pub(crate) fn statement(line: u32, col: u32, parts: &[(TokenKind, &str)]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut at = col;
    for (kind, value) in parts {
        let token = tok(*kind, value, line, at);
        at = token.end_col();
        tokens.push(token);
    }
    tokens
}

pub(crate) fn keyword_call(name: &str, args: &[&str], line: u32) -> Arc<Node> {
    let mut parts = vec![
        (TokenKind::Separator, "    "),
        (TokenKind::Keyword, name),
    ];
    for arg in args {
        parts.push((TokenKind::Separator, "    "));
        parts.push((TokenKind::Argument, arg));
    }
    parts.push((TokenKind::Eol, "\n"));
    Arc::new(Node::leaf("KeywordCall", statement(line, 0, &parts)))
}

/// A `[Setup]`-style fixture setting whose NAME slot holds the keyword.
pub(crate) fn fixture(tag: &str, marker: &str, name: &str, args: &[&str], line: u32) -> Arc<Node> {
    let mut parts = vec![
        (TokenKind::Separator, "    "),
        (TokenKind::Setup, marker),
        (TokenKind::Separator, "    "),
        (TokenKind::Name, name),
    ];
    for arg in args {
        parts.push((TokenKind::Separator, "    "));
        parts.push((TokenKind::Argument, arg));
    }
    parts.push((TokenKind::Eol, "\n"));
    Arc::new(Node::leaf(tag, statement(line, 0, &parts)))
}

pub(crate) fn keyword(name: &str, line: u32, body: Vec<Arc<Node>>) -> Arc<Node> {
    Arc::new(Node::new(
        "Keyword",
        body,
        vec![tok(TokenKind::KeywordName, name, line, 0)],
    ))
}

pub(crate) fn test_case(name: &str, line: u32, body: Vec<Arc<Node>>) -> Arc<Node> {
    Arc::new(Node::new(
        "TestCase",
        body,
        vec![tok(TokenKind::TestCaseName, name, line, 0)],
    ))
}

pub(crate) fn library_import(name: &str, line: u32) -> Arc<Node> {
    Arc::new(Node::leaf(
        "LibraryImport",
        statement(
            line,
            0,
            &[
                (TokenKind::Library, "Library"),
                (TokenKind::Separator, "    "),
                (TokenKind::Name, name),
                (TokenKind::Eol, "\n"),
            ],
        ),
    ))
}

pub(crate) fn resource_import(path: &str, line: u32) -> Arc<Node> {
    Arc::new(Node::leaf(
        "ResourceImport",
        statement(
            line,
            0,
            &[
                (TokenKind::Resource, "Resource"),
                (TokenKind::Separator, "    "),
                (TokenKind::Name, path),
                (TokenKind::Eol, "\n"),
            ],
        ),
    ))
}

pub(crate) fn setting_section(children: Vec<Arc<Node>>) -> Arc<Node> {
    Arc::new(Node::new("SettingSection", children, Vec::new()))
}

pub(crate) fn test_case_section(children: Vec<Arc<Node>>) -> Arc<Node> {
    Arc::new(Node::new("TestCaseSection", children, Vec::new()))
}

pub(crate) fn keyword_section(children: Vec<Arc<Node>>) -> Arc<Node> {
    Arc::new(Node::new("KeywordSection", children, Vec::new()))
}

pub(crate) fn document(children: Vec<Arc<Node>>) -> Arc<Node> {
    Arc::new(Node::new("File", children, Vec::new()))
}

/// Small but complete suite: one import, one test, one keyword.
pub(crate) fn suite_document() -> Arc<Node> {
    document(vec![
        setting_section(vec![library_import("Collections", 1)]),
        test_case_section(vec![test_case(
            "Example Test",
            2,
            vec![keyword_call("Log", &["hello"], 3)],
        )]),
        keyword_section(vec![keyword(
            "My Keyword",
            4,
            vec![keyword_call("Log", &["inside"], 5)],
        )]),
    ])
}
