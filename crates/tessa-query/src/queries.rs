use std::sync::Arc;

use tessa_syntax::{try_visit, Node, Position, Span, Token, TokenKind};

use crate::error::QueryError;
use crate::index::AstIndex;
use crate::located::{NodeInfo, TokenInfo};
use crate::variables::tokenize_variables_even_when_invalid;

/// Diagnostics stop accumulating past this point; a document in that state
/// is beyond useful error reporting anyway.
const MAX_ERRORS: usize = 100;

/// A parser-reported problem with its source range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    pub message: String,
    pub span: Span,
}

pub fn iter_library_imports(index: &AstIndex) -> Result<Vec<NodeInfo>, QueryError> {
    index.iter_indexed("LibraryImport")
}

pub fn iter_resource_imports(index: &AstIndex) -> Result<Vec<NodeInfo>, QueryError> {
    index.iter_indexed("ResourceImport")
}

pub fn iter_variable_imports(index: &AstIndex) -> Result<Vec<NodeInfo>, QueryError> {
    index.iter_indexed("VariablesImport")
}

/// User keyword definitions.
pub fn iter_keywords(index: &AstIndex) -> Result<Vec<NodeInfo>, QueryError> {
    index.iter_indexed("Keyword")
}

/// Variable definitions from variable sections.
pub fn iter_variables(index: &AstIndex) -> Result<Vec<NodeInfo>, QueryError> {
    index.iter_indexed("Variable")
}

pub fn iter_tests(index: &AstIndex) -> Result<Vec<NodeInfo>, QueryError> {
    index.iter_indexed("TestCase")
}

pub fn iter_test_case_sections(index: &AstIndex) -> Result<Vec<NodeInfo>, QueryError> {
    index.iter_indexed("TestCaseSection")
}

/// ARGUMENT tokens of every indexed `[Arguments]` setting.
pub fn iter_keyword_arguments(index: &AstIndex) -> Result<Vec<Token>, QueryError> {
    let mut out = Vec::new();
    for info in index.iter_indexed("Arguments")? {
        out.extend(info.node.tokens_of_kind(TokenKind::Argument).cloned());
    }
    Ok(out)
}

/// The library import's own name token (never its alias), if `token` is
/// exactly that.
pub fn library_import_name_token<'t>(node: &Node, token: &'t Token) -> Option<&'t Token> {
    import_name_token(node, token, "LibraryImport")
}

pub fn resource_import_name_token<'t>(node: &Node, token: &'t Token) -> Option<&'t Token> {
    import_name_token(node, token, "ResourceImport")
}

pub fn variables_import_name_token<'t>(node: &Node, token: &'t Token) -> Option<&'t Token> {
    import_name_token(node, token, "VariablesImport")
}

fn import_name_token<'t>(node: &Node, token: &'t Token, tag: &str) -> Option<&'t Token> {
    (token.kind == TokenKind::Name
        && node.is(tag)
        && node.value_of_kind(TokenKind::Name) == Some(token.value.as_str()))
    .then_some(token)
}

/// Last top-level section starting at or before `line` (0-based).
pub fn find_section(root: &Node, line: u32) -> Option<&Arc<Node>> {
    let mut last = None;
    for section in &root.children {
        if section.span().start.line.saturating_sub(1) <= line {
            last = Some(section);
        } else {
            return last;
        }
    }
    last
}

/// Token under the given 0-based line/column, searched below `section`.
///
/// Separators match only strictly inside themselves, so a boundary position
/// resolves to the adjacent word. A position at most one character into a
/// whitespace-only EOL merges that whitespace into the preceding token:
/// trailing space after a keyword belongs to the keyword, not the EOL.
pub fn find_token_at(section: &Arc<Node>, line: u32, col: u32) -> Option<TokenInfo> {
    let result = try_visit(section, &mut |stack, node: &Arc<Node>| {
        let mut last_token: Option<&Token> = None;
        for token in &node.tokens {
            if token.line.saturating_sub(1) != line {
                continue;
            }
            match token.kind {
                TokenKind::Separator => {
                    if token.col < col && col < token.end_col() {
                        return Err(TokenInfo {
                            stack: stack.to_vec(),
                            node: Arc::clone(node),
                            token: token.clone(),
                        });
                    }
                }
                TokenKind::Eol => {
                    if token.col <= col && col <= token.end_col() {
                        let diff = (col - token.col) as usize;
                        let mut found = token.clone();
                        if let Some(prev) = last_token {
                            if token.value.trim().is_empty() {
                                let eol_contents: String =
                                    token.value.chars().take(diff).collect();
                                if eol_contents.chars().count() <= 1 {
                                    let mut merged = prev.value.clone();
                                    merged.push_str(&eol_contents);
                                    found = prev.with_value(merged);
                                }
                            }
                        }
                        return Err(TokenInfo {
                            stack: stack.to_vec(),
                            node: Arc::clone(node),
                            token: found,
                        });
                    }
                }
                _ => {
                    if token.col <= col && col <= token.end_col() {
                        return Err(TokenInfo {
                            stack: stack.to_vec(),
                            node: Arc::clone(node),
                            token: token.clone(),
                        });
                    }
                }
            }
            last_token = Some(token);
        }
        Ok(())
    });
    result.err()
}

/// Variable part under the given 0-based position, if any. Falls back to the
/// heuristic tokenizer so completion keeps working while the user is typing
/// an unterminated variable.
pub fn find_variable_at(section: &Arc<Node>, line: u32, col: u32) -> Option<TokenInfo> {
    let info = find_token_at(section, line, col)?;
    if !info.token.value.contains('{') {
        return None;
    }
    let parts = tokenize_variables_even_when_invalid(&info.token, col)?;
    for part in parts {
        if part.col <= col && col <= part.end_col() {
            if part.kind == TokenKind::Variable {
                return Some(TokenInfo {
                    stack: info.stack,
                    node: info.node,
                    token: part,
                });
            }
            return None;
        }
    }
    None
}

/// Raw documentation text of `node`'s documentation settings.
///
/// Token values accumulate into a line buffer that is flushed whenever the
/// physical line changes and reset whenever a continuation or documentation
/// marker token is seen, so markers and anything before them never leak into
/// the text. The result is joined as-is and trimmed.
pub fn get_documentation_raw(node: &Node) -> String {
    let mut doc: Vec<String> = Vec::new();
    let mut line_buffer: Vec<String> = Vec::new();
    let mut last_token_line: Option<u32> = None;

    for child in node.children.iter().filter(|c| c.is("Documentation")) {
        for token in &child.tokens {
            if let Some(prev_line) = last_token_line {
                if prev_line != token.line {
                    doc.append(&mut line_buffer);
                }
            }
            last_token_line = Some(token.line);

            if matches!(token.kind, TokenKind::Continuation | TokenKind::Documentation) {
                line_buffer.clear();
                continue;
            }
            line_buffer.push(token.value.clone());
        }
        doc.append(&mut line_buffer);
    }

    doc.concat().trim().to_string()
}

/// ASSIGN tokens of direct-child keyword calls, with any decoration after
/// the final `}` (the ` =` marker) trimmed off.
pub fn iter_variable_assigns(parent: &Node) -> Vec<TokenInfo> {
    let mut out = Vec::new();
    for child in parent.children.iter().filter(|c| c.is("KeywordCall")) {
        for token in child.tokens_of_kind(TokenKind::Assign) {
            let chars: Vec<char> = token.value.chars().collect();
            let token = match chars.iter().rposition(|&c| c == '}') {
                Some(close) if close > 0 => {
                    token.with_value(chars[..=close].iter().collect::<String>())
                }
                _ => token.clone(),
            };
            out.push(TokenInfo {
                stack: Vec::new(),
                node: Arc::clone(child),
                token,
            });
        }
    }
    out
}

/// Parser-reported errors below `root`, capped at [`MAX_ERRORS`].
pub fn collect_errors(root: &Node) -> Vec<SourceError> {
    let mut errors = Vec::new();
    let _ = try_visit::<(), _>(root, &mut |_stack, node| {
        if node.is("Error") {
            for token in &node.tokens {
                if token.kind.is_error() {
                    let message = token
                        .error
                        .clone()
                        .unwrap_or_else(|| format!("unexpected '{}'", token.value));
                    errors.push(SourceError {
                        message,
                        span: Span {
                            start: Position::new(token.line, token.col),
                            end: Position::new(token.line, token.end_col()),
                        },
                    });
                }
            }
        }
        if errors.len() >= MAX_ERRORS {
            return Err(());
        }
        Ok(())
    });
    errors.truncate(MAX_ERRORS);
    errors
}

/// An error positioned on `node`'s tokens (the whole statement range).
pub fn error_from_node(node: &Node, message: impl Into<String>) -> SourceError {
    let span = match (node.tokens.first(), node.tokens.last()) {
        (Some(first), Some(last)) => Span {
            start: Position::new(first.line, first.col),
            end: Position::new(last.line, last.end_col()),
        },
        _ => {
            tracing::debug!(tag = %node.tag, "no tokens found when building an error");
            Span::default()
        }
    };
    SourceError {
        message: message.into(),
        span,
    }
}
