//! Whole-document semantic-token encoding.
//!
//! Every token of the tree is revisited, reclassified into presentation
//! categories and, where useful, split into sub-tokens (BDD prefixes,
//! import qualifiers, `${` `name` `}` triples, `name=value` pairs). The
//! result is the flat integer stream of the editor protocol: quintuples of
//! (line delta, column delta-or-absolute, length, type index, modifier
//! bitmask).

mod legend;

use std::collections::HashSet;
use std::sync::Arc;

use tower_lsp::lsp_types::{SemanticToken, SemanticTokens};

use tessa_query::keyword_usage::{has_keyword_name_in_name_slot, ArgKeywordNames};
use tessa_query::{Monitor, QueryError};
use tessa_syntax::{try_visit, Node, Token, TokenKind};

use crate::imports::{dependent_name_set, ImportGraph};

pub use legend::{legend, modifier_mask, TOKEN_MODIFIERS, TOKEN_TYPES};
use legend::{
    token_type_index, ARGUMENT_VALUE_INDEX, CONTROL_INDEX, DOCUMENTATION_INDEX, NAME_INDEX,
    PARAMETER_NAME_INDEX, SETTING_INDEX, VARIABLE_INDEX, VARIABLE_OPERATOR_INDEX,
};

/// The one builtin that concatenates all its arguments instead of accepting
/// named parameters; `name=value` splitting is suppressed under it.
const PURE_CONCATENATION_KEYWORD: &str = "catenate";

const GHERKIN_WORDS: [&str; 5] = ["given", "when", "then", "and", "but"];

/// Encodes the whole document. A missing tree (parse failure) degrades to an
/// empty stream; cancellation propagates so the host can abandon the
/// request.
pub fn semantic_tokens_full(
    ast: Option<&Arc<Node>>,
    imports: &dyn ImportGraph,
    monitor: &dyn Monitor,
) -> Result<Vec<u32>, QueryError> {
    let Some(root) = ast else {
        return Ok(Vec::new());
    };
    let imported = dependent_name_set(imports);

    let mut data: Vec<u32> = Vec::new();
    let mut last_line: u32 = 0;
    let mut last_col: u32 = 0;

    try_visit(root, &mut |_stack, node: &Arc<Node>| {
        monitor.check_cancelled()?;
        if node.tokens.is_empty() {
            return Ok(());
        }
        // One handler per node: it is stateful across the node's arguments.
        let mut handler = ArgKeywordNames::for_node(node);
        let mut parts: Vec<(Token, u32)> = Vec::new();
        for token in &node.tokens {
            parts.clear();
            emit_token_parts(node, token, handler.as_mut(), &imported, &mut parts);
            for (part, type_index) in &parts {
                push_quintuple(&mut data, &mut last_line, &mut last_col, part, *type_index);
            }
        }
        Ok(())
    })?;

    Ok(data)
}

/// Packs the flat stream into the protocol result type.
pub fn to_semantic_tokens(data: Vec<u32>) -> SemanticTokens {
    let data = data
        .chunks_exact(5)
        .map(|quintuple| SemanticToken {
            delta_line: quintuple[0],
            delta_start: quintuple[1],
            length: quintuple[2],
            token_type: quintuple[3],
            token_modifiers_bitset: quintuple[4],
        })
        .collect();
    SemanticTokens {
        result_id: None,
        data,
    }
}

/// Decodes a stream back into (text, type-name) pairs by re-slicing the
/// document text. Debugging and test aid; the inverse of the encoder's
/// delta scheme.
pub fn decode_semantic_tokens(data: &[u32], text: &str) -> Vec<(String, &'static str)> {
    let lines: Vec<&str> = text.lines().collect();
    let mut out = Vec::new();
    let mut line: u32 = 0;
    let mut col: u32 = 0;
    for quintuple in data.chunks_exact(5) {
        let (delta_line, delta_col, len, token_type) =
            (quintuple[0], quintuple[1], quintuple[2], quintuple[3]);
        line += delta_line;
        if delta_line == 0 {
            col += delta_col;
        } else {
            col = delta_col;
        }
        let fragment: String = lines
            .get(line as usize)
            .copied()
            .unwrap_or("")
            .chars()
            .skip(col as usize)
            .take(len as usize)
            .collect();
        out.push((fragment, TOKEN_TYPES[token_type as usize]));
    }
    out
}

fn push_quintuple(
    data: &mut Vec<u32>,
    last_line: &mut u32,
    last_col: &mut u32,
    part: &Token,
    type_index: u32,
) {
    // Lines are 1-based in the tree and 0-based on the wire; synthesized
    // tokens without a position clamp to zero rather than underflowing.
    let line = part.line.saturating_sub(1);
    data.push(line.saturating_sub(*last_line));
    if line != *last_line {
        data.push(part.col);
        *last_col = part.col;
    } else {
        let delta = part.col.saturating_sub(*last_col);
        data.push(delta);
        *last_col += delta;
    }
    data.push(part.width());
    data.push(type_index);
    data.push(0);
    *last_line = line;
}

/// Re-classifies one token and appends its presentation parts to `out`.
fn emit_token_parts(
    node: &Node,
    token: &Token,
    handler: Option<&mut ArgKeywordNames>,
    imported: &HashSet<String>,
    out: &mut Vec<(Token, u32)>,
) {
    // Fast path for the most common tokens, which are never highlighted.
    if matches!(token.kind, TokenKind::Eol | TokenKind::Separator) {
        return;
    }

    let mut kind = token.kind;
    let mut in_documentation = false;

    // Promote arguments sitting in a keyword-name position, and the NAME
    // slot of fixtures/templates, to keyword calls.
    if kind == TokenKind::Argument {
        in_documentation = node.is("Documentation");
        if !in_documentation {
            if let Some(handler) = handler {
                if handler.consider_token(token) {
                    kind = TokenKind::Keyword;
                }
            }
        }
    }
    if kind == TokenKind::Name && has_keyword_name_in_name_slot(&node.tag) {
        kind = TokenKind::Keyword;
    }

    let mut use_token = if kind == token.kind {
        token.clone()
    } else {
        token.with_kind(kind)
    };

    if kind == TokenKind::Keyword {
        if let Some((prefix, rest)) = split_gherkin_prefix(&use_token) {
            out.push((prefix, CONTROL_INDEX));
            use_token = rest;
        }
        if let Some((qualifier, rest)) = split_import_qualifier(&use_token, imported) {
            out.push((qualifier, NAME_INDEX));
            use_token = rest;
        }
    }

    let parts = match use_token.tokenize_variables() {
        Ok(parts) => parts,
        Err(_) => {
            // Malformed variable syntax: emit the token as one unit.
            if in_documentation {
                out.push((use_token, DOCUMENTATION_INDEX));
            } else if let Some(index) = token_type_index(kind) {
                out.push((use_token, index));
            }
            return;
        }
    };

    let mut parts = parts.into_iter();
    let mut pending: Option<Token> = None;
    if kind == TokenKind::Argument {
        if let Some(mut first) = parts.next() {
            if !in_documentation {
                if let Some(equals_at) = char_position(&first.value, '=') {
                    if !is_pure_concatenation_call(node) {
                        let (name, rest) = split_at(&first, equals_at);
                        out.push((name, PARAMETER_NAME_INDEX));
                        let (operator, rest) = split_at(&rest, 1);
                        out.push((operator, VARIABLE_OPERATOR_INDEX));
                        first = rest;
                    }
                }
            }
            pending = Some(first);
        }
    }

    for part in pending.into_iter().chain(parts) {
        let Some(type_index) = token_type_index(part.kind) else {
            continue;
        };
        emit_sub_token(part, type_index, in_documentation, out);
    }
}

/// Further splitting of one already-classified part.
fn emit_sub_token(
    token: Token,
    type_index: u32,
    in_documentation: bool,
    out: &mut Vec<(Token, u32)>,
) {
    if in_documentation && type_index == ARGUMENT_VALUE_INDEX {
        // The documentation text itself; embedded variables still split.
        out.push((token, DOCUMENTATION_INDEX));
        return;
    }

    let width = token.width() as usize;

    // `${name}` -> `${`, `name`, `}`.
    if type_index == VARIABLE_INDEX
        && width > 3
        && token.value.ends_with('}')
        && token.value.chars().nth(1) == Some('{')
    {
        let (open, rest) = split_at(&token, 2);
        out.push((open, VARIABLE_OPERATOR_INDEX));
        let (name, close) = split_at(&rest, width - 3);
        out.push((name, type_index));
        out.push((close, VARIABLE_OPERATOR_INDEX));
        return;
    }

    // `[Arguments]` -> `[`, `Arguments`, `]`.
    if type_index == SETTING_INDEX
        && width > 2
        && token.value.starts_with('[')
        && token.value.ends_with(']')
    {
        let (open, rest) = split_at(&token, 1);
        out.push((open, VARIABLE_OPERATOR_INDEX));
        let (name, close) = split_at(&rest, width - 2);
        out.push((name, type_index));
        out.push((close, VARIABLE_OPERATOR_INDEX));
        return;
    }

    // `limit=10` -> `limit`, `=`, `10`.
    if token.kind == TokenKind::Option {
        if let Some(equals_at) = char_position(&token.value, '=') {
            let (name, rest) = split_at(&token, equals_at);
            out.push((name, PARAMETER_NAME_INDEX));
            let (operator, value) = split_at(&rest, 1);
            out.push((operator, VARIABLE_OPERATOR_INDEX));
            out.push((value, ARGUMENT_VALUE_INDEX));
            return;
        }
    }

    out.push((token, type_index));
}

fn is_pure_concatenation_call(node: &Node) -> bool {
    node.value_of_kind(TokenKind::Keyword)
        .is_some_and(|name| name.trim().eq_ignore_ascii_case(PURE_CONCATENATION_KEYWORD))
}

/// Splits a leading BDD word (plus the whitespace run after it) off a
/// keyword-name token: `Given I do X` -> `Given ` + `I do X`.
fn split_gherkin_prefix(token: &Token) -> Option<(Token, Token)> {
    let value = &token.value;
    for word in GHERKIN_WORDS {
        if value.len() > word.len()
            && value.is_char_boundary(word.len())
            && value[..word.len()].eq_ignore_ascii_case(word)
        {
            let whitespace = value[word.len()..]
                .chars()
                .take_while(|c| c.is_whitespace())
                .count();
            if whitespace == 0 {
                continue;
            }
            return Some(split_at(token, word.len() + whitespace));
        }
    }
    None
}

/// Splits a leading `Library.`/`resource.` qualifier off a keyword-name
/// token when the prefix names something in the resolved import graph.
/// Prefixes are tried shortest first; the dot stays with the keyword part.
fn split_import_qualifier(token: &Token, imported: &HashSet<String>) -> Option<(Token, Token)> {
    if !token.value.contains('.') {
        return None;
    }
    let chars: Vec<char> = token.value.chars().collect();
    for (position, c) in chars.iter().enumerate() {
        if *c != '.' {
            continue;
        }
        let candidate: String = chars[..position]
            .iter()
            .collect::<String>()
            .to_lowercase();
        if imported.contains(&candidate) {
            return Some(split_at(token, position));
        }
    }
    None
}

fn split_at(token: &Token, at: usize) -> (Token, Token) {
    let width = token.width() as usize;
    (
        token.slice(0, at, token.kind),
        token.slice(at, width, token.kind),
    )
}

fn char_position(value: &str, needle: char) -> Option<usize> {
    value.chars().position(|c| c == needle)
}
