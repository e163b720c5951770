use std::sync::Arc;

use tessa_syntax::{Token, TokenKind, VARIABLE_PREFIXES};

use crate::error::QueryError;
use crate::index::AstIndex;
use crate::keyword_usage::KEYWORD_NAME_IN_NAME_SLOT_TAGS;
use crate::located::{NodeInfo, TokenInfo};

/// Node kinds whose ARGUMENT/NAME tokens may embed variable references.
const VARIABLE_REFERENCE_TAGS: [&str; 4] = [
    "KeywordCall",
    "LibraryImport",
    "ResourceImport",
    "TestTimeout",
];

/// Variable references (not definitions) embedded in call and import-like
/// statements. A token that fails to tokenize aborts the scan of its node
/// only; the failure is logged and every other node is still scanned.
pub fn iter_variable_references(index: &AstIndex) -> Result<Vec<TokenInfo>, QueryError> {
    let mut out = Vec::new();
    for tag in VARIABLE_REFERENCE_TAGS
        .iter()
        .chain(KEYWORD_NAME_IN_NAME_SLOT_TAGS.iter())
    {
        for info in index.iter_indexed(tag)? {
            index.monitor().check_cancelled()?;
            collect_references_from_node(&info, &mut out);
        }
    }
    Ok(out)
}

fn collect_references_from_node(info: &NodeInfo, out: &mut Vec<TokenInfo>) {
    for token in &info.node.tokens {
        if !matches!(token.kind, TokenKind::Argument | TokenKind::Name) {
            continue;
        }
        match token.tokenize_variables() {
            Ok(parts) => {
                for part in parts {
                    if part.kind == TokenKind::Variable {
                        out.push(TokenInfo {
                            stack: info.stack.clone(),
                            node: Arc::clone(&info.node),
                            token: part,
                        });
                    }
                }
            }
            Err(error) => {
                tracing::warn!(%error, value = %token.value, "unable to tokenize variables");
                return;
            }
        }
    }
}

/// Strict tokenization with a best-effort fallback for text the user is
/// still typing.
///
/// When the tokenizer rejects the value (typically an unterminated `{`), the
/// raw text is scanned backward from the requested column for the nearest
/// variable prefix immediately before an opening brace, then forward until a
/// terminator, and a single synthesized variable token covering the cursor
/// is returned. `None` means not even a heuristic variable exists there.
pub fn tokenize_variables_even_when_invalid(token: &Token, col: u32) -> Option<Vec<Token>> {
    if let Ok(parts) = token.tokenize_variables() {
        return Some(parts);
    }

    let chars: Vec<char> = token.value.chars().collect();
    let cursor = (col.saturating_sub(token.col) as usize).min(chars.len());
    let up_to_cursor = &chars[..cursor];
    let open_at = up_to_cursor.iter().rposition(|&c| c == '{')?;
    if open_at < 1 {
        return None;
    }
    let prefix = up_to_cursor[open_at - 1];
    if !VARIABLE_PREFIXES.contains(&prefix) {
        return None;
    }

    let mut value: String = up_to_cursor[open_at - 1..].iter().collect();
    for &c in &chars[cursor..] {
        if VARIABLE_PREFIXES.contains(&c) || c.is_whitespace() || c == '{' {
            break;
        }
        value.push(c);
        if c == '}' {
            break;
        }
    }

    let mut synthesized = token.with_value_at(value, token.col + open_at as u32 - 1);
    synthesized.kind = TokenKind::Variable;
    Some(vec![synthesized])
}
