use tower_lsp::lsp_types::{SemanticTokenModifier, SemanticTokenType, SemanticTokensLegend};

use tessa_syntax::TokenKind;

/// Presentation token types, in wire order. The client receives the *index*
/// into this table, so the ordering is part of the protocol contract with
/// the editor and must not be reordered without a protocol version bump.
pub const TOKEN_TYPES: [&str; 15] = [
    "variable",
    "comment",
    "header",
    "setting",
    "name",
    "keywordNameDefinition",
    "variableOperator",
    "keywordNameCall",
    "settingOperator",
    "control",
    "testCaseName",
    "parameterName",
    "argumentValue",
    "error",
    "documentation",
];

/// Token modifiers, in wire order. Transmitted as a bitmask with bit *i* for
/// modifier *i*; nothing sets a modifier today, but the table anchors the
/// contract.
pub const TOKEN_MODIFIERS: [&str; 10] = [
    "declaration",
    "definition",
    "readonly",
    "static",
    "deprecated",
    "abstract",
    "async",
    "modification",
    "documentation",
    "defaultLibrary",
];

pub(crate) const VARIABLE_INDEX: u32 = 0;
pub(crate) const COMMENT_INDEX: u32 = 1;
pub(crate) const HEADER_INDEX: u32 = 2;
pub(crate) const SETTING_INDEX: u32 = 3;
pub(crate) const NAME_INDEX: u32 = 4;
pub(crate) const KEYWORD_NAME_DEFINITION_INDEX: u32 = 5;
pub(crate) const VARIABLE_OPERATOR_INDEX: u32 = 6;
pub(crate) const KEYWORD_NAME_CALL_INDEX: u32 = 7;
pub(crate) const CONTROL_INDEX: u32 = 9;
pub(crate) const TESTCASE_NAME_INDEX: u32 = 10;
pub(crate) const PARAMETER_NAME_INDEX: u32 = 11;
pub(crate) const ARGUMENT_VALUE_INDEX: u32 = 12;
pub(crate) const ERROR_INDEX: u32 = 13;
pub(crate) const DOCUMENTATION_INDEX: u32 = 14;

/// Bitmask for one modifier by table position.
pub fn modifier_mask(index: usize) -> u32 {
    1 << index
}

/// Wire index for a lexical token kind, `None` for kinds that are never
/// highlighted on their own (separators, assignment markers, continuations).
pub(crate) fn token_type_index(kind: TokenKind) -> Option<u32> {
    if kind.is_header() {
        return Some(HEADER_INDEX);
    }
    if kind.is_setting() {
        return Some(SETTING_INDEX);
    }
    if kind.is_control() {
        return Some(CONTROL_INDEX);
    }
    match kind {
        TokenKind::Comment => Some(COMMENT_INDEX),
        TokenKind::Name => Some(NAME_INDEX),
        TokenKind::KeywordName => Some(KEYWORD_NAME_DEFINITION_INDEX),
        TokenKind::TestCaseName => Some(TESTCASE_NAME_INDEX),
        TokenKind::Keyword => Some(KEYWORD_NAME_CALL_INDEX),
        TokenKind::Argument => Some(ARGUMENT_VALUE_INDEX),
        TokenKind::Variable => Some(VARIABLE_INDEX),
        TokenKind::Option => Some(ARGUMENT_VALUE_INDEX),
        TokenKind::Error | TokenKind::FatalError => Some(ERROR_INDEX),
        _ => None,
    }
}

/// The legend advertised in the server capabilities; indices transmitted in
/// the token stream resolve against exactly these tables.
pub fn legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: TOKEN_TYPES.into_iter().map(SemanticTokenType::new).collect(),
        token_modifiers: TOKEN_MODIFIERS
            .into_iter()
            .map(SemanticTokenModifier::new)
            .collect(),
    }
}
