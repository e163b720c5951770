use std::fmt;

/// Characters that may introduce a `{`-delimited variable (`${scalar}`,
/// `@{list}`, `&{dict}`, `%{env}`).
pub const VARIABLE_PREFIXES: [char; 4] = ['$', '@', '&', '%'];

/// Lexical type tag of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Section headers (`*** Settings ***`, ...).
    SettingHeader,
    VariableHeader,
    TestCaseHeader,
    KeywordHeader,
    CommentHeader,
    // Setting markers (`Library`, `[Setup]`, `[Arguments]`, ...).
    Library,
    Resource,
    Variables,
    Documentation,
    Metadata,
    SuiteSetup,
    SuiteTeardown,
    TestSetup,
    TestTeardown,
    TestTemplate,
    TestTimeout,
    Setup,
    Teardown,
    Template,
    Timeout,
    Tags,
    ForceTags,
    DefaultTags,
    Arguments,
    Return,
    // Name slots.
    Name,
    KeywordName,
    TestCaseName,
    // Statement payload.
    Keyword,
    Argument,
    Variable,
    Assign,
    Option,
    // Control words.
    For,
    If,
    ElseIf,
    Else,
    While,
    Break,
    Continue,
    End,
    WithName,
    // Layout.
    Separator,
    Eol,
    Continuation,
    Comment,
    // Parser-reported problems carried in the token stream.
    Error,
    FatalError,
}

impl TokenKind {
    pub fn is_header(self) -> bool {
        matches!(
            self,
            TokenKind::SettingHeader
                | TokenKind::VariableHeader
                | TokenKind::TestCaseHeader
                | TokenKind::KeywordHeader
                | TokenKind::CommentHeader
        )
    }

    pub fn is_setting(self) -> bool {
        matches!(
            self,
            TokenKind::Library
                | TokenKind::Resource
                | TokenKind::Variables
                | TokenKind::Documentation
                | TokenKind::Metadata
                | TokenKind::SuiteSetup
                | TokenKind::SuiteTeardown
                | TokenKind::TestSetup
                | TokenKind::TestTeardown
                | TokenKind::TestTemplate
                | TokenKind::TestTimeout
                | TokenKind::Setup
                | TokenKind::Teardown
                | TokenKind::Template
                | TokenKind::Timeout
                | TokenKind::Tags
                | TokenKind::ForceTags
                | TokenKind::DefaultTags
                | TokenKind::Arguments
                | TokenKind::Return
        )
    }

    pub fn is_control(self) -> bool {
        matches!(
            self,
            TokenKind::For
                | TokenKind::If
                | TokenKind::ElseIf
                | TokenKind::Else
                | TokenKind::While
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::End
                | TokenKind::WithName
        )
    }

    pub fn is_error(self) -> bool {
        matches!(self, TokenKind::Error | TokenKind::FatalError)
    }
}

/// One lexical unit. Lines are 1-based, columns 0-based; the end column is
/// derived from the value width. Columns count Unicode scalar values.
///
/// Tokens are immutable: the `with_*` constructors derive copies with a
/// field replaced, since the original may be shared by other views of the
/// tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub line: u32,
    pub col: u32,
    pub error: Option<String>,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, line: u32, col: u32) -> Token {
        Token {
            kind,
            value: value.into(),
            line,
            col,
            error: None,
        }
    }

    /// A detached NAME token, for callers that need to tokenize a bare string.
    pub fn name(value: impl Into<String>) -> Token {
        Token::new(TokenKind::Name, value, 1, 0)
    }

    pub fn width(&self) -> u32 {
        self.value.chars().count() as u32
    }

    /// 0-based exclusive end column.
    pub fn end_col(&self) -> u32 {
        self.col + self.width()
    }

    pub fn with_kind(&self, kind: TokenKind) -> Token {
        Token { kind, ..self.clone() }
    }

    pub fn with_value(&self, value: impl Into<String>) -> Token {
        Token {
            value: value.into(),
            ..self.clone()
        }
    }

    pub fn with_value_at(&self, value: impl Into<String>, col: u32) -> Token {
        Token {
            value: value.into(),
            col,
            ..self.clone()
        }
    }

    pub fn with_error(&self, error: impl Into<String>) -> Token {
        Token {
            error: Some(error.into()),
            ..self.clone()
        }
    }

    /// Copy of this token covering `[start, end)` in character offsets, with
    /// the column advanced accordingly.
    pub fn slice(&self, start: usize, end: usize, kind: TokenKind) -> Token {
        let value: String = self
            .value
            .chars()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect();
        Token {
            kind,
            value,
            line: self.line,
            col: self.col + start as u32,
            error: self.error.clone(),
        }
    }

    /// Splits the value into literal and `{`-delimited variable parts.
    ///
    /// Literal parts keep this token's kind; variable parts (prefix and
    /// braces included) come back as [`TokenKind::Variable`]. A token with no
    /// variable syntax yields itself unchanged. Braces nest: `${out${in}}` is
    /// one variable. An unterminated variable is an error; callers decide
    /// whether to recover heuristically or skip the token.
    pub fn tokenize_variables(&self) -> Result<Vec<Token>, VariableSyntaxError> {
        let chars: Vec<char> = self.value.chars().collect();
        let mut parts = Vec::new();
        let mut literal_start = 0usize;
        let mut i = 0usize;
        while i < chars.len() {
            if VARIABLE_PREFIXES.contains(&chars[i]) && chars.get(i + 1) == Some(&'{') {
                let mut depth = 1usize;
                let mut j = i + 2;
                while j < chars.len() {
                    match chars[j] {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    j += 1;
                }
                if depth > 0 {
                    return Err(VariableSyntaxError {
                        message: format!(
                            "variable '{}' was not closed properly",
                            chars[i..].iter().collect::<String>()
                        ),
                        line: self.line,
                        col: self.col + i as u32,
                    });
                }
                if literal_start < i {
                    parts.push(self.slice(literal_start, i, self.kind));
                }
                parts.push(self.slice(i, j + 1, TokenKind::Variable));
                i = j + 1;
                literal_start = i;
            } else {
                i += 1;
            }
        }
        if parts.is_empty() {
            return Ok(vec![self.clone()]);
        }
        if literal_start < chars.len() {
            parts.push(self.slice(literal_start, chars.len(), self.kind));
        }
        Ok(parts)
    }
}

/// Malformed `{`-delimited variable syntax inside a single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSyntaxError {
    pub message: String,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for VariableSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}:{}", self.message, self.line, self.col)
    }
}

impl std::error::Error for VariableSyntaxError {}
