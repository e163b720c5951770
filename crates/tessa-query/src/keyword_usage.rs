use std::sync::Arc;

use tessa_syntax::{Node, Token, TokenKind};

use crate::error::QueryError;
use crate::index::{AstIndex, CacheKey};
use crate::located::KeywordUsageInfo;

/// Natural-language lead-ins that may prefix a keyword name without a
/// separating token. Matched case-insensitively, trailing space included.
pub const BDD_PREFIXES: [&str; 5] = ["given ", "when ", "then ", "and ", "but "];

/// Node kinds whose NAME slot is itself a keyword reference (fixtures and
/// templates), as opposed to `KeywordCall` whose KEYWORD slot is.
pub const KEYWORD_NAME_IN_NAME_SLOT_TAGS: [&str; 8] = [
    "Setup",
    "Teardown",
    "SuiteSetup",
    "SuiteTeardown",
    "TestSetup",
    "TestTeardown",
    "TestTemplate",
    "Template",
];

pub fn has_keyword_name_in_name_slot(tag: &str) -> bool {
    KEYWORD_NAME_IN_NAME_SLOT_TAGS.contains(&tag)
}

/// Lowercase with spaces and underscores removed; the form builtin keyword
/// names are matched in.
pub fn normalize_keyword_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != ' ' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// 1-based argument position holding the keyword name for builtins that take
/// another keyword as an argument. Fixed rule table; not extensible at
/// runtime.
fn keyword_arg_index(normalized: &str) -> Option<usize> {
    Some(match normalized {
        "runkeyword"
        | "runkeywordandcontinueonfailure"
        | "runkeywordandignoreerror"
        | "runkeywordandreturn"
        | "runkeywordandreturnstatus"
        | "runkeywordifalltestspassed"
        | "runkeywordifanytestsfailed"
        | "runkeywordiftestfailed"
        | "runkeywordiftestpassed"
        | "runkeywordiftimeoutoccurred"
        | "runkeywords" => 1,
        "runkeywordandexpecterror"
        | "runkeywordandreturnif"
        | "runkeywordif"
        | "runkeywordunless"
        | "repeatkeyword" => 2,
        "waituntilkeywordsucceeds" => 3,
        _ => return None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchKind {
    ElseIf,
    Else,
}

/// Stateful decider for "is the current ARGUMENT token a keyword name".
///
/// Feed it every ARGUMENT token of one call-like node, in order. For most
/// builtins a single fixed position matches. `Run Keyword If` additionally
/// encodes an if/elseif/else chain in its arguments: a new branch begins at
/// the literal `ELSE IF`/`ELSE` markers, and the branch's keyword name is the
/// second token after `ELSE IF` (condition first) or the first after `ELSE`.
pub struct ArgKeywordNames {
    keyword_at_index: usize,
    current_arg: usize,
    multi_branch: bool,
    branch_len: Option<usize>,
    branch_kind: Option<BranchKind>,
    started_match: bool,
}

impl ArgKeywordNames {
    /// Handler for a call-like node, if its keyword is one of the builtins
    /// that reference other keywords in their argument list.
    pub fn for_node(node: &Node) -> Option<ArgKeywordNames> {
        if !node.is("KeywordCall") {
            return None;
        }
        let name = node.value_of_kind(TokenKind::Keyword)?;
        let normalized = normalize_keyword_name(name);
        let keyword_at_index = keyword_arg_index(&normalized)?;
        Some(ArgKeywordNames {
            keyword_at_index,
            current_arg: 0,
            multi_branch: normalized == "runkeywordif",
            branch_len: None,
            branch_kind: None,
            started_match: false,
        })
    }

    /// True when this token marked the start of a new ELSE/ELSE IF branch.
    pub fn started_match(&self) -> bool {
        self.started_match
    }

    /// Decides whether `token` (the next ARGUMENT of the node) denotes a
    /// keyword name.
    pub fn consider_token(&mut self, token: &Token) -> bool {
        debug_assert_eq!(token.kind, TokenKind::Argument);
        self.current_arg += 1;

        if self.multi_branch {
            match token.value.as_str() {
                "ELSE IF" => {
                    self.started_match = true;
                    self.branch_len = Some(0);
                    self.branch_kind = Some(BranchKind::ElseIf);
                }
                "ELSE" => {
                    self.started_match = true;
                    self.branch_len = Some(0);
                    self.branch_kind = Some(BranchKind::Else);
                }
                _ => {
                    self.started_match = false;
                    if let Some(len) = self.branch_len.as_mut() {
                        *len += 1;
                    }
                }
            }
            if let Some(len) = self.branch_len {
                return match self.branch_kind {
                    Some(BranchKind::ElseIf) => len == 2,
                    Some(BranchKind::Else) => len == 1,
                    None => false,
                };
            }
        }

        self.current_arg == self.keyword_at_index
    }
}

const KEYWORD_USAGE_TAGS: [&str; 9] = [
    "KeywordCall",
    "Setup",
    "Teardown",
    "SuiteSetup",
    "SuiteTeardown",
    "TestSetup",
    "TestTeardown",
    "TestTemplate",
    "Template",
];

/// Every place a keyword name is referenced, in tree encounter order.
/// With `include_argument_usages` the argument lists of keyword-taking
/// builtins contribute usages too. The enumeration is expensive and cached
/// on the index; repeat calls replay the stored result.
pub fn iter_keyword_usages(
    index: &AstIndex,
    include_argument_usages: bool,
) -> Result<Arc<Vec<KeywordUsageInfo>>, QueryError> {
    index.iter_cached(
        CacheKey::KeywordUsages {
            include_argument_usages,
        },
        |index| collect_keyword_usages(index, include_argument_usages),
    )
}

fn collect_keyword_usages(
    index: &AstIndex,
    include_argument_usages: bool,
) -> Result<Vec<KeywordUsageInfo>, QueryError> {
    let mut out = Vec::new();
    for tag in KEYWORD_USAGE_TAGS {
        for info in index.iter_indexed(tag)? {
            index.monitor().check_cancelled()?;
            let Some(usage) = keyword_usage_for_node(&info.stack, &info.node) else {
                continue;
            };
            // The handler reads the BDD-stripped view so a prefixed builtin
            // name still matches; argument scanning walks the real node.
            let handler_view = Arc::clone(&usage.node);
            out.push(usage);
            if include_argument_usages {
                if let Some(mut handler) = ArgKeywordNames::for_node(&handler_view) {
                    collect_usages_from_args(&info.stack, &info.node, &mut handler, None, &mut out);
                }
            }
        }
    }
    Ok(out)
}

/// Usage info for a call-like node itself (not its arguments), with the BDD
/// prefix stripped off the name. A name of `None` disables the slot and
/// yields nothing.
fn keyword_usage_for_node(stack: &[Arc<Node>], node: &Arc<Node>) -> Option<KeywordUsageInfo> {
    let name_kind = if node.is("KeywordCall") {
        TokenKind::Keyword
    } else if has_keyword_name_in_name_slot(&node.tag) {
        TokenKind::Name
    } else {
        return None;
    };

    let (node, token) = strip_bdd_prefix_from_node(node, name_kind)?;
    if token.value.eq_ignore_ascii_case("none") {
        return None;
    }
    let name = token.value.clone();
    Some(KeywordUsageInfo {
        stack: stack.to_vec(),
        node,
        token,
        name,
        from_argument: false,
    })
}

/// Argument-derived usages of one node. With `only_for` set, only the usage
/// whose name token sits at that token's position is produced (position is
/// compared, not identity, since tokens may be derived copies).
fn collect_usages_from_args(
    stack: &[Arc<Node>],
    node: &Arc<Node>,
    handler: &mut ArgKeywordNames,
    only_for: Option<&Token>,
    out: &mut Vec<KeywordUsageInfo>,
) {
    let mut current: Vec<Token> = Vec::new();
    let mut found_at: Option<usize> = None;

    for token in &node.tokens {
        if token.kind != TokenKind::Argument {
            continue;
        }
        current.push(token.clone());
        if handler.consider_token(token) {
            found_at = Some(current.len() - 1);
        } else if handler.started_match() {
            // The ELSE/ELSE IF marker closes the previous branch; it is not
            // part of either branch's argument list.
            current.pop();
            if let Some(found) = found_at {
                if let Some(usage) = build_arg_usage(stack, node, only_for, &current, found) {
                    out.push(usage);
                }
            }
            current.clear();
            found_at = None;
        }
    }
    if let Some(found) = found_at {
        if found < current.len() {
            if let Some(usage) = build_arg_usage(stack, node, only_for, &current, found) {
                out.push(usage);
            }
        }
    }
}

fn build_arg_usage(
    stack: &[Arc<Node>],
    node: &Node,
    only_for: Option<&Token>,
    current: &[Token],
    found_at: usize,
) -> Option<KeywordUsageInfo> {
    let candidate = current.get(found_at)?;
    if let Some(only) = only_for {
        if only.line != candidate.line || only.col != candidate.col {
            return None;
        }
    }
    let keyword_token = candidate.with_kind(TokenKind::Keyword);
    let mut tokens = vec![keyword_token.clone()];
    tokens.extend(current[found_at + 1..].iter().cloned());
    let name = keyword_token.value.clone();
    Some(KeywordUsageInfo {
        stack: stack.to_vec(),
        node: Arc::new(node.with_tokens(tokens)),
        token: keyword_token,
        name,
        from_argument: true,
    })
}

/// Usage info for the place `token` occupies. An ARGUMENT token that denotes
/// a keyword (per the node's handler) gets its own argument-derived usage;
/// any other token of a call-like node resolves to the node's usage as a
/// whole.
pub fn keyword_usage_for_token(
    stack: &[Arc<Node>],
    node: &Arc<Node>,
    token: &Token,
) -> Option<KeywordUsageInfo> {
    if token.kind == TokenKind::Argument {
        if let Some(mut handler) = ArgKeywordNames::for_node(node) {
            let mut usages = Vec::new();
            collect_usages_from_args(stack, node, &mut handler, Some(token), &mut usages);
            if let Some(usage) = usages.into_iter().next() {
                return Some(usage);
            }
        }
    }
    keyword_usage_for_node(stack, node)
}

/// The keyword name carried by `token`, if it is one: the KEYWORD of a call,
/// the NAME of a fixture/template, or an ARGUMENT in a keyword-name position.
/// BDD prefixes are stripped from the returned token.
pub fn keyword_name_token(node: &Arc<Node>, token: &Token) -> Option<Token> {
    if token.kind == TokenKind::Keyword
        || (token.kind == TokenKind::Name && has_keyword_name_in_name_slot(&node.tag))
    {
        return Some(strip_bdd_prefix(token));
    }

    if token.kind == TokenKind::Argument && !token.value.trim().ends_with('}') {
        if let Some(mut handler) = ArgKeywordNames::for_node(node) {
            let mut usages = Vec::new();
            collect_usages_from_args(&[], node, &mut handler, Some(token), &mut usages);
            if !usages.is_empty() {
                return Some(token.clone());
            }
        }
    }
    None
}

/// Copy of `token` with a leading BDD prefix sliced off and the column
/// advanced past it; the token comes back unchanged when no prefix matches.
pub fn strip_bdd_prefix(token: &Token) -> Token {
    for prefix in BDD_PREFIXES {
        if token.value.len() > prefix.len()
            && token.value.is_char_boundary(prefix.len())
            && token.value[..prefix.len()].eq_ignore_ascii_case(prefix)
        {
            let remainder = token.value[prefix.len()..].to_string();
            return token.with_value_at(remainder, token.col + prefix.len() as u32);
        }
    }
    token.clone()
}

/// Strips the BDD prefix from the node's name token of `kind`. When the
/// prefix was present, a derived node with the replacement token is returned
/// so downstream consumers see consistent text and positions; the original
/// node is never touched.
fn strip_bdd_prefix_from_node(node: &Arc<Node>, kind: TokenKind) -> Option<(Arc<Node>, Token)> {
    let original = node.token_of_kind(kind)?;
    let stripped = strip_bdd_prefix(original);
    if stripped == *original {
        return Some((Arc::clone(node), stripped));
    }
    let mut tokens = node.tokens.clone();
    if let Some(slot) = tokens.iter_mut().find(|t| t.kind == kind) {
        *slot = stripped.clone();
    }
    Some((Arc::new(node.with_tokens(tokens)), stripped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{fixture, keyword_call, test_case, tok};
    use crate::index::AstIndex;

    #[test]
    fn normalization_drops_case_spaces_and_underscores() {
        assert_eq!(normalize_keyword_name("Run Keyword If"), "runkeywordif");
        assert_eq!(normalize_keyword_name("run_keyword"), "runkeyword");
        assert_eq!(normalize_keyword_name("Wait Until Keyword Succeeds"), "waituntilkeywordsucceeds");
    }

    #[test]
    fn bdd_prefix_stripping_advances_the_column_and_keeps_the_original() {
        let token = tok(TokenKind::Keyword, "Given I do X", 2, 4);
        let stripped = strip_bdd_prefix(&token);
        assert_eq!(stripped.value, "I do X");
        assert_eq!(stripped.col, 10);
        assert_eq!(token.value, "Given I do X");
        assert_eq!(token.col, 4);

        let plain = tok(TokenKind::Keyword, "Do X", 2, 4);
        assert_eq!(strip_bdd_prefix(&plain), plain);
        // A prefix word without following text is not a prefix.
        let just_word = tok(TokenKind::Keyword, "Given", 2, 4);
        assert_eq!(strip_bdd_prefix(&just_word).value, "Given");
    }

    #[test]
    fn a_fixture_name_yields_exactly_one_usage_case_preserved() {
        let setup = fixture("Setup", "[Setup]", "Open Session", &["${url}"], 2);
        let test = test_case("T", 1, vec![setup]);
        let index = AstIndex::new(&test);
        let usages = iter_keyword_usages(&index, false).expect("usages");
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].name, "Open Session");
        assert!(!usages[0].from_argument);
        assert_eq!(usages[0].token.kind, TokenKind::Name);
    }

    #[test]
    fn a_fixture_disabled_with_none_yields_nothing() {
        let setup = fixture("Teardown", "[Teardown]", "NONE", &[], 2);
        let test = test_case("T", 1, vec![setup]);
        let index = AstIndex::new(&test);
        let usages = iter_keyword_usages(&index, true).expect("usages");
        assert!(usages.is_empty());
    }

    #[test]
    fn a_prefixed_call_is_reported_with_the_prefix_stripped() {
        let call = keyword_call("Given Do Thing", &[], 2);
        let test = test_case("T", 1, vec![call]);
        let index = AstIndex::new(&test);
        let usages = iter_keyword_usages(&index, false).expect("usages");
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].name, "Do Thing");
        // Position points at the name inside the original text.
        assert_eq!(usages[0].token.col, 4 + 6);
        // The tree's own node still carries the full text.
        let calls = index.iter_indexed("KeywordCall").expect("calls");
        assert_eq!(
            calls[0].node.value_of_kind(TokenKind::Keyword),
            Some("Given Do Thing")
        );
    }

    fn run_keyword_if_test() -> std::sync::Arc<tessa_syntax::Node> {
        let call = keyword_call(
            "Run Keyword If",
            &[
                "${cond}", "Kw One", "ELSE IF", "${other}", "Kw Two", "ELSE", "Kw Three",
            ],
            2,
        );
        test_case("T", 1, vec![call])
    }

    #[test]
    fn run_keyword_if_contributes_one_usage_per_branch() {
        let test = run_keyword_if_test();
        let index = AstIndex::new(&test);
        let usages = iter_keyword_usages(&index, true).expect("usages");
        let names: Vec<&str> = usages.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Run Keyword If", "Kw One", "Kw Two", "Kw Three"]);
        assert!(!usages[0].from_argument);
        assert!(usages[1..].iter().all(|u| u.from_argument));
        // Each branch usage sees a synthesized call whose first token is the
        // re-tagged keyword name.
        assert_eq!(usages[1].node.tokens[0].kind, TokenKind::Keyword);
        assert_eq!(usages[1].node.tokens[0].value, "Kw One");
    }

    #[test]
    fn without_argument_collection_only_the_call_itself_is_reported() {
        let test = run_keyword_if_test();
        let index = AstIndex::new(&test);
        let usages = iter_keyword_usages(&index, false).expect("usages");
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].name, "Run Keyword If");
    }

    #[test]
    fn usage_lookup_for_a_branch_token_finds_that_branch() {
        let test = run_keyword_if_test();
        let call = test.children[0].clone();
        let kw_two = call
            .tokens
            .iter()
            .find(|t| t.value == "Kw Two")
            .expect("token")
            .clone();
        let usage = keyword_usage_for_token(&[], &call, &kw_two).expect("usage");
        assert_eq!(usage.name, "Kw Two");
        assert!(usage.from_argument);

        // A non-keyword argument resolves to the enclosing call's usage.
        let cond = call
            .tokens
            .iter()
            .find(|t| t.value == "${cond}")
            .expect("token")
            .clone();
        let usage = keyword_usage_for_token(&[], &call, &cond).expect("usage");
        assert_eq!(usage.name, "Run Keyword If");
        assert!(!usage.from_argument);
    }

    #[test]
    fn keyword_name_probe_matches_calls_fixtures_and_keyword_arguments() {
        let test = run_keyword_if_test();
        let call = test.children[0].clone();

        let name = call.token_of_kind(TokenKind::Keyword).expect("keyword");
        assert_eq!(
            keyword_name_token(&call, name).expect("name").value,
            "Run Keyword If"
        );

        let kw_one = call.tokens.iter().find(|t| t.value == "Kw One").expect("token");
        assert_eq!(keyword_name_token(&call, kw_one).expect("name").value, "Kw One");

        let cond = call.tokens.iter().find(|t| t.value == "${cond}").expect("token");
        assert!(keyword_name_token(&call, cond).is_none());
    }

    #[test]
    fn usage_enumeration_is_cached_per_flag() {
        let test = run_keyword_if_test();
        let index = AstIndex::new(&test);
        let first = iter_keyword_usages(&index, true).expect("first");
        let second = iter_keyword_usages(&index, true).expect("second");
        assert!(std::sync::Arc::ptr_eq(&first, &second));
        let without_args = iter_keyword_usages(&index, false).expect("other key");
        assert_eq!(without_args.len(), 1);
    }
}
