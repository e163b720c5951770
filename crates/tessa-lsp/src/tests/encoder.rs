use std::sync::Arc;

use tessa_query::{CancelFlag, NullMonitor, QueryError};
use tessa_syntax::{Node, Token, TokenKind};

use crate::imports::{ImportGraph, LibraryDependency, NoImports, ResolvedImports};
use crate::semantic_tokens::{decode_semantic_tokens, semantic_tokens_full};

use super::fixtures::{body, keyword_call, quintuples, statement, suite, type_index};

fn encode(ast: &Arc<Node>, imports: &dyn ImportGraph) -> Vec<u32> {
    semantic_tokens_full(Some(ast), imports, &NullMonitor).expect("encode")
}

#[test]
fn a_missing_tree_encodes_to_nothing() {
    let data = semantic_tokens_full(None, &NoImports, &NullMonitor).expect("encode");
    assert!(data.is_empty());
}

#[test]
fn a_keyword_call_with_a_variable_argument_splits_into_quintuples() {
    let (_text, ast) = suite();
    let data = encode(&ast, &NoImports);
    assert_eq!(
        quintuples(&data),
        vec![
            (0, 0, 16, type_index("header"), 0),
            (1, 0, 7, type_index("setting"), 0),
            (0, 11, 8, type_index("name"), 0),
            (2, 0, 18, type_index("header"), 0),
            (1, 0, 7, type_index("testCaseName"), 0),
            (1, 4, 3, type_index("keywordNameCall"), 0),
            (0, 7, 2, type_index("variableOperator"), 0),
            (0, 2, 1, type_index("variable"), 0),
            (0, 1, 1, type_index("variableOperator"), 0),
        ]
    );
}

#[test]
fn decoding_reslices_the_exact_source_fragments() {
    let (text, ast) = suite();
    let data = encode(&ast, &NoImports);
    let decoded = decode_semantic_tokens(&data, &text);
    let expected: Vec<(String, &str)> = vec![
        ("*** Settings ***".into(), "header"),
        ("Library".into(), "setting"),
        ("MyLib.py".into(), "name"),
        ("*** Test Cases ***".into(), "header"),
        ("Example".into(), "testCaseName"),
        ("Log".into(), "keywordNameCall"),
        ("${".into(), "variableOperator"),
        ("x".into(), "variable"),
        ("}".into(), "variableOperator"),
    ];
    assert_eq!(decoded, expected);
}

#[test]
fn bdd_prefix_and_import_qualifier_split_off_the_keyword_name() {
    let imports = ResolvedImports {
        libraries: vec![LibraryDependency {
            name: "MyLib.py".to_string(),
            alias: None,
        }],
        resources: Vec::new(),
    };
    let ast = body(vec![keyword_call("Given MyLib.Do Thing", &[], 1)]);
    let data = encode(&ast, &imports);
    assert_eq!(
        quintuples(&data),
        vec![
            (0, 4, 6, type_index("control"), 0),
            (0, 6, 5, type_index("name"), 0),
            (0, 5, 9, type_index("keywordNameCall"), 0),
        ]
    );
}

#[test]
fn an_unknown_qualifier_stays_part_of_the_keyword() {
    let ast = body(vec![keyword_call("Other.Do Thing", &[], 1)]);
    let data = encode(&ast, &NoImports);
    assert_eq!(
        quintuples(&data),
        vec![(0, 4, 14, type_index("keywordNameCall"), 0)]
    );
}

#[test]
fn named_parameters_split_unless_the_keyword_concatenates() {
    let ast = body(vec![keyword_call("Create Session", &["alias=s1"], 1)]);
    let data = encode(&ast, &NoImports);
    assert_eq!(
        quintuples(&data),
        vec![
            (0, 4, 14, type_index("keywordNameCall"), 0),
            (0, 18, 5, type_index("parameterName"), 0),
            (0, 5, 1, type_index("variableOperator"), 0),
            (0, 1, 2, type_index("argumentValue"), 0),
        ]
    );

    let ast = body(vec![keyword_call("Catenate", &["a=b"], 1)]);
    let data = encode(&ast, &NoImports);
    assert_eq!(
        quintuples(&data),
        vec![
            (0, 4, 8, type_index("keywordNameCall"), 0),
            (0, 12, 3, type_index("argumentValue"), 0),
        ]
    );
}

#[test]
fn arguments_in_keyword_positions_are_promoted_to_calls() {
    let ast = body(vec![keyword_call("Run Keyword", &["Some Kw", "more"], 1)]);
    let data = encode(&ast, &NoImports);
    assert_eq!(
        quintuples(&data),
        vec![
            (0, 4, 11, type_index("keywordNameCall"), 0),
            (0, 15, 7, type_index("keywordNameCall"), 0),
            (0, 11, 4, type_index("argumentValue"), 0),
        ]
    );
}

#[test]
fn else_branches_of_run_keyword_if_are_promoted_too() {
    let ast = body(vec![keyword_call(
        "Run Keyword If",
        &["${c}", "Kw One", "ELSE", "Kw Two"],
        1,
    )]);
    let data = encode(&ast, &NoImports);
    let types: Vec<u32> = quintuples(&data).iter().map(|q| q.3).collect();
    // Call name, `${`/`c`/`}` triple, both branch keywords promoted; the
    // ELSE marker argument stays a plain argument.
    assert_eq!(
        types,
        vec![
            type_index("keywordNameCall"),
            type_index("variableOperator"),
            type_index("variable"),
            type_index("variableOperator"),
            type_index("keywordNameCall"),
            type_index("argumentValue"),
            type_index("keywordNameCall"),
        ]
    );
}

#[test]
fn documentation_text_keeps_its_variables_but_not_parameter_splits() {
    let doc = Arc::new(Node::leaf(
        "Documentation",
        statement(
            2,
            4,
            &[
                (TokenKind::Documentation, "[Documentation]"),
                (TokenKind::Separator, "    "),
                (TokenKind::Argument, "Docs ${v} x=y"),
            ],
        ),
    ));
    let ast = body(vec![doc]);
    let data = encode(&ast, &NoImports);
    assert_eq!(
        quintuples(&data),
        vec![
            (1, 4, 1, type_index("variableOperator"), 0),
            (0, 1, 13, type_index("setting"), 0),
            (0, 13, 1, type_index("variableOperator"), 0),
            (0, 5, 5, type_index("documentation"), 0),
            (0, 5, 2, type_index("variableOperator"), 0),
            (0, 2, 1, type_index("variable"), 0),
            (0, 1, 1, type_index("variableOperator"), 0),
            (0, 1, 4, type_index("documentation"), 0),
        ]
    );
}

#[test]
fn a_malformed_variable_is_emitted_as_one_argument() {
    let ast = body(vec![keyword_call("Log", &["${broken"], 1)]);
    let data = encode(&ast, &NoImports);
    assert_eq!(
        quintuples(&data),
        vec![
            (0, 4, 3, type_index("keywordNameCall"), 0),
            (0, 7, 8, type_index("argumentValue"), 0),
        ]
    );
}

#[test]
fn option_tokens_split_on_their_equals_sign() {
    let with_equals = Arc::new(Node::leaf(
        "KeywordCall",
        statement(
            1,
            4,
            &[
                (TokenKind::Keyword, "Wait Until"),
                (TokenKind::Separator, "    "),
                (TokenKind::Option, "limit=10"),
            ],
        ),
    ));
    let without_equals = Arc::new(Node::leaf(
        "KeywordCall",
        statement(
            2,
            4,
            &[
                (TokenKind::Keyword, "Go"),
                (TokenKind::Separator, "    "),
                (TokenKind::Option, "fast"),
            ],
        ),
    ));
    let ast = body(vec![with_equals, without_equals]);
    let data = encode(&ast, &NoImports);
    assert_eq!(
        quintuples(&data),
        vec![
            (0, 4, 10, type_index("keywordNameCall"), 0),
            (0, 14, 5, type_index("parameterName"), 0),
            (0, 5, 1, type_index("variableOperator"), 0),
            (0, 1, 2, type_index("argumentValue"), 0),
            (1, 4, 2, type_index("keywordNameCall"), 0),
            (0, 6, 4, type_index("argumentValue"), 0),
        ]
    );
}

#[test]
fn fixture_names_highlight_as_keyword_calls() {
    let setup = Arc::new(Node::leaf(
        "Setup",
        statement(
            1,
            4,
            &[
                (TokenKind::Setup, "[Setup]"),
                (TokenKind::Separator, "    "),
                (TokenKind::Name, "Open Thing"),
            ],
        ),
    ));
    let ast = body(vec![setup]);
    let data = encode(&ast, &NoImports);
    assert_eq!(
        quintuples(&data),
        vec![
            (0, 4, 1, type_index("variableOperator"), 0),
            (0, 1, 5, type_index("setting"), 0),
            (0, 5, 1, type_index("variableOperator"), 0),
            (0, 5, 10, type_index("keywordNameCall"), 0),
        ]
    );
}

#[test]
fn tokens_without_positions_clamp_to_line_zero() {
    let call = Arc::new(Node::leaf(
        "KeywordCall",
        vec![Token::new(TokenKind::Keyword, "X", 0, 0)],
    ));
    let ast = body(vec![call]);
    let data = encode(&ast, &NoImports);
    assert_eq!(
        quintuples(&data),
        vec![(0, 0, 1, type_index("keywordNameCall"), 0)]
    );
}

#[test]
fn cancellation_aborts_the_walk() {
    let (_text, ast) = suite();
    let flag = CancelFlag::new();
    flag.cancel();
    assert_eq!(
        semantic_tokens_full(Some(&ast), &NoImports, &flag),
        Err(QueryError::Cancelled)
    );
}
