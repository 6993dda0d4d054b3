//! Specification front-end tests: parsing, dumping, resolution failures.

use std::path::PathBuf;

use lrmatch::pattern::{dump, parse_source, translate};
use lrmatch::testing;
use lrmatch::Error;

#[test]
fn test_unknown_symbol_reports_and_exits_one() {
    // Scenario: a spec naming FOO, which the grammar does not define.
    let grammar = testing::unit_chain_grammar();
    let spec = parse_source("rule r = | FOO { act }", &PathBuf::from("spec.lrm")).unwrap();
    let err = translate(&grammar, &spec).unwrap_err();
    assert_eq!(err.to_string(), "Unknown symbol FOO");
    assert_eq!(err.exit_code(), 1);
    assert!(matches!(err, Error::Resolution(_)));
}

#[test]
fn test_lexical_error_exits_three() {
    let err = parse_source("rule r = | % { act }", &PathBuf::from("spec.lrm")).unwrap_err();
    assert_eq!(err.exit_code(), 3);
    assert!(matches!(err, Error::Lexical(_)));
    let message = err.to_string();
    assert!(message.contains("spec.lrm:1:12"));
}

#[test]
fn test_parse_error_exits_three() {
    let err = parse_source("rule = | a { act }", &PathBuf::from("spec.lrm")).unwrap_err();
    assert_eq!(err.exit_code(), 3);
    assert!(matches!(err, Error::Parse(_)));
}

#[test]
fn test_dump_round_trips_structure() {
    let spec = parse_source(
        "{ header() }\n\
         startsymbols S\n\
         rule on_error fmt =\n\
         | a ; _ * { act1 }\n\
         | [S: . S] | ! partial { act2 }\n\
         | _ unreachable\n\
         { trailer() }",
        &PathBuf::from("spec.lrm"),
    )
    .unwrap();

    let text = dump(&spec);
    assert!(text.contains("header"));
    assert!(text.contains("startsymbols S"));
    assert!(text.contains("rule on_error fmt"));
    assert!(text.contains("clause 0 (code)"));
    assert!(text.contains("clause 1 (partial code)"));
    assert!(text.contains("clause 2 (unreachable)"));
    assert!(text.contains("seq"));
    assert!(text.contains("alt"));
    assert!(text.contains("star"));
    assert!(text.contains("[S: . S]"));
}

#[test]
fn test_empty_clause_list_rejected() {
    let err = parse_source("rule r = { code }", &PathBuf::from("spec.lrm")).unwrap_err();
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_code_blocks_keep_nested_braces() {
    let spec = parse_source(
        "rule r = | a { format!(\"{:?}\", vec![1, 2]) }",
        &PathBuf::from("spec.lrm"),
    )
    .unwrap();
    let lrmatch::pattern::Action::Code { block, .. } = &spec.rule.clauses[0].action else {
        panic!("expected a code action");
    };
    assert!(block.code.contains("format!"));
}

#[test]
fn test_capture_flows_to_clause_metadata() {
    let grammar = testing::binop_grammar();
    let spec = parse_source(
        "rule r = | lhs = E ; op = PLUS ; ! { report(lhs, op) }",
        &PathBuf::from("spec.lrm"),
    )
    .unwrap();
    let compiled = translate(&grammar, &spec).unwrap();
    assert_eq!(compiled.clauses[0].captures, vec!["lhs", "op"]);
}
