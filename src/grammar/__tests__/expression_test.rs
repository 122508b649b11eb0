use crate::grammar::{GrammarExpr, GrammarParser};
use std::collections::BTreeMap;

fn token_value(code: &str) -> GrammarExpr {
    let grammar = GrammarParser::new(code).parse().unwrap();
    grammar.token_definitions[0].value.clone()
}

fn fragment_value(code: &str) -> GrammarExpr {
    let grammar = GrammarParser::new(code).parse().unwrap();
    grammar.fragment_definitions[0].value.clone()
}

#[test]
fn literal_escaping() {
    let value = token_value("A: 'a.b*c'");
    assert_eq!(value.to_regex(&BTreeMap::new()).unwrap(), "a\\.b\\*c");

    let value = token_value(r"A: '[{\\}]|'");
    assert_eq!(
        value.to_regex(&BTreeMap::new()).unwrap(),
        "\\[\\{\\\\\\}\\]\\|"
    );
}

#[test]
fn decoded_escapes() {
    match token_value(r"A: '\n\t\\'") {
        GrammarExpr::Literal(literal) => assert_eq!(literal.value, "\n\t\\"),
        other => panic!("expected a literal, got {:?}", other),
    }
    match token_value(r"A: '\x41B\U00000043'") {
        GrammarExpr::Literal(literal) => assert_eq!(literal.value, "ABC"),
        other => panic!("expected a literal, got {:?}", other),
    }
    // An escaped quote stands for itself.
    match token_value(r#"A: "\"""#) {
        GrammarExpr::Literal(literal) => assert_eq!(literal.value, "\""),
        other => panic!("expected a literal, got {:?}", other),
    }
}

#[test]
fn malformed_escape() {
    let error = match GrammarParser::new(r"A: '\x4g'").parse() {
        Ok(grammar) => panic!("expected a grammar error, parsed {:?}", grammar),
        Err(error) => error,
    };
    assert!(error.message.contains("malformed hex escape"));
}

#[test]
fn composite_regex() {
    let value = token_value("A: ('a' | 'b') 'c'*");
    assert_eq!(
        value.to_regex(&BTreeMap::new()).unwrap(),
        "(((a)|(b))(c)*)"
    );

    let value = token_value("A: 'a'+? 'b'??");
    assert_eq!(value.to_regex(&BTreeMap::new()).unwrap(), "((a)+?(b)??)");
}

#[test]
fn range_regex() {
    assert_eq!(
        fragment_value("_F: 'a'-'z'").to_regex(&BTreeMap::new()).unwrap(),
        "[a-z]"
    );
    // Swapped bounds are reordered.
    assert_eq!(
        fragment_value("_F: 'z'-'a'").to_regex(&BTreeMap::new()).unwrap(),
        "[a-z]"
    );
    // Class metacharacters are escaped.
    assert_eq!(
        fragment_value("_F: ']'-'^'").to_regex(&BTreeMap::new()).unwrap(),
        "[\\]-\\^]"
    );
    assert_eq!(
        fragment_value("_F: '#'-'['").to_regex(&BTreeMap::new()).unwrap(),
        "[#-\\[]"
    );
}

#[test]
fn wildcard_regex() {
    assert_eq!(
        fragment_value("_F: . 'a'").to_regex(&BTreeMap::new()).unwrap(),
        "(.a)"
    );
}

#[test]
fn fragment_expansion() {
    let mut fragments = BTreeMap::new();
    fragments.insert("_DIGIT".to_string(), "[0-9]".to_string());
    let value = token_value("A: _DIGIT+");
    assert_eq!(value.to_regex(&fragments).unwrap(), "([0-9])+");
}

#[test]
fn undefined_fragment() {
    let value = token_value("A: _MISSING");
    let error = match value.to_regex(&BTreeMap::new()) {
        Ok(regex) => panic!("expected a grammar error, got {:?}", regex),
        Err(error) => error,
    };
    assert_eq!(error.message, "fragment '_MISSING' is not defined");
}

#[test]
fn identifier_queries() {
    let grammar = GrammarParser::new("item: key = WORD NUMBER? (other | WORD)")
        .parse()
        .unwrap();
    let value = &grammar.rule_definitions[0].alternatives[0].value;
    let identifiers: Vec<&str> = value.identifiers().into_iter().collect();
    assert_eq!(identifiers, vec!["NUMBER", "WORD", "other"]);
}

#[test]
fn literal_queries() {
    let grammar = GrammarParser::new("list: '[' item (',' item)* ']'")
        .parse()
        .unwrap();
    let value = &grammar.rule_definitions[0].alternatives[0].value;
    let literals: Vec<String> = value.literals().into_iter().collect();
    assert_eq!(literals, vec![",".to_string(), "[".to_string(), "]".to_string()]);
}

#[test]
fn tree_printing() {
    let value = token_value("A: ('a' | 'b')+");
    value.print().unwrap();
}
