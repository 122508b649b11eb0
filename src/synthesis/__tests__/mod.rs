use super::implicit_name;
use crate::grammar::GrammarParser;
use crate::{Code, GrammarError, Lex, TagAction, Tokenizer, TokenizerHost};

fn compile_error(code: &str) -> GrammarError {
    let grammar = GrammarParser::new(code).parse().unwrap();
    match Tokenizer::new(&grammar) {
        Ok(_) => panic!("expected a grammar error for {:?}", code),
        Err(error) => error,
    }
}

fn kind_names(tokenizer: &Tokenizer, stream: &[Lex]) -> Vec<String> {
    stream
        .iter()
        .map(|lex| tokenizer.kind_name(lex.token).to_string())
        .collect()
}

#[test]
fn implicit_names() {
    assert_eq!(implicit_name(">"), "_3e");
    assert_eq!(implicit_name("{"), "_7b");
    assert_eq!(implicit_name("hello"), "_68_65_6c_6c_6f");
}

#[test]
fn implicit_tokens_are_single_characters() {
    let error = compile_error("greet: 'hello'");
    assert_eq!(
        error.message,
        "implicit token \"hello\" cannot be multiple characters"
    );

    let grammar = GrammarParser::new("greet: 'hello'").parse().unwrap();
    let tokenizer = Tokenizer::with_multichar_implicits(&grammar).unwrap();
    let code = Code::from("hello");
    let stream = tokenizer.tokenize(&code).unwrap();
    assert_eq!(kind_names(&tokenizer, &stream), vec!["_68_65_6c_6c_6f", "EOF"]);
}

#[test]
fn fragment_cycles() {
    let error = compile_error("_A: _B\n_B: _A\nX: _A");
    assert_eq!(error.message, "'_A' and '_B' cannot be defined recursively");

    let error = compile_error("_X: _X 'a'\nY: _X");
    assert_eq!(error.message, "'_X' cannot be defined recursively");

    let error = compile_error("_A: _B\n_B: _C\n_C: _A\nX: _A");
    assert_eq!(
        error.message,
        "'_A', '_B', and '_C' cannot be defined recursively"
    );
}

#[test]
fn undefined_fragment_reference() {
    let error = compile_error("X: _MISSING");
    assert_eq!(error.message, "fragment '_MISSING' is not defined");

    // Undefined names referenced from another fragment surface the same way.
    let error = compile_error("_A: _MISSING 'a'\nX: _A");
    assert_eq!(error.message, "fragment '_MISSING' is not defined");
}

#[test]
fn fragment_ordering_is_stable() {
    let code = "NUMBER: _INT _EXP?\n_EXP: ('e' | 'E') _INT\n_INT: _DIGIT+\n_DIGIT: '0'-'9'";
    let grammar = GrammarParser::new(code).parse().unwrap();
    let first = Tokenizer::new(&grammar).unwrap();
    let second = Tokenizer::new(&grammar).unwrap();
    let sources = |tokenizer: &Tokenizer| -> Vec<String> {
        tokenizer
            .patterns()
            .iter()
            .map(|pattern| pattern.regex_source().to_string())
            .collect()
    };
    assert_eq!(sources(&first), sources(&second));
    let code2 = Code::from("42e7");
    let stream = first.tokenize(&code2).unwrap();
    assert_eq!(kind_names(&first, &stream), vec!["NUMBER", "EOF"]);
}

#[test]
fn reserved_token_names() {
    let error = compile_error("EOF: 'x'");
    assert_eq!(error.message, "'EOF' is a reserved token name");

    let error = compile_error("EOF\nA: 'x'");
    assert_eq!(error.message, "'EOF' is a reserved token name");
}

#[test]
fn reserved_tag_names() {
    let error = compile_error("A: 'x' @EOF");
    assert_eq!(error.message, "'EOF' is an illegal tag name");

    let error = compile_error("A: 'x' @tokenize");
    assert_eq!(error.message, "'tokenize' is an illegal tag name");
}

#[test]
fn duplicate_token_names() {
    let error = compile_error("A: 'x'\nA: 'y'");
    assert_eq!(error.message, "'A' is declared more than once");

    let error = compile_error("A\nA: 'y'");
    assert_eq!(error.message, "'A' is declared more than once");
}

#[test]
fn kind_name_inventory() {
    let tokenizer =
        Tokenizer::compile("DECLARED\nexpr: NUM '+' NUM\nNUM: '0'-'9'+").unwrap();
    assert_eq!(
        tokenizer.kind_names(),
        &[
            "EOF".to_string(),
            "DECLARED".to_string(),
            "_2b".to_string(),
            "NUM".to_string(),
        ]
    );
    assert_eq!(tokenizer.kind_name(tokenizer.eof()), "EOF");
    assert_eq!(tokenizer.kind("NUM"), tokenizer.patterns().last().map(|p| p.id()));
}

#[test]
fn longest_match_wins() {
    let tokenizer = Tokenizer::compile("GT: '>'\nSHR: '>>'\nWS: ' '+ @ignore").unwrap();
    let code = Code::from(">>");
    let stream = tokenizer.tokenize(&code).unwrap();
    assert_eq!(kind_names(&tokenizer, &stream), vec!["SHR", "EOF"]);

    // Declaration order does not matter when one match is strictly longer.
    let tokenizer = Tokenizer::compile("SHR: '>>'\nGT: '>'\nWS: ' '+ @ignore").unwrap();
    let stream = tokenizer.tokenize(&code).unwrap();
    assert_eq!(kind_names(&tokenizer, &stream), vec!["SHR", "EOF"]);

    let code = Code::from(">> >");
    let stream = tokenizer.tokenize(&code).unwrap();
    assert_eq!(kind_names(&tokenizer, &stream), vec!["SHR", "GT", "EOF"]);
}

#[test]
fn ties_resolve_in_declaration_order() {
    let tokenizer = Tokenizer::compile("AAA: 'a'\nBBB: 'a'").unwrap();
    let code = Code::from("a");
    let stream = tokenizer.tokenize(&code).unwrap();
    assert_eq!(kind_names(&tokenizer, &stream), vec!["AAA", "EOF"]);
}

#[test]
fn empty_matches_never_win() {
    let tokenizer = Tokenizer::compile("A: 'x'?\nB: 'y'").unwrap();
    let code = Code::from("y");
    let stream = tokenizer.tokenize(&code).unwrap();
    assert_eq!(kind_names(&tokenizer, &stream), vec!["B", "EOF"]);

    let code = Code::from("z");
    let error = tokenizer.tokenize(&code).unwrap_err();
    assert_eq!(error.pointer, 0);
    assert!(error.message.contains("unknown char"));
}

struct FlagHost {
    flag: bool,
}

impl TokenizerHost for FlagHost {
    fn evaluate(&self, predicate: &str) -> bool {
        assert_eq!(predicate, "flag");
        self.flag
    }
}

#[test]
fn predicates_gate_patterns() {
    let tokenizer = Tokenizer::compile("A: {flag}? 'a'\nB: 'a'").unwrap();
    let code = Code::from("a");

    let stream = tokenizer
        .tokenize_with(&code, &FlagHost { flag: true })
        .unwrap();
    assert_eq!(kind_names(&tokenizer, &stream), vec!["A", "EOF"]);

    let stream = tokenizer
        .tokenize_with(&code, &FlagHost { flag: false })
        .unwrap();
    assert_eq!(kind_names(&tokenizer, &stream), vec!["B", "EOF"]);
}

struct SplitHost;

impl TokenizerHost for SplitHost {
    fn handle_tag(&self, tag: &str, token: Lex) -> TagAction {
        match tag {
            "split" => TagAction::Expand(vec![
                Lex::new(token.token, token.start, token.start + 1),
                Lex::new(token.token, token.start + 1, token.end),
            ]),
            "ignore" => TagAction::Discard,
            _ => TagAction::Keep(token),
        }
    }
}

#[test]
fn tag_hooks_shape_the_stream() {
    let tokenizer = Tokenizer::compile("PAIR: 'ab' @split\nWS: ' '+ @ignore").unwrap();
    let code = Code::from("ab ab");
    let stream = tokenizer.tokenize_with(&code, &SplitHost).unwrap();
    assert_eq!(
        kind_names(&tokenizer, &stream),
        vec!["PAIR", "PAIR", "PAIR", "PAIR", "EOF"]
    );
    assert_eq!(stream[0].text(&code), "a");
    assert_eq!(stream[1].text(&code), "b");
}

#[test]
fn token_positions() {
    let tokenizer = Tokenizer::compile("ID: 'a'-'z'+\nWS: (' ' | '\\n')+ @ignore").unwrap();
    let code = Code::from("abc\nde !");
    let error = tokenizer.tokenize(&code).unwrap_err();
    assert_eq!(error.pointer, 7);
    assert!(error.message.contains("line: 2"));
}

#[test]
fn pattern_description() {
    let tokenizer = Tokenizer::compile("NUM: '0'-'9'+ @number").unwrap();
    let pattern = &tokenizer.patterns()[0];
    assert_eq!(pattern.name(), "NUM");
    assert_eq!(pattern.regex_source(), "^([0-9])+");
    assert_eq!(pattern.tag(), Some("number"));
    assert_eq!(pattern.predicate(), None);
    assert!(tokenizer.build_grammar().unwrap().contains("NUM"));
}
