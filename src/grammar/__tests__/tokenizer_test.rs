use crate::grammar::{GrammarTokenizer, TokenKind};

fn kinds(code: &str) -> Vec<TokenKind> {
    let mut tokenizer = GrammarTokenizer::new(code);
    let mut out = Vec::new();
    loop {
        let token = tokenizer.next_token().unwrap();
        out.push(token.kind);
        if token.kind == TokenKind::Eof {
            break;
        }
    }
    out
}

#[test]
fn atom_coverage() {
    assert_eq!(
        kinds("A: ('a'-'z')+? . @t !d x = Y {code}"),
        vec![
            TokenKind::NewRule,
            TokenKind::Id,
            TokenKind::Colon,
            TokenKind::LParen,
            TokenKind::Str,
            TokenKind::Dash,
            TokenKind::Str,
            TokenKind::RParen,
            TokenKind::Plus,
            TokenKind::QMark,
            TokenKind::Dot,
            TokenKind::At,
            TokenKind::Id,
            TokenKind::Bam,
            TokenKind::Id,
            TokenKind::Id,
            TokenKind::Equals,
            TokenKind::Id,
            TokenKind::Code,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn token_texts() {
    let mut tokenizer = GrammarTokenizer::new("NAME: 'ab' \"cd\"");
    let mut texts = Vec::new();
    loop {
        let token = tokenizer.next_token().unwrap();
        if token.kind == TokenKind::Eof {
            break;
        }
        texts.push(token.text(tokenizer.code()).to_string());
    }
    assert_eq!(texts, vec!["", "NAME", ":", "'ab'", "\"cd\""]);
}

#[test]
fn definition_boundaries() {
    // A second definition at column zero gets its synthetic marker.
    assert_eq!(
        kinds("a: 'x'\nb: 'y'"),
        vec![
            TokenKind::NewRule,
            TokenKind::Id,
            TokenKind::Colon,
            TokenKind::Str,
            TokenKind::NewRule,
            TokenKind::Id,
            TokenKind::Colon,
            TokenKind::Str,
            TokenKind::Eof,
        ]
    );
    // An indented identifier continues the current definition.
    assert_eq!(
        kinds("a: 'x'\n  b 'y'"),
        vec![
            TokenKind::NewRule,
            TokenKind::Id,
            TokenKind::Colon,
            TokenKind::Str,
            TokenKind::Id,
            TokenKind::Str,
            TokenKind::Eof,
        ]
    );
    // Multi-line whitespace still separates definitions.
    assert_eq!(
        kinds("a\n  : 'x'\n\nb: 'y'"),
        vec![
            TokenKind::NewRule,
            TokenKind::Id,
            TokenKind::Colon,
            TokenKind::Str,
            TokenKind::NewRule,
            TokenKind::Id,
            TokenKind::Colon,
            TokenKind::Str,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn comments() {
    assert_eq!(
        kinds("# header comment\na: 'x' # trailing\nb: 'y'"),
        vec![
            TokenKind::NewRule,
            TokenKind::Id,
            TokenKind::Colon,
            TokenKind::Str,
            TokenKind::NewRule,
            TokenKind::Id,
            TokenKind::Colon,
            TokenKind::Str,
            TokenKind::Eof,
        ]
    );
    // A comment at the very end of the input terminates cleanly.
    assert_eq!(
        kinds("a: 'x' # the end"),
        vec![
            TokenKind::NewRule,
            TokenKind::Id,
            TokenKind::Colon,
            TokenKind::Str,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn code_blocks() {
    // Nested braces and quoted braces do not close the block.
    let mut tokenizer = GrammarTokenizer::new("a: {outer {inner} '}' \"}\"} 'x'");
    let mut code_text = String::new();
    loop {
        let token = tokenizer.next_token().unwrap();
        if token.kind == TokenKind::Code {
            code_text = token.text(tokenizer.code()).to_string();
        }
        if token.kind == TokenKind::Eof {
            break;
        }
    }
    assert_eq!(code_text, "{outer {inner} '}' \"}\"}");
}

#[test]
fn unclosed_string() {
    let mut tokenizer = GrammarTokenizer::new("A: 'abc");
    let error = loop {
        match tokenizer.next_token() {
            Ok(token) => assert_ne!(token.kind, TokenKind::Eof, "should fail before EOF"),
            Err(error) => break error,
        }
    };
    assert!(error.message.contains("unclosed string literal"));
}

#[test]
fn unclosed_code() {
    let mut tokenizer = GrammarTokenizer::new("A: {foo");
    let error = loop {
        match tokenizer.next_token() {
            Ok(token) => assert_ne!(token.kind, TokenKind::Eof, "should fail before EOF"),
            Err(error) => break error,
        }
    };
    assert!(error.message.contains("unclosed code snippet"));

    let mut tokenizer = GrammarTokenizer::new("A: {unterminated 'quote}");
    let error = loop {
        match tokenizer.next_token() {
            Ok(token) => assert_ne!(token.kind, TokenKind::Eof, "should fail before EOF"),
            Err(error) => break error,
        }
    };
    assert!(error.message.contains("unclosed code snippet"));
}

#[test]
fn unknown_char() {
    let mut tokenizer = GrammarTokenizer::new("a: ;");
    let error = loop {
        match tokenizer.next_token() {
            Ok(token) => assert_ne!(token.kind, TokenKind::Eof, "should fail before EOF"),
            Err(error) => break error,
        }
    };
    assert!(error.message.contains("unknown char"));
    let position = error.position(tokenizer.code()).unwrap();
    assert_eq!(position.line, 1);
    assert_eq!(position.column, 4);
}
