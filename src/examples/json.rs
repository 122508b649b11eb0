//! A JSON grammar written in the meta-language.
//!
//! The tokens cover strings with full escape handling, numbers with fraction and
//! exponent parts and whitespace tagged `@ignore`; the structural punctuation appears
//! as implicit tokens collected from the rule bodies.

use crate::grammar::{Grammar, GrammarParser};
use crate::{GrammarError, Tokenizer};

pub const JSON_GRAMMAR: &str = r#"
json: value

value
  : STRING
  | NUMBER
  | object
  | array
  | 'true'
  | 'false'
  | 'null'

object: '{' pairs? '}'
pairs: pair (',' pair)*
pair: STRING ':' value

array: '[' values? ']'
values: value (',' value)*

STRING: '"' (_ESCAPE | _SAFECODEPOINT)* '"'
_SAFECODEPOINT: ' '-'!' | '#'-'[' | ']'-'\U0010FFFF'
_ESCAPE: '\\' (_ESC_CHAR | _UNICODE)
_ESC_CHAR: '\\' | '"' | 'b' | 'f' | 'n' | 'r' | 't'
_UNICODE: 'u' _HEX _HEX _HEX _HEX
_HEX: '0'-'9' | 'a'-'f' | 'A'-'F'

NUMBER: '-'? _INT ('.' '0'-'9'+)? _EXP?
_INT: '0' | '1'-'9' ('0'-'9')*
_EXP: ('E' | 'e') ('+' | '-')? _INT

WS: (' ' | '\t' | '\n' | '\r')+ @ignore
"#;

/// Parse the JSON grammar description.
pub fn json_grammar() -> Result<Grammar, GrammarError> {
    GrammarParser::new(JSON_GRAMMAR).parse()
}

/// Synthesize the JSON tokenizer.
///
/// The grammar spells the `true`, `false` and `null` keywords as rule-body literals,
/// so the multi-character implicit relaxation is required.
pub fn json_tokenizer() -> Result<Tokenizer, GrammarError> {
    Tokenizer::with_multichar_implicits(&json_grammar()?)
}
