//! Language lexer tool (lang_lt) is a library to compile a textual grammar description written
//! in an EBNF-like meta-language into a longest-match [Tokenizer].
//!
//! # Overview
//! A generated parser usually begins with a generated lexer.
//! Writing the lexer by hand couples the token inventory of a language to custom code,
//! and every token added to the grammar has to be mirrored manually in the lexer implementation.
//! This library takes the grammar description itself as the single source of truth:
//! the meta-language front end validates the description and lowers the token and fragment
//! definitions into an ordered set of compiled regular expression patterns,
//! from which a longest-match tokenizer is synthesized mechanically.
//!
//! # Design
//!
//! A grammar description consists of rule, token and fragment definitions,
//! distinguished by the spelling of the defined name
//! (`lowercase` for rules, `UPPERCASE` for tokens, `_UPPERCASE` for fragments).
//! The front end is organized as a pipeline.
//! A layout-sensitive [GrammarTokenizer](grammar::GrammarTokenizer) splits the description
//! into a flat token stream, marking the start of every definition with a synthetic token.
//! The [GrammarParser](grammar::GrammarParser) consumes one definition at a time and reduces
//! its body through a fixed sequence of rewrite passes into a
//! [GrammarExpr](grammar::GrammarExpr) tree, enforcing the constructs each definition kind
//! admits. The synthesis stage orders fragments by their reference graph, inlines them into
//! the token patterns, promotes string literals found in rule bodies to implicit tokens and
//! compiles every pattern into an anchored regular expression.
//!
//! The synthesized [Tokenizer] scans an input by matching every pattern at the current
//! position and consuming the longest match, resolving ties in favor of the pattern declared
//! first. Semantic tags written in the grammar (for example `@ignore`) are dispatched to a
//! host implementing [TokenizerHost], which may discard, replace or expand the token.
//!
//! # Example
//!
//! ```
//! use lang_lt::{grammar::GrammarParser, Code, Tokenizer};
//!
//! let grammar = GrammarParser::new(
//!     r"
//! sum: term ('+' term)*
//! term: NUMBER | IDENT
//!
//! NUMBER: '0'-'9'+
//! IDENT: _LETTER (_LETTER | '0'-'9')*
//! _LETTER: 'a'-'z' | 'A'-'Z'
//!
//! WS: (' ' | '\t' | '\n')+ @ignore
//! ",
//! )
//! .parse()
//! .unwrap();
//!
//! let tokenizer = Tokenizer::new(&grammar).unwrap();
//!
//! let code = Code::from("price + 25");
//! let stream = tokenizer.tokenize(&code).unwrap();
//!
//! let kinds: Vec<&str> = stream
//!     .iter()
//!     .map(|lex| tokenizer.kind_name(lex.token))
//!     .collect();
//! // The whitespace token is tagged `@ignore` and dropped by the default host;
//! // '+' appears as the implicit token synthesized from the literal in the rule body.
//! assert_eq!(kinds, ["IDENT", "_2b", "NUMBER", "EOF"]);
//! ```

//! # License
//! [lang_lt](crate) is provided under the MIT license.
mod error;
pub mod examples;
pub mod grammar;
mod host;
mod lex;
mod synthesis;
mod tokenization;
mod util;

use once_cell::unsync::OnceCell;
use regex::Regex;

pub use util::{Code, Log, Position};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// A wrapper to indicate the index of a token kind in the synthesized [Tokenizer].
///
/// The kind names are owned by the [Tokenizer]; a [TokenId] can be resolved back to
/// its name with [Tokenizer::kind_name]. The id `0` is always the `EOF` kind.
pub struct TokenId(pub(crate) usize);

#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq)]
/// Element of the tokenized data produced by a synthesized [Tokenizer].
pub struct Lex {
    pub token: TokenId,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug)]
/// An error raised while tokenizing, parsing or lowering a grammar description.
///
/// The error is fatal to the grammar compilation; the optional pointer locates the
/// offending part of the grammar description.
pub struct GrammarError {
    pub pointer: Option<usize>,
    pub message: String,
}

#[derive(Debug)]
/// An error returned by a synthesized [Tokenizer] when the input matches none of its patterns.
pub struct TokenError {
    pub pointer: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
/// The outcome of a tag hook dispatched through [TokenizerHost::handle_tag].
pub enum TagAction {
    /// Drop the token from the stream.
    Discard,
    /// Emit a single token in place of the matched one.
    Keep(Lex),
    /// Emit a sequence of tokens in place of the matched one.
    Expand(Vec<Lex>),
}

/// The host side of a synthesized [Tokenizer].
///
/// Predicates and tags written in a grammar description are opaque to this crate;
/// they are carried through synthesis as strings and handed to the host at scan time.
pub trait TokenizerHost {
    /// Evaluate a predicate source snippet guarding a token pattern.
    fn evaluate(&self, _predicate: &str) -> bool {
        true
    }

    /// Handle a tagged token and decide what enters the token stream.
    fn handle_tag(&self, _tag: &str, token: Lex) -> TagAction {
        TagAction::Keep(token)
    }
}

/// A minimal [TokenizerHost]: every predicate holds, and the `ignore` tag discards its token.
pub struct BaseHost;

/// One entry of a synthesized [Tokenizer]: a token kind together with its compiled
/// pattern and the optional tag and predicate hooks recorded from the grammar.
pub struct TokenPattern {
    name: String,
    id: TokenId,
    regexp: Regex,
    tag: Option<String>,
    predicate: Option<String>,
}

/// A tokenizer synthesized from a parsed [Grammar](grammar::Grammar).
///
/// The tokenizer owns an ordered list of [TokenPattern]s; implicit tokens collected from
/// rule bodies come first, followed by the explicit token definitions in source order.
/// Scanning is longest-match: every pattern is tried at the current position and the
/// longest match wins, with ties resolved in declaration order.
pub struct Tokenizer {
    patterns: Vec<TokenPattern>,
    kind_names: Vec<String>,
    debug: OnceCell<Log<&'static str>>,
}
