//! The meta-language front end: tokenizing and parsing of grammar descriptions.
//!
//! A grammar description is a sequence of definitions. Layout is significant only at
//! definition boundaries: a definition begins on a line whose first character is a letter
//! or `_` at column zero, so bodies may span lines without a terminator.
//! The spelling of the defined name selects the definition kind, and each kind admits a
//! different subset of the expression language:
//!
//! - a *rule* (`lowercase`) is a list of alternatives separated by `|`; an alternative may
//!   carry a leading `{code} ?` predicate and trailing `@tag`, `!directive` and `{code}`
//!   annotations, and may reference tokens, other rules and aliases (`name = Target`);
//! - a *token* (`UPPERCASE`) is a single expression over literals, ranges and fragment
//!   references, with an optional trailing `@tag` and leading `{code} ?` predicate;
//! - a *fragment* (`_UPPERCASE`) is a pure helper expression over literals, ranges,
//!   wildcards and other fragments, inlined into the tokens referencing it;
//! - a bare `UPPERCASE` name on its own line declares a token without a body.
//!
//! Expressions are concatenated by juxtaposition, alternated with `|`, grouped with
//! parentheses and quantified with postfix `?`, `*` and `+` (a trailing `?` selects the
//! non-greedy variant). `'…'` and `"…"` are character literals, `'a'-'z'` a character
//! range, `.` a wildcard and `# …` a comment running to the end of the line.
//!
//! [GrammarParser::parse] drives the [GrammarTokenizer] and reduces every definition body
//! through a fixed sequence of rewrite passes into [GrammarExpr] values, collecting the
//! definitions into a [Grammar] for the synthesis stage.

mod expression;
mod parser;
mod print;
mod token;
mod tokenizer;

#[cfg(test)]
mod __tests__;

use crate::util::{Code, Log};
use once_cell::unsync::OnceCell;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
/// The kind of a [GrammarToken] produced by the [GrammarTokenizer].
///
/// `NewRule` is synthetic: it carries no text of its own and marks the position where a
/// new definition begins.
pub enum TokenKind {
    Eof,
    Id,
    Code,
    Str,
    NewRule,
    Colon,
    LParen,
    RParen,
    Or,
    Star,
    Plus,
    QMark,
    Dot,
    At,
    Bam,
    Equals,
    Dash,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
/// A token of the grammar description, spanning `start..end` bytes of the source text.
pub struct GrammarToken {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
/// An identifier appearing in a grammar description.
///
/// The spelling classifies every identifier as a rule, token or fragment name.
pub struct Identifier {
    pub name: String,
    pub token: GrammarToken,
}

#[derive(Debug, Clone)]
/// A string literal with its decoded character sequence.
pub struct StringLiteral {
    pub value: String,
    pub token: GrammarToken,
}

#[derive(Debug, Clone)]
/// A `{…}` host-code snippet carried through parsing as an opaque payload.
pub struct InlineCode {
    pub text: String,
    pub token: GrammarToken,
}

#[derive(Debug, Clone)]
/// A `{code} ?` predicate guarding a token definition or a rule alternative.
pub struct Predicate {
    pub code: InlineCode,
    pub qmark: GrammarToken,
}

#[derive(Debug, Clone)]
/// A `@name` semantic tag.
pub struct Tag {
    pub name: Identifier,
    pub at: GrammarToken,
}

#[derive(Debug, Clone)]
/// A `!name` directive attached to a rule alternative, opaque to the front end.
pub struct Directive {
    pub name: Identifier,
    pub bam: GrammarToken,
}

#[derive(Debug, Clone)]
/// A `'a'-'z'` character range with single-character bounds.
pub struct Range {
    pub low: StringLiteral,
    pub high: StringLiteral,
    pub dash: GrammarToken,
}

#[derive(Debug, Clone)]
/// A grammar expression tree.
pub enum GrammarExpr {
    Identifier(Identifier),
    Literal(StringLiteral),
    Range(Range),
    /// The `.` wildcard.
    Any(GrammarToken),
    /// Alternation of two or more expressions.
    Union(Vec<GrammarExpr>),
    /// Juxtaposition of two or more expressions.
    Concat(Vec<GrammarExpr>),
    Optional(Box<GrammarExpr>),
    NongreedyOptional(Box<GrammarExpr>),
    Star(Box<GrammarExpr>),
    NongreedyStar(Box<GrammarExpr>),
    Plus(Box<GrammarExpr>),
    NongreedyPlus(Box<GrammarExpr>),
    /// A `alias = Target` local rename, usable in rule bodies only.
    Alias {
        alias: Identifier,
        target: Identifier,
    },
}

#[derive(Debug, Clone)]
/// One alternative of a rule definition.
pub struct Alternative {
    pub value: GrammarExpr,
    pub tag: Option<Tag>,
    pub directives: Vec<Directive>,
    pub code: Option<InlineCode>,
    pub predicate: Option<Predicate>,
}

#[derive(Debug, Clone)]
/// A rule definition: a lowercase name and its alternatives.
pub struct RuleDefinition {
    pub name: Identifier,
    pub alternatives: Vec<Alternative>,
    pub colon: GrammarToken,
}

#[derive(Debug, Clone)]
/// A token definition: an uppercase name, a single body expression and optional hooks.
pub struct TokenDefinition {
    pub name: Identifier,
    pub value: GrammarExpr,
    pub tag: Option<Tag>,
    pub predicate: Option<Predicate>,
    pub colon: GrammarToken,
}

#[derive(Debug, Clone)]
/// A fragment definition: a `_UPPERCASE` helper expression inlined into token patterns.
pub struct FragmentDefinition {
    pub name: Identifier,
    pub value: GrammarExpr,
    pub colon: GrammarToken,
}

#[derive(Debug, Clone)]
/// A parsed grammar description: the validated definitions plus the original source text.
pub struct Grammar {
    pub token_declarations: Vec<Identifier>,
    pub fragment_definitions: Vec<FragmentDefinition>,
    pub token_definitions: Vec<TokenDefinition>,
    pub rule_definitions: Vec<RuleDefinition>,
    pub code: String,
}

/// A two-cursor scanner producing [GrammarToken]s from a grammar description.
///
/// The scanner is a lazy producer; the parser pulls one token at a time and never
/// buffers more than a single token of lookahead.
pub struct GrammarTokenizer<'c> {
    code: Code<'c>,
    slow: usize,
    fast: usize,
    started: bool,
}

/// The grammar description parser.
///
/// Dispatches on the spelling of every defined name and reduces each definition body
/// through the per-kind pass pipeline into a [Grammar].
pub struct GrammarParser<'c> {
    tokenizer: GrammarTokenizer<'c>,
    buffer: Option<GrammarToken>,
    grammar: Grammar,
    debug: OnceCell<Log<&'static str>>,
}
