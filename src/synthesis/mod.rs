//! Lowering of a parsed [Grammar] into a synthesized [Tokenizer]:
//! fragment ordering, implicit-token collection, reserved-name checks and
//! pattern compilation.

#[cfg(test)]
mod __tests__;

use crate::grammar::{Grammar, GrammarParser};
use crate::{GrammarError, TokenId, TokenPattern, Tokenizer};
use once_cell::unsync::OnceCell;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::Write;

/// Token names claimed by the synthesized tokenizer itself.
const RESERVED_TOKEN_NAMES: [&str; 1] = ["EOF"];

/// Tag names that would shadow the synthesized tokenizer surface.
const RESERVED_TAG_NAMES: [&str; 5] = ["EOF", "tokenize", "tokenize_with", "evaluate", "handle_tag"];

impl Tokenizer {
    /// Synthesize a tokenizer from a parsed grammar.
    ///
    /// String literals appearing in rule bodies are restricted to a single character;
    /// use [Tokenizer::with_multichar_implicits] to lift the restriction.
    pub fn new(grammar: &Grammar) -> Result<Self, GrammarError> {
        Self::build(grammar, false)
    }

    /// Synthesize a tokenizer, allowing implicit tokens of more than one character.
    ///
    /// A multi-character implicit token can shadow a prefix of another token under the
    /// longest-match discipline, so the relaxation is opt-in.
    pub fn with_multichar_implicits(grammar: &Grammar) -> Result<Self, GrammarError> {
        Self::build(grammar, true)
    }

    /// Parse a grammar description and synthesize its tokenizer in one step.
    pub fn compile(grammar_code: &str) -> Result<Self, GrammarError> {
        let grammar = GrammarParser::new(grammar_code).parse()?;
        Self::build(&grammar, false)
    }

    fn build(grammar: &Grammar, multichar_implicits: bool) -> Result<Self, GrammarError> {
        check_token_names(grammar)?;
        check_tag_names(grammar)?;
        let fragments = fragment_regexes(grammar)?;
        let implicits = implicit_tokens(grammar, multichar_implicits)?;

        let mut kind_names: Vec<String> = vec!["EOF".to_string()];
        for declaration in &grammar.token_declarations {
            kind_names.push(declaration.name.clone());
        }
        for name in implicits.keys() {
            kind_names.push(name.clone());
        }
        for definition in &grammar.token_definitions {
            kind_names.push(definition.name.name.clone());
        }

        let kind_of = |name: &str| -> Option<TokenId> {
            kind_names.iter().position(|n| n == name).map(TokenId)
        };

        let mut patterns = Vec::with_capacity(implicits.len() + grammar.token_definitions.len());
        for (name, value) in &implicits {
            let source = format!("^{}", implicit_pattern(value));
            let regexp = Regex::new(&source).map_err(|err| {
                GrammarError::new(format!(
                    "implicit token {:?} produced an invalid pattern. {:?}",
                    value, err
                ))
            })?;
            patterns.push(TokenPattern {
                name: name.clone(),
                id: kind_of(name).unwrap_or(TokenId(0)),
                regexp,
                tag: None,
                predicate: None,
            });
        }
        for definition in &grammar.token_definitions {
            let name = &definition.name.name;
            let source = format!("^{}", definition.value.to_regex(&fragments)?);
            let regexp = Regex::new(&source).map_err(|err| {
                GrammarError::at(
                    definition.name.token.start,
                    format!("token '{}' produced an invalid pattern. {:?}", name, err),
                )
            })?;
            patterns.push(TokenPattern {
                name: name.clone(),
                id: kind_of(name).unwrap_or(TokenId(0)),
                regexp,
                tag: definition.tag.as_ref().map(|tag| tag.name.name.clone()),
                predicate: definition
                    .predicate
                    .as_ref()
                    .map(|predicate| predicate.code.snippet().to_string()),
            });
        }

        Ok(Self {
            patterns,
            kind_names,
            debug: OnceCell::new(),
        })
    }
}

fn check_token_names(grammar: &Grammar) -> Result<(), GrammarError> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for declaration in &grammar.token_declarations {
        if RESERVED_TOKEN_NAMES.contains(&declaration.name.as_str()) {
            return Err(GrammarError::at(
                declaration.token.start,
                format!("'{}' is a reserved token name", declaration.name),
            ));
        }
        if !seen.insert(declaration.name.as_str()) {
            return Err(GrammarError::at(
                declaration.token.start,
                format!("'{}' is declared more than once", declaration.name),
            ));
        }
    }
    for definition in &grammar.token_definitions {
        let name = &definition.name;
        if RESERVED_TOKEN_NAMES.contains(&name.name.as_str()) {
            return Err(GrammarError::at(
                name.token.start,
                format!("'{}' is a reserved token name", name.name),
            ));
        }
        if !seen.insert(name.name.as_str()) {
            return Err(GrammarError::at(
                name.token.start,
                format!("'{}' is declared more than once", name.name),
            ));
        }
    }
    Ok(())
}

fn check_tag_names(grammar: &Grammar) -> Result<(), GrammarError> {
    for definition in &grammar.token_definitions {
        if let Some(tag) = &definition.tag {
            if RESERVED_TAG_NAMES.contains(&tag.name.name.as_str()) {
                return Err(GrammarError::at(
                    tag.name.token.start,
                    format!("'{}' is an illegal tag name", tag.name.name),
                ));
            }
        }
    }
    Ok(())
}

/// Order the fragment names so that every fragment follows the fragments it references.
///
/// The returned order also contains referenced names with no definition of their own;
/// populating the regex map skips them so the reference site reports the error.
fn fragment_order(grammar: &Grammar) -> Result<Vec<String>, GrammarError> {
    let mut successors: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut indegree: BTreeMap<&str, usize> = BTreeMap::new();
    let mut references: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for fragment in &grammar.fragment_definitions {
        let name = fragment.name.name.as_str();
        indegree.entry(name).or_insert(0);
        let referenced = fragment.value.identifiers();
        for &reference in &referenced {
            indegree.entry(reference).or_insert(0);
            if successors.entry(reference).or_default().insert(name) {
                *indegree.entry(name).or_insert(0) += 1;
            }
        }
        references.insert(name, referenced);
    }

    let mut queue: VecDeque<&str> = indegree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| *name)
        .collect();
    let mut order = Vec::with_capacity(indegree.len());
    while let Some(name) = queue.pop_front() {
        order.push(name.to_string());
        if let Some(nexts) = successors.get(name) {
            for &next in nexts {
                if let Some(degree) = indegree.get_mut(next) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(next);
                    }
                }
            }
        }
    }
    if order.len() == indegree.len() {
        return Ok(order);
    }

    let remaining: BTreeSet<&str> = indegree
        .iter()
        .filter(|(_, degree)| **degree > 0)
        .map(|(name, _)| *name)
        .collect();
    Err(GrammarError::new(cycle_message(&locate_cycle(
        &references,
        &remaining,
    ))))
}

/// Walk reference edges inside the unresolved set until a name repeats; the walked
/// loop is a reference cycle.
fn locate_cycle<'g>(
    references: &BTreeMap<&'g str, BTreeSet<&'g str>>,
    remaining: &BTreeSet<&'g str>,
) -> Vec<&'g str> {
    let mut path: Vec<&str> = Vec::new();
    let mut visited: BTreeMap<&str, usize> = BTreeMap::new();
    let mut node = match remaining.iter().next() {
        Some(name) => *name,
        None => return path,
    };
    loop {
        if let Some(&start) = visited.get(node) {
            return path[start..].to_vec();
        }
        visited.insert(node, path.len());
        path.push(node);
        let next = references
            .get(node)
            .and_then(|refs| refs.iter().find(|r| remaining.contains(*r)));
        match next {
            Some(next) => node = *next,
            None => return path,
        }
    }
}

fn cycle_message(fragments: &[&str]) -> String {
    match fragments {
        [single] => format!("'{}' cannot be defined recursively", single),
        [first, second] => format!(
            "'{}' and '{}' cannot be defined recursively",
            first, second
        ),
        rest => match rest.split_last() {
            Some((last, init)) => {
                let mut message = String::new();
                for fragment in init {
                    let _ = write!(message, "'{}', ", fragment);
                }
                let _ = write!(message, "and '{}' cannot be defined recursively", last);
                message
            }
            None => "fragments cannot be defined recursively".to_string(),
        },
    }
}

/// Expand every defined fragment into its regular expression, in dependency order.
fn fragment_regexes(grammar: &Grammar) -> Result<BTreeMap<String, String>, GrammarError> {
    let order = fragment_order(grammar)?;
    let definitions: BTreeMap<&str, &crate::grammar::FragmentDefinition> = grammar
        .fragment_definitions
        .iter()
        .map(|fragment| (fragment.name.name.as_str(), fragment))
        .collect();
    let mut fragments: BTreeMap<String, String> = BTreeMap::new();
    for name in order {
        if let Some(definition) = definitions.get(name.as_str()) {
            let regex = definition.value.to_regex(&fragments)?;
            fragments.insert(name, regex);
        }
    }
    Ok(fragments)
}

/// Collect the string literals of every rule body as implicit tokens, keyed by their
/// synthesized name.
fn implicit_tokens(
    grammar: &Grammar,
    multichar_implicits: bool,
) -> Result<BTreeMap<String, String>, GrammarError> {
    let mut values: BTreeSet<String> = BTreeSet::new();
    for rule in &grammar.rule_definitions {
        for alternative in &rule.alternatives {
            for literal in alternative.value.literals() {
                if !multichar_implicits && literal.chars().count() > 1 {
                    return Err(GrammarError::at(
                        rule.name.token.start,
                        format!(
                            "implicit token {:?} cannot be multiple characters",
                            literal
                        ),
                    ));
                }
                values.insert(literal);
            }
        }
    }
    Ok(values
        .into_iter()
        .map(|value| (implicit_name(&value), value))
        .collect())
}

/// The synthesized name of an implicit token: `_` followed by the `_`-separated hex
/// code points of the literal.
pub(crate) fn implicit_name(value: &str) -> String {
    let mut name = String::from("_");
    for (index, c) in value.chars().enumerate() {
        if index > 0 {
            name.push('_');
        }
        let _ = write!(name, "{:x}", c as u32);
    }
    name
}

/// Escaping for implicit-token patterns, which also covers the grouping parentheses.
fn implicit_pattern(value: &str) -> String {
    const ESCAPE: [char; 14] = [
        '.', '^', '$', '*', '+', '?', '{', '}', '(', ')', '\\', '[', ']', '|',
    ];
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if ESCAPE.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
