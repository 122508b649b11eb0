use super::{
    Directive, GrammarExpr, GrammarToken, Identifier, InlineCode, Predicate, Range,
    StringLiteral, Tag,
};
use crate::GrammarError;
use std::collections::{BTreeMap, BTreeSet};

/// Whether a spelling is all-uppercase: at least one cased character and none lowercase.
fn is_screaming(name: &str) -> bool {
    let mut cased = false;
    for c in name.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

impl Identifier {
    pub fn new(token: GrammarToken, name: &str) -> Self {
        Self {
            name: name.to_string(),
            token,
        }
    }

    pub fn is_rule(&self) -> bool {
        Self::is_rule_name(&self.name)
    }
    pub fn is_token(&self) -> bool {
        Self::is_token_name(&self.name)
    }
    pub fn is_fragment(&self) -> bool {
        Self::is_fragment_name(&self.name)
    }

    pub fn is_rule_name(name: &str) -> bool {
        !is_screaming(name)
    }
    pub fn is_token_name(name: &str) -> bool {
        is_screaming(name) && !name.starts_with('_')
    }
    pub fn is_fragment_name(name: &str) -> bool {
        is_screaming(name) && name.starts_with('_')
    }
}

impl StringLiteral {
    /// Build a literal from its quoted source text, decoding backslash escapes.
    pub(crate) fn parse(token: GrammarToken, text: &str) -> Result<Self, String> {
        let inner = &text[1..text.len() - 1];
        let value = decode_escapes(inner)?;
        Ok(Self { value, token })
    }
}

fn decode_escapes(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            None => return Err("dangling escape in string literal".to_string()),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some('x') => out.push(hex_escape(&mut chars, 2)?),
            Some('u') => out.push(hex_escape(&mut chars, 4)?),
            Some('U') => out.push(hex_escape(&mut chars, 8)?),
            Some(other) => out.push(other),
        }
    }
    Ok(out)
}

fn hex_escape(chars: &mut std::str::Chars, digits: u32) -> Result<char, String> {
    let mut value: u32 = 0;
    for _ in 0..digits {
        match chars.next().and_then(|c| c.to_digit(16)) {
            Some(digit) => value = value * 16 + digit,
            None => return Err("malformed hex escape in string literal".to_string()),
        }
    }
    char::from_u32(value)
        .ok_or_else(|| format!("escape value {:#x} is not a valid character", value))
}

/// Escape the characters that are meaningful inside a regular expression pattern.
pub(crate) fn regex_escape(value: &str) -> String {
    const ESCAPE: [char; 12] = ['.', '^', '$', '*', '+', '?', '{', '}', '\\', '[', ']', '|'];
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if ESCAPE.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl InlineCode {
    pub fn new(token: GrammarToken, text: &str) -> Self {
        Self {
            text: text.to_string(),
            token,
        }
    }

    /// The code payload without the surrounding braces.
    pub fn snippet(&self) -> &str {
        &self.text[1..self.text.len() - 1]
    }
}

impl Tag {
    pub fn new(name: Identifier, at: GrammarToken) -> Self {
        Self { name, at }
    }
}

impl Directive {
    pub fn new(name: Identifier, bam: GrammarToken) -> Self {
        Self { name, bam }
    }
}

impl Predicate {
    pub fn new(code: InlineCode, qmark: GrammarToken) -> Self {
        Self { code, qmark }
    }
}

fn first_char(value: &str) -> char {
    value.chars().next().unwrap_or('\0')
}

impl Range {
    fn to_regex(&self) -> String {
        let mut low = first_char(&self.low.value);
        let mut high = first_char(&self.high.value);
        if (high as u32) < (low as u32) {
            std::mem::swap(&mut low, &mut high);
        }
        let mut out = String::from("[");
        push_bound(&mut out, low);
        out.push('-');
        push_bound(&mut out, high);
        out.push(']');
        out
    }
}

// Inside a class, `[` opens a nested class and `-` a range, so the bound set to
// escape is wider than in plain pattern position.
fn push_bound(out: &mut String, bound: char) {
    if matches!(bound, ']' | '^' | '[' | '\\' | '-') {
        out.push('\\');
    }
    out.push(bound);
}

impl GrammarExpr {
    /// Synthesize the regular expression for this expression, expanding fragment
    /// references through the provided map.
    pub fn to_regex(&self, fragments: &BTreeMap<String, String>) -> Result<String, GrammarError> {
        match self {
            GrammarExpr::Identifier(id) => match fragments.get(&id.name) {
                Some(regex) => Ok(regex.clone()),
                None => Err(GrammarError::at(
                    id.token.start,
                    format!("fragment '{}' is not defined", id.name),
                )),
            },
            GrammarExpr::Literal(literal) => Ok(regex_escape(&literal.value)),
            GrammarExpr::Range(range) => Ok(range.to_regex()),
            GrammarExpr::Any(_) => Ok(".".to_string()),
            GrammarExpr::Union(values) => {
                let mut parts = Vec::with_capacity(values.len());
                for value in values {
                    parts.push(format!("({})", value.to_regex(fragments)?));
                }
                Ok(format!("({})", parts.join("|")))
            }
            GrammarExpr::Concat(values) => {
                let mut out = String::from("(");
                for value in values {
                    out.push_str(&value.to_regex(fragments)?);
                }
                out.push(')');
                Ok(out)
            }
            GrammarExpr::Optional(value) => Ok(format!("({})?", value.to_regex(fragments)?)),
            GrammarExpr::NongreedyOptional(value) => {
                Ok(format!("({})??", value.to_regex(fragments)?))
            }
            GrammarExpr::Star(value) => Ok(format!("({})*", value.to_regex(fragments)?)),
            GrammarExpr::NongreedyStar(value) => Ok(format!("({})*?", value.to_regex(fragments)?)),
            GrammarExpr::Plus(value) => Ok(format!("({})+", value.to_regex(fragments)?)),
            GrammarExpr::NongreedyPlus(value) => Ok(format!("({})+?", value.to_regex(fragments)?)),
            GrammarExpr::Alias { .. } => unreachable!("aliases appear in rule bodies only"),
        }
    }

    /// The set of identifier names referenced anywhere in this expression.
    pub fn identifiers(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'e>(&'e self, out: &mut BTreeSet<&'e str>) {
        match self {
            GrammarExpr::Identifier(id) => {
                out.insert(id.name.as_str());
            }
            GrammarExpr::Alias { target, .. } => {
                out.insert(target.name.as_str());
            }
            GrammarExpr::Literal(_) | GrammarExpr::Range(_) | GrammarExpr::Any(_) => {}
            GrammarExpr::Union(values) | GrammarExpr::Concat(values) => {
                for value in values {
                    value.collect_identifiers(out);
                }
            }
            GrammarExpr::Optional(value)
            | GrammarExpr::NongreedyOptional(value)
            | GrammarExpr::Star(value)
            | GrammarExpr::NongreedyStar(value)
            | GrammarExpr::Plus(value)
            | GrammarExpr::NongreedyPlus(value) => value.collect_identifiers(out),
        }
    }

    /// The set of decoded string literal values appearing in this expression.
    pub fn literals(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_literals(&mut out);
        out
    }

    fn collect_literals(&self, out: &mut BTreeSet<String>) {
        match self {
            GrammarExpr::Literal(literal) => {
                out.insert(literal.value.clone());
            }
            GrammarExpr::Identifier(_)
            | GrammarExpr::Alias { .. }
            | GrammarExpr::Range(_)
            | GrammarExpr::Any(_) => {}
            GrammarExpr::Union(values) | GrammarExpr::Concat(values) => {
                for value in values {
                    value.collect_literals(out);
                }
            }
            GrammarExpr::Optional(value)
            | GrammarExpr::NongreedyOptional(value)
            | GrammarExpr::Star(value)
            | GrammarExpr::NongreedyStar(value)
            | GrammarExpr::Plus(value)
            | GrammarExpr::NongreedyPlus(value) => value.collect_literals(out),
        }
    }

    /// Whether this expression is a quantified variant.
    pub(crate) fn is_quantified(&self) -> bool {
        matches!(
            self,
            GrammarExpr::Optional(_)
                | GrammarExpr::NongreedyOptional(_)
                | GrammarExpr::Star(_)
                | GrammarExpr::NongreedyStar(_)
                | GrammarExpr::Plus(_)
                | GrammarExpr::NongreedyPlus(_)
        )
    }
}
