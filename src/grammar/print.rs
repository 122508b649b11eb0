//! Rendering of parsed grammars back to meta-language text.
//!
//! The printed form is re-parseable: feeding the output of [Grammar]'s `Display` back
//! into the [GrammarParser](super::GrammarParser) reproduces an equivalent grammar.

use super::{
    Alternative, FragmentDefinition, Grammar, GrammarExpr, RuleDefinition, TokenDefinition,
};
use ptree::TreeItem;
use std::borrow::Cow;
use std::fmt::{Display, Formatter, Write};

fn quote_literal(value: &str) -> String {
    let mut out = String::from("'");
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Print a quantifier operand, parenthesizing nested quantifiers so that the postfix
/// symbols reattach to the same operand when the text is parsed again.
fn write_quantified(
    f: &mut Formatter<'_>,
    value: &GrammarExpr,
    suffix: &str,
) -> std::fmt::Result {
    if value.is_quantified() {
        write!(f, "({}){}", value, suffix)
    } else {
        write!(f, "{}{}", value, suffix)
    }
}

impl Display for GrammarExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarExpr::Identifier(id) => write!(f, "{}", id.name),
            GrammarExpr::Literal(literal) => write!(f, "{}", quote_literal(&literal.value)),
            GrammarExpr::Range(range) => write!(
                f,
                "{}-{}",
                quote_literal(&range.low.value),
                quote_literal(&range.high.value)
            ),
            GrammarExpr::Any(_) => write!(f, "."),
            GrammarExpr::Union(values) => {
                write!(f, "(")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, ")")
            }
            GrammarExpr::Concat(values) => {
                write!(f, "(")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, ")")
            }
            GrammarExpr::Optional(value) => write_quantified(f, value, "?"),
            GrammarExpr::NongreedyOptional(value) => write_quantified(f, value, "??"),
            GrammarExpr::Star(value) => write_quantified(f, value, "*"),
            GrammarExpr::NongreedyStar(value) => write_quantified(f, value, "*?"),
            GrammarExpr::Plus(value) => write_quantified(f, value, "+"),
            GrammarExpr::NongreedyPlus(value) => write_quantified(f, value, "+?"),
            GrammarExpr::Alias { alias, target } => {
                write!(f, "{} = {}", alias.name, target.name)
            }
        }
    }
}

impl Display for Alternative {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(predicate) = &self.predicate {
            write!(f, "{} ? ", predicate.code.text)?;
        }
        write!(f, "{}", self.value)?;
        if let Some(code) = &self.code {
            write!(f, " {}", code.text)?;
        }
        for directive in &self.directives {
            write!(f, " !{}", directive.name.name)?;
        }
        if let Some(tag) = &self.tag {
            write!(f, " @{}", tag.name.name)?;
        }
        Ok(())
    }
}

impl Display for RuleDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:", self.name.name)?;
        for (index, alternative) in self.alternatives.iter().enumerate() {
            if index > 0 {
                write!(f, " |")?;
            }
            write!(f, " {}", alternative)?;
        }
        Ok(())
    }
}

impl Display for TokenDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: ", self.name.name)?;
        if let Some(predicate) = &self.predicate {
            write!(f, "{} ? ", predicate.code.text)?;
        }
        write!(f, "{}", self.value)?;
        if let Some(tag) = &self.tag {
            write!(f, " @{}", tag.name.name)?;
        }
        Ok(())
    }
}

impl Display for FragmentDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name.name, self.value)
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for declaration in &self.token_declarations {
            writeln!(f, "{}", declaration.name)?;
        }
        for fragment in &self.fragment_definitions {
            writeln!(f, "{}", fragment)?;
        }
        for token in &self.token_definitions {
            writeln!(f, "{}", token)?;
        }
        for rule in &self.rule_definitions {
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}

impl TreeItem for GrammarExpr {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        match self {
            GrammarExpr::Identifier(id) => write!(f, "Id({})", id.name),
            GrammarExpr::Literal(literal) => write!(f, "Str({})", quote_literal(&literal.value)),
            GrammarExpr::Range(range) => write!(
                f,
                "Range({}, {})",
                quote_literal(&range.low.value),
                quote_literal(&range.high.value)
            ),
            GrammarExpr::Any(_) => write!(f, "Any"),
            GrammarExpr::Union(_) => write!(f, "Union"),
            GrammarExpr::Concat(_) => write!(f, "Concat"),
            GrammarExpr::Optional(_) => write!(f, "Optional"),
            GrammarExpr::NongreedyOptional(_) => write!(f, "NongreedyOptional"),
            GrammarExpr::Star(_) => write!(f, "Star"),
            GrammarExpr::NongreedyStar(_) => write!(f, "NongreedyStar"),
            GrammarExpr::Plus(_) => write!(f, "Plus"),
            GrammarExpr::NongreedyPlus(_) => write!(f, "NongreedyPlus"),
            GrammarExpr::Alias { alias, target } => {
                write!(f, "Alias({} = {})", alias.name, target.name)
            }
        }
    }

    fn children(&self) -> Cow<[Self::Child]> {
        match self {
            GrammarExpr::Union(values) | GrammarExpr::Concat(values) => Cow::from(values),
            GrammarExpr::Optional(value)
            | GrammarExpr::NongreedyOptional(value)
            | GrammarExpr::Star(value)
            | GrammarExpr::NongreedyStar(value)
            | GrammarExpr::Plus(value)
            | GrammarExpr::NongreedyPlus(value) => {
                Cow::from(std::slice::from_ref(value.as_ref()))
            }
            _ => Cow::Owned(Vec::with_capacity(0)),
        }
    }
}

impl GrammarExpr {
    /// Print the expression tree to the standard output.
    pub fn print(&self) -> Result<(), std::io::Error> {
        ptree::print_tree(self)
    }
}
