use super::{GrammarToken, TokenKind};
use crate::Code;
use std::fmt::{Display, Formatter};

impl GrammarToken {
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }

    /// The slice of the grammar description covered by this token.
    pub fn text<'c>(&self, code: &Code<'c>) -> &'c str {
        &code.value[self.start..self.end]
    }
}

impl Display for GrammarToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("")
            .field(&self.kind)
            .field(&self.start)
            .field(&self.end)
            .finish()
    }
}
