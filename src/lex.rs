use crate::{Code, Lex, TokenId};
use std::fmt::{Display, Formatter};

impl Display for Lex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("")
            .field(&self.token)
            .field(&self.start)
            .field(&self.end)
            .finish()
    }
}

impl Lex {
    pub fn new(token: TokenId, start: usize, end: usize) -> Self {
        Self { token, start, end }
    }

    /// The slice of the scanned input covered by this token.
    pub fn text<'c>(&self, code: &Code<'c>) -> &'c str {
        &code.value[self.start..self.end]
    }
}
