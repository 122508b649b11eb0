use crate::{Code, GrammarError, Position, TokenError};
use std::fmt::{Display, Formatter};

impl GrammarError {
    pub fn new(message: String) -> Self {
        Self {
            pointer: None,
            message,
        }
    }

    pub fn at(pointer: usize, message: String) -> Self {
        Self {
            pointer: Some(pointer),
            message,
        }
    }

    /// Resolve the error pointer against the grammar description it was raised for.
    pub fn position(&self, code: &Code) -> Option<Position> {
        self.pointer.map(|p| code.obtain_position(p))
    }
}

impl Display for GrammarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GrammarError: {}", self.message)
    }
}

impl TokenError {
    pub fn new(pointer: usize, message: String) -> Self {
        Self { pointer, message }
    }
}

impl Display for TokenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "TokenError: {}", self.message)
    }
}
