mod code;
mod logger;
mod position;
use once_cell::unsync::OnceCell;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
/// The line and column information at code point.
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// A wrapper for an input text with lazily computed lines information.
pub struct Code<'c> {
    pub value: &'c str,
    line_breaks: OnceCell<Vec<usize>>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// A enum structure to assign multiple level debugging to the grammar parser and the synthesized tokenizer.
pub enum Log<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}
