use super::{GrammarToken, GrammarTokenizer, TokenKind};
use crate::{Code, GrammarError, Position};

fn starts_definition(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

impl<'c> GrammarTokenizer<'c> {
    pub fn new(code: &'c str) -> Self {
        Self {
            code: Code::from(code),
            slow: 0,
            fast: 0,
            started: false,
        }
    }

    pub fn code(&self) -> &Code<'c> {
        &self.code
    }

    pub fn obtain_position(&self, pointer: usize) -> Position {
        self.code.obtain_position(pointer)
    }

    fn peek_char(&self) -> Option<char> {
        self.code.value[self.fast..].chars().next()
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.fast += c.len_utf8();
        Some(c)
    }

    fn make_token(&mut self, kind: TokenKind) -> GrammarToken {
        let token = GrammarToken::new(kind, self.slow, self.fast);
        self.slow = self.fast;
        token
    }

    /// Produce the next token of the grammar description.
    ///
    /// Once the input is exhausted every further call returns an `Eof` token.
    pub fn next_token(&mut self) -> Result<GrammarToken, GrammarError> {
        if !self.started {
            self.started = true;
            // A description whose very first character opens a definition gets the
            // synthetic marker before anything else.
            if self.peek_char().map_or(false, starts_definition) {
                return Ok(self.make_token(TokenKind::NewRule));
            }
        }
        loop {
            let c = match self.peek_char() {
                None => return Ok(self.make_token(TokenKind::Eof)),
                Some(c) => c,
            };
            if c.is_whitespace() {
                if let Some(token) = self.handle_whitespace() {
                    return Ok(token);
                }
            } else if starts_definition(c) {
                return Ok(self.handle_identifier());
            } else if c == '{' {
                return self.handle_code();
            } else if c == '\'' || c == '"' {
                return self.handle_string(c);
            } else if c == '#' {
                self.consume_comment();
            } else if let Some(kind) = punctuation_kind(c) {
                self.next_char();
                return Ok(self.make_token(kind));
            } else {
                return Err(self.unknown_char(c));
            }
        }
    }

    /// Consume a whitespace run. The run separates two definitions exactly when its last
    /// character is a line break and the next character opens a definition at column zero.
    fn handle_whitespace(&mut self) -> Option<GrammarToken> {
        let mut last = ' ';
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            last = c;
            self.next_char();
        }
        let token = self.make_token(TokenKind::NewRule);
        if last == '\n' && self.peek_char().map_or(false, starts_definition) {
            Some(token)
        } else {
            None
        }
    }

    fn handle_identifier(&mut self) -> GrammarToken {
        self.next_char();
        while let Some(c) = self.peek_char() {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            self.next_char();
        }
        self.make_token(TokenKind::Id)
    }

    /// A `{…}` code block runs to the matching brace, skipping over nested braces and
    /// balanced quoted strings with backslash escapes.
    fn handle_code(&mut self) -> Result<GrammarToken, GrammarError> {
        self.next_char();
        let mut depth = 1usize;
        while depth > 0 {
            match self.next_char() {
                None => return Err(self.unclosed_code()),
                Some('{') => depth += 1,
                Some('}') => depth -= 1,
                Some(quote @ ('\'' | '"')) => loop {
                    match self.next_char() {
                        None => return Err(self.unclosed_code()),
                        Some('\\') => {
                            if self.next_char().is_none() {
                                return Err(self.unclosed_code());
                            }
                        }
                        Some(c) if c == quote => break,
                        Some(_) => {}
                    }
                },
                Some(_) => {}
            }
        }
        Ok(self.make_token(TokenKind::Code))
    }

    fn handle_string(&mut self, quote: char) -> Result<GrammarToken, GrammarError> {
        self.next_char();
        loop {
            match self.next_char() {
                None => return Err(self.unclosed_string()),
                Some('\\') => {
                    if self.next_char().is_none() {
                        return Err(self.unclosed_string());
                    }
                }
                Some(c) if c == quote => break,
                Some(_) => {}
            }
        }
        Ok(self.make_token(TokenKind::Str))
    }

    fn consume_comment(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.next_char();
        }
        self.slow = self.fast;
    }

    fn unknown_char(&self, c: char) -> GrammarError {
        GrammarError::at(
            self.slow,
            format!(
                "unknown char {:?} at {}",
                c,
                self.obtain_position(self.slow)
            ),
        )
    }

    fn unclosed_string(&self) -> GrammarError {
        GrammarError::at(
            self.slow,
            format!(
                "unclosed string literal starting at {}",
                self.obtain_position(self.slow)
            ),
        )
    }

    fn unclosed_code(&self) -> GrammarError {
        GrammarError::at(
            self.slow,
            format!(
                "unclosed code snippet starting at {}",
                self.obtain_position(self.slow)
            ),
        )
    }
}

fn punctuation_kind(c: char) -> Option<TokenKind> {
    match c {
        ':' => Some(TokenKind::Colon),
        '(' => Some(TokenKind::LParen),
        ')' => Some(TokenKind::RParen),
        '|' => Some(TokenKind::Or),
        '*' => Some(TokenKind::Star),
        '+' => Some(TokenKind::Plus),
        '?' => Some(TokenKind::QMark),
        '.' => Some(TokenKind::Dot),
        '@' => Some(TokenKind::At),
        '!' => Some(TokenKind::Bam),
        '=' => Some(TokenKind::Equals),
        '-' => Some(TokenKind::Dash),
        _ => None,
    }
}
