use crate::util::{Code, Log};
use crate::{BaseHost, Lex, TagAction, TokenError, TokenId, TokenPattern, Tokenizer, TokenizerHost};
use std::fmt::{Display, Formatter, Write};

impl TokenPattern {
    /// The token kind name of this pattern.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The kind id assigned to this pattern's token.
    pub fn id(&self) -> TokenId {
        self.id
    }

    /// The anchored source of the compiled pattern.
    pub fn regex_source(&self) -> &str {
        self.regexp.as_str()
    }

    /// The tag hook name recorded from the grammar, if any.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// The predicate source recorded from the grammar, if any.
    pub fn predicate(&self) -> Option<&str> {
        self.predicate.as_deref()
    }
}

impl Display for TokenPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} : /{}/",
            self.name,
            self.regexp.as_str().replace('/', "\\/")
        )
    }
}

impl Tokenizer {
    /// The ordered pattern entries of the synthesized tokenizer.
    pub fn patterns(&self) -> &[TokenPattern] {
        &self.patterns
    }

    /// Every token kind name of the synthesized tokenizer, indexed by [TokenId].
    pub fn kind_names(&self) -> &[String] {
        &self.kind_names
    }

    /// Resolve a kind id back to its name.
    pub fn kind_name(&self, id: TokenId) -> &str {
        &self.kind_names[id.0]
    }

    /// Look up the kind id of a token name.
    pub fn kind(&self, name: &str) -> Option<TokenId> {
        self.kind_names
            .iter()
            .position(|kind| kind == name)
            .map(TokenId)
    }

    /// The kind id of the terminal `EOF` token.
    pub fn eof(&self) -> TokenId {
        TokenId(0)
    }

    /// Set a log label to debug the tokenizer.
    /// Based on the level of the [Log], the tokenizer will report match decisions.
    pub fn set_log(&mut self, log_label: Log<&'static str>) -> Result<(), String> {
        self.debug
            .set(log_label)
            .map_err(|err| format!("Log label {} is already assigned.", err))
    }

    /// Tokenize the input with the default [BaseHost].
    pub fn tokenize(&self, code: &Code) -> Result<Vec<Lex>, TokenError> {
        self.tokenize_with(code, &BaseHost)
    }

    /// Tokenize the input, dispatching predicates and tag hooks to the provided host.
    ///
    /// Scanning is anchored at the current position: every pattern whose predicate holds
    /// is matched and the longest match is consumed, with ties resolved in favor of the
    /// pattern declared first. The returned stream always ends with the `EOF` token.
    pub fn tokenize_with(
        &self,
        code: &Code,
        host: &dyn TokenizerHost,
    ) -> Result<Vec<Lex>, TokenError> {
        let mut stream: Vec<Lex> = Vec::new();
        let mut pointer: usize = 0;
        let eof_pointer: usize = code.value.len();

        #[cfg(debug_assertions)]
        let debug = self.debug.get().map_or(Log::None, |label| *label);

        while pointer < eof_pointer {
            let rest = &code.value[pointer..];
            let mut best_len = 0usize;
            let mut best: Option<&TokenPattern> = None;
            for pattern in &self.patterns {
                if let Some(predicate) = &pattern.predicate {
                    if !host.evaluate(predicate) {
                        continue;
                    }
                }
                if let Some(found) = pattern.regexp.find(rest) {
                    debug_assert_eq!(found.start(), 0);
                    if found.end() > best_len {
                        best_len = found.end();
                        best = Some(pattern);
                    }
                }
            }
            let pattern = match best {
                Some(pattern) => pattern,
                None => {
                    #[cfg(debug_assertions)]
                    if debug.order() >= Log::Default(()).order() {
                        println!(
                            "[{}; TokenizationError]: at {}",
                            debug,
                            code.obtain_position(pointer)
                        );
                    }
                    return Err(TokenError::new(
                        pointer,
                        format!(
                            "unknown char {:?} at {}",
                            rest.chars().next().unwrap_or_default(),
                            code.obtain_position(pointer)
                        ),
                    ));
                }
            };
            let lex = Lex::new(pattern.id, pointer, pointer + best_len);
            pointer += best_len;

            #[cfg(debug_assertions)]
            if debug.order() >= Log::Verbose(()).order() {
                println!(
                    "[{}; Matched]: {} at {}",
                    debug,
                    pattern.name,
                    code.obtain_position(lex.start)
                );
            }

            match &pattern.tag {
                None => stream.push(lex),
                Some(tag) => match host.handle_tag(tag, lex) {
                    TagAction::Discard => {}
                    TagAction::Keep(lex) => stream.push(lex),
                    TagAction::Expand(lexes) => stream.extend(lexes),
                },
            }
        }
        stream.push(Lex::new(self.eof(), eof_pointer, eof_pointer));
        Ok(stream)
    }

    /// Write the synthesized token inventory as a readable listing.
    pub fn build_grammar(&self) -> Result<String, std::fmt::Error> {
        let mut writer = String::new();
        writeln!(writer, "tokens {{")?;
        for pattern in &self.patterns {
            writeln!(writer, "{:>6}{} ,", "", pattern)?;
        }
        writeln!(writer, "}}")?;
        Ok(writer)
    }
}

impl Display for Tokenizer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for pattern in &self.patterns {
            writeln!(f, "{}", pattern)?;
        }
        Ok(())
    }
}
