use super::{
    Alternative, Directive, FragmentDefinition, Grammar, GrammarExpr, GrammarParser,
    GrammarToken, GrammarTokenizer, Identifier, InlineCode, Predicate, Range, RuleDefinition,
    StringLiteral, Tag, TokenDefinition, TokenKind,
};
use crate::util::Log;
use crate::GrammarError;
use once_cell::unsync::OnceCell;

/// Intermediate element of the definition-body rewrite passes: either a raw grammar
/// token or a partially reduced node.
enum PipelineItem {
    Raw(GrammarToken),
    Expr(GrammarExpr),
    Code(InlineCode),
    Tag(Tag),
    Directive(Directive),
    Predicate(Predicate),
}

impl PipelineItem {
    fn into_identifier(self) -> Option<Identifier> {
        match self {
            PipelineItem::Expr(GrammarExpr::Identifier(id)) => Some(id),
            _ => None,
        }
    }

    fn into_literal(self) -> Option<StringLiteral> {
        match self {
            PipelineItem::Expr(GrammarExpr::Literal(literal)) => Some(literal),
            _ => None,
        }
    }
}

impl<'c> GrammarParser<'c> {
    pub fn new(code: &'c str) -> Self {
        Self {
            tokenizer: GrammarTokenizer::new(code),
            buffer: None,
            grammar: Grammar {
                token_declarations: Vec::new(),
                fragment_definitions: Vec::new(),
                token_definitions: Vec::new(),
                rule_definitions: Vec::new(),
                code: code.to_string(),
            },
            debug: OnceCell::new(),
        }
    }

    /// Set a log label to debug the parser.
    /// Based on the level of the [Log], the parser will report the parsed definitions.
    pub fn set_log(&mut self, log_label: Log<&'static str>) -> Result<(), String> {
        self.debug
            .set(log_label)
            .map_err(|err| format!("Log label {} is already assigned.", err))
    }

    fn peek_token(&mut self) -> Result<GrammarToken, GrammarError> {
        match self.buffer {
            Some(token) => Ok(token),
            None => {
                let token = self.tokenizer.next_token()?;
                self.buffer = Some(token);
                Ok(token)
            }
        }
    }

    fn next_token(&mut self) -> Result<GrammarToken, GrammarError> {
        let token = self.peek_token()?;
        self.buffer = None;
        Ok(token)
    }

    fn text(&self, token: &GrammarToken) -> &'c str {
        token.text(self.tokenizer.code())
    }

    fn error(&self, message: &str, token: &GrammarToken) -> GrammarError {
        GrammarError::at(token.start, message.to_string())
    }

    fn log_definition(&self, _kind: &str, _name: &str) {
        #[cfg(debug_assertions)]
        if let Some(label) = self.debug.get() {
            if label.order() >= Log::Verbose(()).order() {
                println!("[{}; Parsed {}]: '{}'", label, _kind, _name);
            }
        }
    }

    /// Parse the whole grammar description into a [Grammar].
    pub fn parse(mut self) -> Result<Grammar, GrammarError> {
        loop {
            let token = self.peek_token()?;
            match token.kind {
                TokenKind::NewRule => {
                    self.next_token()?;
                    let name_token = self.next_token()?;
                    if name_token.kind != TokenKind::Id {
                        return Err(self.error("unexpected token", &name_token));
                    }
                    let name = Identifier::new(name_token, self.text(&name_token));
                    let next = self.peek_token()?;
                    match next.kind {
                        TokenKind::Colon => {
                            let colon = self.next_token()?;
                            let body = self.collect_body()?;
                            if name.is_rule() {
                                self.parse_rule_definition(name, colon, body)?;
                            } else if name.is_token() {
                                self.parse_token_definition(name, colon, body)?;
                            } else {
                                self.parse_fragment_definition(name, colon, body)?;
                            }
                        }
                        TokenKind::NewRule | TokenKind::Eof => {
                            self.log_definition("token declaration", &name.name);
                            self.grammar.token_declarations.push(name);
                        }
                        _ => return Err(self.error("unexpected token", &next)),
                    }
                }
                TokenKind::Eof => break,
                _ => return Err(self.error("unexpected token", &token)),
            }
        }
        Ok(self.grammar)
    }

    /// Collect the flat token list of a definition body, up to the next definition
    /// boundary or the end of the description.
    fn collect_body(&mut self) -> Result<Vec<GrammarToken>, GrammarError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.peek_token()?;
            match token.kind {
                TokenKind::NewRule | TokenKind::Eof => break,
                TokenKind::Colon => return Err(self.error("unexpected colon", &token)),
                _ => {
                    self.next_token()?;
                    tokens.push(token);
                }
            }
        }
        Ok(tokens)
    }

    fn parse_rule_definition(
        &mut self,
        name: Identifier,
        colon: GrammarToken,
        body: Vec<GrammarToken>,
    ) -> Result<(), GrammarError> {
        if body.is_empty() {
            return Err(self.error("rule definitions cannot be empty", &colon));
        }
        self.reject_rule_atoms(&body)?;
        let items = self.lift_atoms(body)?;
        let items = self.fold_annotations(items)?;
        self.check_rule_references(&items)?;
        let items = self.fold_aliases(items)?;
        let items = self.fold_parentheses(items)?;
        let items = self.fold_quantifiers(items)?;
        let alternatives = self.make_alternatives(items)?;
        self.log_definition("rule", &name.name);
        self.grammar.rule_definitions.push(RuleDefinition {
            name,
            alternatives,
            colon,
        });
        Ok(())
    }

    fn parse_token_definition(
        &mut self,
        name: Identifier,
        colon: GrammarToken,
        body: Vec<GrammarToken>,
    ) -> Result<(), GrammarError> {
        if body.is_empty() {
            return Err(self.error("token definitions cannot be empty", &colon));
        }
        self.reject_token_atoms(&body)?;
        let items = self.lift_atoms(body)?;
        let (items, tag, predicate) = self.extract_token_annotations(items)?;
        self.check_token_references(&items)?;
        let items = self.fold_ranges(items)?;
        let value = self.reduce_expression(items)?;
        self.log_definition("token", &name.name);
        self.grammar.token_definitions.push(TokenDefinition {
            name,
            value,
            tag,
            predicate,
            colon,
        });
        Ok(())
    }

    fn parse_fragment_definition(
        &mut self,
        name: Identifier,
        colon: GrammarToken,
        body: Vec<GrammarToken>,
    ) -> Result<(), GrammarError> {
        if body.is_empty() {
            return Err(self.error("fragment definitions cannot be empty", &colon));
        }
        self.reject_fragment_atoms(&body)?;
        let items = self.lift_atoms(body)?;
        let items = self.fold_ranges(items)?;
        let value = self.reduce_expression(items)?;
        self.log_definition("fragment", &name.name);
        self.grammar.fragment_definitions.push(FragmentDefinition {
            name,
            value,
            colon,
        });
        Ok(())
    }

    fn reject_rule_atoms(&self, tokens: &[GrammarToken]) -> Result<(), GrammarError> {
        for token in tokens {
            match token.kind {
                TokenKind::Dash => {
                    return Err(self.error("rule definitions cannot contain ranges", token))
                }
                TokenKind::Dot => {
                    return Err(self.error("rule definitions cannot contain wildcards", token))
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn reject_token_atoms(&self, tokens: &[GrammarToken]) -> Result<(), GrammarError> {
        for token in tokens {
            match token.kind {
                TokenKind::Bam => {
                    return Err(self.error("token definitions cannot contain directives", token))
                }
                TokenKind::Equals => {
                    return Err(self.error("token definitions cannot contain aliases", token))
                }
                TokenKind::Dot => {
                    return Err(self.error("token definitions cannot contain wildcards", token))
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn reject_fragment_atoms(&self, tokens: &[GrammarToken]) -> Result<(), GrammarError> {
        for token in tokens {
            match token.kind {
                TokenKind::Code => {
                    return Err(
                        self.error("fragment definitions cannot contain code snippets", token)
                    )
                }
                TokenKind::Bam => {
                    return Err(self.error("fragment definitions cannot contain directives", token))
                }
                TokenKind::At => {
                    return Err(self.error("fragment definitions cannot contain tags", token))
                }
                TokenKind::Equals => {
                    return Err(self.error("fragment definitions cannot contain aliases", token))
                }
                TokenKind::Id => {
                    let name = self.text(token);
                    if Identifier::is_rule_name(name) {
                        return Err(self.error(
                            "fragment definitions cannot contain rule references",
                            token,
                        ));
                    } else if Identifier::is_token_name(name) {
                        return Err(self.error(
                            "fragment definitions cannot contain token references",
                            token,
                        ));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Lift the single-token atoms of a body into expression nodes.
    fn lift_atoms(&self, tokens: Vec<GrammarToken>) -> Result<Vec<PipelineItem>, GrammarError> {
        let mut out = Vec::with_capacity(tokens.len());
        for token in tokens {
            let item = match token.kind {
                TokenKind::Id => PipelineItem::Expr(GrammarExpr::Identifier(Identifier::new(
                    token,
                    self.text(&token),
                ))),
                TokenKind::Str => {
                    let literal = StringLiteral::parse(token, self.text(&token))
                        .map_err(|message| GrammarError::at(token.start, message))?;
                    PipelineItem::Expr(GrammarExpr::Literal(literal))
                }
                TokenKind::Code => PipelineItem::Code(InlineCode::new(token, self.text(&token))),
                TokenKind::Dot => PipelineItem::Expr(GrammarExpr::Any(token)),
                _ => PipelineItem::Raw(token),
            };
            out.push(item);
        }
        Ok(out)
    }

    /// Fold `@name` into tags, `!name` into directives and `{code} ?` into predicates.
    fn fold_annotations(
        &self,
        items: Vec<PipelineItem>,
    ) -> Result<Vec<PipelineItem>, GrammarError> {
        let mut out: Vec<PipelineItem> = Vec::new();
        let mut iter = items.into_iter();
        while let Some(item) = iter.next() {
            match item {
                PipelineItem::Raw(token) if token.kind == TokenKind::At => {
                    match iter.next().and_then(PipelineItem::into_identifier) {
                        Some(name) => out.push(PipelineItem::Tag(Tag::new(name, token))),
                        None => {
                            return Err(self.error("@ must be followed by an identifier", &token))
                        }
                    }
                }
                PipelineItem::Raw(token) if token.kind == TokenKind::Bam => {
                    match iter.next().and_then(PipelineItem::into_identifier) {
                        Some(name) => out.push(PipelineItem::Directive(Directive::new(name, token))),
                        None => {
                            return Err(self.error("! must be followed by an identifier", &token))
                        }
                    }
                }
                PipelineItem::Raw(token) if token.kind == TokenKind::QMark => {
                    if matches!(out.last(), Some(PipelineItem::Code(_))) {
                        if let Some(PipelineItem::Code(code)) = out.pop() {
                            out.push(PipelineItem::Predicate(Predicate::new(code, token)));
                        }
                    } else {
                        out.push(PipelineItem::Raw(token));
                    }
                }
                other => out.push(other),
            }
        }
        Ok(out)
    }

    fn check_rule_references(&self, items: &[PipelineItem]) -> Result<(), GrammarError> {
        for item in items {
            if let PipelineItem::Expr(GrammarExpr::Identifier(id)) = item {
                if id.is_fragment() {
                    return Err(self.error(
                        "rule definitions cannot contain fragment references",
                        &id.token,
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_token_references(&self, items: &[PipelineItem]) -> Result<(), GrammarError> {
        for item in items {
            if let PipelineItem::Expr(GrammarExpr::Identifier(id)) = item {
                if id.is_rule() {
                    return Err(
                        self.error("token definitions cannot contain rule references", &id.token)
                    );
                } else if id.is_token() {
                    return Err(self.error(
                        "token definitions cannot contain token references",
                        &id.token,
                    ));
                }
            }
        }
        Ok(())
    }

    /// Fold `alias = Target` pairs into alias expressions.
    fn fold_aliases(&self, items: Vec<PipelineItem>) -> Result<Vec<PipelineItem>, GrammarError> {
        let mut out: Vec<PipelineItem> = Vec::new();
        let mut iter = items.into_iter();
        while let Some(item) = iter.next() {
            match item {
                PipelineItem::Raw(token) if token.kind == TokenKind::Equals => {
                    let alias = out.pop().and_then(PipelineItem::into_identifier);
                    let target = iter.next().and_then(PipelineItem::into_identifier);
                    match (alias, target) {
                        (Some(alias), Some(target)) => {
                            out.push(PipelineItem::Expr(GrammarExpr::Alias { alias, target }))
                        }
                        _ => {
                            return Err(
                                self.error("= must have an identifier on each side", &token)
                            )
                        }
                    }
                }
                other => out.push(other),
            }
        }
        Ok(out)
    }

    /// Fold `'a'-'z'` literal pairs into range expressions.
    fn fold_ranges(&self, items: Vec<PipelineItem>) -> Result<Vec<PipelineItem>, GrammarError> {
        let mut out: Vec<PipelineItem> = Vec::new();
        let mut iter = items.into_iter();
        while let Some(item) = iter.next() {
            match item {
                PipelineItem::Raw(token) if token.kind == TokenKind::Dash => {
                    let low = out.pop().and_then(PipelineItem::into_literal);
                    let high = iter.next().and_then(PipelineItem::into_literal);
                    match (low, high) {
                        (Some(low), Some(high)) => {
                            if low.value.chars().count() != 1 {
                                return Err(self.error(
                                    "range bounds must be a single character",
                                    &low.token,
                                ));
                            }
                            if high.value.chars().count() != 1 {
                                return Err(self.error(
                                    "range bounds must be a single character",
                                    &high.token,
                                ));
                            }
                            out.push(PipelineItem::Expr(GrammarExpr::Range(Range {
                                low,
                                high,
                                dash: token,
                            })));
                        }
                        _ => return Err(self.error("- must have a string on each side", &token)),
                    }
                }
                other => out.push(other),
            }
        }
        Ok(out)
    }

    /// Reduce every balanced `( … )` group into a single expression node.
    fn fold_parentheses(
        &self,
        items: Vec<PipelineItem>,
    ) -> Result<Vec<PipelineItem>, GrammarError> {
        let mut out: Vec<PipelineItem> = Vec::new();
        let mut in_parens: Vec<PipelineItem> = Vec::new();
        let mut left_paren: Option<GrammarToken> = None;
        let mut depth = 0usize;
        for item in items {
            match item {
                PipelineItem::Raw(token) if token.kind == TokenKind::LParen => {
                    if depth == 0 {
                        left_paren = Some(token);
                    } else {
                        in_parens.push(PipelineItem::Raw(token));
                    }
                    depth += 1;
                }
                PipelineItem::Raw(token) if token.kind == TokenKind::RParen => {
                    if depth == 0 {
                        return Err(self.error("unmatched right parentheses", &token));
                    }
                    depth -= 1;
                    if depth == 0 {
                        if in_parens.is_empty() {
                            return Err(
                                self.error("parentheses must contain an expression", &token)
                            );
                        }
                        let sub = self.reduce_expression(std::mem::take(&mut in_parens))?;
                        out.push(PipelineItem::Expr(sub));
                    } else {
                        in_parens.push(PipelineItem::Raw(token));
                    }
                }
                item => {
                    if depth > 0 {
                        in_parens.push(item);
                    } else {
                        out.push(item);
                    }
                }
            }
        }
        if depth > 0 {
            if let Some(token) = left_paren {
                return Err(self.error("unclosed parentheses", &token));
            }
        }
        Ok(out)
    }

    /// Apply the postfix operators `*`, `+` and `?`, folding a trailing `?` into the
    /// non-greedy variant.
    fn fold_quantifiers(
        &self,
        items: Vec<PipelineItem>,
    ) -> Result<Vec<PipelineItem>, GrammarError> {
        let mut out: Vec<PipelineItem> = Vec::new();
        let mut iter = items.into_iter().peekable();
        while let Some(item) = iter.next() {
            let token = match item {
                PipelineItem::Raw(token)
                    if matches!(
                        token.kind,
                        TokenKind::Star | TokenKind::Plus | TokenKind::QMark
                    ) =>
                {
                    token
                }
                other => {
                    out.push(other);
                    continue;
                }
            };
            let value = match out.pop() {
                Some(PipelineItem::Expr(expr)) => expr,
                _ => {
                    let symbol = match token.kind {
                        TokenKind::Star => "*",
                        TokenKind::Plus => "+",
                        _ => "?",
                    };
                    return Err(
                        self.error(&format!("{} must follow an expression", symbol), &token)
                    );
                }
            };
            let nongreedy =
                matches!(iter.peek(), Some(PipelineItem::Raw(t)) if t.kind == TokenKind::QMark);
            if nongreedy {
                iter.next();
            }
            let expr = match (token.kind, nongreedy) {
                (TokenKind::Star, false) => GrammarExpr::Star(Box::new(value)),
                (TokenKind::Star, true) => GrammarExpr::NongreedyStar(Box::new(value)),
                (TokenKind::Plus, false) => GrammarExpr::Plus(Box::new(value)),
                (TokenKind::Plus, true) => GrammarExpr::NongreedyPlus(Box::new(value)),
                (TokenKind::QMark, false) => GrammarExpr::Optional(Box::new(value)),
                (TokenKind::QMark, true) => GrammarExpr::NongreedyOptional(Box::new(value)),
                _ => unreachable!(),
            };
            out.push(PipelineItem::Expr(expr));
        }
        Ok(out)
    }

    /// Split a reduced rule body at `|` and decompose every group into an alternative.
    fn make_alternatives(
        &self,
        items: Vec<PipelineItem>,
    ) -> Result<Vec<Alternative>, GrammarError> {
        let mut groups: Vec<Vec<PipelineItem>> = vec![Vec::new()];
        let mut ors: Vec<GrammarToken> = Vec::new();
        for item in items {
            match item {
                PipelineItem::Raw(token) if token.kind == TokenKind::Or => {
                    if groups.last().map_or(true, Vec::is_empty) {
                        return Err(self.error("alternatives cannot be empty", &token));
                    }
                    groups.push(Vec::new());
                    ors.push(token);
                }
                other => {
                    if let Some(group) = groups.last_mut() {
                        group.push(other);
                    }
                }
            }
        }
        if groups.last().map_or(true, Vec::is_empty) {
            return Err(match ors.last() {
                Some(token) => self.error("alternatives cannot be empty", token),
                None => GrammarError::new("alternatives cannot be empty".to_string()),
            });
        }
        let mut alternatives = Vec::with_capacity(groups.len());
        for group in groups {
            alternatives.push(self.split_group(group)?);
        }
        let first_tag_at = alternatives
            .first()
            .and_then(|alt| alt.tag.as_ref())
            .map(|tag| tag.at);
        match first_tag_at {
            None => {
                for alt in alternatives.iter().skip(1) {
                    if let Some(tag) = &alt.tag {
                        return Err(
                            self.error("all or none of the alternatives should have tags", &tag.at)
                        );
                    }
                }
            }
            Some(at) => {
                for alt in alternatives.iter().skip(1) {
                    if alt.tag.is_none() {
                        return Err(
                            self.error("all or none of the alternatives should have tags", &at)
                        );
                    }
                }
            }
        }
        Ok(alternatives)
    }

    /// Decompose one alternative group: peel trailing tags, directives and the single
    /// code snippet, then the leading predicate; whatever remains is the value.
    fn split_group(&self, mut group: Vec<PipelineItem>) -> Result<Alternative, GrammarError> {
        let mut tag: Option<Tag> = None;
        let mut directives: Vec<Directive> = Vec::new();
        let mut code: Option<InlineCode> = None;
        let mut predicate: Option<Predicate> = None;
        loop {
            match group.last() {
                Some(PipelineItem::Tag(_)) => {
                    if let Some(existing) = &tag {
                        return Err(
                            self.error("alternatives cannot have multiple tags", &existing.at)
                        );
                    }
                    if let Some(PipelineItem::Tag(t)) = group.pop() {
                        tag = Some(t);
                    }
                }
                Some(PipelineItem::Directive(_)) => {
                    if let Some(PipelineItem::Directive(d)) = group.pop() {
                        directives.push(d);
                    }
                }
                Some(PipelineItem::Code(_)) => {
                    if let Some(existing) = &code {
                        return Err(self.error(
                            "alternatives can only have one code snippet",
                            &existing.token,
                        ));
                    }
                    if let Some(PipelineItem::Code(c)) = group.pop() {
                        code = Some(c);
                    }
                }
                _ => break,
            }
        }
        directives.reverse();
        if matches!(group.first(), Some(PipelineItem::Predicate(_))) {
            if let PipelineItem::Predicate(p) = group.remove(0) {
                predicate = Some(p);
            }
        }
        if group.is_empty() {
            let pointer = tag
                .as_ref()
                .map(|t| t.at)
                .or_else(|| code.as_ref().map(|c| c.token))
                .or_else(|| predicate.as_ref().map(|p| p.code.token))
                .or_else(|| directives.first().map(|d| d.bam));
            return Err(match pointer {
                Some(token) => self.error("alternatives cannot be empty", &token),
                None => GrammarError::new("alternatives cannot be empty".to_string()),
            });
        }
        let value = self.concat_group(group)?;
        Ok(Alternative {
            value,
            tag,
            directives,
            code,
            predicate,
        })
    }

    /// Reduce a body without the top-level alternative handling of rules: parentheses,
    /// quantifiers, then alternation.
    fn reduce_expression(&self, items: Vec<PipelineItem>) -> Result<GrammarExpr, GrammarError> {
        let items = self.fold_parentheses(items)?;
        let items = self.fold_quantifiers(items)?;
        let mut groups: Vec<Vec<PipelineItem>> = vec![Vec::new()];
        let mut ors: Vec<GrammarToken> = Vec::new();
        for item in items {
            match item {
                PipelineItem::Raw(token) if token.kind == TokenKind::Or => {
                    if groups.last().map_or(true, Vec::is_empty) {
                        return Err(self.error("alternatives cannot be empty", &token));
                    }
                    groups.push(Vec::new());
                    ors.push(token);
                }
                other => {
                    if let Some(group) = groups.last_mut() {
                        group.push(other);
                    }
                }
            }
        }
        if groups.last().map_or(true, Vec::is_empty) {
            return Err(match ors.last() {
                Some(token) => self.error("alternatives cannot be empty", token),
                None => GrammarError::new("alternatives cannot be empty".to_string()),
            });
        }
        let mut values = Vec::with_capacity(groups.len());
        for group in groups {
            values.push(self.concat_group(group)?);
        }
        Ok(if values.len() == 1 {
            values.remove(0)
        } else {
            GrammarExpr::Union(values)
        })
    }

    /// Turn a group of reduced items into a single expression, rejecting annotations
    /// that survived in expression position.
    fn concat_group(&self, group: Vec<PipelineItem>) -> Result<GrammarExpr, GrammarError> {
        let mut values = Vec::with_capacity(group.len());
        for item in group {
            match item {
                PipelineItem::Expr(expr) => values.push(expr),
                PipelineItem::Tag(t) => {
                    return Err(self.error("tags must be at the end of an alternative", &t.at))
                }
                PipelineItem::Directive(d) => {
                    return Err(
                        self.error("directives must be at the end of an alternative", &d.bam)
                    )
                }
                PipelineItem::Code(c) => {
                    return Err(self.error(
                        "code snippets must be at the end of an alternative",
                        &c.token,
                    ))
                }
                PipelineItem::Predicate(p) => {
                    return Err(self.error(
                        "predicates must be at the start of an alternative",
                        &p.code.token,
                    ))
                }
                PipelineItem::Raw(t) => return Err(self.error("unexpected token", &t)),
            }
        }
        Ok(if values.len() == 1 {
            values.remove(0)
        } else {
            GrammarExpr::Concat(values)
        })
    }

    /// Fold `@name` tags of a token body and extract the trailing tag and the leading
    /// predicate; code snippets are not valid anywhere in a token definition.
    fn extract_token_annotations(
        &self,
        items: Vec<PipelineItem>,
    ) -> Result<(Vec<PipelineItem>, Option<Tag>, Option<Predicate>), GrammarError> {
        let mut out: Vec<PipelineItem> = Vec::new();
        let mut iter = items.into_iter();
        while let Some(item) = iter.next() {
            match item {
                PipelineItem::Raw(token) if token.kind == TokenKind::At => {
                    match iter.next().and_then(PipelineItem::into_identifier) {
                        Some(name) => out.push(PipelineItem::Tag(Tag::new(name, token))),
                        None => {
                            return Err(self.error("@ must be followed by an identifier", &token))
                        }
                    }
                }
                other => out.push(other),
            }
        }
        let mut predicate: Option<Predicate> = None;
        if out.len() > 1
            && matches!(out.first(), Some(PipelineItem::Code(_)))
            && matches!(out.get(1), Some(PipelineItem::Raw(t)) if t.kind == TokenKind::QMark)
        {
            if let (PipelineItem::Code(code), PipelineItem::Raw(qmark)) =
                (out.remove(0), out.remove(0))
            {
                predicate = Some(Predicate::new(code, qmark));
            }
        }
        let mut tag: Option<Tag> = None;
        loop {
            match out.last() {
                Some(PipelineItem::Tag(_)) => {
                    if let Some(existing) = &tag {
                        return Err(self.error(
                            "token definitions cannot have multiple tags",
                            &existing.at,
                        ));
                    }
                    if let Some(PipelineItem::Tag(t)) = out.pop() {
                        tag = Some(t);
                    }
                }
                Some(PipelineItem::Code(code)) => {
                    return Err(self.error(
                        "token definitions cannot contain code snippets",
                        &code.token,
                    ))
                }
                _ => break,
            }
        }
        if out.is_empty() {
            let pointer = tag
                .as_ref()
                .map(|t| t.at)
                .or_else(|| predicate.as_ref().map(|p| p.code.token));
            return Err(match pointer {
                Some(token) => self.error("token definitions cannot be empty", &token),
                None => GrammarError::new("token definitions cannot be empty".to_string()),
            });
        }
        for item in &out {
            match item {
                PipelineItem::Tag(t) => {
                    return Err(self.error("tags must be at the end of token definitions", &t.at))
                }
                PipelineItem::Code(c) => {
                    return Err(
                        self.error("token definitions cannot contain code snippets", &c.token)
                    )
                }
                _ => {}
            }
        }
        Ok((out, tag, predicate))
    }
}
