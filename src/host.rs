use crate::{BaseHost, Lex, TagAction, TokenizerHost};

impl TokenizerHost for BaseHost {
    fn handle_tag(&self, tag: &str, token: Lex) -> TagAction {
        if tag == "ignore" {
            TagAction::Discard
        } else {
            TagAction::Keep(token)
        }
    }
}
