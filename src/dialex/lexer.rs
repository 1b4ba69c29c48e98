//! The lexer: rule registry, application front end, and shared context
//!
//! A `Lexer` owns the named rules of one grammar together with the mutable
//! session state (`LexerData` and the nested result store). Rule
//! application threads a `LexerContext` through the recursive walk instead
//! of reaching for ambient state: the context resolves named references
//! against the registry and mediates path pushes and result writes.
//!
//! One lexer serves one caller at a time. Rules never outlive their
//! registry, and named references borrow registry entries rather than
//! cloning them.

use crate::dialex::data::{LexerData, NestedStore};
use crate::dialex::rules::{Rule, RuleMatch, TokenValue};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Errors raised by the lexer front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexerError {
    /// The requested rule is not registered
    UnknownRule(String),
    /// `tokenize` was called but no main rule is configured
    NoMainRule,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexerError::UnknownRule(name) => write!(f, "Unknown rule: {}", name),
            LexerError::NoMainRule => write!(f, "No main rule configured"),
        }
    }
}

impl std::error::Error for LexerError {}

/// Shared state threaded through a recursive rule application
pub struct LexerContext<'a> {
    rules: &'a HashMap<String, Rule>,
    data: &'a mut LexerData,
    store: &'a mut NestedStore,
}

impl<'a> LexerContext<'a> {
    /// Resolve a named rule against the registry.
    pub fn rule(&self, name: &str) -> Option<&'a Rule> {
        self.rules.get(name)
    }

    /// Push a path fragment and retarget the store. Returns whether the
    /// push took effect; fragments are validated non-empty at build time.
    pub(crate) fn enter_path(&mut self, fragment: &str) -> bool {
        let pushed = self.data.push_path(fragment).is_ok();
        debug_assert!(pushed, "rule paths are validated at build time");
        if pushed {
            self.store.set_base(self.data.current_path());
        }
        pushed
    }

    /// Pop the most recent fragment and retarget the store.
    pub(crate) fn leave_path(&mut self) {
        self.data.pop_path();
        self.store.set_base(self.data.current_path());
    }

    /// Write an extracted value at the current base path.
    pub(crate) fn record(&mut self, value: &TokenValue) {
        self.store.store(value);
    }
}

/// Rule registry and application front end for one grammar
#[derive(Debug, Clone, Default)]
pub struct Lexer {
    rules: HashMap<String, Rule>,
    data: LexerData,
    store: NestedStore,
}

impl Lexer {
    pub fn new() -> Lexer {
        Lexer::default()
    }

    /// Register a rule under a name. A later registration under the same
    /// name replaces the earlier one.
    pub fn register_rule(&mut self, name: impl Into<String>, rule: Rule) {
        self.rules.insert(name.into(), rule);
    }

    /// Look up a registered rule.
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn set_main_rule(&mut self, name: impl Into<String>) {
        self.data.set_main_rule(name);
    }

    /// Apply a registered rule to the content.
    ///
    /// Ordinary non-match is `Ok(false)` with the token list and consumed
    /// length cleared; only an unknown rule name is an error. On a match
    /// the outcome settles into the lexer data.
    pub fn apply_rule(&mut self, name: &str, content: &str) -> Result<bool, LexerError> {
        let rule = self
            .rules
            .get(name)
            .ok_or_else(|| LexerError::UnknownRule(name.to_string()))?;

        let mut ctx = LexerContext {
            rules: &self.rules,
            data: &mut self.data,
            store: &mut self.store,
        };
        let outcome = rule.apply(content, &mut ctx);

        self.data.record_outcome(outcome.as_ref());
        Ok(outcome.is_some())
    }

    /// Apply an unregistered rule (e.g. a freshly built descriptor tree)
    /// against this lexer's registry and data.
    pub fn apply(&mut self, rule: &Rule, content: &str) -> Option<RuleMatch> {
        let mut ctx = LexerContext {
            rules: &self.rules,
            data: &mut self.data,
            store: &mut self.store,
        };
        let outcome = rule.apply(content, &mut ctx);
        self.data.record_outcome(outcome.as_ref());
        outcome
    }

    /// Drive the main rule over the content.
    pub fn tokenize(&mut self, content: &str) -> Result<bool, LexerError> {
        let name = self
            .data
            .main_rule()
            .ok_or(LexerError::NoMainRule)?
            .to_string();
        self.apply_rule(&name, content)
    }

    /// Token list of the last successful application.
    pub fn tokens(&self) -> Option<&[TokenValue]> {
        self.data.tokens()
    }

    /// Characters consumed by the last successful application.
    pub fn source_length(&self) -> usize {
        self.data.source_length()
    }

    /// The nested tree of values extracted through rule paths.
    pub fn extracted(&self) -> &Value {
        self.store.values()
    }

    pub fn data(&self) -> &LexerData {
        &self.data
    }

    /// Clear session state (outcome, path stack, extracted values); the
    /// registered rules and main-rule name stay.
    pub fn reset(&mut self) {
        let main_rule = self.data.main_rule().map(str::to_string);
        self.data = LexerData::new();
        if let Some(name) = main_rule {
            self.data.set_main_rule(name);
        }
        self.store.clear();
    }

    /// The first named reference (from any registered rule or the main
    /// rule) that does not resolve, if any. Loaders use this to fail fast
    /// before any content is scanned.
    pub fn first_unresolved_reference(&self) -> Option<String> {
        if let Some(main) = self.data.main_rule() {
            if !self.rules.contains_key(main) {
                return Some(main.to_string());
            }
        }
        for rule in self.rules.values() {
            let mut named = Vec::new();
            rule.collect_named(&mut named);
            for name in named {
                if !self.rules.contains_key(name) {
                    return Some(name.to_string());
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_rule_is_an_error() {
        let mut lexer = Lexer::new();
        assert_eq!(
            lexer.apply_rule("missing", "content"),
            Err(LexerError::UnknownRule("missing".to_string()))
        );
    }

    #[test]
    fn test_non_match_is_not_an_error() {
        let mut lexer = Lexer::new();
        lexer.register_rule("verb", Rule::build(&json!({ "keyword": "DROP" })).unwrap());

        assert_eq!(lexer.apply_rule("verb", "CREATE TABLE"), Ok(false));
        assert_eq!(lexer.tokens(), None);
        assert_eq!(lexer.source_length(), 0);
    }

    #[test]
    fn test_outcome_settles_into_data() {
        let mut lexer = Lexer::new();
        lexer.register_rule("verb", Rule::build(&json!({ "keyword": "DROP" })).unwrap());

        assert_eq!(lexer.apply_rule("verb", "DROP TABLE"), Ok(true));
        assert_eq!(
            lexer.tokens(),
            Some(&[TokenValue::Scalar("DROP".to_string())][..])
        );
        assert_eq!(lexer.source_length(), 4);
    }

    #[test]
    fn test_tokenize_requires_a_main_rule() {
        let mut lexer = Lexer::new();
        assert_eq!(lexer.tokenize("anything"), Err(LexerError::NoMainRule));

        lexer.register_rule("verb", Rule::build(&json!({ "keyword": "DROP" })).unwrap());
        lexer.set_main_rule("verb");
        assert_eq!(lexer.tokenize("DROP TABLE"), Ok(true));
    }

    #[test]
    fn test_rule_paths_fill_the_store() {
        let mut lexer = Lexer::new();
        lexer.register_rule(
            "statement",
            Rule::build(&json!({
                "method": "sequence",
                "tokenizer": { "match": r"\s+" },
                "path": "statement",
                "group": [
                    { "keyword": "DROP", "path": "verb" },
                    { "keyword": "TABLE", "path": "object" },
                ]
            }))
            .unwrap(),
        );

        assert_eq!(lexer.apply_rule("statement", "DROP TABLE t"), Ok(true));
        assert_eq!(
            lexer.extracted(),
            &json!({
                "statement": {
                    "verb": "DROP",
                    "object": "TABLE",
                }
            })
        );
    }

    #[test]
    fn test_reset_keeps_rules_and_main() {
        let mut lexer = Lexer::new();
        lexer.register_rule("verb", Rule::build(&json!({ "keyword": "DROP" })).unwrap());
        lexer.set_main_rule("verb");
        lexer.tokenize("DROP").unwrap();

        lexer.reset();
        assert_eq!(lexer.tokens(), None);
        assert_eq!(lexer.extracted(), &json!({}));
        assert_eq!(lexer.tokenize("DROP"), Ok(true));
    }

    #[test]
    fn test_first_unresolved_reference() {
        let mut lexer = Lexer::new();
        lexer.register_rule(
            "statement",
            Rule::build(&json!({
                "method": "case",
                "group": ["verb", { "keyword": "TABLE" }]
            }))
            .unwrap(),
        );

        assert_eq!(
            lexer.first_unresolved_reference(),
            Some("verb".to_string())
        );

        lexer.register_rule("verb", Rule::build(&json!({ "keyword": "DROP" })).unwrap());
        assert_eq!(lexer.first_unresolved_reference(), None);
    }
}
