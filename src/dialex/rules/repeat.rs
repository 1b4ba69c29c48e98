//! Repeat rules: bounded repetition of a body rule
//!
//! A repeat drives its body in a loop bounded by the parsed `[min, max]`
//! range. Between iterations (never before the first) the tokenizer, when
//! present, consumes separator text; unlike a sequence, a repeat keeps the
//! tokenizer's captures in its flattened output.
//!
//! A body failure stops the loop rather than failing outright; whether the
//! repeat succeeded is decided afterwards by checking the iteration count
//! against the bounds. `min = 0` lets zero iterations succeed with an
//! empty value list.

use super::{char_prefix_bytes, BuildError, RuleMatch, RuleRef, TokenValue};
use crate::dialex::descriptor::{self, Descriptor};
use crate::dialex::lexer::LexerContext;
use crate::dialex::range::Bound;

/// Applies a body rule repeatedly within parsed bounds
#[derive(Debug, Clone)]
pub struct RepeatRule {
    tokenizer: Option<RuleRef>,
    min: u32,
    max: Bound,
    body: RuleRef,
}

impl RepeatRule {
    pub fn new(
        min: u32,
        max: Bound,
        body: RuleRef,
        tokenizer: Option<RuleRef>,
    ) -> RepeatRule {
        RepeatRule {
            tokenizer,
            min,
            max,
            body,
        }
    }

    pub(crate) fn from_descriptor(desc: &Descriptor) -> Result<RepeatRule, BuildError> {
        let (min, max) =
            descriptor::require("repeat", descriptor::range_field(desc, "repeat", true)?)?;
        let body = descriptor::require("rule", descriptor::rule_field(desc, "rule", true)?)?;
        let tokenizer = descriptor::rule_field(desc, "tokenizer", false)?;
        Ok(RepeatRule::new(min, max, body, tokenizer))
    }

    pub fn bounds(&self) -> (u32, Bound) {
        (self.min, self.max)
    }

    pub fn apply(&self, content: &str, ctx: &mut LexerContext<'_>) -> Option<RuleMatch> {
        let mut values = Vec::new();
        let mut consumed = 0;
        let mut cursor = 0;
        let mut iterations: u32 = 0;

        loop {
            if let Bound::Finite(max) = self.max {
                if iterations >= max {
                    break;
                }
            }
            if cursor >= content.len() {
                break;
            }

            let round_start = consumed;

            if iterations > 0 {
                if let Some(tokenizer) = &self.tokenizer {
                    if let Some(gap) = tokenizer.apply(&content[cursor..], ctx) {
                        // A repeat keeps separator captures in its output
                        cursor += char_prefix_bytes(&content[cursor..], gap.length)
                            .unwrap_or(content.len() - cursor);
                        consumed += gap.length;
                        values.push(gap.value);
                    }
                }
            }

            let rest = &content[cursor..];
            let Some(found) = self.body.apply(rest, ctx) else {
                break;
            };
            cursor += char_prefix_bytes(rest, found.length).unwrap_or(rest.len());
            consumed += found.length;
            values.push(found.value);
            iterations += 1;

            // An iteration that consumed nothing would never stop an
            // unbounded repeat; end the loop once progress stalls.
            if consumed == round_start {
                break;
            }
        }

        let within_bounds = iterations >= self.min
            && match self.max {
                Bound::Finite(max) => iterations <= max,
                Bound::Unbounded => true,
            };

        within_bounds.then(|| RuleMatch {
            value: TokenValue::List(values),
            length: consumed,
        })
    }

    pub(crate) fn collect_named<'a>(&'a self, sink: &mut Vec<&'a str>) {
        if let Some(tokenizer) = &self.tokenizer {
            tokenizer.collect_named(sink);
        }
        self.body.collect_named(sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialex::lexer::Lexer;
    use crate::dialex::rules::Rule;
    use serde_json::json;

    fn lexer_with(name: &str, descriptor: serde_json::Value) -> Lexer {
        let mut lexer = Lexer::new();
        lexer.register_rule(name, Rule::build(&descriptor).unwrap());
        lexer
    }

    #[test]
    fn test_stops_at_max_iterations() {
        let mut lexer = lexer_with(
            "words",
            json!({
                "repeat": "1..4",
                "tokenizer": { "match": r"\s*" },
                "rule": { "match": "[a-zA-Z]+", "method": "ignore case" }
            }),
        );

        assert!(lexer.apply_rule("words", "The basics   are\tRules?").unwrap());
        // Four body matches plus the separator captures between them
        assert_eq!(
            lexer.tokens(),
            Some(
                &[
                    TokenValue::Scalar("The".to_string()),
                    TokenValue::Scalar(" ".to_string()),
                    TokenValue::Scalar("basics".to_string()),
                    TokenValue::Scalar("   ".to_string()),
                    TokenValue::Scalar("are".to_string()),
                    TokenValue::Scalar("\t".to_string()),
                    TokenValue::Scalar("Rules".to_string()),
                ][..]
            )
        );
        // Everything up to the question mark
        assert_eq!(lexer.source_length(), 22);
    }

    #[test]
    fn test_fails_when_min_unreachable() {
        let mut lexer = lexer_with(
            "words",
            json!({
                "repeat": "5..10",
                "tokenizer": { "match": r"\s*" },
                "rule": { "match": "[a-zA-Z]+", "method": "ignore case" }
            }),
        );

        // Only four matches available: below min, value cleared
        assert!(!lexer.apply_rule("words", "The basics   are\tRules?").unwrap());
        assert_eq!(lexer.tokens(), None);
        assert_eq!(lexer.source_length(), 0);
    }

    #[test]
    fn test_zero_min_allows_empty_success() {
        let mut lexer = lexer_with(
            "digits",
            json!({ "repeat": "0..3", "rule": { "match": "[0-9]+" } }),
        );

        assert!(lexer.apply_rule("digits", "no digits here").unwrap());
        assert_eq!(lexer.tokens(), Some(&[][..]));
        assert_eq!(lexer.source_length(), 0);
    }

    #[test]
    fn test_unbounded_repeat_consumes_all_matches() {
        let mut lexer = lexer_with(
            "list",
            json!({
                "repeat": "1..n",
                "tokenizer": { "match": r",\s*" },
                "rule": { "match": "[0-9]+" }
            }),
        );

        assert!(lexer.apply_rule("list", "1, 22, 333; rest").unwrap());
        assert_eq!(lexer.source_length(), 10);
    }

    #[test]
    fn test_without_tokenizer() {
        let mut lexer = lexer_with(
            "runs",
            json!({ "repeat": "2", "rule": { "match": "[a-z]+[0-9]" } }),
        );

        assert!(lexer.apply_rule("runs", "ab1cd2ef").unwrap());
        assert_eq!(lexer.source_length(), 6);
    }

    #[test]
    fn test_empty_body_match_cannot_livelock() {
        let mut lexer = lexer_with(
            "greedy",
            json!({ "repeat": "1..n", "rule": { "match": "[0-9]*" } }),
        );

        // The body matches the empty string forever; the stall guard must
        // end the loop after the first zero-length iteration.
        assert!(lexer.apply_rule("greedy", "abc").unwrap());
        assert_eq!(lexer.source_length(), 0);
    }

    #[test]
    fn test_exhausted_input_stops_the_loop() {
        let mut lexer = lexer_with(
            "words",
            json!({
                "repeat": "1..n",
                "tokenizer": { "match": r"\s+" },
                "rule": { "match": "[a-z]+" }
            }),
        );

        assert!(lexer.apply_rule("words", "one two").unwrap());
        assert_eq!(lexer.source_length(), 7);
    }

    #[test]
    fn test_missing_body_is_a_build_error() {
        assert!(matches!(
            Rule::build(&json!({ "repeat": "1..4" })),
            Err(BuildError::NodeNotFound(field)) if field == "rule"
        ));
    }
}
