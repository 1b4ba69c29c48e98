//! Pattern rules: prefix-anchored regular-expression matching
//!
//! Pattern matching is delegated to the regex crate; descriptors carry the
//! pattern text and the engine compiles it anchored at the start of the
//! content, case-insensitive when the method says so.
//!
//! The extracted value's shape follows the pattern's capture groups:
//! - no groups, or exactly one: a scalar (the capture when present,
//!   otherwise the whole match)
//! - two or more groups: an ordered list of the captured groups, with the
//!   full match dropped
//!
//! The consumed length is always the character length of the full match.

use super::{BuildError, CaseMode, RuleMatch, TokenValue};
use crate::dialex::descriptor::{self, Descriptor};
use regex::{Captures, Regex, RegexBuilder};

/// Compile a descriptor pattern anchored at the start of the content.
///
/// The pattern is wrapped in a non-capturing group so alternations anchor
/// as a whole and capture-group numbering is preserved.
pub(crate) fn compile_anchored(pattern: &str, mode: CaseMode) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!("^(?:{})", pattern))
        .case_insensitive(!mode.is_case_sensitive())
        .build()
}

/// Matches a prefix-anchored regular expression
#[derive(Debug, Clone)]
pub struct PatternRule {
    method: CaseMode,
    matcher: Regex,
    /// Secondary extraction pattern, applied at the same position as the
    /// match; when present it supplies the value while the match decides
    /// the consumed length
    extractor: Option<Regex>,
}

impl PatternRule {
    pub fn new(
        method: CaseMode,
        pattern: &str,
        extract: Option<&str>,
    ) -> Result<PatternRule, BuildError> {
        let matcher = compile_anchored(pattern, method).map_err(|_| BuildError::InvalidValue {
            field: "match".to_string(),
            expected: "regular expression".to_string(),
        })?;
        let extractor = match extract {
            Some(pattern) => {
                Some(compile_anchored(pattern, method).map_err(|_| BuildError::InvalidValue {
                    field: "extract".to_string(),
                    expected: "regular expression".to_string(),
                })?)
            }
            None => None,
        };
        Ok(PatternRule {
            method,
            matcher,
            extractor,
        })
    }

    pub(crate) fn from_descriptor(desc: &Descriptor) -> Result<PatternRule, BuildError> {
        let method = descriptor::case_mode_field(desc, "method", CaseMode::Literal)?;
        let matcher = descriptor::require(
            "match",
            descriptor::pattern_field(desc, "match", method, true)?,
        )?;
        let extractor = descriptor::pattern_field(desc, "extract", method, false)?;
        Ok(PatternRule {
            method,
            matcher,
            extractor,
        })
    }

    pub fn method(&self) -> CaseMode {
        self.method
    }

    /// Match the pattern against the start of `content`.
    pub fn apply(&self, content: &str) -> Option<RuleMatch> {
        let caps = self.matcher.captures(content)?;
        let full = caps.get(0)?;
        let length = full.as_str().chars().count();

        let value = match &self.extractor {
            Some(extractor) => match extractor.captures(content) {
                Some(extracted) => capture_value(&extracted),
                None => capture_value(&caps),
            },
            None => capture_value(&caps),
        };

        Some(RuleMatch { value, length })
    }
}

/// Shape the extracted value from a capture set.
fn capture_value(caps: &Captures<'_>) -> TokenValue {
    let group_text = |index: usize| caps.get(index).map_or("", |m| m.as_str()).to_string();

    match caps.len() {
        // No capture groups: the whole match
        1 => TokenValue::Scalar(group_text(0)),
        // A single group: the capture, falling back to the whole match
        // when the group did not participate
        2 => match caps.get(1) {
            Some(capture) => TokenValue::Scalar(capture.as_str().to_string()),
            None => TokenValue::Scalar(group_text(0)),
        },
        // Two or more groups: the ordered group list, full match dropped
        count => TokenValue::List((1..count).map(|i| TokenValue::Scalar(group_text(i))).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchored_at_start() {
        let rule = PatternRule::new(CaseMode::Literal, "[0-9]+", None).unwrap();
        assert!(rule.apply("123abc").is_some());
        assert!(rule.apply("abc123").is_none());
    }

    #[test]
    fn test_no_groups_yields_full_match() {
        let rule = PatternRule::new(CaseMode::Literal, "[0-9]+", None).unwrap();
        let found = rule.apply("42 apples").unwrap();
        assert_eq!(found.value, TokenValue::Scalar("42".to_string()));
        assert_eq!(found.length, 2);
    }

    #[test]
    fn test_single_group_yields_scalar() {
        let rule = PatternRule::new(CaseMode::Literal, r"([0-9]+)px", None).unwrap();
        let found = rule.apply("42px wide").unwrap();
        assert_eq!(found.value, TokenValue::Scalar("42".to_string()));
        // Length still covers the whole match
        assert_eq!(found.length, 4);
    }

    #[test]
    fn test_multiple_groups_yield_list() {
        let rule = PatternRule::new(CaseMode::Literal, r"([0-9]+)\.([0-9]+)", None).unwrap();
        let found = rule.apply("5.7 and later").unwrap();
        assert_eq!(
            found.value,
            TokenValue::List(vec![
                TokenValue::Scalar("5".to_string()),
                TokenValue::Scalar("7".to_string()),
            ])
        );
        assert_eq!(found.length, 3);
    }

    #[test]
    fn test_ignore_case_mode() {
        let rule = PatternRule::new(CaseMode::IgnoreCase, "select", None).unwrap();
        let found = rule.apply("SELECT 1").unwrap();
        assert_eq!(found.value, TokenValue::Scalar("SELECT".to_string()));

        let literal = PatternRule::new(CaseMode::Literal, "select", None).unwrap();
        assert!(literal.apply("SELECT 1").is_none());
    }

    #[test]
    fn test_alternation_anchors_as_a_whole() {
        let rule = PatternRule::new(CaseMode::Literal, "foo|bar", None).unwrap();
        assert!(rule.apply("bar none").is_some());
        assert!(rule.apply("embargo").is_none());
    }

    #[test]
    fn test_length_counts_characters() {
        let rule = PatternRule::new(CaseMode::Literal, r"[^\s]+", None).unwrap();
        let found = rule.apply("наружу out").unwrap();
        assert_eq!(found.length, 6);
    }

    #[test]
    fn test_extract_supplies_the_value() {
        let rule =
            PatternRule::new(CaseMode::Literal, r"'[^']*'", Some(r"'([^']*)'")).unwrap();
        let found = rule.apply("'quoted' rest").unwrap();
        assert_eq!(found.value, TokenValue::Scalar("quoted".to_string()));
        // Consumed length comes from the match pattern, quotes included
        assert_eq!(found.length, 8);
    }

    #[test]
    fn test_invalid_pattern_is_a_build_error() {
        assert!(matches!(
            PatternRule::new(CaseMode::Literal, "(unclosed", None),
            Err(BuildError::InvalidValue { .. })
        ));
    }
}
