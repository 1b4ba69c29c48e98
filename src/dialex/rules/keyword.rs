//! Keyword rules: fixed-literal prefix matching
//!
//! The simplest rule variant. A keyword either is or is not the prefix of
//! the content; the extracted value is the original-case slice of the
//! content, not the descriptor's spelling, so `select` against a keyword
//! `SELECT` under `ignore case` yields `select`.

use super::{char_prefix_bytes, BuildError, CaseMode, RuleMatch, TokenValue};
use crate::dialex::descriptor::{self, Descriptor};

/// Matches a fixed literal prefix
#[derive(Debug, Clone)]
pub struct KeywordRule {
    method: CaseMode,
    keyword: String,
    /// Case-folded spelling, precomputed for `ignore case` comparisons
    folded: String,
}

impl KeywordRule {
    pub fn new(method: CaseMode, keyword: impl Into<String>) -> Result<KeywordRule, BuildError> {
        let keyword = keyword.into();
        if keyword.is_empty() {
            return Err(BuildError::InvalidValue {
                field: "keyword".to_string(),
                expected: "non-empty keyword".to_string(),
            });
        }
        let folded = keyword.to_lowercase();
        Ok(KeywordRule {
            method,
            keyword,
            folded,
        })
    }

    pub(crate) fn from_descriptor(desc: &Descriptor) -> Result<KeywordRule, BuildError> {
        let method = descriptor::case_mode_field(desc, "method", CaseMode::IgnoreCase)?;
        let keyword = descriptor::require(
            "keyword",
            descriptor::string_field(desc, "keyword", None, false, true)?,
        )?;
        KeywordRule::new(method, keyword)
    }

    pub fn method(&self) -> CaseMode {
        self.method
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Match the keyword against the start of `content`.
    pub fn apply(&self, content: &str) -> Option<RuleMatch> {
        let length = self.keyword.chars().count();
        let end = char_prefix_bytes(content, length)?;
        let slice = &content[..end];

        let hit = match self.method {
            CaseMode::Literal => slice == self.keyword,
            CaseMode::IgnoreCase => slice.to_lowercase() == self.folded,
        };

        hit.then(|| RuleMatch {
            value: TokenValue::Scalar(slice.to_string()),
            length,
        })
    }
}
