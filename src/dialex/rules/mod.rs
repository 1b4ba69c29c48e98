//! The polymorphic rule model
//!
//! A `Rule` is the unit of matching: a keyword, a regex pattern, a grouped
//! alternation/sequence, or a bounded repetition. Rule trees are built once
//! from descriptors and are structurally immutable afterwards; application
//! is a plain recursive walk with an explicit context.
//!
//! Two contracts hold everywhere:
//! 1. Construction problems (wrong field type, missing field, empty group,
//!    bad regex, bad range text) are `BuildError`s, raised before any
//!    content is scanned.
//! 2. Ordinary non-match during application is `None`, never an error, so
//!    composing rules can probe alternatives without error-driven control
//!    flow.
//!
//! Sub-rules are either owned inline or referenced by name; named
//! references are resolved through the registry at apply time and never
//! duplicate the referenced rule.

pub mod group;
pub mod keyword;
pub mod pattern;
pub mod repeat;

pub use group::{GroupMode, GroupRule};
pub use keyword::KeywordRule;
pub use pattern::PatternRule;
pub use repeat::RepeatRule;

use crate::dialex::descriptor;
use crate::dialex::lexer::LexerContext;
use serde_json::Value;
use std::fmt;

/// Errors raised while building a rule from a descriptor
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// A required descriptor field is absent
    NodeNotFound(String),
    /// A descriptor field is present but not of the expected kind
    InvalidValue { field: String, expected: String },
    /// A rule value is neither a name, an inline descriptor, nor a rule
    RuleNotFound(String),
    /// The descriptor shape matches no rule type
    NoApplicableRule,
    /// A group descriptor has no members
    EmptyGroup,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::NodeNotFound(name) => {
                write!(f, "Required descriptor field not found: {}", name)
            }
            BuildError::InvalidValue { field, expected } => {
                write!(f, "Invalid value for {}: expected {}", field, expected)
            }
            BuildError::RuleNotFound(value) => {
                write!(f, "Cannot resolve rule value: {}", value)
            }
            BuildError::NoApplicableRule => {
                write!(f, "Descriptor shape matches no rule type")
            }
            BuildError::EmptyGroup => write!(f, "Group rule has no members"),
        }
    }
}

impl std::error::Error for BuildError {}

/// How a matching method treats letter case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMode {
    /// Match exactly as written
    Literal,
    /// Fold case on both sides before comparing
    IgnoreCase,
}

impl CaseMode {
    /// The descriptor spellings of the two modes
    pub(crate) const NAMES: [&'static str; 2] = ["literal", "ignore case"];

    pub fn is_case_sensitive(&self) -> bool {
        matches!(self, CaseMode::Literal)
    }

    pub(crate) fn from_name(name: &str) -> Option<CaseMode> {
        match name {
            "literal" => Some(CaseMode::Literal),
            "ignore case" => Some(CaseMode::IgnoreCase),
            _ => None,
        }
    }
}

/// An extracted match value: a scalar string or an ordered list of values
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Scalar(String),
    List(Vec<TokenValue>),
}

impl TokenValue {
    /// The scalar text, if this value is a scalar
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            TokenValue::Scalar(text) => Some(text),
            TokenValue::List(_) => None,
        }
    }

    /// View this value as a token list: a list yields its items, a scalar
    /// yields itself as the only item.
    pub fn into_items(self) -> Vec<TokenValue> {
        match self {
            TokenValue::List(items) => items,
            scalar => vec![scalar],
        }
    }

    /// Convert to a JSON value for the nested result store
    pub fn to_json(&self) -> Value {
        match self {
            TokenValue::Scalar(text) => Value::String(text.clone()),
            TokenValue::List(items) => Value::Array(items.iter().map(TokenValue::to_json).collect()),
        }
    }
}

impl From<&str> for TokenValue {
    fn from(text: &str) -> Self {
        TokenValue::Scalar(text.to_string())
    }
}

/// A successful rule application: the extracted value and the number of
/// characters consumed from the input
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub value: TokenValue,
    pub length: usize,
}

/// A sub-rule slot: owned inline, or a non-owning reference into the
/// registry, resolved at apply time
#[derive(Debug, Clone)]
pub enum RuleRef {
    Inline(Box<Rule>),
    Named(String),
}

impl RuleRef {
    /// Apply the referenced rule. An unresolvable name is a non-match;
    /// loader-built registries validate all names before any application.
    pub fn apply(&self, content: &str, ctx: &mut LexerContext<'_>) -> Option<RuleMatch> {
        match self {
            RuleRef::Inline(rule) => rule.apply(content, ctx),
            RuleRef::Named(name) => match ctx.rule(name) {
                Some(rule) => rule.apply(content, ctx),
                None => {
                    debug_assert!(false, "unresolved rule reference: {}", name);
                    None
                }
            },
        }
    }

    pub(crate) fn collect_named<'a>(&'a self, sink: &mut Vec<&'a str>) {
        match self {
            RuleRef::Inline(rule) => rule.collect_named(sink),
            RuleRef::Named(name) => sink.push(name),
        }
    }
}

/// The variant-specific part of a rule
#[derive(Debug, Clone)]
pub enum RuleKind {
    Keyword(KeywordRule),
    Pattern(PatternRule),
    Group(GroupRule),
    Repeat(RepeatRule),
}

/// A matching rule: variant behaviour plus the fields common to all
/// variants
#[derive(Debug, Clone)]
pub struct Rule {
    starter: bool,
    path: Option<String>,
    kind: RuleKind,
}

impl Rule {
    /// Wrap a variant with default common fields.
    pub fn new(kind: RuleKind) -> Rule {
        Rule {
            starter: false,
            path: None,
            kind,
        }
    }

    /// Mark this rule as eligible to start a larger sequence.
    pub fn with_starter(mut self, starter: bool) -> Rule {
        self.starter = starter;
        self
    }

    /// Attach a result-path fragment pushed around this rule's application.
    pub fn with_path(mut self, fragment: impl Into<String>) -> Result<Rule, BuildError> {
        let fragment = fragment.into();
        validate_path_fragment(&fragment)?;
        self.path = Some(fragment);
        Ok(self)
    }

    /// Build a rule from a descriptor.
    ///
    /// Dispatches on descriptor shape: `keyword` means a keyword rule,
    /// `match` (without `group`) a pattern rule, `group` a grouped rule,
    /// `repeat` a repetition. Anything else is `NoApplicableRule`.
    pub fn build(value: &Value) -> Result<Rule, BuildError> {
        let desc = value.as_object().ok_or(BuildError::NoApplicableRule)?;

        let kind = if desc.contains_key("keyword") {
            RuleKind::Keyword(KeywordRule::from_descriptor(desc)?)
        } else if desc.contains_key("match") && !desc.contains_key("group") {
            RuleKind::Pattern(PatternRule::from_descriptor(desc)?)
        } else if desc.contains_key("group") {
            RuleKind::Group(GroupRule::from_descriptor(desc)?)
        } else if desc.contains_key("repeat") {
            RuleKind::Repeat(RepeatRule::from_descriptor(desc)?)
        } else {
            return Err(BuildError::NoApplicableRule);
        };

        let starter = descriptor::bool_field(desc, "starter", false, false)?;
        let path = descriptor::string_field(desc, "path", None, true, false)?;
        if let Some(fragment) = &path {
            validate_path_fragment(fragment)?;
        }

        Ok(Rule {
            starter,
            path,
            kind,
        })
    }

    pub fn is_starter(&self) -> bool {
        self.starter
    }

    /// Case sensitivity follows the variant's matching method; composed
    /// rules report sensitive, their members carry their own modes.
    pub fn is_case_sensitive(&self) -> bool {
        match &self.kind {
            RuleKind::Keyword(rule) => rule.method().is_case_sensitive(),
            RuleKind::Pattern(rule) => rule.method().is_case_sensitive(),
            RuleKind::Group(_) | RuleKind::Repeat(_) => true,
        }
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    /// Apply this rule to the given content.
    ///
    /// `None` is an ordinary non-match. When the rule carries a path
    /// fragment, the fragment is pushed for the duration of the
    /// application and the extracted value is stored at the resulting
    /// path on success.
    pub fn apply(&self, content: &str, ctx: &mut LexerContext<'_>) -> Option<RuleMatch> {
        match &self.path {
            Some(fragment) => {
                let entered = ctx.enter_path(fragment);
                let outcome = self.apply_kind(content, ctx);
                if let Some(found) = &outcome {
                    ctx.record(&found.value);
                }
                if entered {
                    ctx.leave_path();
                }
                outcome
            }
            None => self.apply_kind(content, ctx),
        }
    }

    fn apply_kind(&self, content: &str, ctx: &mut LexerContext<'_>) -> Option<RuleMatch> {
        match &self.kind {
            RuleKind::Keyword(rule) => rule.apply(content),
            RuleKind::Pattern(rule) => rule.apply(content),
            RuleKind::Group(rule) => rule.apply(content, ctx),
            RuleKind::Repeat(rule) => rule.apply(content, ctx),
        }
    }

    /// Collect every named reference reachable from this rule.
    pub(crate) fn collect_named<'a>(&'a self, sink: &mut Vec<&'a str>) {
        match &self.kind {
            RuleKind::Keyword(_) | RuleKind::Pattern(_) => {}
            RuleKind::Group(rule) => rule.collect_named(sink),
            RuleKind::Repeat(rule) => rule.collect_named(sink),
        }
    }
}

fn validate_path_fragment(fragment: &str) -> Result<(), BuildError> {
    let stored = fragment.strip_prefix(crate::dialex::data::PATH_SEPARATOR).unwrap_or(fragment);
    if stored.is_empty() {
        return Err(BuildError::InvalidValue {
            field: "path".to_string(),
            expected: "non-empty path fragment".to_string(),
        });
    }
    Ok(())
}

/// Byte length of the first `chars` characters of `text`, or `None` when
/// the text is shorter. Consumption is counted in characters but slicing
/// needs byte offsets.
pub(crate) fn char_prefix_bytes(text: &str, chars: usize) -> Option<usize> {
    if chars == 0 {
        return Some(0);
    }
    let mut seen = 0;
    for (index, ch) in text.char_indices() {
        seen += 1;
        if seen == chars {
            return Some(index + ch.len_utf8());
        }
    }
    None
}
