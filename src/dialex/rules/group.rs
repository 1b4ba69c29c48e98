//! Group rules: ordered alternation and tokenizer-separated sequences
//!
//! A group composes sub-rules in one of two modes:
//!
//! - `case`: members are tried in descriptor order and the first success
//!   wins. Ordered alternation, not longest-match.
//! - `sequence`: every member must match in order. Between members (never
//!   before the first) the tokenizer, when present, consumes separator
//!   text; its match is excluded from the composed value, only its length
//!   counts.
//!
//! Members and tokenizer are rule entries: inline descriptors build owned
//! rules, strings reference registry entries.

use super::{char_prefix_bytes, BuildError, RuleMatch, RuleRef, TokenValue};
use crate::dialex::descriptor::{self, Descriptor};
use crate::dialex::lexer::LexerContext;

/// How a group composes its members
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMode {
    /// Ordered alternation, first success wins
    Case,
    /// All members in order, tokenizer-separated
    Sequence,
}

/// Composes sub-rules by alternation or sequencing
#[derive(Debug, Clone)]
pub struct GroupRule {
    mode: GroupMode,
    tokenizer: Option<RuleRef>,
    members: Vec<RuleRef>,
}

impl GroupRule {
    /// A group with no members signals a malformed grammar, not a parse
    /// miss, and is rejected here.
    pub fn new(
        mode: GroupMode,
        members: Vec<RuleRef>,
        tokenizer: Option<RuleRef>,
    ) -> Result<GroupRule, BuildError> {
        if members.is_empty() {
            return Err(BuildError::EmptyGroup);
        }
        Ok(GroupRule {
            mode,
            tokenizer,
            members,
        })
    }

    pub(crate) fn from_descriptor(desc: &Descriptor) -> Result<GroupRule, BuildError> {
        let mode = match descriptor::require(
            "method",
            descriptor::enum_field(desc, "method", &["case", "sequence"], None, true)?,
        )?
        .as_str()
        {
            "case" => GroupMode::Case,
            _ => GroupMode::Sequence,
        };

        let entries = descriptor::require("group", descriptor::array_field(desc, "group", true)?)?;
        let members = entries
            .iter()
            .map(descriptor::rule_entry)
            .collect::<Result<Vec<_>, _>>()?;
        let tokenizer = descriptor::rule_field(desc, "tokenizer", false)?;

        GroupRule::new(mode, members, tokenizer)
    }

    pub fn mode(&self) -> GroupMode {
        self.mode
    }

    pub fn members(&self) -> &[RuleRef] {
        &self.members
    }

    pub fn apply(&self, content: &str, ctx: &mut LexerContext<'_>) -> Option<RuleMatch> {
        match self.mode {
            GroupMode::Case => self.apply_case(content, ctx),
            GroupMode::Sequence => self.apply_sequence(content, ctx),
        }
    }

    /// First member to match decides value and length, passed through
    /// unwrapped.
    fn apply_case(&self, content: &str, ctx: &mut LexerContext<'_>) -> Option<RuleMatch> {
        self.members
            .iter()
            .find_map(|member| member.apply(content, ctx))
    }

    /// Every member must match in order; any member failing fails the
    /// whole sequence with nothing recorded.
    fn apply_sequence(&self, content: &str, ctx: &mut LexerContext<'_>) -> Option<RuleMatch> {
        let mut values = Vec::with_capacity(self.members.len());
        let mut consumed = 0;
        let mut cursor = 0;

        for (index, member) in self.members.iter().enumerate() {
            if index > 0 {
                if let Some(tokenizer) = &self.tokenizer {
                    if let Some(gap) = tokenizer.apply(&content[cursor..], ctx) {
                        // Separator text is consumed but not collected
                        cursor += char_prefix_bytes(&content[cursor..], gap.length)
                            .unwrap_or(content.len() - cursor);
                        consumed += gap.length;
                    }
                }
            }

            let rest = &content[cursor..];
            let found = member.apply(rest, ctx)?;
            cursor += char_prefix_bytes(rest, found.length).unwrap_or(rest.len());
            consumed += found.length;
            values.push(found.value);
        }

        Some(RuleMatch {
            value: TokenValue::List(values),
            length: consumed,
        })
    }

    pub(crate) fn collect_named<'a>(&'a self, sink: &mut Vec<&'a str>) {
        if let Some(tokenizer) = &self.tokenizer {
            tokenizer.collect_named(sink);
        }
        for member in &self.members {
            member.collect_named(sink);
        }
    }
}
