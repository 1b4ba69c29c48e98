//! Typed access to untyped rule descriptors
//!
//! A descriptor is a `serde_json` object describing a rule's configuration.
//! This module contains the typed accessors all rule variants parse their
//! fields through. The policy is uniform across accessors:
//!
//! - key absent and required: `NodeNotFound`
//! - key absent and not required: the caller's default
//! - key present with the wrong type (or null where null isn't allowed):
//!   `InvalidValue` naming the expected kind
//!
//! The regex and range accessors are thin wrappers that fold compile/parse
//! failures into `InvalidValue`. The rule accessor turns a string into a
//! named reference and a nested object into a freshly built inline rule; it
//! never touches the registry (named references resolve at apply time).

use crate::dialex::range::{self, Bound};
use crate::dialex::rules::{pattern, BuildError, CaseMode, Rule, RuleRef};
use regex::Regex;
use serde_json::Value;

/// An untyped rule descriptor: a JSON object of configuration fields
pub type Descriptor = serde_json::Map<String, Value>;

fn missing(name: &str) -> BuildError {
    BuildError::NodeNotFound(name.to_string())
}

fn invalid(name: &str, expected: &str) -> BuildError {
    BuildError::InvalidValue {
        field: name.to_string(),
        expected: expected.to_string(),
    }
}

/// Unwrap an accessor result for a field that was requested as required.
pub(crate) fn require<T>(name: &str, value: Option<T>) -> Result<T, BuildError> {
    value.ok_or_else(|| missing(name))
}

/// Read a boolean field.
pub fn bool_field(
    desc: &Descriptor,
    name: &str,
    default: bool,
    required: bool,
) -> Result<bool, BuildError> {
    match desc.get(name) {
        None if required => Err(missing(name)),
        None => Ok(default),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(_) => Err(invalid(name, "boolean")),
    }
}

/// Read a string field.
///
/// A null value is accepted (and reads as "no value") only when `nullable`.
pub fn string_field(
    desc: &Descriptor,
    name: &str,
    default: Option<&str>,
    nullable: bool,
    required: bool,
) -> Result<Option<String>, BuildError> {
    match desc.get(name) {
        None if required => Err(missing(name)),
        None => Ok(default.map(str::to_string)),
        Some(Value::Null) if nullable => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(invalid(name, "string")),
    }
}

/// Read a string field constrained to a fixed set of spellings.
pub fn enum_field(
    desc: &Descriptor,
    name: &str,
    allowed: &[&str],
    default: Option<&str>,
    required: bool,
) -> Result<Option<String>, BuildError> {
    match string_field(desc, name, default, false, required)? {
        Some(value) if allowed.contains(&value.as_str()) => Ok(Some(value)),
        Some(_) => Err(invalid(name, &format!("one of: {}", allowed.join(", ")))),
        None => Ok(None),
    }
}

/// Read a case-mode field (`"literal"` or `"ignore case"`).
pub fn case_mode_field(
    desc: &Descriptor,
    name: &str,
    default: CaseMode,
) -> Result<CaseMode, BuildError> {
    let value = enum_field(desc, name, &CaseMode::NAMES, None, false)?;
    Ok(match value.as_deref() {
        Some(name) => CaseMode::from_name(name).unwrap_or(default),
        None => default,
    })
}

/// Read an array field.
pub fn array_field<'a>(
    desc: &'a Descriptor,
    name: &str,
    required: bool,
) -> Result<Option<&'a Vec<Value>>, BuildError> {
    match desc.get(name) {
        None if required => Err(missing(name)),
        None => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(_) => Err(invalid(name, "array")),
    }
}

/// Read a regular-expression field, compiled prefix-anchored with the given
/// case mode. Compile failure is an `InvalidValue`.
pub fn pattern_field(
    desc: &Descriptor,
    name: &str,
    mode: CaseMode,
    required: bool,
) -> Result<Option<Regex>, BuildError> {
    match string_field(desc, name, None, true, required)? {
        Some(text) => pattern::compile_anchored(&text, mode)
            .map(Some)
            .map_err(|_| invalid(name, "regular expression")),
        None => Ok(None),
    }
}

/// Read a repetition-bound field. Parse failure is an `InvalidValue`.
pub fn range_field(
    desc: &Descriptor,
    name: &str,
    required: bool,
) -> Result<Option<(u32, Bound)>, BuildError> {
    match string_field(desc, name, None, false, required)? {
        Some(text) => range::parse(&text)
            .map(Some)
            .map_err(|_| invalid(name, "repetition range")),
        None => Ok(None),
    }
}

/// Read a rule field: a string names a registry entry, a nested object is
/// built into a fresh inline rule. A null value reads as "no rule".
pub fn rule_field(
    desc: &Descriptor,
    name: &str,
    required: bool,
) -> Result<Option<RuleRef>, BuildError> {
    match desc.get(name) {
        None if required => Err(missing(name)),
        None | Some(Value::Null) => Ok(None),
        Some(value) => rule_entry(value).map(Some),
    }
}

/// Convert a single rule entry (string reference or inline descriptor) into
/// a `RuleRef`. Anything else is an unresolvable rule value.
pub fn rule_entry(value: &Value) -> Result<RuleRef, BuildError> {
    match value {
        Value::String(name) => Ok(RuleRef::Named(name.clone())),
        Value::Object(_) => Rule::build(value).map(|rule| RuleRef::Inline(Box::new(rule))),
        other => Err(BuildError::RuleNotFound(other.to_string())),
    }
}
