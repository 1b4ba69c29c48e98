//! Lexer data: application outcome, path stack, and the nested result store
//!
//! `LexerData` is the mutable sink of one lexing session. It records the
//! outcome of the last driven rule (token list and consumed length), the
//! name of the main rule, and the path stack that addresses where extracted
//! values land in the nested result.
//!
//! The path stack is a LIFO of pushed fragments. Its dot-joined projection
//! is the active write base of the nested store and is recomputed on every
//! push and pop. A fragment may itself contain interior dots; those
//! segments are flattened into the join. A fragment starting with the
//! reserved `.` marker clears the stack first, defining a new absolute base
//! instead of extending the current one.
//!
//! `NestedStore` is the hierarchical result structure: values are written
//! at the current base, intermediate objects are created on demand, and
//! callers read the whole tree back as JSON.

use crate::dialex::rules::{RuleMatch, TokenValue};
use serde_json::Value;
use std::fmt;

/// The reserved path separator and rebase marker
pub const PATH_SEPARATOR: char = '.';

/// Errors raised by path-stack mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// An empty fragment was pushed
    EmptyPath,
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::EmptyPath => write!(f, "Cannot push an empty path fragment"),
        }
    }
}

impl std::error::Error for DataError {}

/// Mutable sink of one lexing session
#[derive(Debug, Clone, Default)]
pub struct LexerData {
    tokens: Option<Vec<TokenValue>>,
    source_length: usize,
    main_rule: Option<String>,
    path_stack: Vec<String>,
}

impl LexerData {
    pub fn new() -> LexerData {
        LexerData::default()
    }

    /// The token list of the last successful application, if any
    pub fn tokens(&self) -> Option<&[TokenValue]> {
        self.tokens.as_deref()
    }

    /// Characters consumed by the last successful application
    pub fn source_length(&self) -> usize {
        self.source_length
    }

    pub fn main_rule(&self) -> Option<&str> {
        self.main_rule.as_deref()
    }

    pub fn set_main_rule(&mut self, name: impl Into<String>) {
        self.main_rule = Some(name.into());
    }

    /// Record the outcome of a driven rule: a match settles into the token
    /// list and consumed length, a non-match clears both.
    pub(crate) fn record_outcome(&mut self, outcome: Option<&RuleMatch>) {
        match outcome {
            Some(found) => {
                self.tokens = Some(found.value.clone().into_items());
                self.source_length = found.length;
            }
            None => {
                self.tokens = None;
                self.source_length = 0;
            }
        }
    }

    /// Push a path fragment.
    ///
    /// An empty fragment is rejected. A fragment starting with the
    /// reserved `.` marker clears all previously pushed fragments and is
    /// stored with the marker stripped.
    pub fn push_path(&mut self, fragment: &str) -> Result<(), DataError> {
        if fragment.is_empty() {
            return Err(DataError::EmptyPath);
        }
        match fragment.strip_prefix(PATH_SEPARATOR) {
            Some(rebased) => {
                if rebased.is_empty() {
                    return Err(DataError::EmptyPath);
                }
                self.path_stack.clear();
                self.path_stack.push(rebased.to_string());
            }
            None => self.path_stack.push(fragment.to_string()),
        }
        Ok(())
    }

    /// Remove the most recent fragment. Popping an empty stack is a no-op.
    pub fn pop_path(&mut self) {
        self.path_stack.pop();
    }

    /// The dot-joined projection of the stack: the active write base.
    ///
    /// Empty stack means no active path. Fragments with interior dots are
    /// split and flattened into the join.
    pub fn current_path(&self) -> Option<String> {
        if self.path_stack.is_empty() {
            return None;
        }
        let segments: Vec<&str> = self
            .path_stack
            .iter()
            .flat_map(|fragment| fragment.split(PATH_SEPARATOR))
            .filter(|segment| !segment.is_empty())
            .collect();
        Some(segments.join("."))
    }
}

/// Hierarchical key/value store addressed by dot-joined paths
#[derive(Debug, Clone)]
pub struct NestedStore {
    base: Option<String>,
    root: Value,
}

impl Default for NestedStore {
    fn default() -> Self {
        NestedStore::new()
    }
}

impl NestedStore {
    pub fn new() -> NestedStore {
        NestedStore {
            base: None,
            root: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the active write base; `None` parks the store.
    pub fn set_base(&mut self, path: Option<String>) {
        self.base = path;
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Store a value at the current base, creating intermediate objects as
    /// needed. With no base there is nowhere to write: a no-op.
    pub fn store(&mut self, value: &TokenValue) {
        let Some(base) = self.base.clone() else {
            return;
        };

        let mut node = &mut self.root;
        let mut segments = base.split(PATH_SEPARATOR).peekable();
        while let Some(segment) = segments.next() {
            if !node.is_object() {
                *node = Value::Object(serde_json::Map::new());
            }
            let Value::Object(map) = node else {
                return;
            };
            if segments.peek().is_none() {
                // Nested writes win over their ancestor's aggregate: a slot
                // that already holds children is never replaced
                if let Some(Value::Object(existing)) = map.get(segment) {
                    if !existing.is_empty() {
                        return;
                    }
                }
                map.insert(segment.to_string(), value.to_json());
                return;
            }
            node = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
        }
    }

    /// The whole stored tree
    pub fn values(&self) -> &Value {
        &self.root
    }

    pub fn clear(&mut self) {
        self.base = None;
        self.root = Value::Object(serde_json::Map::new());
    }
}
