//! Grammar resources: the serialized form of a rule set
//!
//! A grammar resource is a JSON or YAML document with a header and a rule
//! map:
//!
//! ```text
//! {
//!   "grammar": {
//!     "language": "MySQL",
//!     "version": { "min": "5.7", "max": null },
//!     "main": "statement"
//!   },
//!   "rules": {
//!     "statement": { "method": "case", "group": ["select", "drop"] },
//!     ...
//!   }
//! }
//! ```
//!
//! Loading is fail-fast: the first malformed descriptor aborts the build
//! with no partial registry, and every named reference is validated before
//! the lexer is handed out. No content is ever scanned against a grammar
//! that did not load cleanly.

use crate::dialex::lexer::Lexer;
use crate::dialex::rules::{BuildError, Rule};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;

/// Rule names must be plain identifiers so they stay unambiguous as
/// references inside descriptors
static RULE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").unwrap());

/// Errors that can occur when loading a grammar resource
#[derive(Debug, Clone, PartialEq)]
pub enum GrammarError {
    /// IO error when reading a resource file
    Io(String),
    /// The resource text is not valid JSON/YAML for the schema
    Parse(String),
    /// The file extension names no supported format
    UnknownFormat(String),
    /// A rule is registered under a malformed name
    InvalidRuleName(String),
    /// A rule descriptor failed to build
    Rule { name: String, source: BuildError },
    /// A named reference resolves to no registered rule
    UnresolvedReference(String),
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::Io(msg) => write!(f, "IO error: {}", msg),
            GrammarError::Parse(msg) => write!(f, "Malformed grammar resource: {}", msg),
            GrammarError::UnknownFormat(ext) => {
                write!(f, "Unknown grammar resource format: {}", ext)
            }
            GrammarError::InvalidRuleName(name) => {
                write!(f, "Invalid rule name: {:?}", name)
            }
            GrammarError::Rule { name, source } => {
                write!(f, "Rule {:?} failed to build: {}", name, source)
            }
            GrammarError::UnresolvedReference(name) => {
                write!(f, "Grammar references unknown rule: {}", name)
            }
        }
    }
}

impl std::error::Error for GrammarError {}

impl From<std::io::Error> for GrammarError {
    fn from(err: std::io::Error) -> Self {
        GrammarError::Io(err.to_string())
    }
}

/// The supported version window of a grammar
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VersionWindow {
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub max: Option<String>,
}

/// The `grammar` header of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarHeader {
    pub language: String,
    #[serde(default)]
    pub version: VersionWindow,
    /// The rule driven by `tokenize`, when the resource designates one
    #[serde(default)]
    pub main: Option<String>,
}

/// A parsed grammar resource: header plus named rule descriptors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarResource {
    pub grammar: GrammarHeader,
    #[serde(default)]
    pub rules: serde_json::Map<String, Value>,
}

impl GrammarResource {
    pub fn from_json_str(text: &str) -> Result<GrammarResource, GrammarError> {
        serde_json::from_str(text).map_err(|err| GrammarError::Parse(err.to_string()))
    }

    pub fn from_yaml_str(text: &str) -> Result<GrammarResource, GrammarError> {
        serde_yaml::from_str(text).map_err(|err| GrammarError::Parse(err.to_string()))
    }

    /// Load a resource file, dispatching on the file extension
    /// (`.json`, `.yaml`, `.yml`).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<GrammarResource, GrammarError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => GrammarResource::from_json_str(&text),
            Some("yaml") | Some("yml") => GrammarResource::from_yaml_str(&text),
            other => Err(GrammarError::UnknownFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Build a lexer from this resource.
    ///
    /// Every descriptor is built and registered; the first failure aborts
    /// the whole load. Afterwards all named references (including the
    /// main rule) must resolve.
    pub fn build_lexer(&self) -> Result<Lexer, GrammarError> {
        let mut lexer = Lexer::new();

        for (name, descriptor) in &self.rules {
            if !RULE_NAME.is_match(name) {
                return Err(GrammarError::InvalidRuleName(name.clone()));
            }
            let rule = Rule::build(descriptor).map_err(|source| GrammarError::Rule {
                name: name.clone(),
                source,
            })?;
            lexer.register_rule(name.clone(), rule);
        }

        if let Some(main) = &self.grammar.main {
            lexer.set_main_rule(main.clone());
        }

        if let Some(name) = lexer.first_unresolved_reference() {
            return Err(GrammarError::UnresolvedReference(name));
        }

        Ok(lexer)
    }
}
