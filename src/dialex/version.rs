//! Grammar proxies: dialect and version resolution
//!
//! A dialect family (say, MySQL) is served by several concrete grammars,
//! each covering a version window. A `GrammarProxy` holds the candidates
//! registered for one grammar name; resolution keeps the candidates whose
//! predicate accepts the requested version and picks the one with the
//! highest minimum version. Ties resolve to the first registered
//! candidate, so resolution is deterministic.
//!
//! Registration is validated: a candidate declaring a different grammar
//! name than the proxy's own is a configuration error, not a runtime one.

use crate::dialex::grammar::{GrammarError, GrammarResource};
use crate::dialex::lexer::Lexer;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Errors raised while registering grammar candidates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The candidate declares a grammar name other than the proxy's
    GrammarMismatch { expected: String, found: String },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::GrammarMismatch { expected, found } => write!(
                f,
                "Candidate grammar {:?} does not match proxy grammar {:?}",
                found, expected
            ),
        }
    }
}

impl std::error::Error for RegistrationError {}

/// Errors raised while resolving a lexer for a version
#[derive(Debug)]
pub enum ResolveError {
    /// No registered grammar has this name
    UnknownGrammar(String),
    /// No candidate of the grammar accepts the requested version
    UnsupportedVersion { grammar: String, version: String },
    /// The winning candidate failed to produce a lexer
    Grammar(GrammarError),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::UnknownGrammar(name) => write!(f, "Unknown grammar: {}", name),
            ResolveError::UnsupportedVersion { grammar, version } => {
                write!(f, "Grammar {} does not support version {}", grammar, version)
            }
            ResolveError::Grammar(err) => write!(f, "Grammar failed to load: {}", err),
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<GrammarError> for ResolveError {
    fn from(err: GrammarError) -> Self {
        ResolveError::Grammar(err)
    }
}

/// A concrete lexer candidate for one version window of a grammar
pub trait LexerFactory {
    /// The grammar name this candidate belongs to
    fn grammar(&self) -> &str;

    /// The lowest version this candidate covers; resolution prefers the
    /// candidate with the highest minimum among those that accept
    fn minimum_version(&self) -> &str;

    /// Whether the requested version string falls in this candidate's
    /// family
    fn supports(&self, version: &str) -> bool;

    /// Produce a configured lexer
    fn create(&self) -> Result<Lexer, GrammarError>;
}

/// Compare two dotted version strings segment by segment.
///
/// Segments compare numerically when both parse as integers, textually
/// otherwise; missing segments read as zero, so `"5.7"` equals `"5.7.0"`.
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let left_segments: Vec<&str> = left.split('.').collect();
    let right_segments: Vec<&str> = right.split('.').collect();
    let width = left_segments.len().max(right_segments.len());

    for index in 0..width {
        let a = left_segments.get(index).copied().unwrap_or("0");
        let b = right_segments.get(index).copied().unwrap_or("0");
        let ordering = match (a.parse::<u64>(), b.parse::<u64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b),
            _ => a.cmp(b),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Compare a version against a bound at the bound's own precision, so a
/// `"5.7"` bound covers the whole 5.7 family.
fn compare_at_precision(version: &str, bound: &str) -> Ordering {
    let width = bound.split('.').count();
    let truncated: Vec<&str> = version.split('.').take(width).collect();
    compare_versions(&truncated.join("."), bound)
}

/// Ordered candidate set for one grammar name
pub struct GrammarProxy {
    grammar: String,
    candidates: Vec<Box<dyn LexerFactory>>,
}

impl GrammarProxy {
    pub fn new(grammar: impl Into<String>) -> GrammarProxy {
        GrammarProxy {
            grammar: grammar.into(),
            candidates: Vec::new(),
        }
    }

    pub fn grammar(&self) -> &str {
        &self.grammar
    }

    /// Register a candidate. Its declared grammar name must match the
    /// proxy's.
    pub fn register(&mut self, candidate: Box<dyn LexerFactory>) -> Result<(), RegistrationError> {
        if candidate.grammar() != self.grammar {
            return Err(RegistrationError::GrammarMismatch {
                expected: self.grammar.clone(),
                found: candidate.grammar().to_string(),
            });
        }
        self.candidates.push(candidate);
        Ok(())
    }

    /// Pick the best candidate for a requested version: among those whose
    /// predicate accepts it, the one with the highest minimum version,
    /// first registered winning ties.
    pub fn resolve(&self, version: &str) -> Result<&dyn LexerFactory, ResolveError> {
        let mut best: Option<&dyn LexerFactory> = None;
        for candidate in &self.candidates {
            let candidate = candidate.as_ref();
            if !candidate.supports(version) {
                continue;
            }
            let better = match best {
                None => true,
                Some(current) => {
                    compare_versions(candidate.minimum_version(), current.minimum_version())
                        == Ordering::Greater
                }
            };
            if better {
                best = Some(candidate);
            }
        }

        best.ok_or_else(|| ResolveError::UnsupportedVersion {
            grammar: self.grammar.clone(),
            version: version.to_string(),
        })
    }

    /// Resolve and create in one step.
    pub fn resolve_lexer(&self, version: &str) -> Result<Lexer, ResolveError> {
        Ok(self.resolve(version)?.create()?)
    }
}

/// All registered grammar families, addressed by name
#[derive(Default)]
pub struct GrammarRegistry {
    proxies: HashMap<String, GrammarProxy>,
}

impl GrammarRegistry {
    pub fn new() -> GrammarRegistry {
        GrammarRegistry::default()
    }

    /// Register a candidate under its own grammar name, creating the
    /// proxy on first use.
    pub fn register(&mut self, candidate: Box<dyn LexerFactory>) -> Result<(), RegistrationError> {
        let name = candidate.grammar().to_string();
        self.proxies
            .entry(name.clone())
            .or_insert_with(|| GrammarProxy::new(name))
            .register(candidate)
    }

    pub fn proxy(&self, grammar: &str) -> Option<&GrammarProxy> {
        self.proxies.get(grammar)
    }

    /// Resolve a lexer for a grammar name and requested version.
    pub fn resolve_lexer(&self, grammar: &str, version: &str) -> Result<Lexer, ResolveError> {
        let proxy = self
            .proxies
            .get(grammar)
            .ok_or_else(|| ResolveError::UnknownGrammar(grammar.to_string()))?;
        proxy.resolve_lexer(version)
    }
}

/// Adapts a grammar resource into a lexer candidate: the resource's
/// version window is the predicate, its header names the grammar.
pub struct ResourceFactory {
    resource: GrammarResource,
}

impl ResourceFactory {
    pub fn new(resource: GrammarResource) -> ResourceFactory {
        ResourceFactory { resource }
    }
}

impl LexerFactory for ResourceFactory {
    fn grammar(&self) -> &str {
        &self.resource.grammar.language
    }

    fn minimum_version(&self) -> &str {
        self.resource.grammar.version.min.as_deref().unwrap_or("0")
    }

    fn supports(&self, version: &str) -> bool {
        if let Some(min) = &self.resource.grammar.version.min {
            if compare_versions(version, min) == Ordering::Less {
                return false;
            }
        }
        if let Some(max) = &self.resource.grammar.version.max {
            if compare_at_precision(version, max) == Ordering::Greater {
                return false;
            }
        }
        true
    }

    fn create(&self) -> Result<Lexer, GrammarError> {
        self.resource.build_lexer()
    }
}
