//! # dialex
//!
//! A rule-driven lexer engine for SQL dialects.
//!
//! Grammars are declarative rule descriptors (JSON or YAML), and an
//! interpreter walks those descriptors against an input string to recognize
//! tokens and extract structured values. Building a lexer for a new dialect
//! means writing a rule descriptor tree, not a scanner.

pub mod dialex;
