//! End-to-end grammar loading: resources to lexers to tokens, value
//! extraction through rule paths, and dialect/version resolution.

use dialex::dialex::{
    GrammarError, GrammarRegistry, GrammarResource, LexerFactory, ResolveError, ResourceFactory,
};
use serde_json::json;

/// A miniature dialect grammar exercising every rule variant
const DIALECT_JSON: &str = r#"{
    "grammar": {
        "language": "MiniSQL",
        "version": { "min": "1.0", "max": null },
        "main": "statement"
    },
    "rules": {
        "verb": {
            "method": "case",
            "path": "statement.verb",
            "group": [
                { "keyword": "SELECT" },
                { "keyword": "DELETE" }
            ]
        },
        "column": { "match": "[a-z_]+" },
        "columns": {
            "repeat": "1..n",
            "path": "statement.columns",
            "tokenizer": { "match": ",\\s*" },
            "rule": "column"
        },
        "statement": {
            "method": "sequence",
            "tokenizer": { "match": "\\s+" },
            "group": ["verb", "columns"]
        }
    }
}"#;

#[test]
fn grammar_drives_tokenization_and_extraction() {
    let resource = GrammarResource::from_json_str(DIALECT_JSON).unwrap();
    let mut lexer = resource.build_lexer().unwrap();

    assert_eq!(lexer.tokenize("SELECT id, name FROM t"), Ok(true));
    // verb + separator-inclusive column list
    assert_eq!(lexer.source_length(), 15);

    assert_eq!(
        lexer.extracted(),
        &json!({
            "statement": {
                "verb": "SELECT",
                "columns": ["id", ", ", "name"],
            }
        })
    );
}

#[test]
fn json_and_yaml_resources_behave_identically() {
    let yaml = r#"
grammar:
  language: MiniSQL
  version:
    min: "1.0"
  main: statement
rules:
  verb:
    method: case
    path: statement.verb
    group:
      - keyword: SELECT
      - keyword: DELETE
  column:
    match: "[a-z_]+"
  columns:
    repeat: 1..n
    path: statement.columns
    tokenizer:
      match: ",\\s*"
    rule: column
  statement:
    method: sequence
    tokenizer:
      match: "\\s+"
    group:
      - verb
      - columns
"#;

    let from_json = GrammarResource::from_json_str(DIALECT_JSON).unwrap();
    let from_yaml = GrammarResource::from_yaml_str(yaml).unwrap();

    let content = "DELETE old_rows;";
    let mut json_lexer = from_json.build_lexer().unwrap();
    let mut yaml_lexer = from_yaml.build_lexer().unwrap();

    assert_eq!(json_lexer.tokenize(content), yaml_lexer.tokenize(content));
    assert_eq!(json_lexer.tokens(), yaml_lexer.tokens());
    assert_eq!(json_lexer.source_length(), yaml_lexer.source_length());
    assert_eq!(json_lexer.extracted(), yaml_lexer.extracted());
}

#[test]
fn malformed_resources_fail_before_any_scan() {
    // Wrong field type inside a descriptor
    let resource = GrammarResource::from_json_str(
        r#"{
            "grammar": { "language": "MiniSQL" },
            "rules": { "verb": { "keyword": 42 } }
        }"#,
    )
    .unwrap();
    assert!(matches!(
        resource.build_lexer(),
        Err(GrammarError::Rule { .. })
    ));

    // Reference to a rule the resource never defines
    let resource = GrammarResource::from_json_str(
        r#"{
            "grammar": { "language": "MiniSQL" },
            "rules": {
                "statement": { "method": "case", "group": ["ghost"] }
            }
        }"#,
    )
    .unwrap();
    assert_eq!(
        resource.build_lexer().err(),
        Some(GrammarError::UnresolvedReference("ghost".to_string()))
    );
}

fn versioned_resource(language: &str, min: &str, max: Option<&str>, keyword: &str) -> GrammarResource {
    let text = json!({
        "grammar": {
            "language": language,
            "version": { "min": min, "max": max },
            "main": "verb"
        },
        "rules": {
            "verb": { "keyword": keyword }
        }
    })
    .to_string();
    GrammarResource::from_json_str(&text).unwrap()
}

#[test]
fn version_resolution_picks_the_right_family() {
    let mut registry = GrammarRegistry::new();
    registry
        .register(Box::new(ResourceFactory::new(versioned_resource(
            "MySQL",
            "5.7",
            Some("5.7"),
            "OLD",
        ))))
        .unwrap();
    registry
        .register(Box::new(ResourceFactory::new(versioned_resource(
            "MySQL",
            "8.1",
            None,
            "NEW",
        ))))
        .unwrap();

    // 5.7.24 falls in the 5.7 family
    let mut lexer = registry.resolve_lexer("MySQL", "5.7.24").unwrap();
    assert_eq!(lexer.tokenize("OLD syntax"), Ok(true));
    assert_eq!(lexer.tokenize("NEW syntax"), Ok(false));

    // 9.0 exceeds 8.1 with no upper bound
    let mut lexer = registry.resolve_lexer("MySQL", "9.0").unwrap();
    assert_eq!(lexer.tokenize("NEW syntax"), Ok(true));

    // 5.8 is accepted by neither family
    assert!(matches!(
        registry.resolve_lexer("MySQL", "5.8"),
        Err(ResolveError::UnsupportedVersion { .. })
    ));
}

#[test]
fn resource_factory_exposes_its_window() {
    let factory = ResourceFactory::new(versioned_resource("MySQL", "5.7", Some("5.7"), "OLD"));
    assert_eq!(factory.grammar(), "MySQL");
    assert_eq!(factory.minimum_version(), "5.7");
    assert!(factory.supports("5.7"));
    assert!(factory.supports("5.7.44"));
    assert!(!factory.supports("5.6.1"));
    assert!(!factory.supports("8.0"));
}
