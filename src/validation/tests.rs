use super::{SchemaValidationError, SchemaValidator, ValidatorOptions, validate_yaml};
use crate::loader::{LoadError, Source};
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn violations(result: Result<(), SchemaValidationError>) -> Vec<super::Violation> {
    match result {
        Err(SchemaValidationError::ValidationFailed { violations, .. }) => violations.into_inner(),
        other => panic!("expected a validation failure, got {other:?}"),
    }
}

#[test]
fn test_validator_creation() {
    let validator = SchemaValidator::new(ValidatorOptions::default());
    assert!(validator.is_ok());
}

#[test]
fn test_undeclared_property_rejected() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "schema.yaml",
        "type: object\nproperties:\n  x:\n    type: string\n",
    );
    let schema = temp.path().join("schema.yaml");

    assert!(validate_yaml(json!({"x": "ok"}), &schema).is_ok());

    let found = violations(validate_yaml(json!({"x": "ok", "y": 1}), &schema));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].instance_path, "");
    assert!(found[0].schema_path.ends_with("additionalProperties"));
}

#[test]
fn test_non_strict_mode_allows_undeclared_property() {
    let options = ValidatorOptions {
        strict: false,
        ..ValidatorOptions::default()
    };
    let validator = SchemaValidator::new(options).unwrap();
    let schema = json!({"type": "object", "properties": {"x": {"type": "string"}}});
    assert!(validator.validate(json!({"x": "ok", "y": 1}), schema).is_ok());
}

#[test]
fn test_cross_file_reference() {
    let temp = TempDir::new().unwrap();
    let schemas = temp.path().join("schemas");
    write(
        &schemas,
        "root.yaml",
        r#"
type: object
properties:
  turbine:
    $ref: "shared/defs.yaml#/definitions/Turbine"
required: [turbine]
"#,
    );
    write(
        &schemas,
        "shared/defs.yaml",
        r#"
definitions:
  Turbine:
    type: object
    properties:
      rated_power:
        type: number
        minimum: 0
"#,
    );

    let validator = SchemaValidator::new(ValidatorOptions::default()).unwrap();
    let root = schemas.join("root.yaml");

    assert!(
        validator
            .validate(json!({"turbine": {"rated_power": 3.4e6}}), &root)
            .is_ok()
    );

    let found = violations(validator.validate(json!({"turbine": {"rated_power": -1}}), &root));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].instance_path, "/turbine/rated_power");
    assert!(found[0].schema_path.ends_with("minimum"));
}

#[test]
fn test_broken_schema_file_does_not_abort() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "root.json",
        r#"{"type": "object", "properties": {"n": {"$ref": "defs.json#/definitions/N"}}}"#,
    );
    write(
        temp.path(),
        "defs.json",
        r#"{"definitions": {"N": {"type": "integer"}}}"#,
    );
    write(temp.path(), "broken.yaml", "key: [unclosed\n");

    let root = temp.path().join("root.json");
    assert!(validate_yaml(json!({"n": 3}), &root).is_ok());
    assert!(validate_yaml(json!({"n": "three"}), &root).is_err());
}

#[test]
fn test_nested_one_of_reports_branch() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "schema.yaml",
        r#"
type: object
properties:
  turbine:
    type: object
    properties:
      rotor:
        oneOf:
          - type: object
            properties:
              diameter: {type: number}
            required: [diameter]
          - type: object
            properties:
              radius: {type: number}
            required: [radius]
"#,
    );
    let schema = temp.path().join("schema.yaml");
    let data = json!({"turbine": {"rotor": {"diameter": "big"}}});

    let found = violations(validate_yaml(data, &schema));
    let one_of = found
        .iter()
        .find(|v| v.is_combinator())
        .expect("oneOf violation");
    assert_eq!(one_of.instance_path, "/turbine/rotor");
    assert_eq!(one_of.schema_path, "/properties/turbine/properties/rotor/oneOf");
    assert!(one_of.branches.iter().any(|b| {
        b.instance_path == "/turbine/rotor/diameter" && b.schema_path.contains("/oneOf/0/")
    }));
}

#[test]
fn test_data_with_includes() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "schema.yaml",
        r#"
type: object
properties:
  name: {type: string}
  blade:
    type: object
    properties:
      length: {type: number}
      chord: {type: array, items: {type: number}}
"#,
    );
    write(
        temp.path(),
        "turbine.yaml",
        "name: reference\nblade: !include parts/blade.yaml\n",
    );
    write(temp.path(), "parts/blade.yaml", "length: 1.2e2\nchord: [4.5, .5, 1e-1]\n");

    let result = validate_yaml(temp.path().join("turbine.yaml"), temp.path().join("schema.yaml"));
    assert!(result.is_ok(), "{result:?}");
}

#[test]
fn test_in_memory_schema_without_store() {
    let schema = json!({
        "type": "object",
        "properties": {"a": {"$ref": "#/definitions/A"}},
        "definitions": {"A": {"type": "object", "properties": {"b": {"type": "boolean"}}}}
    });
    assert!(validate_yaml(json!({"a": {"b": true}}), Source::Tree(schema.clone())).is_ok());

    let found = violations(validate_yaml(json!({"a": {"b": true, "c": 1}}), Source::Tree(schema)));
    assert_eq!(found[0].instance_path, "/a");
}

#[test]
fn test_missing_data_file() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "schema.yaml", "type: object\n");
    let err = validate_yaml(temp.path().join("absent.yaml"), temp.path().join("schema.yaml"))
        .unwrap_err();
    assert!(matches!(
        err,
        SchemaValidationError::Load {
            what: "data",
            source: LoadError::FileNotFound { .. }
        }
    ));
}
