use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;

fn docval() -> Command {
    Command::cargo_bin("docval").unwrap()
}

const SCHEMA: &str = r#"
type: object
properties:
  name: {type: string}
  rotor:
    type: object
    properties:
      diameter: {type: number}
"#;

#[test]
fn test_help_lists_subcommands() {
    docval()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("load"))
        .stdout(predicate::str::contains("pack"));
}

#[test]
fn test_validate_success() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    temp.child("schema.yaml").write_str(SCHEMA)?;
    temp.child("turbine.yaml")
        .write_str("name: ref\nrotor: !include rotor.yaml\n")?;
    temp.child("rotor.yaml").write_str("diameter: 2.4e2\n")?;

    docval()
        .args(["validate", "turbine.yaml", "--schema", "schema.yaml"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
    Ok(())
}

#[test]
fn test_validate_reports_undeclared_property() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    temp.child("schema.yaml").write_str(SCHEMA)?;
    temp.child("turbine.yaml")
        .write_str("name: ref\nrotor:\n  diameter: 240\n  hub: 3\n")?;

    docval()
        .args(["validate", "turbine.yaml", "--schema", "schema.yaml"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("hub"))
        .stderr(predicate::str::contains("1 violation(s)"));
    Ok(())
}

#[test]
fn test_validate_no_strict_accepts_undeclared_property() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    temp.child("schema.yaml").write_str(SCHEMA)?;
    temp.child("turbine.yaml")
        .write_str("name: ref\nrotor:\n  diameter: 240\n  hub: 3\n")?;

    docval()
        .args(["validate", "turbine.yaml", "--schema", "schema.yaml", "--no-strict"])
        .current_dir(temp.path())
        .assert()
        .success();
    Ok(())
}

#[test]
fn test_validate_missing_include() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    temp.child("schema.yaml").write_str(SCHEMA)?;
    temp.child("turbine.yaml")
        .write_str("rotor: !include parts/rotor.yaml\n")?;

    docval()
        .args(["validate", "turbine.yaml", "--schema", "schema.yaml"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("rotor.yaml"))
        .stderr(predicate::str::contains("Failed to load data"));
    Ok(())
}

#[test]
fn test_load_expands_includes_as_json() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    temp.child("main.yaml")
        .write_str("blade: !include sub/blade.yaml\n")?;
    temp.child("sub/blade.yaml")
        .write_str("length: 1e2\nairfoil: !include airfoil.yaml\n")?;
    temp.child("sub/airfoil.yaml").write_str("name: \"0012\"\n")?;

    let output = docval()
        .args(["load", "main.yaml", "--format", "json"])
        .current_dir(temp.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let tree: serde_json::Value = serde_json::from_slice(&output)?;
    assert_eq!(
        tree,
        serde_json::json!({"blade": {"length": 100.0, "airfoil": {"name": "0012"}}})
    );
    Ok(())
}

#[test]
fn test_custom_include_tag_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    temp.child("main.yaml").write_str("part: !import part.yaml\n")?;
    temp.child("part.yaml").write_str("v: 1\n")?;

    docval()
        .args(["load", "main.yaml", "--format", "json"])
        .env("DOCVAL_INCLUDE_TAG", "!import")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"v\": 1"));
    Ok(())
}

#[test]
fn test_load_parse_error_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    temp.child("bad.yaml").write_str("a: [1, 2\n")?;

    docval()
        .args(["load", "bad.yaml"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load"));
    Ok(())
}

#[test]
fn test_pack_then_dump() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    temp.child("wind.yaml").write_str(
        "height: [10.0, 50.0]\nspeed:\n  dims: [height]\n  data: [3.5, 7.25]\n",
    )?;

    docval()
        .args(["pack", "wind.yaml", "--output", "wind.bds"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("wind.bds"));
    temp.child("wind.bds").assert(predicate::path::exists());

    let output = docval()
        .args(["dump", "wind.bds", "--format", "json"])
        .current_dir(temp.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let tree: serde_json::Value = serde_json::from_slice(&output)?;
    assert_eq!(
        tree,
        serde_json::json!({
            "height": [10.0, 50.0],
            "speed": {"dims": ["height"], "data": [3.5, 7.25]}
        })
    );
    Ok(())
}

#[test]
fn test_dump_rejects_non_dataset() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    temp.child("fake.bds").write_str("not a dataset")?;

    docval()
        .args(["dump", "fake.bds"])
        .current_dir(temp.path())
        .assert()
        .failure();
    Ok(())
}

#[test]
fn test_validate_cross_file_reference_from_relative_paths() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    temp.child("schemas/root.yaml").write_str(
        r##"
type: object
properties:
  tower:
    $ref: "shared/defs.yaml#/definitions/Tower"
required: [tower]
"##,
    )?;
    temp.child("schemas/shared/defs.yaml").write_str(
        r#"
definitions:
  Tower:
    type: object
    properties:
      height: {type: number, minimum: 0}
    required: [height]
"#,
    )?;
    temp.child("data/good.yaml").write_str("tower:\n  height: 1.1e2\n")?;
    temp.child("data/bad.yaml").write_str("tower:\n  height: tall\n")?;

    docval()
        .args(["validate", "data/good.yaml", "--schema", "schemas/root.yaml"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));

    docval()
        .args(["validate", "data/bad.yaml", "--schema", "schemas/root.yaml"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("/tower/height"))
        .stderr(predicate::str::contains("1 violation(s)"));

    // The same schema resolves when invoked from inside the data directory
    docval()
        .args(["validate", "good.yaml", "--schema", "../schemas/root.yaml"])
        .current_dir(temp.path().join("data"))
        .assert()
        .success();
    Ok(())
}
