//! CLI integration tests driving the compiled binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn cmd() -> Command {
    Command::cargo_bin("schemashift").expect("binary builds")
}

fn write_schema(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("fixture written");
    path
}

const USER_SCHEMA: &str = r#"{
    "type": "object",
    "properties": {
        "id": { "type": "string" },
        "nickname": { "type": "string" }
    },
    "required": ["id"]
}"#;

#[test]
fn converts_to_avro_on_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_schema(&dir, "user.json", USER_SCHEMA);

    cmd()
        .arg("convert")
        .arg(&input)
        .args(["--to", "avro"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"record\""))
        .stdout(predicate::str::contains("\"RootRecord\""));
}

#[test]
fn converts_to_xsd_with_custom_root() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_schema(&dir, "user.json", USER_SCHEMA);

    cmd()
        .arg("convert")
        .arg(&input)
        .args(["--to", "xsd", "--root-name", "User"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"<xs:element name="User">"#))
        .stdout(predicate::str::contains(r#"minOccurs="0""#));
}

#[test]
fn writes_files_into_out_dir() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let input = write_schema(&dir, "user.json", USER_SCHEMA);

    cmd()
        .arg("convert")
        .arg(&input)
        .args(["--to", "avro", "--to", "xsd"])
        .arg("--out-dir")
        .arg(out.path())
        .assert()
        .success();

    let avro = fs::read_to_string(out.path().join("user.avsc")).unwrap();
    assert!(avro.contains("\"record\""));
    let xsd = fs::read_to_string(out.path().join("user.xsd")).unwrap();
    assert!(xsd.contains("xs:schema"));
}

#[test]
fn malformed_schema_exits_nonzero_with_code() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_schema(&dir, "bad.json", r#"{"type": "array"}"#);

    cmd()
        .arg("convert")
        .arg(&input)
        .args(["--to", "avro"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SCHEMA_PARSE_ERROR"))
        .stderr(predicate::str::contains("items"));
}

#[test]
fn missing_input_file_fails_with_context() {
    cmd()
        .arg("convert")
        .arg("does-not-exist.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read input file"));
}

#[test]
fn avro_source_round_trips_to_json_schema() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_schema(
        &dir,
        "user.avsc",
        r#"{
            "type": "record",
            "name": "User",
            "fields": [
                { "name": "id", "type": "string" },
                { "name": "nickname", "type": ["null", "string"], "default": null }
            ]
        }"#,
    );

    cmd()
        .arg("convert")
        .arg(&input)
        .args(["--from", "avro", "--to", "jsonschema"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"$schema\""))
        .stdout(predicate::str::contains("\"required\""));
}
