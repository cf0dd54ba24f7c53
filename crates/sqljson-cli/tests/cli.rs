//! End-to-end tests for the CLI driver: files on disk in, JSON out

use std::fs;
use std::path::Path;

use clap::Parser;
use serde_json::{Value as JsonValue, json};
use sqljson_cli::{Args, run};
use tempfile::tempdir;

/// `$.items ? (@ > $min)`
fn filter_ir() -> JsonValue {
    json!({
        "kind": {"filter": {
            "target": {"kind": {"member_accessor": {
                "target": {"kind": "context_variable"},
                "name": "items"
            }}},
            "predicate": {"kind": {"comparison": {
                "op": "greater_than",
                "left": {"kind": "current_item"},
                "right": {"kind": {"named_value_variable": "min"}}
            }}}
        }}
    })
}

/// `$.items[9]`
fn index_ir() -> JsonValue {
    json!({
        "kind": {"array_accessor": {
            "target": {"kind": {"member_accessor": {
                "target": {"kind": "context_variable"},
                "name": "items"
            }}},
            "subscripts": [{"index": {"kind": {"literal": {"int": 9}}}}]
        }}
    })
}

fn write_json(dir: &Path, name: &str, value: &JsonValue) -> String {
    let file = dir.join(name);
    fs::write(&file, value.to_string()).unwrap();
    file.to_string_lossy().into_owned()
}

fn run_cli(argv: &[&str], stdin: &str) -> anyhow::Result<JsonValue> {
    let args = Args::try_parse_from(std::iter::once("sqljson").chain(argv.iter().copied()))?;
    run(&args, &mut stdin.as_bytes())
}

#[test]
fn exists_from_files() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = write_json(dir.path(), "path.json", &filter_ir());
    let input = write_json(dir.path(), "doc.json", &json!({"items": [1, 5, 9]}));

    let hit = run_cli(&["--path", &path, "--input", &input, "--param", "min=4"], "")?;
    assert_eq!(hit, json!(true));
    let miss = run_cli(&["--path", &path, "--input", &input, "--param", "min=9"], "")?;
    assert_eq!(miss, json!(false));
    Ok(())
}

#[test]
fn query_reads_stdin() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = write_json(dir.path(), "path.json", &filter_ir());

    let out = run_cli(
        &[
            "--path",
            &path,
            "--param",
            "min=1",
            "--function",
            "query",
            "--wrapper",
            "unconditional",
        ],
        r#"{"items": [1, 5, 9]}"#,
    )?;
    assert_eq!(out, json!([5, 9]));
    Ok(())
}

#[test]
fn value_with_returning_and_default() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = write_json(dir.path(), "path.json", &index_ir());
    let input = write_json(dir.path(), "doc.json", &json!({"items": [1, 2]}));

    // lax: out of bounds is empty, so ON EMPTY applies
    let out = run_cli(
        &[
            "--path",
            &path,
            "--input",
            &input,
            "--function",
            "value",
            "--returning",
            "bigint",
            "--on-empty",
            "default",
            "--default=-1",
        ],
        "",
    )?;
    assert_eq!(out, json!(-1));

    // strict: out of bounds is an error, so ON ERROR applies
    let err = run_cli(
        &[
            "--path",
            &path,
            "--input",
            &input,
            "--mode",
            "strict",
            "--function",
            "value",
            "--on-error",
            "error",
        ],
        "",
    )
    .unwrap_err();
    assert!(err.to_string().contains("out of bounds"));
    Ok(())
}

#[test]
fn default_follows_declared_type() -> anyhow::Result<()> {
    let dir = tempdir()?;
    // `$.n` declared as bigint
    let path = write_json(
        dir.path(),
        "path.json",
        &json!({
            "kind": {"member_accessor": {
                "target": {"kind": "context_variable"},
                "name": "n"
            }},
            "declared_type": "big_int"
        }),
    );

    let ok = run_cli(&["--path", &path, "--function", "value"], r#"{"n": "7"}"#)?;
    assert_eq!(ok, json!(7));

    let fallback = run_cli(
        &[
            "--path",
            &path,
            "--function",
            "value",
            "--on-error",
            "default",
            "--default",
            "\"12\"",
        ],
        r#"{"n": "seven"}"#,
    )?;
    assert_eq!(fallback, json!(12));
    Ok(())
}

#[test]
fn malformed_document_short_circuits() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = write_json(dir.path(), "path.json", &filter_ir());

    let err = run_cli(&["--path", &path, "--on-error", "error"], "{not json").unwrap_err();
    assert_eq!(
        err.to_string(),
        "malformed input argument to JSON_EXISTS function"
    );

    let unknown = run_cli(&["--path", &path, "--on-error", "unknown"], "{not json")?;
    assert_eq!(unknown, JsonValue::Null);

    let err = run_cli(
        &["--path", &path, "--on-error", "error", "--param", "min=oops"],
        r#"{"items": []}"#,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "malformed JSON path parameter to JSON_EXISTS function"
    );
    Ok(())
}

#[test]
fn invalid_ir_is_reported() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let bad = write_json(dir.path(), "bad.json", &json!({"kind": "no_such_node"}));
    let err = run_cli(&["--path", &bad], "{}").unwrap_err();
    assert!(err.to_string().contains("invalid path IR"));

    // `@` outside a filter is rejected when the path is built
    let misplaced = write_json(dir.path(), "at.json", &json!({"kind": "current_item"}));
    let err = run_cli(&["--path", &misplaced], "{}").unwrap_err();
    assert!(err.to_string().contains("@ used outside of a filter"));
    Ok(())
}
