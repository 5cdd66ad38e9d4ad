use assert_cmd::prelude::*;
use predicates::str::contains;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{tempdir, TempDir};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../fixtures/shop")
        .canonicalize()
        .unwrap()
}

fn write_config(tmp: &TempDir, strategy: Option<&str>) -> PathBuf {
    let mut config = json!({
        "target_project": fixture(),
        "output_dir": "results",
        "cache_dir": "cache",
    });
    if let Some(s) = strategy {
        config["sql_wrapping_type"] = json!(s);
    }
    let path = tmp.path().join("config.json");
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}

fn analyze_json(config: &Path) -> Value {
    let output = Command::cargo_bin("dbscope")
        .unwrap()
        .arg("analyze")
        .arg("--config")
        .arg(config)
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn analyze_persists_every_result_document() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let config = write_config(&tmp, Some("mybatis"));

    let summary = analyze_json(&config);
    assert_eq!(summary["java_files"], 13);
    assert_eq!(summary["sql_statements"], 4);
    assert_eq!(summary["endpoints"], 5);
    assert_eq!(summary["table_access_records"], 4);

    for name in [
        "source_files.json",
        "java_parse_results.json",
        "sql_extraction_results.json",
        "call_graph.json",
        "table_access_info.json",
    ] {
        assert!(tmp.path().join("results").join(name).is_file(), "{name} missing");
    }
    let records: Value =
        serde_json::from_str(&fs::read_to_string(tmp.path().join("results/table_access_info.json"))?)?;
    assert_eq!(records.as_array().map(Vec::len), Some(4));
    assert!(tmp.path().join("cache/java_parse_cache.json").is_file());
    Ok(())
}

#[test]
fn second_run_hits_the_parse_cache() {
    let tmp = tempdir().unwrap();
    let config = write_config(&tmp, Some("mybatis"));
    assert_eq!(analyze_json(&config)["cache_hits"], 0);
    assert_eq!(analyze_json(&config)["cache_hits"], 13);
}

#[test]
fn no_cache_leaves_no_cache_file() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let config = write_config(&tmp, Some("mybatis_ccs"));
    Command::cargo_bin("dbscope")?
        .arg("analyze")
        .arg("--config")
        .arg(&config)
        .arg("--no-cache")
        .assert()
        .success()
        .stdout(contains("Table access records      1"));
    assert!(!tmp.path().join("cache").exists());
    Ok(())
}

#[test]
fn missing_strategy_fails_with_configuration_error() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let config = write_config(&tmp, None);
    Command::cargo_bin("dbscope")?
        .arg("analyze")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stderr(contains("no SQL extraction strategy configured"));
    assert!(!tmp.path().join("results").exists());
    Ok(())
}

#[test]
fn unknown_strategy_is_named_in_the_error() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let config = write_config(&tmp, Some("jpa"));
    Command::cargo_bin("dbscope")?
        .arg("analyze")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(contains("unknown SQL extraction strategy 'jpa'"));
    Ok(())
}

#[test]
fn yaml_configuration_is_accepted() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let config = tmp.path().join("config.yaml");
    let doc = serde_yaml::to_string(&json!({
        "target_project": fixture(),
        "sql_wrapping_type": "mybatis",
        "output_dir": tmp.path().join("out"),
        "access_tables": [{"table_name": "orders"}],
    }))?;
    fs::write(&config, doc)?;
    Command::cargo_bin("dbscope")?
        .arg("analyze")
        .arg("--config")
        .arg(&config)
        .arg("--no-cache")
        .assert()
        .success()
        .stdout(contains("Table access records      2"));
    Ok(())
}

#[test]
fn zero_threads_argument_errors() -> Result<(), Box<dyn std::error::Error>> {
    Command::cargo_bin("dbscope")?
        .arg("analyze")
        .arg("--threads")
        .arg("0")
        .assert()
        .failure()
        .stderr(contains("threads must be greater than 0"));
    Ok(())
}

#[test]
fn missing_configuration_file_errors() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    Command::cargo_bin("dbscope")?
        .arg("analyze")
        .arg("--config")
        .arg(tmp.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(contains("failed to load configuration"));
    Ok(())
}

#[test]
fn unsupported_format_is_rejected_by_the_parser() -> Result<(), Box<dyn std::error::Error>> {
    Command::cargo_bin("dbscope")?
        .args(["analyze", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(contains("invalid value 'yaml'"))
        .stderr(contains("[possible values: text, json]"));
    Ok(())
}
