use assert_cmd::prelude::*;
use predicates::str::contains;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{tempdir, TempDir};

fn analyzed_project() -> (TempDir, PathBuf) {
    let tmp = tempdir().unwrap();
    let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/shop");
    let config = tmp.path().join("config.json");
    let doc = json!({
        "target_project": fixture.canonicalize().unwrap(),
        "sql_wrapping_type": "mybatis",
        "output_dir": "results",
    });
    fs::write(&config, doc.to_string()).unwrap();
    Command::cargo_bin("dbscope")
        .unwrap()
        .args(["analyze", "--no-cache", "--config"])
        .arg(&config)
        .assert()
        .success();
    (tmp, config)
}

fn list(config: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    Command::cargo_bin("dbscope")
        .unwrap()
        .arg("list")
        .arg("--config")
        .arg(config)
        .args(args)
        .assert()
}

#[test]
fn db_lists_table_access() {
    let (_tmp, config) = analyzed_project();
    list(&config, &["--db"])
        .success()
        .stdout(contains("users [mapper] select"))
        .stdout(contains("orders [mapper] insert"))
        .stdout(contains("entry points: GET /api/users/{id}, PUT /api/users/{id}/email"));
}

#[test]
fn endpoint_lists_routes() {
    let (_tmp, config) = analyzed_project();
    list(&config, &["--endpoint"])
        .success()
        .stdout(contains("/api/users/{id}/email"))
        .stdout(contains("POST    /ccs/payhist/list"))
        .stdout(contains("Total: 5"));
}

#[test]
fn callgraph_accepts_labels_and_signatures() {
    let (_tmp, config) = analyzed_project();
    list(&config, &["--callgraph", "GET /api/users/{id}"])
        .success()
        .stdout(contains("com.shop.mapper.UserMapper.selectById(Long)"));
    list(&config, &["--callgraph", "com.shop.web.OrderController.place(Order)"])
        .success()
        .stdout(contains("com.shop.service.OrderService.validate(Order,int) ↺ (recursive)"));
    list(&config, &["--callgraph", "DELETE /nowhere"])
        .failure()
        .stderr(contains("endpoint not found: DELETE /nowhere"));
}

#[test]
fn all_lists_collected_files_as_json() {
    let (_tmp, config) = analyzed_project();
    let output = list(&config, &["--all", "--format", "json"]).success();
    let value: serde_json::Value =
        serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(value["total"], 16);
}

#[test]
fn list_before_analyze_explains_what_to_do() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let config = tmp.path().join("config.json");
    fs::write(&config, json!({"target_project": tmp.path()}).to_string())?;
    list(&config, &["--db"])
        .failure()
        .stderr(contains("run `dbscope analyze` first"));
    Ok(())
}

#[test]
fn list_requires_a_selection() -> Result<(), Box<dyn std::error::Error>> {
    Command::cargo_bin("dbscope")?.arg("list").assert().failure();
    Ok(())
}
