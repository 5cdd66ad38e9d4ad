use super::*;
use serde_json::{self, Value as JsonValue};
use std::collections::BTreeSet;
// Tests for JSON roundtrips of the output artifacts.

fn sample_access() -> Vec<TableAccessInfo> {
    let mut select = TableAccessInfo::new("orders", "mapper", QueryType::Select);
    select.add_column("ID", ColumnUsage::Read);
    select.add_column("card_no", ColumnUsage::Read);
    select.access_files.insert("src/OrderMapper.xml".into());
    select.access_files.insert("src/OrderController.java".into());
    select
        .layer_files
        .entry("controller".into())
        .or_default()
        .insert("src/OrderController.java".into());

    let mut update = TableAccessInfo::new("orders", "mapper", QueryType::Update);
    update.add_column("card_no", ColumnUsage::Write);
    update.access_files.insert("src/OrderMapper.xml".into());
    vec![select, update]
}

#[test]
fn table_access_roundtrip_preserves_sets() {
    let list = sample_access();
    let json = serde_json::to_string(&list).unwrap();
    let back: Vec<TableAccessInfo> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.len(), list.len());
    for (a, b) in list.iter().zip(&back) {
        assert_eq!(a.table_name, b.table_name);
        assert_eq!(a.access_files, b.access_files);
        let ca: BTreeSet<_> = a.columns.iter().collect();
        let cb: BTreeSet<_> = b.columns.iter().collect();
        assert_eq!(ca, cb);
        assert_eq!(a.query_type, b.query_type);
    }
}

#[test]
fn table_access_serializes_lowercase_enums() {
    let list = sample_access();
    let v: JsonValue = serde_json::to_value(&list).unwrap();
    assert_eq!(v[0]["query_type"], "select");
    assert_eq!(v[1]["columns"][0]["usage"], "write");
    assert_eq!(v[0]["columns"][0]["name"], "card_no");
}

#[test]
fn merge_unions_files_and_columns() {
    let mut a = TableAccessInfo::new("orders", "mapper", QueryType::Select);
    a.add_column("id", ColumnUsage::Read);
    a.access_files.insert("A.java".into());
    let mut b = TableAccessInfo::new("orders", "mapper", QueryType::Select);
    b.add_column("Id", ColumnUsage::Read);
    b.add_column("status", ColumnUsage::Read);
    b.access_files.insert("B.java".into());
    b.entry_points.insert("GET /orders".into());
    a.merge(b);
    assert_eq!(a.column_names(), vec!["id", "status"]);
    assert_eq!(a.access_files.len(), 2);
    assert!(a.entry_points.contains("GET /orders"));
}

#[test]
fn method_signature_includes_parameter_types() {
    let mut class = JavaClass::new("UserService", "UserService.java");
    class.package = "com.shop".into();
    let method = JavaMethod {
        name: "find".into(),
        parameters: vec![
            Parameter {
                name: "id".into(),
                type_name: "Long".into(),
            },
            Parameter {
                name: "opts".into(),
                type_name: "Map<String,String>".into(),
            },
        ],
        return_type: "User".into(),
        annotations: vec![],
        access_modifier: "public".into(),
        is_static: false,
        line_start: 1,
        line_end: 3,
        call_sites: vec![],
        string_literals: vec![],
    };
    assert_eq!(
        class.method_signature(&method),
        "com.shop.UserService.find(Long,Map<String,String>)"
    );
}

#[test]
fn call_tree_depth_and_walk() {
    let mut root = CallTree::leaf("a", "A.java");
    let mut b = CallTree::leaf("b", "B.java");
    b.children.push(CallTree::leaf("c", "C.java"));
    root.children.push(b);
    root.children.push(CallTree::leaf("d", "D.java"));
    assert_eq!(root.depth(), 2);
    let mut seen = Vec::new();
    root.walk(&mut |n| seen.push(n.signature.clone()));
    assert_eq!(seen, vec!["a", "b", "c", "d"]);

    let json = serde_json::to_value(&root).unwrap();
    assert!(json.get("recursive").is_none());
    assert_eq!(json["children"][0]["children"][0]["signature"], "c");
}
