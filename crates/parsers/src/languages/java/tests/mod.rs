use super::*;
use crate::cache::MemoryParseCache;
use ir::JavaMethod;
use std::fs;
use tempfile::tempdir;

const CONTROLLER: &str = r#"package com.shop.web;

import com.shop.service.UserService;
import com.shop.model.*;
import org.springframework.web.bind.annotation.*;

@RestController
@RequestMapping("/api")
public class UserController {
    private static final String PREFIX = "user";
    @Autowired
    private UserService userService;

    @GetMapping(value = {"/users", "/members"})
    public List<User> list(@RequestParam Map<String, String> filter, int page) {
        List<User> users = userService.findAll(filter);
        for (User u : users) {
            u.touch();
        }
        return users;
    }

    @RequestMapping(path = "/users/{id}", method = RequestMethod.DELETE)
    public void remove(@PathVariable Long id) {
        this.userService.delete(id);
        Audit.log("removed " + id);
        new Helper().run();
        helper();
    }

    private void helper() {}

    static class Helper {
        void run() {}
    }
}
"#;

fn parse(code: &str) -> ParsedJavaFile {
    let parser = JavaParser::new(Arc::new(MemoryParseCache::new()));
    parser.parse_source("UserController.java", code).unwrap()
}

fn method<'a>(file: &'a ParsedJavaFile, class: &str, name: &str) -> &'a JavaMethod {
    file.classes
        .iter()
        .find(|c| c.name == class)
        .and_then(|c| c.methods.iter().find(|m| m.name == name))
        .unwrap()
}

#[test]
fn extracts_package_imports_and_nested_classes() {
    let file = parse(CONTROLLER);
    assert_eq!(file.package, "com.shop.web");
    assert_eq!(
        file.imports,
        vec![
            "com.shop.service.UserService",
            "com.shop.model.*",
            "org.springframework.web.bind.annotation.*"
        ]
    );
    let names: Vec<_> = file.classes.iter().map(|c| c.qualified_name()).collect();
    assert_eq!(
        names,
        vec!["com.shop.web.UserController", "com.shop.web.UserController.Helper"]
    );
    let controller = &file.classes[0];
    assert_eq!(controller.access_modifier, "public");
    assert!(controller.annotation("RestController").is_some());
    assert_eq!(
        controller.annotation("RequestMapping").unwrap().values(&["value", "path"]),
        ["/api"]
    );
    let prefix = controller.field("PREFIX").unwrap();
    assert_eq!(prefix.string_value.as_deref(), Some("user"));
    assert!(prefix.is_static);
    assert_eq!(controller.field("userService").unwrap().type_name, "UserService");
}

#[test]
fn extracts_method_signatures_and_annotations() {
    let file = parse(CONTROLLER);
    let list = method(&file, "UserController", "list");
    assert_eq!(list.descriptor(), "list(Map<String,String>,int)");
    assert_eq!(list.return_type, "List<User>");
    assert_eq!(
        list.annotation("GetMapping").unwrap().values(&["value"]),
        ["/users", "/members"]
    );
    let remove = method(&file, "UserController", "remove");
    let mapping = remove.annotation("RequestMapping").unwrap();
    assert_eq!(mapping.values(&["path"]), ["/users/{id}"]);
    assert_eq!(mapping.values(&["method"]), ["RequestMethod.DELETE"]);
    assert_eq!(method(&file, "UserController", "helper").access_modifier, "private");
}

#[test]
fn call_sites_carry_receiver_type_hints() {
    let file = parse(CONTROLLER);
    let list = method(&file, "UserController", "list");
    let find_all = list.call_sites.iter().find(|c| c.callee == "findAll").unwrap();
    assert_eq!(find_all.receiver.as_deref(), Some("userService"));
    assert_eq!(find_all.receiver_type.as_deref(), Some("UserService"));
    assert_eq!(find_all.argument_count, 1);
    let touch = list.call_sites.iter().find(|c| c.callee == "touch").unwrap();
    assert_eq!(touch.receiver_type.as_deref(), Some("User"));

    let remove = method(&file, "UserController", "remove");
    let types: Vec<_> = remove
        .call_sites
        .iter()
        .map(|c| (c.callee.as_str(), c.receiver_type.as_deref()))
        .collect();
    assert_eq!(
        types,
        vec![
            ("delete", Some("UserService")),
            ("log", Some("Audit")),
            ("run", Some("Helper")),
            ("helper", None),
        ]
    );
    assert!(remove.string_literals.contains(&"removed ".to_string()));
}

#[test]
fn var_locals_take_the_constructed_type() {
    let file = parse(
        "package a;\nclass Job {\n  void run() {\n    var repo = new OrderRepo();\n    repo.save();\n    var rows = repo.load();\n    rows.clear();\n    userMapper.findById(1L);\n  }\n}\n",
    );
    let run = method(&file, "Job", "run");
    let hint = |callee: &str| {
        run.call_sites
            .iter()
            .find(|c| c.callee == callee)
            .unwrap()
            .receiver_type
            .clone()
    };
    assert_eq!(hint("save").as_deref(), Some("OrderRepo"));
    assert_eq!(hint("clear"), None);
    // declared in a superclass, left to the call graph
    assert_eq!(hint("findById"), None);
}

#[test]
fn interface_methods_default_to_public() {
    let file = parse(
        "package com.shop.mapper;\npublic interface UserMapper extends BaseMapper<User> {\n  User findById(Long id);\n}\n",
    );
    let class = &file.classes[0];
    assert!(class.is_interface);
    assert_eq!(class.interfaces, vec!["BaseMapper"]);
    assert_eq!(class.methods[0].access_modifier, "public");
    assert_eq!(class.methods[0].descriptor(), "findById(Long)");
}

#[test]
fn class_hierarchy_is_recorded() {
    let file = parse(
        "package a;\nclass UserServiceImpl extends AbstractService<User> implements UserService, Auditable {}\n",
    );
    let class = &file.classes[0];
    assert_eq!(class.superclass.as_deref(), Some("AbstractService"));
    assert_eq!(class.interfaces, vec!["UserService", "Auditable"]);
    assert_eq!(class.access_modifier, "default");
}

#[test]
fn constructors_are_not_methods() {
    let file = parse("class A { A() { init(); } void init() {} }");
    let names: Vec<_> = file.classes[0].methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["init"]);
}

#[test]
fn syntax_error_is_reported_and_counted() {
    let parser = JavaParser::new(Arc::new(MemoryParseCache::new()));
    let err = parser
        .parse_source("Broken.java", "class Broken { void f( { }")
        .unwrap_err();
    assert!(matches!(err, JavaParseError::Syntax { .. }));
    assert_eq!(parser.metrics().parse_errors, 1);
    assert_eq!(parser.metrics().files_parsed, 0);
}

#[test]
fn cache_hit_skips_grammar() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("A.java");
    fs::write(&path, "package p;\nclass A { void f() {} }\n").unwrap();
    let parser = JavaParser::new(Arc::new(MemoryParseCache::new()));
    let first = parser.parse(&path).unwrap();
    let second = parser.parse(&path).unwrap();
    assert_eq!(first, second);
    let m = parser.metrics();
    assert_eq!((m.files_parsed, m.cache_hits), (1, 1));

    fs::write(&path, "package p;\nclass A { void g() {} }\n").unwrap();
    let third = parser.parse(&path).unwrap();
    assert_eq!(third.classes[0].methods[0].name, "g");
    assert_eq!(parser.metrics().files_parsed, 2);
}

#[test]
fn parse_all_keeps_order_and_skips_failures() {
    let dir = tempdir().unwrap();
    let mut paths = Vec::new();
    for (name, body) in [
        ("B.java", "class B {}"),
        ("Bad.java", "class {"),
        ("A.java", "class A {}"),
    ] {
        let p = dir.path().join(name);
        fs::write(&p, body).unwrap();
        paths.push(p);
    }
    paths.push(dir.path().join("Missing.java"));
    let parser = JavaParser::new(Arc::new(MemoryParseCache::new()));
    let files = parser.parse_all(&paths);
    let names: Vec<_> = classes_of(&files).into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["B", "A"]);
    assert_eq!(parser.metrics().parse_errors, 2);
}
