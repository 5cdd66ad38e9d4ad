use ir::{
    erase_type, Annotation, CallSite, JavaClass, JavaField, JavaMethod, Parameter, ParsedJavaFile,
};
use std::collections::HashMap;
use tree_sitter::Node;

struct FileContext<'s> {
    src: &'s str,
    file_path: &'s str,
    package: String,
    imports: Vec<String>,
}

#[derive(Default)]
struct Modifiers {
    access: Option<String>,
    is_static: bool,
    annotations: Vec<Annotation>,
}

fn text<'s>(node: Node, src: &'s str) -> &'s str {
    node.utf8_text(src.as_bytes()).unwrap_or("")
}

fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn all_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Pre-order walk over named descendants, `node` included.
fn walk<'t>(node: Node<'t>, visit: &mut impl FnMut(Node<'t>)) {
    visit(node);
    for child in named_children(node) {
        walk(child, visit);
    }
}

fn squash(type_text: &str) -> String {
    type_text.split_whitespace().collect()
}

fn unquote(literal: &str) -> String {
    let s = literal
        .strip_prefix("\"\"\"")
        .and_then(|s| s.strip_suffix("\"\"\""))
        .unwrap_or(literal);
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
        .to_string()
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

fn is_type_declaration(kind: &str) -> bool {
    matches!(
        kind,
        "class_declaration" | "interface_declaration" | "enum_declaration" | "record_declaration"
    )
}

/// Returns the first syntax error or missing node under `node`.
pub(crate) fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    all_children(node).into_iter().find_map(first_error)
}

/// Walks a parsed compilation unit and extracts its structure.
pub fn extract_classes(root: Node, src: &str, file_path: &str) -> ParsedJavaFile {
    let mut ctx = FileContext {
        src,
        file_path,
        package: String::new(),
        imports: Vec::new(),
    };
    let top = named_children(root);
    for child in &top {
        match child.kind() {
            "package_declaration" => ctx.package = package_name(*child, src),
            "import_declaration" => {
                if let Some(path) = import_path(*child, src) {
                    ctx.imports.push(path);
                }
            }
            _ => {}
        }
    }
    let mut classes = Vec::new();
    for child in top {
        if is_type_declaration(child.kind()) {
            visit_type(child, &ctx, None, &mut classes);
        }
    }
    ParsedJavaFile {
        file_path: file_path.to_string(),
        content_hash: String::new(),
        package: ctx.package,
        imports: ctx.imports,
        classes,
    }
}

fn package_name(node: Node, src: &str) -> String {
    named_children(node)
        .into_iter()
        .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
        .map(|c| text(c, src).to_string())
        .unwrap_or_else(|| {
            text(node, src)
                .trim_start_matches("package")
                .trim()
                .trim_end_matches(';')
                .trim()
                .to_string()
        })
}

fn import_path(node: Node, src: &str) -> Option<String> {
    let mut raw = text(node, src).trim_start_matches("import").trim();
    if let Some(rest) = raw.strip_prefix("static ") {
        raw = rest.trim();
    }
    let path = squash(raw.trim_end_matches(';'));
    (!path.is_empty()).then_some(path)
}

fn modifiers(node: Node, src: &str) -> Modifiers {
    let mut mods = Modifiers::default();
    let Some(list) = named_children(node)
        .into_iter()
        .find(|c| c.kind() == "modifiers")
    else {
        return mods;
    };
    for child in all_children(list) {
        match child.kind() {
            "public" | "private" | "protected" => mods.access = Some(child.kind().to_string()),
            "static" => mods.is_static = true,
            "marker_annotation" | "annotation" => mods.annotations.push(annotation(child, src)),
            _ => {}
        }
    }
    mods
}

fn annotation(node: Node, src: &str) -> Annotation {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(n, src))
        .unwrap_or_default();
    let mut ann = Annotation::new(name);
    if let Some(args) = node.child_by_field_name("arguments") {
        for arg in named_children(args) {
            if arg.kind() == "element_value_pair" {
                let key = arg
                    .child_by_field_name("key")
                    .map(|k| text(k, src).to_string())
                    .unwrap_or_else(|| "value".into());
                let values = arg
                    .child_by_field_name("value")
                    .map(|v| annotation_values(v, src))
                    .unwrap_or_default();
                ann.arguments.insert(key, values);
            } else {
                ann.arguments
                    .entry("value".into())
                    .or_default()
                    .extend(annotation_values(arg, src));
            }
        }
    }
    ann
}

fn concat_literal(node: Node, src: &str) -> Option<String> {
    match node.kind() {
        "string_literal" => Some(unquote(text(node, src))),
        "binary_expression" => {
            let left = concat_literal(node.child_by_field_name("left")?, src)?;
            let right = concat_literal(node.child_by_field_name("right")?, src)?;
            Some(left + &right)
        }
        "parenthesized_expression" => concat_literal(*named_children(node).first()?, src),
        _ => None,
    }
}

fn annotation_values(node: Node, src: &str) -> Vec<String> {
    match node.kind() {
        "element_value_array_initializer" => named_children(node)
            .into_iter()
            .flat_map(|c| annotation_values(c, src))
            .collect(),
        _ => vec![concat_literal(node, src).unwrap_or_else(|| text(node, src).to_string())],
    }
}

fn type_list(node: Node, src: &str) -> Vec<String> {
    let mut out = Vec::new();
    for child in named_children(node) {
        if child.kind() == "type_list" {
            out.extend(type_list(child, src));
        } else {
            out.push(erase_type(text(child, src)));
        }
    }
    out
}

fn visit_type(node: Node, ctx: &FileContext, enclosing: Option<&str>, out: &mut Vec<JavaClass>) {
    let src = ctx.src;
    let Some(name) = node.child_by_field_name("name") else {
        return;
    };
    let mut class = JavaClass::new(text(name, src), ctx.file_path);
    class.package = ctx.package.clone();
    class.enclosing = enclosing.map(str::to_string);
    class.imports = ctx.imports.clone();
    class.is_interface = node.kind() == "interface_declaration";
    let mods = modifiers(node, src);
    class.access_modifier = mods.access.unwrap_or_else(|| "default".into());
    class.annotations = mods.annotations;
    if let Some(sup) = node.child_by_field_name("superclass") {
        class.superclass = type_list(sup, src).into_iter().next();
    }
    for child in named_children(node) {
        if matches!(child.kind(), "super_interfaces" | "extends_interfaces") {
            class.interfaces.extend(type_list(child, src));
        }
    }

    let mut nested = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let members = body_members(body);
        for member in &members {
            if matches!(member.kind(), "field_declaration" | "constant_declaration") {
                class.fields.extend(fields(*member, src));
            }
        }
        let nested_name = class.nested_name();
        for member in members {
            match member.kind() {
                "method_declaration" => {
                    let method = method(member, src, &class);
                    class.methods.push(method);
                }
                kind if is_type_declaration(kind) => {
                    visit_type(member, ctx, Some(&nested_name), &mut nested)
                }
                _ => {}
            }
        }
    }
    out.push(class);
    out.append(&mut nested);
}

/// Class, interface and record bodies list members directly; enum bodies
/// keep them under `enum_body_declarations`.
fn body_members(body: Node) -> Vec<Node> {
    let mut members = Vec::new();
    for child in named_children(body) {
        if child.kind() == "enum_body_declarations" {
            members.extend(named_children(child));
        } else {
            members.push(child);
        }
    }
    members
}

fn fields(node: Node, src: &str) -> Vec<JavaField> {
    let type_name = node
        .child_by_field_name("type")
        .map(|t| squash(text(t, src)))
        .unwrap_or_default();
    let is_static = modifiers(node, src).is_static;
    named_children(node)
        .into_iter()
        .filter(|c| c.kind() == "variable_declarator")
        .filter_map(|decl| {
            let name = text(decl.child_by_field_name("name")?, src).to_string();
            let string_value = decl
                .child_by_field_name("value")
                .and_then(|v| concat_literal(v, src));
            Some(JavaField {
                name,
                type_name: type_name.clone(),
                string_value,
                is_static,
            })
        })
        .collect()
}

fn parameters(node: Node, src: &str) -> Vec<Parameter> {
    let mut out = Vec::new();
    for p in named_children(node) {
        match p.kind() {
            "formal_parameter" => {
                let type_name = p
                    .child_by_field_name("type")
                    .map(|t| squash(text(t, src)))
                    .unwrap_or_default();
                let name = p
                    .child_by_field_name("name")
                    .map(|n| text(n, src).to_string())
                    .unwrap_or_default();
                out.push(Parameter { name, type_name });
            }
            "spread_parameter" => {
                let mut type_name = String::new();
                let mut name = String::new();
                for c in named_children(p) {
                    match c.kind() {
                        "modifiers" => {}
                        "variable_declarator" => {
                            name = c
                                .child_by_field_name("name")
                                .map(|n| text(n, src).to_string())
                                .unwrap_or_default();
                        }
                        _ if type_name.is_empty() => type_name = squash(text(c, src)),
                        _ => {}
                    }
                }
                out.push(Parameter {
                    name,
                    type_name: format!("{type_name}..."),
                });
            }
            _ => {}
        }
    }
    out
}

fn declare(scope: &mut HashMap<String, String>, name: &str, type_name: &str) {
    let erased = erase_type(type_name);
    if !erased.is_empty() && erased != "var" {
        scope.insert(name.to_string(), erased);
    }
}

/// Local variables visible somewhere in the body. Block scoping is ignored:
/// the last declaration of a name wins.
fn local_scope(body: Node, src: &str, params: &[Parameter]) -> HashMap<String, String> {
    let mut scope = HashMap::new();
    for p in params {
        declare(&mut scope, &p.name, &p.type_name);
    }
    walk(body, &mut |n| match n.kind() {
        "local_variable_declaration" => {
            let Some(ty) = n.child_by_field_name("type") else {
                return;
            };
            for decl in named_children(n) {
                if decl.kind() != "variable_declarator" {
                    continue;
                }
                let Some(name) = decl.child_by_field_name("name") else {
                    continue;
                };
                let declared = text(ty, src);
                // `var x = new Foo()` takes the constructed type
                let inferred = (declared == "var")
                    .then(|| decl.child_by_field_name("value"))
                    .flatten()
                    .filter(|v| v.kind() == "object_creation_expression")
                    .and_then(|v| v.child_by_field_name("type"))
                    .map(|t| text(t, src));
                declare(&mut scope, text(name, src), inferred.unwrap_or(declared));
            }
        }
        "enhanced_for_statement" | "resource" => {
            if let (Some(ty), Some(name)) =
                (n.child_by_field_name("type"), n.child_by_field_name("name"))
            {
                declare(&mut scope, text(name, src), text(ty, src));
            }
        }
        _ => {}
    });
    scope
}

fn receiver_type(
    obj: Node,
    src: &str,
    scope: &HashMap<String, String>,
    class: &JavaClass,
) -> Option<String> {
    match obj.kind() {
        "identifier" => {
            let name = text(obj, src);
            scope
                .get(name)
                .cloned()
                .or_else(|| class.field(name).map(|f| erase_type(&f.type_name)))
                .or_else(|| starts_uppercase(name).then(|| name.to_string()))
        }
        "field_access" => {
            let target = obj.child_by_field_name("object")?;
            let field = obj.child_by_field_name("field")?;
            if target.kind() == "this" {
                return class.field(text(field, src)).map(|f| erase_type(&f.type_name));
            }
            // com.shop.util.Dates.format(): package segments then a type
            let full = text(obj, src);
            let segments: Vec<&str> = full.split('.').collect();
            let (last, head) = segments.split_last()?;
            (starts_uppercase(last) && head.iter().all(|s| !starts_uppercase(s)))
                .then(|| squash(full))
        }
        "object_creation_expression" => obj
            .child_by_field_name("type")
            .map(|t| erase_type(text(t, src))),
        _ => None,
    }
}

fn call_site(
    node: Node,
    src: &str,
    scope: &HashMap<String, String>,
    class: &JavaClass,
) -> Option<CallSite> {
    let callee = text(node.child_by_field_name("name")?, src).to_string();
    let argument_count = node
        .child_by_field_name("arguments")
        .map_or(0, |a| a.named_child_count());
    let (receiver, receiver_type) = match node.child_by_field_name("object") {
        Some(obj) => (
            Some(squash(text(obj, src))),
            receiver_type(obj, src, scope, class),
        ),
        None => (None, None),
    };
    Some(CallSite {
        callee,
        receiver,
        receiver_type,
        argument_count,
        line: node.start_position().row + 1,
    })
}

fn method(node: Node, src: &str, class: &JavaClass) -> JavaMethod {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(n, src).to_string())
        .unwrap_or_default();
    let params = node
        .child_by_field_name("parameters")
        .map(|p| parameters(p, src))
        .unwrap_or_default();
    let return_type = node
        .child_by_field_name("type")
        .map(|t| squash(text(t, src)))
        .unwrap_or_else(|| "void".into());
    let mods = modifiers(node, src);
    let access_modifier = mods.access.unwrap_or_else(|| {
        if class.is_interface {
            "public".into()
        } else {
            "default".into()
        }
    });

    let mut call_sites = Vec::new();
    let mut string_literals = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let scope = local_scope(body, src, &params);
        walk(body, &mut |n| match n.kind() {
            "method_invocation" => {
                if let Some(site) = call_site(n, src, &scope, class) {
                    call_sites.push(site);
                }
            }
            "string_literal" => string_literals.push(unquote(text(n, src))),
            _ => {}
        });
    }

    JavaMethod {
        name,
        parameters: params,
        return_type,
        annotations: mods.annotations,
        access_modifier,
        is_static: mods.is_static,
        line_start: node.start_position().row + 1,
        line_end: node.end_position().row + 1,
        call_sites,
        string_literals,
    }
}
