use ir::{Annotation, Endpoint, JavaClass, JavaMethod};

const SPRING_SHORTCUTS: &[(&str, &str)] = &[
    ("GetMapping", "GET"),
    ("PostMapping", "POST"),
    ("PutMapping", "PUT"),
    ("DeleteMapping", "DELETE"),
    ("PatchMapping", "PATCH"),
];

const SPRING_CONTROLLERS: &[&str] = &["Controller", "RestController"];

const JAXRS_VERBS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

/// Joins a class level and a method level route: the class path loses its
/// trailing slash, the method path gets a leading one.
///
/// # Example
/// ```
/// use engine::callgraph::join_path;
/// assert_eq!(join_path("/api/", "users"), "/api/users");
/// assert_eq!(join_path("api", "/users/{id}"), "/api/users/{id}");
/// assert_eq!(join_path("", ""), "/");
/// assert_eq!(join_path("/api", ""), "/api");
/// ```
pub fn join_path(class_path: &str, method_path: &str) -> String {
    let base = class_path.trim().trim_end_matches('/');
    let base = if base.is_empty() || base.starts_with('/') {
        base.to_string()
    } else {
        format!("/{base}")
    };
    let method = method_path.trim();
    if method.is_empty() || method == "/" {
        return if base.is_empty() { "/".into() } else { base };
    }
    if method.starts_with('/') {
        format!("{base}{method}")
    } else {
        format!("{base}/{method}")
    }
}

fn paths(annotation: Option<&Annotation>) -> Vec<String> {
    let values = annotation.map_or(&[][..], |a| a.values(&["value", "path"]));
    if values.is_empty() {
        vec![String::new()]
    } else {
        values.to_vec()
    }
}

/// Routes of one method: Spring mappings first, JAX-RS otherwise. A method
/// without a route annotation of its own is not an endpoint, and Spring
/// mappings count only inside a `@Controller` or `@RestController` class.
pub(crate) fn endpoints_of(class: &JavaClass, method: &JavaMethod, signature: &str) -> Vec<Endpoint> {
    let mut routes: Vec<(String, String)> = Vec::new();
    if SPRING_CONTROLLERS.iter().any(|a| class.annotation(a).is_some()) {
        spring_routes(class, method, &mut routes);
    }

    if routes.is_empty() {
        let class_paths = paths(class.annotation("Path"));
        let method_paths = paths(method.annotation("Path"));
        for verb in JAXRS_VERBS {
            if method.annotation(verb).is_none() {
                continue;
            }
            for base in &class_paths {
                for p in &method_paths {
                    routes.push((verb.to_string(), join_path(base, p)));
                }
            }
        }
    }

    let mut endpoints: Vec<Endpoint> = Vec::new();
    for (http_method, path) in routes {
        let endpoint = Endpoint {
            http_method,
            path,
            method_signature: signature.to_string(),
            class_name: class.nested_name(),
            file_path: class.file_path.clone(),
        };
        if !endpoints.contains(&endpoint) {
            endpoints.push(endpoint);
        }
    }
    endpoints
}

fn spring_routes(class: &JavaClass, method: &JavaMethod, routes: &mut Vec<(String, String)>) {
    let class_paths = paths(class.annotation("RequestMapping"));
    for (name, verb) in SPRING_SHORTCUTS {
        if let Some(ann) = method.annotation(name) {
            for base in &class_paths {
                for p in paths(Some(ann)) {
                    routes.push((verb.to_string(), join_path(base, &p)));
                }
            }
        }
    }
    if let Some(ann) = method.annotation("RequestMapping") {
        let verbs: Vec<String> = match ann.values(&["method"]) {
            [] => vec!["ANY".into()],
            methods => methods
                .iter()
                .map(|m| m.rsplit('.').next().unwrap_or(m).trim().to_uppercase())
                .collect(),
        };
        for base in &class_paths {
            for p in paths(Some(ann)) {
                for verb in &verbs {
                    routes.push((verb.clone(), join_path(base, &p)));
                }
            }
        }
    }
}
