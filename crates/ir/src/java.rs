//! Structural model of Java source: classes, methods and call sites.
//!
//! The model is intentionally shallow. It keeps what the call graph and the
//! SQL ownership lookup need (names, types as written, annotations and call
//! expressions) and nothing that would require semantic resolution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Annotation attached to a class, method or parameter.
pub struct Annotation {
    /// Simple name without `@` (`GetMapping`).
    pub name: String,
    /// Named arguments. A single unnamed argument is stored under `value`.
    /// Array arguments keep one entry per element, in source order.
    #[serde(default)]
    pub arguments: BTreeMap<String, Vec<String>>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: BTreeMap::new(),
        }
    }

    /// Returns the values of the first argument found among `keys`.
    pub fn values(&self, keys: &[&str]) -> &[String] {
        keys.iter()
            .find_map(|k| self.arguments.get(*k))
            .map_or(&[], |v| v.as_slice())
    }

    /// Checks the name ignoring any package qualifier.
    pub fn is(&self, name: &str) -> bool {
        self.name.rsplit('.').next() == Some(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JavaField {
    pub name: String,
    pub type_name: String,
    /// Value of a string-literal initializer, quotes removed.
    #[serde(default)]
    pub string_value: Option<String>,
    #[serde(default)]
    pub is_static: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// One method invocation found inside a method body.
pub struct CallSite {
    /// Simple name of the invoked method.
    pub callee: String,
    /// Receiver expression as written (`userService`, `this.dao`), if any.
    #[serde(default)]
    pub receiver: Option<String>,
    /// Declared type of the receiver when it could be inferred from a local
    /// variable, parameter or field. Generic arguments are removed.
    #[serde(default)]
    pub receiver_type: Option<String>,
    pub argument_count: usize,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JavaMethod {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    pub access_modifier: String,
    #[serde(default)]
    pub is_static: bool,
    pub line_start: usize,
    pub line_end: usize,
    #[serde(default)]
    pub call_sites: Vec<CallSite>,
    /// String literals used in the body, in source order.
    #[serde(default)]
    pub string_literals: Vec<String>,
}

impl JavaMethod {
    /// `name(TypeA,TypeB)` portion of the signature.
    pub fn descriptor(&self) -> String {
        let params: Vec<&str> = self
            .parameters
            .iter()
            .map(|p| p.type_name.as_str())
            .collect();
        format!("{}({})", self.name, params.join(","))
    }

    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.is(name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JavaClass {
    pub name: String,
    #[serde(default)]
    pub package: String,
    /// Dotted chain of enclosing classes for nested declarations (`Outer`).
    #[serde(default)]
    pub enclosing: Option<String>,
    pub access_modifier: String,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub fields: Vec<JavaField>,
    #[serde(default)]
    pub methods: Vec<JavaMethod>,
    #[serde(default)]
    pub is_interface: bool,
    pub file_path: String,
}

impl JavaClass {
    /// Name including enclosing classes (`Outer.Inner`).
    pub fn nested_name(&self) -> String {
        match &self.enclosing {
            Some(outer) => format!("{outer}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Fully qualified name (`com.shop.Outer.Inner`).
    ///
    /// # Example
    /// ```
    /// use ir::JavaClass;
    /// let mut c = JavaClass::new("UserMapper", "a/UserMapper.java");
    /// c.package = "com.shop.mapper".into();
    /// assert_eq!(c.qualified_name(), "com.shop.mapper.UserMapper");
    /// ```
    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.nested_name()
        } else {
            format!("{}.{}", self.package, self.nested_name())
        }
    }

    /// Unique signature of one of this class's methods.
    pub fn method_signature(&self, method: &JavaMethod) -> String {
        format!("{}.{}", self.qualified_name(), method.descriptor())
    }

    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.is(name))
    }

    pub fn field(&self, name: &str) -> Option<&JavaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn new(name: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: String::new(),
            enclosing: None,
            access_modifier: "default".into(),
            imports: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            is_interface: false,
            file_path: file_path.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Extracted structure of one Java file; this is what the parse cache stores.
pub struct ParsedJavaFile {
    pub file_path: String,
    pub content_hash: String,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub imports: Vec<String>,
    pub classes: Vec<JavaClass>,
}

/// Removes generic arguments, array brackets and varargs from a type name.
///
/// # Example
/// ```
/// use ir::java::erase_type;
/// assert_eq!(erase_type("List<Map<String, User>>"), "List");
/// assert_eq!(erase_type("User[]"), "User");
/// assert_eq!(erase_type("String..."), "String");
/// ```
pub fn erase_type(type_name: &str) -> String {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.trim()
        .trim_end_matches("...")
        .trim_end_matches("[]")
        .trim()
        .to_string()
}
