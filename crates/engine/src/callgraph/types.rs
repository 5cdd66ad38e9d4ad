use ir::{erase_type, JavaClass};
use std::collections::{HashMap, HashSet, VecDeque};

const IMPL_SUFFIXES: &[&str] = &["Impl", "IMPL", "impl"];

fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{package}.{name}")
    }
}

/// Resolves type names, as written inside a class, to project classes.
pub(crate) struct TypeIndex {
    names: Vec<String>,
    by_name: HashMap<String, usize>,
    by_simple: HashMap<String, Vec<usize>>,
    by_package: HashMap<String, Vec<usize>>,
    supertypes: Vec<Vec<usize>>,
    subtypes: Vec<Vec<usize>>,
    interfaces: Vec<bool>,
}

impl TypeIndex {
    pub(crate) fn new(classes: &[JavaClass]) -> Self {
        let names: Vec<String> = classes.iter().map(|c| c.qualified_name()).collect();
        let mut by_name = HashMap::new();
        let mut by_simple: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_package: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, name) in names.iter().enumerate() {
            by_name.entry(name.clone()).or_insert(i);
            by_simple.entry(classes[i].name.clone()).or_default().push(i);
            by_package.entry(classes[i].package.clone()).or_default().push(i);
        }
        let mut index = Self {
            names,
            by_name,
            by_simple,
            by_package,
            supertypes: vec![Vec::new(); classes.len()],
            subtypes: vec![Vec::new(); classes.len()],
            interfaces: classes.iter().map(|c| c.is_interface).collect(),
        };
        for (i, class) in classes.iter().enumerate() {
            let parents: Vec<usize> = class
                .superclass
                .iter()
                .chain(class.interfaces.iter())
                .filter_map(|t| index.resolve(t, class))
                .filter(|&p| p != i)
                .collect();
            for &p in &parents {
                index.subtypes[p].push(i);
            }
            index.supertypes[i] = parents;
        }
        index
    }

    pub(crate) fn lookup(&self, qualified: &str) -> Option<usize> {
        self.by_name.get(qualified).copied()
    }

    pub(crate) fn with_simple_name(&self, simple: &str) -> &[usize] {
        self.by_simple.get(simple).map_or(&[], |v| v.as_slice())
    }

    /// Order: nested or same class, explicit import, same package, wildcard
    /// import. Types outside the project resolve to `None`.
    pub(crate) fn resolve(&self, type_name: &str, from: &JavaClass) -> Option<usize> {
        let name = erase_type(type_name);
        if name.is_empty() {
            return None;
        }
        if let Some((head, rest)) = name.split_once('.') {
            if let Some(i) = self.lookup(&name) {
                return Some(i);
            }
            // Outer.Inner written relative to the file
            let outer = self.resolve(head, from)?;
            return self.lookup(&format!("{}.{rest}", self.names[outer]));
        }

        let mut chain = from.nested_name();
        loop {
            if let Some(i) = self.lookup(&qualify(&from.package, &format!("{chain}.{name}"))) {
                return Some(i);
            }
            match chain.rsplit_once('.') {
                Some((outer, _)) => chain = outer.to_string(),
                None => break,
            }
        }
        if chain == name {
            return self.lookup(&qualify(&from.package, &name));
        }

        let explicit = from
            .imports
            .iter()
            .filter(|imp| !imp.ends_with(".*"))
            .find(|imp| imp.rsplit('.').next() == Some(name.as_str()))
            .and_then(|imp| self.lookup(imp));
        if explicit.is_some() {
            return explicit;
        }
        if let Some(i) = self.lookup(&qualify(&from.package, &name)) {
            return Some(i);
        }
        from.imports
            .iter()
            .filter_map(|imp| imp.strip_suffix(".*"))
            .find_map(|prefix| self.lookup(&format!("{prefix}.{name}")))
    }

    fn in_package(&self, package: &str) -> &[usize] {
        self.by_package.get(package).map_or(&[], |v| v.as_slice())
    }

    /// Classes of `from`'s package followed by its imported project classes,
    /// wildcard imports included.
    pub(crate) fn visible_from(&self, from: &JavaClass) -> Vec<usize> {
        let mut out: Vec<usize> = self.in_package(&from.package).to_vec();
        for imp in &from.imports {
            match imp.strip_suffix(".*") {
                Some(package) => out.extend_from_slice(self.in_package(package)),
                None => out.extend(self.lookup(imp)),
            }
        }
        let mut seen = HashSet::new();
        out.retain(|c| seen.insert(*c));
        out
    }

    /// Resolved superclass and interfaces, transitively, nearest first.
    pub(crate) fn ancestors(&self, class: usize) -> Vec<usize> {
        walk(class, &self.supertypes)
    }

    /// Every class extending or implementing `class`, transitively. An
    /// interface nobody declares to implement falls back to the naming
    /// convention `IUserSvc` / `UserSvc` implemented by `UserSvcImpl`.
    pub(crate) fn implementations(&self, class: usize) -> Vec<usize> {
        let found = walk(class, &self.subtypes);
        if !found.is_empty() || !self.interfaces[class] {
            return found;
        }
        let simple = self.names[class].rsplit('.').next().unwrap_or_default();
        let stripped = simple
            .strip_prefix('I')
            .filter(|rest| rest.chars().next().is_some_and(|c| c.is_ascii_uppercase()));
        let mut candidates: Vec<String> = Vec::new();
        for base in stripped.into_iter().chain(std::iter::once(simple)) {
            for suffix in IMPL_SUFFIXES {
                candidates.push(format!("{base}{suffix}"));
            }
        }
        candidates
            .iter()
            .flat_map(|c| self.with_simple_name(c).iter().copied())
            .filter(|&i| !self.interfaces[i])
            .take(1)
            .collect()
    }
}

/// Breadth-first closure over `edges`, excluding `start`.
fn walk(start: usize, edges: &[Vec<usize>]) -> Vec<usize> {
    let mut seen = HashSet::from([start]);
    let mut queue: VecDeque<usize> = edges[start].iter().copied().collect();
    let mut out = Vec::new();
    while let Some(next) = queue.pop_front() {
        if !seen.insert(next) {
            continue;
        }
        out.push(next);
        queue.extend(edges[next].iter().copied());
    }
    out
}
