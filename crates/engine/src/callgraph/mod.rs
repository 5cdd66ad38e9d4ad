//! Method level call graph of the parsed project.
//!
//! Nodes live in an arena and edges are adjacency lists of node indices, in
//! both directions. Calls are resolved by simple method name against the
//! receiver's class, or against the classes visible from the caller when
//! the receiver's type is unknown (see [`CallGraph::resolve_call`]). Calls
//! on types outside the project are dropped without error.

use ir::{
    CallGraphSummary, CallSite, CallTree, Endpoint, JavaClass, JavaField, JavaMethod,
    ParsedJavaFile,
};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use tracing::{debug, info};

mod endpoints;
mod types;

pub use endpoints::join_path;
use types::TypeIndex;


/// Upper bound on the nodes of a single call tree. Wide fan-out repeated
/// down to the depth limit would otherwise grow exponentially.
pub const MAX_TREE_NODES: usize = 10_000;

#[derive(Debug, Clone, Serialize)]
pub struct MethodNode {
    pub signature: String,
    pub class_name: String,
    pub method_name: String,
    pub file_path: String,
    #[serde(skip)]
    class: usize,
    #[serde(skip)]
    method: usize,
}

impl MethodNode {
    pub fn class_index(&self) -> usize {
        self.class
    }
}

/// Collects parsed files. Adding a file path a second time replaces the
/// classes it contributed.
#[derive(Debug, Default)]
pub struct CallGraphBuilder {
    order: Vec<String>,
    files: HashMap<String, Vec<JavaClass>>,
}

impl CallGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, file: ParsedJavaFile) -> &mut Self {
        self.add_classes(&file.file_path, file.classes)
    }

    pub fn add_classes(&mut self, file_path: &str, classes: Vec<JavaClass>) -> &mut Self {
        if self.files.insert(file_path.to_string(), classes).is_none() {
            self.order.push(file_path.to_string());
        }
        self
    }

    pub fn build(self) -> CallGraph {
        let CallGraphBuilder { order, mut files } = self;
        let classes: Vec<JavaClass> = order
            .iter()
            .filter_map(|path| files.remove(path))
            .flatten()
            .collect();
        CallGraph::from_classes(classes)
    }
}

pub struct CallGraph {
    classes: Vec<JavaClass>,
    nodes: Vec<MethodNode>,
    index: HashMap<String, usize>,
    callees: Vec<Vec<usize>>,
    callers: Vec<Vec<usize>>,
    class_nodes: Vec<Vec<usize>>,
    files: HashMap<String, Vec<usize>>,
    endpoints: Vec<(Endpoint, usize)>,
    types: TypeIndex,
}

impl CallGraph {
    /// Builds the graph from classes of any number of files. Classes sharing
    /// a file path are appended to that file in input order; use
    /// [`CallGraphBuilder::add_file`] to replace a file's classes.
    pub fn build(classes: Vec<JavaClass>) -> Self {
        let mut builder = CallGraphBuilder::new();
        for class in classes {
            let path = class.file_path.clone();
            match builder.files.get_mut(&path) {
                Some(list) => list.push(class),
                None => {
                    builder.add_classes(&path, vec![class]);
                }
            }
        }
        builder.build()
    }

    fn from_classes(classes: Vec<JavaClass>) -> Self {
        let types = TypeIndex::new(&classes);
        let mut nodes = Vec::new();
        let mut index = HashMap::new();
        let mut class_nodes = vec![Vec::new(); classes.len()];
        let mut files: HashMap<String, Vec<usize>> = HashMap::new();
        for (ci, class) in classes.iter().enumerate() {
            files.entry(class.file_path.clone()).or_default().push(ci);
            for (mi, method) in class.methods.iter().enumerate() {
                let signature = class.method_signature(method);
                if index.contains_key(&signature) {
                    debug!(signature = %signature, file = %class.file_path, "Duplicate method signature ignored");
                    continue;
                }
                index.insert(signature.clone(), nodes.len());
                class_nodes[ci].push(nodes.len());
                nodes.push(MethodNode {
                    signature,
                    class_name: class.qualified_name(),
                    method_name: method.name.clone(),
                    file_path: class.file_path.clone(),
                    class: ci,
                    method: mi,
                });
            }
        }

        let mut graph = Self {
            classes,
            nodes,
            index,
            callees: Vec::new(),
            callers: Vec::new(),
            class_nodes,
            files,
            endpoints: Vec::new(),
            types,
        };

        // every node exists at this point, edges may cross files freely
        let callees: Vec<Vec<usize>> = (0..graph.nodes.len())
            .into_par_iter()
            .map(|n| graph.resolve_node(n))
            .collect();
        let mut callers = vec![Vec::new(); graph.nodes.len()];
        for (from, targets) in callees.iter().enumerate() {
            for &to in targets {
                callers[to].push(from);
            }
        }
        graph.callees = callees;
        graph.callers = callers;

        let mut endpoints = Vec::new();
        for (n, node) in graph.nodes.iter().enumerate() {
            let class = &graph.classes[node.class];
            let method = &class.methods[node.method];
            for ep in endpoints::endpoints_of(class, method, &node.signature) {
                endpoints.push((ep, n));
            }
        }
        graph.endpoints = endpoints;

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            endpoints = graph.endpoints.len(),
            "Call graph built"
        );
        graph
    }

    fn resolve_node(&self, n: usize) -> Vec<usize> {
        let class = self.nodes[n].class;
        let mut out: Vec<usize> = Vec::new();
        for site in &self.method(n).call_sites {
            for target in self.resolve_call(class, site) {
                if !out.contains(&target) {
                    out.push(target);
                }
            }
        }
        out
    }

    fn methods_named(&self, class: usize, name: &str) -> Vec<usize> {
        self.class_nodes[class]
            .iter()
            .copied()
            .filter(|&n| self.nodes[n].method_name == name)
            .collect()
    }

    /// Methods named `name` in `class`, or in the nearest ancestor that
    /// declares one.
    fn lookup_upwards(&self, class: usize, name: &str) -> Vec<usize> {
        std::iter::once(class)
            .chain(self.types.ancestors(class))
            .map(|c| self.methods_named(c, name))
            .find(|found| !found.is_empty())
            .unwrap_or_default()
    }

    /// Every project method a call site may land on. All overloads sharing
    /// the callee name are linked; argument types are not compared.
    ///
    /// A receiver of unknown type is first looked up as a field inherited
    /// from a project superclass. Failing that, the callee name is matched
    /// against the methods of the caller's package and imported classes.
    pub fn resolve_call(&self, class: usize, site: &CallSite) -> Vec<usize> {
        let caller = &self.classes[class];
        match (site.receiver.as_deref(), site.receiver_type.as_deref()) {
            (None, _) | (Some("this"), _) => {
                let mut targets = self.lookup_upwards(class, &site.callee);
                let mut enclosing = caller.enclosing.clone();
                while targets.is_empty() {
                    let Some(outer) = enclosing else { break };
                    let Some(ci) = self.types.lookup(&qualify(&caller.package, &outer)) else {
                        break;
                    };
                    targets = self.lookup_upwards(ci, &site.callee);
                    enclosing = self.classes[ci].enclosing.clone();
                }
                targets
            }
            (Some("super"), _) => caller
                .superclass
                .as_deref()
                .and_then(|s| self.types.resolve(s, caller))
                .map(|sup| self.lookup_upwards(sup, &site.callee))
                .unwrap_or_default(),
            (Some(_), Some(type_name)) => match self.types.resolve(type_name, caller) {
                Some(target) => self.dispatch(target, &site.callee),
                None => Vec::new(),
            },
            (Some(receiver), None) => match self.inherited_field(class, receiver) {
                Some((owner, field)) => {
                    match self.types.resolve(&field.type_name, &self.classes[owner]) {
                        Some(target) => self.dispatch(target, &site.callee),
                        None => Vec::new(),
                    }
                }
                None => self.visible_methods(class, &site.callee),
            },
        }
    }

    /// `name` on an instance of `target`: the nearest declaration upwards
    /// plus every implementation or override below it.
    fn dispatch(&self, target: usize, name: &str) -> Vec<usize> {
        let mut out = self.lookup_upwards(target, name);
        for sub in self.types.implementations(target) {
            for n in self.methods_named(sub, name) {
                if !out.contains(&n) {
                    out.push(n);
                }
            }
        }
        out
    }

    /// Field named by a plain or `this.` receiver, declared in a project
    /// superclass of `class`, with the index of the declaring class.
    fn inherited_field(&self, class: usize, receiver: &str) -> Option<(usize, &JavaField)> {
        let name = receiver.strip_prefix("this.").unwrap_or(receiver);
        if !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
            return None;
        }
        self.types
            .ancestors(class)
            .into_iter()
            .find_map(|a| self.classes[a].field(name).map(|f| (a, f)))
    }

    fn visible_methods(&self, class: usize, name: &str) -> Vec<usize> {
        let mut out = Vec::new();
        for c in self.types.visible_from(&self.classes[class]) {
            for n in self.methods_named(c, name) {
                if !out.contains(&n) {
                    out.push(n);
                }
            }
        }
        out
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.callees.iter().map(Vec::len).sum()
    }

    pub fn nodes(&self) -> &[MethodNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &MethodNode {
        &self.nodes[index]
    }

    /// Parsed method behind a node.
    pub fn method(&self, node: usize) -> &JavaMethod {
        let n = &self.nodes[node];
        &self.classes[n.class].methods[n.method]
    }

    pub fn node_index(&self, signature: &str) -> Option<usize> {
        self.index.get(signature).copied()
    }

    pub fn classes(&self) -> &[JavaClass] {
        &self.classes
    }

    /// Index of a class by fully qualified name.
    pub fn class_index(&self, qualified: &str) -> Option<usize> {
        self.types.lookup(qualified)
    }

    /// Classes whose simple name is `simple`.
    pub fn classes_named(&self, simple: &str) -> &[usize] {
        self.types.with_simple_name(simple)
    }

    /// Nodes of the methods of `class` named `name`.
    pub fn class_methods(&self, class: usize, name: &str) -> Vec<usize> {
        self.methods_named(class, name)
    }

    /// Nodes of every method declared by `class`.
    pub fn class_nodes(&self, class: usize) -> &[usize] {
        &self.class_nodes[class]
    }

    pub fn classes_for_file(&self, file_path: &str) -> Vec<&JavaClass> {
        self.files
            .get(file_path)
            .map(|ids| ids.iter().map(|&i| &self.classes[i]).collect())
            .unwrap_or_default()
    }

    pub fn callees_of(&self, signature: &str) -> Vec<&str> {
        self.neighbours(signature, &self.callees)
    }

    pub fn callers_of(&self, signature: &str) -> Vec<&str> {
        self.neighbours(signature, &self.callers)
    }

    fn neighbours<'a>(&'a self, signature: &str, edges: &'a [Vec<usize>]) -> Vec<&'a str> {
        self.node_index(signature)
            .map(|n| {
                edges[n]
                    .iter()
                    .map(|&m| self.nodes[m].signature.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.endpoints.iter().map(|(e, _)| e.clone()).collect()
    }

    /// `node` and every node calling it within `max_depth` hops.
    pub fn reaching_nodes(&self, node: usize, max_depth: usize) -> Vec<usize> {
        let mut seen = HashSet::from([node]);
        let mut out = vec![node];
        let mut queue = VecDeque::from([(node, 0usize)]);
        while let Some((n, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for &caller in &self.callers[n] {
                if seen.insert(caller) {
                    out.push(caller);
                    queue.push_back((caller, depth + 1));
                }
            }
        }
        out
    }

    /// Files of `signature` and of every method reaching it.
    pub fn reachable_files(&self, signature: &str, max_depth: usize) -> BTreeSet<String> {
        self.node_index(signature)
            .map(|n| {
                self.reaching_nodes(n, max_depth)
                    .into_iter()
                    .map(|m| self.nodes[m].file_path.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Endpoints whose method is among `nodes`.
    pub fn endpoints_among(&self, nodes: &[usize]) -> Vec<&Endpoint> {
        let set: HashSet<usize> = nodes.iter().copied().collect();
        self.endpoints
            .iter()
            .filter(|(_, n)| set.contains(n))
            .map(|(e, _)| e)
            .collect()
    }

    /// Depth first expansion of the callees of `signature`. A callee already
    /// on the current path becomes a `recursive` leaf; at `max_depth` the
    /// node becomes a `truncated` leaf when it still has callees.
    pub fn call_tree(&self, signature: &str, max_depth: usize) -> Option<CallTree> {
        let root = self.node_index(signature)?;
        let mut on_path = HashSet::new();
        let mut budget = MAX_TREE_NODES;
        Some(self.expand(root, 0, max_depth, &mut on_path, &mut budget))
    }

    fn expand(
        &self,
        node: usize,
        depth: usize,
        max_depth: usize,
        on_path: &mut HashSet<usize>,
        budget: &mut usize,
    ) -> CallTree {
        let n = &self.nodes[node];
        let mut tree = CallTree::leaf(n.signature.clone(), n.file_path.clone());
        *budget = budget.saturating_sub(1);
        let callees = &self.callees[node];
        if depth >= max_depth || *budget == 0 {
            tree.truncated = !callees.is_empty();
            return tree;
        }
        on_path.insert(node);
        for &callee in callees {
            if on_path.contains(&callee) {
                let c = &self.nodes[callee];
                let mut back = CallTree::leaf(c.signature.clone(), c.file_path.clone());
                back.recursive = true;
                tree.children.push(back);
                continue;
            }
            tree.children
                .push(self.expand(callee, depth + 1, max_depth, on_path, budget));
        }
        on_path.remove(&node);
        tree
    }

    /// Call tree of every endpoint method, keyed by method signature.
    pub fn call_trees(&self, max_depth: usize) -> BTreeMap<String, CallTree> {
        let mut roots: Vec<&str> = self
            .endpoints
            .iter()
            .map(|(e, _)| e.method_signature.as_str())
            .collect();
        roots.dedup();
        roots
            .par_iter()
            .filter_map(|sig| self.call_tree(sig, max_depth).map(|t| (sig.to_string(), t)))
            .collect()
    }

    pub fn summary(&self, max_depth: usize) -> CallGraphSummary {
        CallGraphSummary {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            endpoints: self.endpoints(),
            call_trees: self.call_trees(max_depth),
        }
    }
}

fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{package}.{name}")
    }
}
