//! Call graph output types: endpoints and bounded call trees.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// An HTTP-exposed method.
pub struct Endpoint {
    pub http_method: String,
    pub path: String,
    pub method_signature: String,
    pub class_name: String,
    #[serde(default)]
    pub file_path: String,
}

impl Endpoint {
    /// `GET /api/users`
    pub fn label(&self) -> String {
        format!("{} {}", self.http_method, self.path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallTree {
    pub signature: String,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CallTree>,
    /// The node is already on the current path; its callees are not expanded.
    #[serde(default, skip_serializing_if = "is_false")]
    pub recursive: bool,
    /// The depth limit stopped the expansion while callees remained.
    #[serde(default, skip_serializing_if = "is_false")]
    pub truncated: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl CallTree {
    pub fn leaf(signature: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            file_path: file_path.into(),
            children: Vec::new(),
            recursive: false,
            truncated: false,
        }
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Visits every node in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a CallTree)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CallGraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub endpoints: Vec<Endpoint>,
    /// Call tree per endpoint method signature.
    pub call_trees: BTreeMap<String, CallTree>,
}
