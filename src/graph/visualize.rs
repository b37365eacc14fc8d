//! Risk-coloured export of a family tree
//!
//! The graph is plain data for rendering collaborators: JSON through serde,
//! or Graphviz DOT via [`RiskGraph::to_dot`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;
use crate::models::{Address, FamilyTree, RiskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Root,
    Parent,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: Address,
    pub label: String,
    pub role: NodeRole,
    pub status: RiskStatus,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: Address,
    pub to: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskGraph {
    pub root: Address,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl RiskGraph {
    /// Build from a tree, asking `status_of` for every distinct address
    pub fn from_tree<F>(tree: &FamilyTree, mut status_of: F) -> Self
    where
        F: FnMut(&Address) -> RiskStatus,
    {
        let mut roles: BTreeMap<&Address, NodeRole> = BTreeMap::new();
        let mut edges = Vec::new();

        roles.insert(&tree.root, NodeRole::Root);
        for parent in &tree.parents {
            roles.entry(parent).or_insert(NodeRole::Parent);
            edges.push(GraphEdge { from: tree.root.clone(), to: parent.clone() });
        }
        for (parent, kids) in &tree.children {
            roles.entry(parent).or_insert(NodeRole::Parent);
            for kid in kids {
                roles.entry(kid).or_insert(NodeRole::Child);
                edges.push(GraphEdge { from: parent.clone(), to: kid.clone() });
            }
        }

        let nodes = roles
            .into_iter()
            .map(|(address, role)| {
                let status = status_of(address);
                GraphNode {
                    id: address.clone(),
                    label: format!("{}\n{}", address.shorten(6), status),
                    role,
                    status,
                    color: status.color().to_string(),
                }
            })
            .collect();

        Self { root: tree.root.clone(), nodes, edges }
    }

    pub fn node(&self, address: &Address) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| &node.id == address)
    }

    pub fn to_dot(&self) -> String {
        let mut dot = String::new();
        let _ = writeln!(dot, "digraph family_tree {{");
        let _ = writeln!(dot, "    rankdir=TB;");
        let _ = writeln!(dot, "    node [style=filled, fontname=\"monospace\"];");

        for node in &self.nodes {
            let shape = match node.role {
                NodeRole::Root => "doublecircle",
                NodeRole::Parent => "box",
                NodeRole::Child => "ellipse",
            };
            let _ = writeln!(
                dot,
                "    \"{}\" [label=\"{}\", fillcolor=\"{}\", shape={}];",
                node.id,
                node.label.replace('\n', "\\n"),
                node.color,
                shape
            );
        }
        for edge in &self.edges {
            let _ = writeln!(dot, "    \"{}\" -> \"{}\";", edge.from, edge.to);
        }

        dot.push('}');
        dot.push('\n');
        dot
    }
}
