//! Graphviz DOT building blocks shared by the renderers.
//!
//! Elements are assembled into a [`DiGraph`] and serialized in one pass with
//! [`DiGraph::render`]. Attribute values are always written quoted; callers
//! pass values that are already escaped for their context (see
//! [`escape_label`] and [`escape_record`]).

use crate::graph::format::Layout;
use sha2::{Digest, Sha256};

/// Stable DOT identifier derived from a key, e.g. `node_3a7bd3e2360a3d29`
pub fn hashed_id(prefix: &str, key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{}_{}", prefix, hex::encode(&digest[..8]))
}

/// Record node holding a table
pub fn node_id(table: &str) -> String {
    hashed_id("node", table)
}

/// Cluster wrapping a table
pub fn cluster_id(table: &str) -> String {
    hashed_id("cluster", table)
}

/// Composite index node of a table
pub fn index_node_id(table: &str) -> String {
    hashed_id("idx", table)
}

/// Relation node between a dependent and a reference table
pub fn relation_node_id(dependent: &str, reference: &str) -> String {
    hashed_id("rel", &format!("{}\0{}", dependent, reference))
}

/// Escape plain text for a quoted attribute value
pub fn escape_label(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Escape text placed in one cell of a record label
pub fn escape_record(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '{' | '}' | '|' | '<' | '>' | '"' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Ordered `key="value"` attribute list
#[derive(Debug, Clone, Default)]
pub struct Attrs(Vec<(&'static str, String)>);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn render(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub attrs: Attrs,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attrs: Attrs::new(),
        }
    }

    pub fn attr(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.attrs.set(key, value);
        self
    }

    fn write_to(&self, out: &mut String, indent: &str) {
        if self.attrs.is_empty() {
            out.push_str(&format!("{}{};\n", indent, self.id));
        } else {
            out.push_str(&format!("{}{} [{}];\n", indent, self.id, self.attrs.render()));
        }
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub attrs: Attrs,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            attrs: Attrs::new(),
        }
    }

    pub fn attr(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.attrs.set(key, value);
        self
    }

    fn write_to(&self, out: &mut String, indent: &str) {
        if self.attrs.is_empty() {
            out.push_str(&format!("{}{} -> {};\n", indent, self.from, self.to));
        } else {
            out.push_str(&format!(
                "{}{} -> {} [{}];\n",
                indent,
                self.from,
                self.to,
                self.attrs.render()
            ));
        }
    }
}

/// Cluster subgraph with its own style, nodes and edges
#[derive(Debug, Clone)]
pub struct Subgraph {
    pub id: String,
    pub attrs: Attrs,
    pub node_defaults: Attrs,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Subgraph {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attrs: Attrs::new(),
            node_defaults: Attrs::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn attr(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.attrs.set(key, value);
        self
    }

    pub fn node_default(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.node_defaults.set(key, value);
        self
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    fn write_to(&self, out: &mut String, indent: &str) {
        let inner = format!("{}  ", indent);
        out.push_str(&format!("{}subgraph {} {{\n", indent, self.id));
        for (key, value) in &self.attrs.0 {
            out.push_str(&format!("{}{}=\"{}\";\n", inner, key, value));
        }
        if !self.node_defaults.is_empty() {
            out.push_str(&format!("{}node [{}];\n", inner, self.node_defaults.render()));
        }
        for node in &self.nodes {
            node.write_to(out, &inner);
        }
        for edge in &self.edges {
            edge.write_to(out, &inner);
        }
        out.push_str(&format!("{}}}\n", indent));
    }
}

/// Top-level directed graph
#[derive(Debug, Clone)]
pub struct DiGraph {
    pub layout: Layout,
    pub subgraphs: Vec<Subgraph>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl DiGraph {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            subgraphs: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn add_subgraph(&mut self, subgraph: Subgraph) {
        self.subgraphs.push(subgraph);
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Serialize the whole graph
    pub fn render(&self) -> String {
        let mut output = String::new();

        output.push_str("digraph G {\n");
        output.push_str(&format!("  rankdir={};\n", self.layout.rankdir()));
        output.push_str("  compound=true;\n");
        output.push_str("  nodesep=0.5;\n");
        output.push_str("  ranksep=0.7;\n");

        if !self.subgraphs.is_empty() {
            output.push('\n');
        }
        for subgraph in &self.subgraphs {
            subgraph.write_to(&mut output, "  ");
        }

        if !self.nodes.is_empty() {
            output.push('\n');
        }
        for node in &self.nodes {
            node.write_to(&mut output, "  ");
        }

        if !self.edges.is_empty() {
            output.push('\n');
        }
        for edge in &self.edges {
            edge.write_to(&mut output, "  ");
        }

        output.push_str("}\n");
        output
    }
}

/// Record label laid out as rows of cells.
///
/// Top-to-bottom graphs draw records horizontally, so rows are transposed
/// into columns there; left-to-right graphs wrap the columns in one more
/// flip so rows read across.
#[derive(Debug, Clone)]
pub struct Grid {
    layout: Layout,
    rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            rows: Vec::new(),
        }
    }

    /// Append a row of already-escaped cells
    pub fn push_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let width = self.rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let columns: Vec<String> = (0..width)
            .map(|c| {
                let cells: Vec<&str> = self
                    .rows
                    .iter()
                    .map(|row| row.get(c).map(String::as_str).unwrap_or(""))
                    .collect();
                format!("{{{}}}", cells.join("|"))
            })
            .collect();
        let body = columns.join(" | ");
        match self.layout {
            Layout::TB => body,
            Layout::LR => format!("{{{}}}", body),
        }
    }
}
