//! Graph export as DOT text.
//!
//! The containment forest is written depth-first: each container becomes a
//! `subgraph cluster_*` block holding its children. An edge is written in the
//! block of the deepest container enclosing both endpoints, or at top level.

use std::{collections::HashMap, fmt};

use trellis_core::{
    edge::{Curve, Edge},
    geometry::Position,
    graph::Graph,
    identifier::Id,
    node::Node,
};

use crate::{CLUSTER_PREFIX, SCALE_FACTOR, keys};

const INDENT: &str = "    ";

/// [`Display`](fmt::Display) adapter writing a graph as DOT text.
///
/// ```
/// # use trellis_core::{graph::Graph, identifier::Id, node::Node};
/// # use trellis_dot::DotWriter;
/// let mut graph = Graph::new();
/// graph.add_node(Node::new(Id::new("a"))).unwrap();
/// let text = DotWriter::new(&graph).to_string();
/// assert!(text.starts_with("graph {"));
/// ```
pub struct DotWriter<'a> {
    graph: &'a Graph,
    directed: bool,
}

impl<'a> DotWriter<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        Self {
            graph,
            directed: graph.edges().any(Edge::is_directed),
        }
    }

    /// Groups edges by the deepest container enclosing both endpoints.
    fn edge_blocks(&self) -> HashMap<Option<Id>, Vec<&'a Edge>> {
        let hierarchy = self.graph.hierarchy();
        let mut blocks: HashMap<Option<Id>, Vec<&'a Edge>> = HashMap::new();
        for edge in self.graph.edges() {
            let block = hierarchy
                .ancestors(edge.source())
                .find(|container| hierarchy.is_ancestor(*container, edge.target()));
            blocks.entry(block).or_default().push(edge);
        }
        blocks
    }

    fn write_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: Id,
        depth: usize,
        blocks: &HashMap<Option<Id>, Vec<&'a Edge>>,
    ) -> fmt::Result {
        let Some(node) = self.graph.node(id) else {
            return Ok(());
        };
        let indent = INDENT.repeat(depth);

        if !node.is_container() {
            return writeln!(
                f,
                "{indent}{} [{}];",
                quote_id(&id.as_string()),
                attribute_list(&node_attributes(node))
            );
        }

        writeln!(f, "{indent}subgraph {} {{", quote_id(&cluster_name(id)))?;
        let inner = INDENT.repeat(depth + 1);
        if !id.has_prefix_ignore_case(CLUSTER_PREFIX) {
            writeln!(f, "{inner}{}={};", keys::NODE_ID, quote(&id.as_string()))?;
        }
        for (key, value) in container_attributes(node) {
            writeln!(f, "{inner}{}={};", quote_id(&key), quote(&value))?;
        }
        for child in self.graph.children_of(id) {
            self.write_node(f, child, depth + 1, blocks)?;
        }
        for edge in blocks.get(&Some(id)).into_iter().flatten() {
            self.write_edge(f, edge, depth + 1)?;
        }
        writeln!(f, "{indent}}}")
    }

    fn write_edge(&self, f: &mut fmt::Formatter<'_>, edge: &Edge, depth: usize) -> fmt::Result {
        let op = if self.directed { "->" } else { "--" };
        let mut attributes = vec![(keys::EDGE_ID.to_string(), edge.id().as_string())];
        if edge.is_directed() != self.directed {
            attributes.push((keys::DIRECTED.to_string(), edge.is_directed().to_string()));
        }
        match edge.curve() {
            Curve::Straight => {}
            curve => attributes.push((keys::RENDERING_TYPE.to_string(), curve.kind().to_string())),
        }
        if !edge.curve().control_points().is_empty() {
            attributes.push((
                keys::CONTROL_POINTS.to_string(),
                control_points(edge.curve().control_points()),
            ));
        }
        for (key, value) in edge.attributes() {
            attributes.push((key.clone(), value.clone()));
        }

        writeln!(
            f,
            "{}{} {op} {} [{}];",
            INDENT.repeat(depth),
            quote_id(&edge.source().as_string()),
            quote_id(&edge.target().as_string()),
            attribute_list(&attributes)
        )
    }
}

impl fmt::Display for DotWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.directed { "digraph" } else { "graph" })?;
        if let Some(name) = self.graph.name() {
            write!(f, " {}", quote_id(name))?;
        }
        writeln!(f, " {{")?;

        let advisory = self.graph.advisory();
        if let Some(layout) = &advisory.last_layout {
            writeln!(f, "{INDENT}{}={};", keys::LAST_LAYOUT, quote(layout))?;
        }
        if let Some(density) = advisory.density {
            writeln!(f, "{INDENT}{}=\"{density:.3}\";", keys::GRAPH_DENSITY)?;
        }
        if !advisory.suggested_layouts.is_empty() {
            let list = serde_json::to_string(&advisory.suggested_layouts).map_err(|_| fmt::Error)?;
            writeln!(f, "{INDENT}{}={};", keys::SUGGESTED_LAYOUTS, quote(&list))?;
        }
        for (key, value) in self.graph.attributes() {
            writeln!(f, "{INDENT}{}={};", quote_id(key), quote(value))?;
        }

        let blocks = self.edge_blocks();
        for root in self.graph.roots() {
            self.write_node(f, root, 1, &blocks)?;
        }
        for edge in blocks.get(&None).into_iter().flatten() {
            self.write_edge(f, edge, 1)?;
        }
        writeln!(f, "}}")
    }
}

/// Block name of a container: its id if it already carries the cluster
/// prefix, else the id behind `cluster_`.
fn cluster_name(id: Id) -> String {
    if id.has_prefix_ignore_case(CLUSTER_PREFIX) {
        id.as_string()
    } else {
        format!("{CLUSTER_PREFIX}_{id}")
    }
}

fn position_attributes(position: Position) -> [(String, String); 3] {
    [
        (keys::X.to_string(), coordinate(position.x())),
        (keys::Y.to_string(), coordinate(position.y())),
        (keys::Z.to_string(), coordinate(position.z())),
    ]
}

fn node_attributes(node: &Node) -> Vec<(String, String)> {
    let position = node.position();
    let mut attributes = vec![(keys::LABEL.to_string(), node.label().to_string())];
    attributes.extend(position_attributes(position));
    attributes.push((
        keys::POS.to_string(),
        format!("{},{}", coordinate(position.x()), coordinate(position.y())),
    ));
    attributes.extend(
        node.attributes()
            .iter()
            .filter(|(key, _)| !keys::is_node_field(key))
            .map(|(key, value)| (key.clone(), value.clone())),
    );
    attributes
}

fn container_attributes(node: &Node) -> Vec<(String, String)> {
    let mut attributes = vec![
        (keys::LABEL.to_string(), node.label().to_string()),
        (keys::IS_EXPANDED.to_string(), node.is_expanded().to_string()),
    ];
    attributes.extend(position_attributes(node.position()));
    attributes.extend(
        node.attributes()
            .iter()
            .filter(|(key, _)| {
                !keys::is_node_field(key) && !keys::is_advisory(key) && key.as_str() != keys::NODE_ID
            })
            .map(|(key, value)| (key.clone(), value.clone())),
    );
    attributes
}

/// Unscaled coordinate text. Integral values print without a fraction.
fn coordinate(value: f64) -> String {
    let unscaled = value / SCALE_FACTOR;
    if unscaled == 0.0 {
        // Also normalizes `-0`
        "0".to_string()
    } else {
        format!("{unscaled}")
    }
}

fn control_points(points: &[Position]) -> String {
    let pairs: Vec<String> = points
        .iter()
        .map(|p| format!("[{}, {}]", coordinate(p.x()), coordinate(p.y())))
        .collect();
    format!("[{}]", pairs.join(", "))
}

fn attribute_list(attributes: &[(String, String)]) -> String {
    attributes
        .iter()
        .map(|(key, value)| format!("{}={}", quote_id(key), quote(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Double-quoted string with `"`, `\` and newlines escaped.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// An identifier, quoted unless it is a plain non-keyword identifier.
fn quote_id(id: &str) -> String {
    let mut chars = id.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c == '_' || c.is_alphabetic() || !c.is_ascii())
        && chars.all(|c| c == '_' || c.is_alphanumeric() || !c.is_ascii())
        && !is_keyword(id);
    if plain { id.to_string() } else { quote(id) }
}

fn is_keyword(id: &str) -> bool {
    matches!(
        id.to_ascii_lowercase().as_str(),
        "strict" | "graph" | "digraph" | "subgraph" | "node" | "edge"
    )
}
