//! Graph construction from a parsed [`Document`].
//!
//! The builder walks the statement tree once, collecting node and edge
//! drafts together with their source spans. Membership, defaults and
//! reserved attributes are resolved on the drafts; the [`Graph`] is only
//! assembled once the whole document is known to be valid, so a failed
//! build never exposes a partial graph.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, info, trace};

use trellis_core::{
    edge::{Curve, Edge},
    error::GraphError,
    geometry::Position,
    graph::{Advisory, Graph},
    identifier::Id,
    node::Node,
};

use crate::{
    CLUSTER_PREFIX, SCALE_FACTOR,
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    keys,
    parser_types::{
        Attribute, AttributeTarget, Document, EdgeOp, EdgeOperand, Statement, Subgraph,
    },
    span::{Span, Spanned},
};

type Defaults = IndexMap<String, Spanned<String>>;

/// The kind of block a statement appears in.
#[derive(Debug, Clone, Copy, Default)]
enum Block {
    #[default]
    Root,
    Cluster(Id),
    /// A subgraph that only groups statements.
    Plain,
}

#[derive(Debug, Clone, Default)]
struct Scope {
    block: Block,
    /// Innermost enclosing cluster, which owns nodes declared in this block.
    cluster: Option<Id>,
    node_defaults: Defaults,
    edge_defaults: Defaults,
}

#[derive(Debug)]
struct NodeDraft {
    /// Span of the first mention.
    span: Span,
    container: bool,
    label: Option<String>,
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
    pos: Option<Position>,
    expanded: Option<bool>,
    attributes: IndexMap<String, String>,
    parent: Option<Id>,
}

impl NodeDraft {
    fn new(span: Span, container: bool) -> Self {
        Self {
            span,
            container,
            label: None,
            x: None,
            y: None,
            z: None,
            pos: None,
            expanded: None,
            attributes: IndexMap::new(),
            parent: None,
        }
    }

    /// Explicit `_x`/`_y`/`_z` take precedence over `pos`.
    fn position(&self) -> Position {
        let pos = self.pos.unwrap_or(Position::ORIGIN);
        Position::new(
            self.x.unwrap_or(pos.x()),
            self.y.unwrap_or(pos.y()),
            self.z.unwrap_or(pos.z()),
        )
    }

    fn to_node(&self, id: Id) -> Node {
        let mut node = if self.container {
            Node::container(id)
        } else {
            Node::new(id)
        }
        .with_position(self.position());

        if let Some(label) = &self.label {
            node = node.with_label(label.clone());
        }
        if let Some(expanded) = self.expanded {
            node = node.with_expanded(expanded);
        }
        for (key, value) in &self.attributes {
            node = node.with_attribute(key.clone(), value.clone());
        }
        node
    }
}

#[derive(Debug)]
struct EdgeDraft {
    source: Spanned<Id>,
    target: Spanned<Id>,
    op: Spanned<EdgeOp>,
    attributes: Defaults,
}

/// A decoded node attribute value.
enum NodeField {
    Label(String),
    Pos(Position),
    X(f64),
    Y(f64),
    Z(f64),
    Expanded(bool),
    Other(String),
}

/// Builds a [`Graph`] from a [`Document`], reporting every semantic problem.
pub(crate) struct Builder {
    directed: bool,
    nodes: IndexMap<Id, NodeDraft>,
    edges: Vec<EdgeDraft>,
    attributes: IndexMap<String, String>,
    advisory: Advisory,
    diagnostics: DiagnosticCollector,
}

impl Builder {
    pub(crate) fn new() -> Self {
        Self {
            directed: false,
            nodes: IndexMap::new(),
            edges: Vec::new(),
            attributes: IndexMap::new(),
            advisory: Advisory::default(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    pub(crate) fn build(mut self, document: &Document) -> Result<Graph, ParseError> {
        debug!(
            statements = document.statements.len(),
            directed = document.directed;
            "Building graph"
        );
        self.directed = document.directed;

        let mut scope = Scope::default();
        self.statements(&document.statements, &mut scope);
        let edges = self.resolve_edges();

        let assembled = if self.diagnostics.has_errors() {
            None
        } else {
            let name = document.name.as_ref().map(|name| name.inner().clone());
            self.assemble(name, edges)
                .map_err(|err| {
                    self.diagnostics
                        .emit(Diagnostic::error(format!("invalid graph structure: {err}")));
                })
                .ok()
        };

        self.diagnostics.finish()?;
        let graph = assembled.ok_or_else(|| Diagnostic::error("graph could not be assembled"))?;
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count();
            "Graph built"
        );
        Ok(graph)
    }

    // ============================================================================
    // Statement Walk
    // ============================================================================

    /// Processes a block and returns the nodes it mentions, in order.
    fn statements(&mut self, statements: &[Statement], scope: &mut Scope) -> Vec<Spanned<Id>> {
        let mut members = Vec::new();
        for statement in statements {
            match statement {
                Statement::Node { id, attributes } => {
                    let id = id.clone().map(|name| Id::new(&name));
                    self.declare_node(&id, attributes, scope);
                    members.push(id);
                }
                Statement::Edge {
                    operands,
                    ops,
                    attributes,
                } => {
                    let ends: Vec<Vec<Spanned<Id>>> = operands
                        .iter()
                        .map(|operand| match operand {
                            EdgeOperand::Node(id) => vec![id.clone().map(|name| Id::new(&name))],
                            EdgeOperand::Subgraph(subgraph) => self.subgraph(subgraph, scope),
                        })
                        .collect();

                    let mut merged = scope.edge_defaults.clone();
                    for attribute in attributes {
                        merged.insert(attribute.key.inner().clone(), attribute.value.clone());
                    }

                    for (hop, op) in ops.iter().enumerate() {
                        for source in &ends[hop] {
                            for target in &ends[hop + 1] {
                                self.edges.push(EdgeDraft {
                                    source: source.clone(),
                                    target: target.clone(),
                                    op: op.clone(),
                                    attributes: merged.clone(),
                                });
                            }
                        }
                    }
                    members.extend(ends.into_iter().flatten());
                }
                Statement::Attributes { target, attributes } => match target {
                    AttributeTarget::Graph => self.block_attributes(scope.block, attributes),
                    AttributeTarget::Node => {
                        for attribute in attributes {
                            scope
                                .node_defaults
                                .insert(attribute.key.inner().clone(), attribute.value.clone());
                        }
                    }
                    AttributeTarget::Edge => {
                        for attribute in attributes {
                            scope
                                .edge_defaults
                                .insert(attribute.key.inner().clone(), attribute.value.clone());
                        }
                    }
                },
                Statement::Assignment(attribute) => {
                    self.block_attributes(scope.block, std::slice::from_ref(attribute));
                }
                Statement::Subgraph(subgraph) => {
                    members.extend(self.subgraph(subgraph, scope));
                }
            }
        }
        members
    }

    fn subgraph(&mut self, subgraph: &Subgraph, scope: &Scope) -> Vec<Spanned<Id>> {
        let mut inner = scope.clone();
        inner.block = Block::Plain;

        let cluster_name = subgraph
            .name
            .as_ref()
            .filter(|name| Id::new(name.inner()).has_prefix_ignore_case(CLUSTER_PREFIX));
        if let Some(name) = cluster_name {
            let id_source = Self::node_id_override(subgraph).unwrap_or(name);
            let id = Id::new(id_source.inner());
            if self.enter_cluster(id, id_source.span(), scope) {
                trace!(cluster:% = id; "Entering cluster");
                inner.block = Block::Cluster(id);
                inner.cluster = Some(id);
            }
        }

        self.statements(&subgraph.statements, &mut inner)
    }

    /// The last `_node_id` assigned directly in a cluster block.
    fn node_id_override(subgraph: &Subgraph) -> Option<&Spanned<String>> {
        subgraph
            .statements
            .iter()
            .flat_map(|statement| -> &[Attribute] {
                match statement {
                    Statement::Assignment(attribute) => std::slice::from_ref(attribute),
                    Statement::Attributes {
                        target: AttributeTarget::Graph,
                        attributes,
                    } => attributes.as_slice(),
                    _ => &[],
                }
            })
            .filter(|attribute| attribute.key.inner() == keys::NODE_ID)
            .map(|attribute| &attribute.value)
            .last()
    }

    /// Creates or reopens a container. Returns `false` if the id is taken
    /// by a plain node.
    fn enter_cluster(&mut self, id: Id, span: Span, scope: &Scope) -> bool {
        match self.nodes.get(&id) {
            Some(draft) if !draft.container => {
                let first = draft.span;
                self.diagnostics.emit(
                    Diagnostic::error(format!("cluster id `{id}` is already used by a node"))
                        .with_code(ErrorCode::E205)
                        .with_label(span, "cluster declared here")
                        .with_secondary_label(first, "node declared here")
                        .with_help("rename the cluster or set a distinct `_node_id`"),
                );
                return false;
            }
            Some(_) => {}
            None => {
                self.nodes.insert(id, NodeDraft::new(span, true));
            }
        }
        self.place(id, span, scope.cluster);
        true
    }

    fn declare_node(&mut self, id: &Spanned<Id>, attributes: &[Attribute], scope: &Scope) {
        let node = *id.inner();
        if !self.nodes.contains_key(&node) {
            self.nodes.insert(node, NodeDraft::new(id.span(), false));
            for (key, value) in &scope.node_defaults {
                self.node_attribute(node, key, value);
            }
        }
        for attribute in attributes {
            self.node_attribute(node, attribute.key.inner(), &attribute.value);
        }
        self.place(node, id.span(), scope.cluster);
    }

    /// Moves `node` into `cluster` if that makes it more deeply nested.
    ///
    /// A node first declared in an outer cluster and mentioned again in a
    /// nested one ends up in the nested one. A node already in an unrelated
    /// cluster stays where it is.
    fn place(&mut self, node: Id, span: Span, cluster: Option<Id>) {
        let Some(cluster) = cluster else {
            return;
        };
        if node == cluster || self.is_ancestor(node, cluster) {
            self.diagnostics.emit(
                Diagnostic::error(format!(
                    "cluster `{cluster}` cannot contain `{node}`, which encloses it"
                ))
                .with_code(ErrorCode::E201)
                .with_label(span, "creates a containment cycle"),
            );
            return;
        }

        let adopt = match self.nodes.get(&node).and_then(|draft| draft.parent) {
            None => true,
            Some(parent) => parent != cluster && self.is_ancestor(parent, cluster),
        };
        if adopt {
            if let Some(draft) = self.nodes.get_mut(&node) {
                draft.parent = Some(cluster);
            }
        }
    }

    fn is_ancestor(&self, ancestor: Id, node: Id) -> bool {
        let mut current = self.nodes.get(&node).and_then(|draft| draft.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.nodes.get(&parent).and_then(|draft| draft.parent);
        }
        false
    }

    // ============================================================================
    // Attributes
    // ============================================================================

    fn block_attributes(&mut self, block: Block, attributes: &[Attribute]) {
        for attribute in attributes {
            let key = attribute.key.inner().as_str();
            match block {
                Block::Root => self.graph_attribute(key, &attribute.value),
                Block::Cluster(id) => {
                    if key == keys::NODE_ID || keys::is_advisory(key) {
                        continue;
                    }
                    self.node_attribute(id, key, &attribute.value);
                }
                Block::Plain => {
                    trace!(key = key; "Ignoring attribute of a non-cluster subgraph");
                }
            }
        }
    }

    fn graph_attribute(&mut self, key: &str, value: &Spanned<String>) {
        match key {
            keys::LAST_LAYOUT => self.advisory.last_layout = Some(value.inner().clone()),
            keys::GRAPH_DENSITY => match value.inner().trim().parse::<f64>() {
                Ok(density) if density.is_finite() => self.advisory.density = Some(density),
                _ => self.advisory_warning(key, value),
            },
            keys::SUGGESTED_LAYOUTS => match serde_json::from_str::<Vec<String>>(value.inner()) {
                Ok(layouts) => self.advisory.suggested_layouts = layouts,
                Err(_) => self.advisory_warning(key, value),
            },
            _ => {
                self.attributes
                    .insert(key.to_string(), value.inner().clone());
            }
        }
    }

    fn advisory_warning(&mut self, key: &str, value: &Spanned<String>) {
        self.diagnostics.emit(
            Diagnostic::warning(format!(
                "ignoring malformed `{key}` value `{}`",
                value.inner()
            ))
            .with_label(value.span(), "malformed value"),
        );
    }

    fn node_attribute(&mut self, node: Id, key: &str, value: &Spanned<String>) {
        let Some(field) = self.decode_node_field(key, value) else {
            return;
        };
        let Some(draft) = self.nodes.get_mut(&node) else {
            return;
        };
        match field {
            NodeField::Label(label) => draft.label = Some(label),
            NodeField::Pos(pos) => draft.pos = Some(pos),
            NodeField::X(x) => draft.x = Some(x),
            NodeField::Y(y) => draft.y = Some(y),
            NodeField::Z(z) => draft.z = Some(z),
            NodeField::Expanded(expanded) => draft.expanded = Some(expanded),
            NodeField::Other(value) => {
                draft.attributes.insert(key.to_string(), value);
            }
        }
    }

    /// Decodes one node attribute, reporting invalid reserved values.
    fn decode_node_field(&mut self, key: &str, value: &Spanned<String>) -> Option<NodeField> {
        let text = value.inner();
        let field = match key {
            keys::LABEL => NodeField::Label(text.clone()),
            keys::POS => NodeField::Pos(parse_pos(text).or_else(|| {
                self.invalid_value(key, value, "expected `x,y` or `x,y,z`");
                None
            })?),
            keys::X | keys::Y | keys::Z => {
                let coordinate = parse_coordinate(text).or_else(|| {
                    self.invalid_value(key, value, "expected a finite number");
                    None
                })?;
                match key {
                    keys::X => NodeField::X(coordinate),
                    keys::Y => NodeField::Y(coordinate),
                    _ => NodeField::Z(coordinate),
                }
            }
            keys::IS_EXPANDED => NodeField::Expanded(parse_bool(text).or_else(|| {
                self.invalid_value(key, value, "expected `true` or `false`");
                None
            })?),
            _ => NodeField::Other(text.clone()),
        };
        Some(field)
    }

    fn invalid_value(&mut self, key: &str, value: &Spanned<String>, expected: &str) {
        self.diagnostics.emit(
            Diagnostic::error(format!("invalid value `{}` for `{key}`", value.inner()))
                .with_code(ErrorCode::E204)
                .with_label(value.span(), expected.to_string()),
        );
    }

    // ============================================================================
    // Edges
    // ============================================================================

    fn resolve_edges(&mut self) -> Vec<Edge> {
        let drafts = std::mem::take(&mut self.edges);

        let mut used: HashMap<Id, Span> = HashMap::new();
        let mut ids: Vec<Option<Id>> = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            let Some(explicit) = draft.attributes.get(keys::EDGE_ID) else {
                ids.push(None);
                continue;
            };
            let id = Id::new(explicit.inner());
            if let Some(first) = used.get(&id) {
                self.diagnostics.emit(
                    Diagnostic::error(format!("duplicate edge id `{id}`"))
                        .with_code(ErrorCode::E202)
                        .with_label(explicit.span(), "duplicate")
                        .with_secondary_label(*first, "first used here")
                        .with_help("give every edge a distinct `_edge_id`"),
                );
            } else {
                used.insert(id, explicit.span());
            }
            ids.push(Some(id));
        }

        let mut taken: HashSet<Id> = used.into_keys().collect();
        let mut counter = 0usize;
        let mut edges = Vec::with_capacity(drafts.len());
        for (draft, id) in drafts.iter().zip(ids) {
            let id = id.unwrap_or_else(|| loop {
                let candidate = Id::new(&format!("e{counter}"));
                counter += 1;
                if taken.insert(candidate) {
                    break candidate;
                }
            });
            if let Some(edge) = self.resolve_edge(id, draft) {
                edges.push(edge);
            }
        }
        edges
    }

    fn resolve_edge(&mut self, id: Id, draft: &EdgeDraft) -> Option<Edge> {
        let mut valid = true;
        for end in [&draft.source, &draft.target] {
            if !self.nodes.contains_key(end.inner()) {
                let name = end.inner();
                self.diagnostics.emit(
                    Diagnostic::error(format!("edge references undeclared node `{name}`"))
                        .with_code(ErrorCode::E200)
                        .with_label(end.span(), "not declared")
                        .with_help(format!("declare `{name}` with a node statement")),
                );
                valid = false;
            }
        }

        let op = *draft.op.inner();
        if (op == EdgeOp::Directed) != self.directed {
            let message = match op {
                EdgeOp::Directed => "`->` used in an undirected graph",
                EdgeOp::Undirected => "`--` used in a directed graph",
            };
            self.diagnostics.emit(
                Diagnostic::error(message)
                    .with_code(ErrorCode::E203)
                    .with_label(draft.op.span(), "wrong edge operator")
                    .with_help("use `->` in a `digraph` and `--` in a `graph`"),
            );
            valid = false;
        }

        let mut directed = self.directed;
        if let Some(value) = draft.attributes.get(keys::DIRECTED) {
            match parse_bool(value.inner()) {
                Some(flag) => directed = flag,
                None => {
                    self.invalid_value(keys::DIRECTED, value, "expected `true` or `false`");
                    valid = false;
                }
            }
        }

        let mut curve = Curve::default();
        if let Some(value) = draft.attributes.get(keys::RENDERING_TYPE) {
            match value.inner().parse::<Curve>() {
                Ok(kind) => curve = kind,
                Err(_) => {
                    self.invalid_value(
                        keys::RENDERING_TYPE,
                        value,
                        "expected `straight`, `curved` or `composite`",
                    );
                    valid = false;
                }
            }
        }
        if let (Curve::Composite(points), Some(value)) =
            (&mut curve, draft.attributes.get(keys::CONTROL_POINTS))
        {
            match parse_control_points(value.inner()) {
                Some(parsed) => *points = parsed,
                None => {
                    self.invalid_value(
                        keys::CONTROL_POINTS,
                        value,
                        "expected a list of `[x, y]` pairs",
                    );
                    valid = false;
                }
            }
        }

        if !valid {
            return None;
        }

        let mut edge = Edge::new(id, *draft.source.inner(), *draft.target.inner())
            .with_directed(directed)
            .with_curve(curve);
        for (key, value) in &draft.attributes {
            if !keys::is_edge_field(key) {
                edge = edge.with_attribute(key.clone(), value.inner().clone());
            }
        }
        Some(edge)
    }

    // ============================================================================
    // Assembly
    // ============================================================================

    fn assemble(&mut self, name: Option<String>, edges: Vec<Edge>) -> Result<Graph, GraphError> {
        let mut graph = Graph::new();
        graph.set_name(name);
        *graph.attributes_mut() = std::mem::take(&mut self.attributes);
        *graph.advisory_mut() = std::mem::take(&mut self.advisory);

        for (id, draft) in &self.nodes {
            graph.add_node(draft.to_node(*id))?;
        }
        // Attaching after every node exists lets centroids settle bottom-up.
        for (id, draft) in &self.nodes {
            if let Some(parent) = draft.parent {
                graph.add_child(parent, *id)?;
            }
        }
        for edge in edges {
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }
}

/// Parses a scaled coordinate. Values that overflow once scaled are rejected.
fn parse_coordinate(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .map(|value| value * SCALE_FACTOR)
        .filter(|value| value.is_finite())
}

/// Parses `"x,y"`, `"x,y,z"` and their pinned `!` forms into a scaled position.
fn parse_pos(text: &str) -> Option<Position> {
    let text = text.trim().trim_end_matches('!');
    let parts: Vec<f64> = text
        .split(',')
        .map(parse_coordinate)
        .collect::<Option<_>>()?;
    match parts.as_slice() {
        [x, y] => Some(Position::planar(*x, *y)),
        [x, y, z] => Some(Position::new(*x, *y, *z)),
        _ => None,
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Parses a JSON list of `[x, y]` pairs into scaled control points.
fn parse_control_points(text: &str) -> Option<Vec<Position>> {
    let pairs: Vec<Vec<f64>> = serde_json::from_str(text).ok()?;
    pairs
        .into_iter()
        .map(|pair| match pair.as_slice() {
            [x, y] => Some(Position::planar(x * SCALE_FACTOR, y * SCALE_FACTOR))
                .filter(|point| point.x().is_finite() && point.y().is_finite()),
            _ => None,
        })
        .collect()
}
