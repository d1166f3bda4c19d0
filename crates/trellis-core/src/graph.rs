//! The graph aggregate.
//!
//! [`Graph`] owns nodes, edges and the containment forest, and keeps the
//! centroid invariant: after every public operation returns, each non-empty
//! container sits at the arithmetic mean of its direct children. Containers
//! are recomputed deepest first, so a change deep in the forest propagates to
//! every ancestor up to the root.
//!
//! All mutating operations validate before they touch anything and return the
//! [`Command`] that undoes them.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::{
    command::{Command, RemovedNode, RemovedSubtree},
    edge::Edge,
    error::{CycleError, GraphError, Result},
    geometry::Position,
    hierarchy::ContainerHierarchy,
    identifier::Id,
    node::Node,
};

/// Derived metadata stored alongside the graph.
///
/// These values are never recomputed implicitly. They are only as fresh as
/// the last explicit refresh by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Advisory {
    /// Name of the most recently committed layout algorithm.
    pub last_layout: Option<String>,
    /// Cached edge density.
    pub density: Option<f64>,
    /// Cached ordered list of suggested layout algorithms.
    pub suggested_layouts: Vec<String>,
}

/// Nodes, edges and their containment forest.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    name: Option<String>,
    attributes: IndexMap<String, String>,
    nodes: IndexMap<Id, Node>,
    edges: IndexMap<Id, Edge>,
    hierarchy: ContainerHierarchy,
    advisory: Advisory,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Graph-level attributes other than the advisory ones.
    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut IndexMap<String, String> {
        &mut self.attributes
    }

    pub fn advisory(&self) -> &Advisory {
        &self.advisory
    }

    pub fn advisory_mut(&mut self) -> &mut Advisory {
        &mut self.advisory
    }

    pub fn hierarchy(&self) -> &ContainerHierarchy {
        &self.hierarchy
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_node(&self, id: Id) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn contains_edge(&self, id: Id) -> bool {
        self.edges.contains_key(&id)
    }

    pub fn node(&self, id: Id) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Mutable access for labels and attributes. Positions and expansion
    /// state go through the graph operations.
    pub fn node_mut(&mut self, id: Id) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn edge(&self, id: Id) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn edge_mut(&mut self, id: Id) -> Option<&mut Edge> {
        self.edges.get_mut(&id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn parent_of(&self, id: Id) -> Option<Id> {
        self.hierarchy.parent_of(id)
    }

    pub fn children_of(&self, id: Id) -> impl Iterator<Item = Id> + '_ {
        self.hierarchy.children_of(id)
    }

    /// Nodes without a parent container, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = Id> + '_ {
        self.nodes
            .keys()
            .copied()
            .filter(|id| self.hierarchy.parent_of(*id).is_none())
    }

    /// Every node of the forest in pre-order, roots in insertion order.
    pub fn pre_order(&self) -> Vec<Id> {
        self.roots()
            .flat_map(|root| self.hierarchy.pre_order_from(root))
            .collect()
    }

    /// Returns `true` for nodes whose position is not derived from children:
    /// leaves and empty containers.
    pub fn is_free(&self, id: Id) -> bool {
        self.hierarchy.child_count(id) == 0
    }

    /// Returns an identifier of the form `e<N>` not used by any edge.
    pub fn next_edge_id(&self) -> Id {
        let mut n = self.edges.len();
        loop {
            let id = Id::new(&format!("e{n}"));
            if !self.edges.contains_key(&id) {
                return id;
            }
            n += 1;
        }
    }

    /// Mean position of the direct children of `container`.
    ///
    /// An empty container reports its own stored position.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownNode`] or [`GraphError::NotAContainer`].
    pub fn centroid_of(&self, container: Id) -> Result<Position> {
        let node = self.require_container(container)?;
        Ok(Position::centroid(
            self.hierarchy
                .children_of(container)
                .filter_map(|child| self.nodes.get(&child))
                .map(Node::position),
        )
        .unwrap_or(node.position()))
    }

    /// Adds a node. Containers are registered in the hierarchy with no children.
    pub fn add_node(&mut self, node: Node) -> Result<Command> {
        let id = node.id();
        if !node.position().is_finite() {
            return Err(GraphError::NonFinitePosition(id));
        }
        self.insert_node_at(node, None)?;
        debug!(node:% = id; "Node added");
        Ok(Command::RemoveNode(id))
    }

    /// Removes a node with its incident edges.
    ///
    /// Children of a removed container are promoted to the container's
    /// parent, taking its place among the siblings.
    pub fn remove_node(&mut self, id: Id) -> Result<Command> {
        let index = self
            .nodes
            .get_index_of(&id)
            .ok_or(GraphError::UnknownNode(id))?;

        let parent = self.hierarchy.slot_of(id);
        let children: Vec<Id> = self.hierarchy.children_of(id).collect();
        let edges = self.take_edges(|edge| edge.touches(id));

        self.hierarchy.detach(id);
        for (offset, child) in children.iter().enumerate() {
            self.hierarchy.detach(*child);
            if let Some((grandparent, slot)) = parent {
                self.hierarchy
                    .attach_at(grandparent, *child, Some(slot + offset));
            }
        }
        self.hierarchy.unregister_container(id);

        let Some(node) = self.nodes.shift_remove(&id) else {
            return Err(GraphError::UnknownNode(id));
        };
        if let Some((grandparent, _)) = parent {
            self.refresh_centroids([grandparent]);
        }

        debug!(node:% = id, promoted = children.len(), edges = edges.len(); "Node removed");
        Ok(Command::RestoreNode(Box::new(RemovedNode {
            node,
            index,
            parent,
            children,
            edges,
        })))
    }

    pub(crate) fn restore_node(&mut self, removed: RemovedNode) -> Result<Command> {
        let RemovedNode {
            node,
            index,
            parent,
            children,
            edges,
        } = removed;
        let id = node.id();

        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        if let Some((p, _)) = parent {
            self.require_container(p)?;
        }
        for child in &children {
            self.require_node(*child)?;
        }
        for (_, edge) in &edges {
            self.check_restorable_edge(edge, &[id])?;
        }

        self.insert_node_at(node, Some(index))?;
        for child in &children {
            self.hierarchy.detach(*child);
            self.hierarchy.attach_at(id, *child, None);
        }
        if let Some((p, slot)) = parent {
            self.hierarchy.attach_at(p, id, Some(slot));
        }
        self.restore_edges(edges);
        self.refresh_centroids([id]);

        debug!(node:% = id; "Node restored");
        Ok(Command::RemoveNode(id))
    }

    /// Removes a container together with all of its descendants and every
    /// edge touching any of them. Descendants are collected in pre-order.
    pub fn remove_subtree(&mut self, root: Id) -> Result<Command> {
        self.require_node(root)?;

        let order = self.hierarchy.pre_order_from(root);
        let members: HashSet<Id> = order.iter().copied().collect();
        let parent = self.hierarchy.slot_of(root);

        let links: Vec<(Id, Vec<Id>)> = order
            .iter()
            .filter(|id| self.hierarchy.is_container(**id))
            .map(|id| (*id, self.hierarchy.children_of(*id).collect()))
            .collect();
        let edges = self.take_edges(|edge| {
            members.contains(&edge.source()) || members.contains(&edge.target())
        });

        self.hierarchy.detach(root);
        for (container, _) in &links {
            self.hierarchy.unregister_container(*container);
        }

        let mut indices: Vec<usize> = order
            .iter()
            .filter_map(|id| self.nodes.get_index_of(id))
            .collect();
        indices.sort_unstable();
        let mut nodes = Vec::with_capacity(indices.len());
        for index in indices.iter().rev() {
            if let Some((_, node)) = self.nodes.shift_remove_index(*index) {
                nodes.push((*index, node));
            }
        }
        nodes.reverse();

        if let Some((p, _)) = parent {
            self.refresh_centroids([p]);
        }

        debug!(root:% = root, nodes = nodes.len(), edges = edges.len(); "Subtree removed");
        Ok(Command::RestoreSubtree(Box::new(RemovedSubtree {
            root,
            parent,
            nodes,
            links,
            edges,
        })))
    }

    pub(crate) fn restore_subtree(&mut self, removed: RemovedSubtree) -> Result<Command> {
        let RemovedSubtree {
            root,
            parent,
            nodes,
            links,
            edges,
        } = removed;

        let restored: Vec<Id> = nodes.iter().map(|(_, node)| node.id()).collect();
        if let Some(existing) = restored.iter().find(|id| self.nodes.contains_key(*id)) {
            return Err(GraphError::DuplicateNode(*existing));
        }
        if let Some((p, _)) = parent {
            self.require_container(p)?;
        }
        for (_, edge) in &edges {
            self.check_restorable_edge(edge, &restored)?;
        }

        for (index, node) in nodes {
            self.insert_node_at(node, Some(index))?;
        }
        for (container, children) in &links {
            self.hierarchy.register_container(*container);
            for child in children {
                self.hierarchy.attach_at(*container, *child, None);
            }
        }
        if let Some((p, slot)) = parent {
            self.hierarchy.attach_at(p, root, Some(slot));
        }
        self.restore_edges(edges);
        self.refresh_centroids(links.iter().map(|(container, _)| *container));

        debug!(root:% = root, nodes = restored.len(); "Subtree restored");
        Ok(Command::RemoveSubtree(root))
    }

    /// Adds an edge between two existing nodes.
    pub fn add_edge(&mut self, edge: Edge) -> Result<Command> {
        self.insert_edge(edge, None)
    }

    pub(crate) fn insert_edge(&mut self, edge: Edge, index: Option<usize>) -> Result<Command> {
        let id = edge.id();
        if self.edges.contains_key(&id) {
            return Err(GraphError::DuplicateEdge(id));
        }
        for endpoint in [edge.source(), edge.target()] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(GraphError::DanglingEdge {
                    edge: id,
                    node: endpoint,
                });
            }
        }
        match index {
            Some(index) if index < self.edges.len() => {
                self.edges.shift_insert(index, id, edge);
            }
            _ => {
                self.edges.insert(id, edge);
            }
        }
        trace!(edge:% = id; "Edge added");
        Ok(Command::RemoveEdge(id))
    }

    pub fn remove_edge(&mut self, id: Id) -> Result<Command> {
        let (index, _, edge) = self
            .edges
            .shift_remove_full(&id)
            .ok_or(GraphError::UnknownEdge(id))?;
        trace!(edge:% = id; "Edge removed");
        Ok(Command::AddEdge {
            edge,
            index: Some(index),
        })
    }

    /// Makes `node` the last child of `container`, detaching it from any
    /// previous container.
    ///
    /// # Errors
    ///
    /// [`GraphError::Cycle`] if `node` is `container` itself or one of its
    /// ancestors. The graph is unchanged on error.
    pub fn add_child(&mut self, container: Id, node: Id) -> Result<Command> {
        self.reparent(node, Some(container), None)
    }

    /// Detaches `node` from `container`, making it a root.
    pub fn remove_child(&mut self, container: Id, node: Id) -> Result<Command> {
        self.require_container(container)?;
        self.require_node(node)?;
        if self.hierarchy.parent_of(node) != Some(container) {
            return Err(GraphError::NotAChild { container, node });
        }
        self.reparent(node, None, None)
    }

    pub(crate) fn reparent(
        &mut self,
        node: Id,
        parent: Option<Id>,
        index: Option<usize>,
    ) -> Result<Command> {
        self.require_node(node)?;
        if let Some(container) = parent {
            self.require_node(container)?;
            if node == container || self.hierarchy.is_ancestor(node, container) {
                return Err(CycleError { container, node }.into());
            }
            self.require_container(container)?;
        }

        let previous = self.hierarchy.detach(node);
        if let Some(container) = parent {
            self.hierarchy.attach_at(container, node, index);
        }
        self.refresh_centroids(previous.map(|(p, _)| p).into_iter().chain(parent));

        debug!(node:% = node, parent:? = parent.map(|p| p.to_string()); "Node reparented");
        Ok(Command::Reparent {
            node,
            parent: previous.map(|(p, _)| p),
            index: previous.map(|(_, i)| i),
        })
    }

    /// Sets the expansion state of a container. Children are neither moved
    /// nor removed.
    pub fn set_expanded(&mut self, container: Id, expanded: bool) -> Result<Command> {
        let node = self.require_container_mut(container)?;
        let previous = node.is_expanded();
        node.set_expanded(expanded);
        Ok(Command::SetExpanded {
            container,
            expanded: previous,
        })
    }

    /// Expands or collapses `container` and every container below it, visited
    /// in pre-order.
    pub fn set_expanded_recursive(&mut self, container: Id, expanded: bool) -> Result<Command> {
        self.require_container(container)?;
        let targets: Vec<Id> = self
            .hierarchy
            .pre_order_from(container)
            .into_iter()
            .filter(|id| self.hierarchy.is_container(*id))
            .collect();

        let mut inverses = Vec::with_capacity(targets.len());
        for target in targets {
            inverses.push(self.set_expanded(target, expanded)?);
        }
        inverses.reverse();
        Ok(Command::Batch(inverses))
    }

    /// Moves a single node. Moving a non-empty container translates its
    /// whole subtree.
    pub fn move_node(&mut self, id: Id, position: Position) -> Result<Command> {
        self.set_positions([(id, position)])
    }

    /// Assigns positions in one step and recomputes every affected container.
    ///
    /// Entries for leaves and empty containers are written directly. An entry
    /// for a non-empty container is turned into a translation of all free
    /// descendants by the difference to the container's current position.
    pub fn set_positions<I>(&mut self, positions: I) -> Result<Command>
    where
        I: IntoIterator<Item = (Id, Position)>,
    {
        let requested: Vec<(Id, Position)> = positions.into_iter().collect();
        for (id, position) in &requested {
            self.require_node(*id)?;
            if !position.is_finite() {
                return Err(GraphError::NonFinitePosition(*id));
            }
        }

        let mut updates: IndexMap<Id, Position> = IndexMap::new();
        for (id, position) in requested {
            if self.is_free(id) {
                updates.insert(id, position);
                continue;
            }
            let delta = position.sub_position(self.nodes[&id].position());
            for descendant in self.hierarchy.descendants(id) {
                if !self.is_free(descendant) {
                    continue;
                }
                let current = updates
                    .get(&descendant)
                    .copied()
                    .unwrap_or_else(|| self.nodes[&descendant].position());
                updates.insert(descendant, current.add_position(delta));
            }
        }

        let mut previous = IndexMap::with_capacity(updates.len());
        for (id, position) in &updates {
            if let Some(node) = self.nodes.get_mut(id) {
                previous.insert(*id, node.position());
                node.set_position(*position);
            }
        }
        let parents: Vec<Id> = updates
            .keys()
            .filter_map(|id| self.hierarchy.parent_of(*id))
            .collect();
        self.refresh_centroids(parents);

        trace!(count = previous.len(); "Positions updated");
        Ok(Command::SetPositions(previous))
    }

    fn require_node(&self, id: Id) -> Result<&Node> {
        self.nodes.get(&id).ok_or(GraphError::UnknownNode(id))
    }

    fn require_container(&self, id: Id) -> Result<&Node> {
        let node = self.require_node(id)?;
        if node.is_container() {
            Ok(node)
        } else {
            Err(GraphError::NotAContainer(id))
        }
    }

    fn require_container_mut(&mut self, id: Id) -> Result<&mut Node> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::UnknownNode(id))?;
        if node.is_container() {
            Ok(node)
        } else {
            Err(GraphError::NotAContainer(id))
        }
    }

    fn insert_node_at(&mut self, node: Node, index: Option<usize>) -> Result<()> {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        if node.is_container() {
            self.hierarchy.register_container(id);
        }
        match index {
            Some(index) if index < self.nodes.len() => {
                self.nodes.shift_insert(index, id, node);
            }
            _ => {
                self.nodes.insert(id, node);
            }
        }
        Ok(())
    }

    /// An edge may come back if its id is free and each endpoint either
    /// exists or is about to be restored.
    fn check_restorable_edge(&self, edge: &Edge, restoring: &[Id]) -> Result<()> {
        if self.edges.contains_key(&edge.id()) {
            return Err(GraphError::DuplicateEdge(edge.id()));
        }
        for endpoint in [edge.source(), edge.target()] {
            if !self.nodes.contains_key(&endpoint) && !restoring.contains(&endpoint) {
                return Err(GraphError::DanglingEdge {
                    edge: edge.id(),
                    node: endpoint,
                });
            }
        }
        Ok(())
    }

    /// Removes matching edges, returning them with their former indices in
    /// ascending order.
    fn take_edges(&mut self, predicate: impl Fn(&Edge) -> bool) -> Vec<(usize, Edge)> {
        let indices: Vec<usize> = self
            .edges
            .values()
            .enumerate()
            .filter(|(_, edge)| predicate(edge))
            .map(|(index, _)| index)
            .collect();

        let mut taken: Vec<(usize, Edge)> = indices
            .into_iter()
            .rev()
            .filter_map(|index| {
                self.edges
                    .shift_remove_index(index)
                    .map(|(_, edge)| (index, edge))
            })
            .collect();
        taken.reverse();
        taken
    }

    fn restore_edges(&mut self, edges: Vec<(usize, Edge)>) {
        for (index, edge) in edges {
            let id = edge.id();
            if index < self.edges.len() {
                self.edges.shift_insert(index, id, edge);
            } else {
                self.edges.insert(id, edge);
            }
        }
    }

    /// Recomputes the position of every container in `seeds` and all of
    /// their ancestors, deepest first.
    fn refresh_centroids<I>(&mut self, seeds: I)
    where
        I: IntoIterator<Item = Id>,
    {
        let mut containers: Vec<Id> = Vec::new();
        let mut seen = HashSet::new();
        for seed in seeds {
            let chain = std::iter::once(seed).chain(self.hierarchy.ancestors(seed));
            for id in chain {
                if self.hierarchy.is_container(id) && seen.insert(id) {
                    containers.push(id);
                }
            }
        }
        containers.sort_by_key(|id| std::cmp::Reverse(self.hierarchy.depth(*id)));

        for container in containers {
            let centroid = Position::centroid(
                self.hierarchy
                    .children_of(container)
                    .filter_map(|child| self.nodes.get(&child))
                    .map(Node::position),
            );
            if let (Some(centroid), Some(node)) = (centroid, self.nodes.get_mut(&container)) {
                node.set_position(centroid);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn id(name: &str) -> Id {
        Id::new(name)
    }

    fn leaf(name: &str, x: f64, y: f64) -> Node {
        Node::new(id(name)).with_position(Position::planar(x, y))
    }

    /// outer ─┬─ inner ─┬─ a (0, 0)
    ///        │         └─ b (10, 0)
    ///        └─ c (20, 30)
    fn nested() -> Graph {
        let mut g = Graph::new();
        g.add_node(Node::container(id("outer"))).unwrap();
        g.add_node(Node::container(id("inner"))).unwrap();
        g.add_node(leaf("a", 0.0, 0.0)).unwrap();
        g.add_node(leaf("b", 10.0, 0.0)).unwrap();
        g.add_node(leaf("c", 20.0, 30.0)).unwrap();
        g.add_child(id("inner"), id("a")).unwrap();
        g.add_child(id("inner"), id("b")).unwrap();
        g.add_child(id("outer"), id("inner")).unwrap();
        g.add_child(id("outer"), id("c")).unwrap();
        g
    }

    fn position(g: &Graph, name: &str) -> Position {
        g.node(id(name)).unwrap().position()
    }

    #[test]
    fn test_add_duplicate_node() {
        let mut g = Graph::new();
        g.add_node(Node::new(id("a"))).unwrap();
        assert_eq!(
            g.add_node(Node::new(id("a"))),
            Err(GraphError::DuplicateNode(id("a")))
        );
    }

    #[test]
    fn test_edge_requires_endpoints() {
        let mut g = Graph::new();
        g.add_node(Node::new(id("a"))).unwrap();
        let err = g
            .add_edge(Edge::new(id("e"), id("a"), id("zz")))
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::DanglingEdge {
                edge: id("e"),
                node: id("zz")
            }
        );
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_centroid_transitive() {
        let g = nested();
        assert_eq!(position(&g, "inner"), Position::planar(5.0, 0.0));
        // Mean of inner (5, 0) and c (20, 30)
        assert_eq!(position(&g, "outer"), Position::planar(12.5, 15.0));
        assert_eq!(g.centroid_of(id("outer")).unwrap(), position(&g, "outer"));
    }

    #[test]
    fn test_moving_leaf_updates_all_ancestors() {
        let mut g = nested();
        g.move_node(id("b"), Position::planar(30.0, 20.0)).unwrap();
        assert_eq!(position(&g, "inner"), Position::planar(15.0, 10.0));
        assert_eq!(position(&g, "outer"), Position::planar(17.5, 20.0));
    }

    #[test]
    fn test_moving_container_translates_subtree() {
        let mut g = nested();
        g.move_node(id("inner"), Position::planar(105.0, 50.0))
            .unwrap();
        assert_eq!(position(&g, "a"), Position::planar(100.0, 50.0));
        assert_eq!(position(&g, "b"), Position::planar(110.0, 50.0));
        assert_eq!(position(&g, "inner"), Position::planar(105.0, 50.0));
    }

    #[test]
    fn test_move_undo() {
        let mut g = nested();
        let undo = g.move_node(id("inner"), Position::planar(-5.0, 1.0)).unwrap();
        undo.apply(&mut g).unwrap();
        assert_eq!(position(&g, "a"), Position::planar(0.0, 0.0));
        assert_eq!(position(&g, "outer"), Position::planar(12.5, 15.0));
    }

    #[test]
    fn test_non_finite_position_rejected() {
        let mut g = nested();
        let err = g
            .set_positions([
                (id("a"), Position::planar(1.0, 1.0)),
                (id("b"), Position::planar(f64::NAN, 0.0)),
            ])
            .unwrap_err();
        assert_eq!(err, GraphError::NonFinitePosition(id("b")));
        assert_eq!(position(&g, "a"), Position::planar(0.0, 0.0));
    }

    #[test]
    fn test_add_child_self_is_cycle() {
        let mut g = nested();
        let err = g.add_child(id("inner"), id("inner")).unwrap_err();
        assert!(matches!(err, GraphError::Cycle(_)));
    }

    #[test]
    fn test_add_child_ancestor_is_cycle() {
        let mut g = nested();
        let before = g.pre_order();
        let err = g.add_child(id("inner"), id("outer")).unwrap_err();
        assert_eq!(
            err,
            GraphError::Cycle(CycleError {
                container: id("inner"),
                node: id("outer")
            })
        );
        assert_eq!(g.pre_order(), before);
        assert_eq!(g.parent_of(id("outer")), None);
    }

    #[test]
    fn test_add_child_requires_container() {
        let mut g = nested();
        assert_eq!(
            g.add_child(id("a"), id("c")),
            Err(GraphError::NotAContainer(id("a")))
        );
    }

    #[test]
    fn test_reparent_moves_between_containers() {
        let mut g = nested();
        let undo = g.add_child(id("inner"), id("c")).unwrap();
        assert_eq!(g.parent_of(id("c")), Some(id("inner")));
        // inner = mean(a, b, c) = (10, 10); outer has only inner left
        assert_eq!(position(&g, "inner"), Position::planar(10.0, 10.0));
        assert_eq!(position(&g, "outer"), Position::planar(10.0, 10.0));

        undo.apply(&mut g).unwrap();
        assert_eq!(g.parent_of(id("c")), Some(id("outer")));
        assert_eq!(position(&g, "outer"), Position::planar(12.5, 15.0));
    }

    #[test]
    fn test_remove_child() {
        let mut g = nested();
        assert_eq!(
            g.remove_child(id("inner"), id("c")),
            Err(GraphError::NotAChild {
                container: id("inner"),
                node: id("c")
            })
        );
        g.remove_child(id("outer"), id("c")).unwrap();
        assert_eq!(g.parent_of(id("c")), None);
        assert_eq!(position(&g, "outer"), Position::planar(5.0, 0.0));
    }

    #[test]
    fn test_empty_container_keeps_position() {
        let mut g = nested();
        g.remove_child(id("inner"), id("a")).unwrap();
        g.remove_child(id("inner"), id("b")).unwrap();
        assert_eq!(g.hierarchy().child_count(id("inner")), 0);
        assert_eq!(position(&g, "inner"), Position::planar(10.0, 0.0));
    }

    #[test]
    fn test_remove_node_promotes_children() {
        let mut g = nested();
        g.add_node(leaf("z", 0.0, 0.0)).unwrap();
        g.add_edge(Edge::new(id("e0"), id("inner"), id("z"))).unwrap();
        g.add_edge(Edge::new(id("e1"), id("a"), id("z"))).unwrap();

        let undo = g.remove_node(id("inner")).unwrap();
        assert!(!g.contains_node(id("inner")));
        let children: Vec<_> = g.children_of(id("outer")).collect();
        assert_eq!(children, vec![id("a"), id("b"), id("c")]);
        assert_eq!(g.edge_count(), 1);

        undo.apply(&mut g).unwrap();
        assert_eq!(g.pre_order(), nested_with_z_order());
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.edges().next().map(Edge::id), Some(id("e0")));
        assert_eq!(position(&g, "inner"), Position::planar(5.0, 0.0));
    }

    fn nested_with_z_order() -> Vec<Id> {
        ["outer", "inner", "a", "b", "c", "z"]
            .into_iter()
            .map(id)
            .collect()
    }

    #[test]
    fn test_remove_subtree_and_restore() {
        let mut g = nested();
        g.add_node(leaf("z", 1.0, 1.0)).unwrap();
        g.add_edge(Edge::new(id("e0"), id("a"), id("z"))).unwrap();
        g.add_edge(Edge::new(id("e1"), id("c"), id("z"))).unwrap();

        let undo = g.remove_subtree(id("inner")).unwrap();
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(position(&g, "outer"), Position::planar(20.0, 30.0));

        let redo = undo.apply(&mut g).unwrap();
        assert_eq!(g.pre_order(), nested_with_z_order());
        assert_eq!(g.edge_count(), 2);
        assert_eq!(position(&g, "outer"), Position::planar(12.5, 15.0));

        redo.apply(&mut g).unwrap();
        assert_eq!(g.node_count(), 3);
    }

    #[test]
    fn test_set_expanded() {
        let mut g = nested();
        let undo = g.set_expanded(id("inner"), false).unwrap();
        assert!(g.node(id("inner")).unwrap().is_collapsed());
        assert_eq!(position(&g, "a"), Position::planar(0.0, 0.0));
        undo.apply(&mut g).unwrap();
        assert!(g.node(id("inner")).unwrap().is_expanded());
        assert_eq!(
            g.set_expanded(id("a"), false),
            Err(GraphError::NotAContainer(id("a")))
        );
    }

    #[test]
    fn test_set_expanded_recursive() {
        let mut g = nested();
        g.set_expanded(id("inner"), false).unwrap();
        let undo = g.set_expanded_recursive(id("outer"), false).unwrap();
        assert!(g.node(id("outer")).unwrap().is_collapsed());
        assert!(g.node(id("inner")).unwrap().is_collapsed());

        undo.apply(&mut g).unwrap();
        assert!(g.node(id("outer")).unwrap().is_expanded());
        // inner was collapsed before the recursive call
        assert!(g.node(id("inner")).unwrap().is_collapsed());
    }

    #[test]
    fn test_pre_order_and_roots() {
        let mut g = nested();
        g.add_node(Node::new(id("solo"))).unwrap();
        let roots: Vec<_> = g.roots().collect();
        assert_eq!(roots, vec![id("outer"), id("solo")]);
        assert_eq!(
            g.pre_order(),
            ["outer", "inner", "a", "b", "c", "solo"]
                .into_iter()
                .map(id)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_next_edge_id_skips_used() {
        let mut g = Graph::new();
        g.add_node(Node::new(id("a"))).unwrap();
        g.add_edge(Edge::new(id("e1"), id("a"), id("a"))).unwrap();
        assert_eq!(g.next_edge_id(), id("e2"));
    }

    #[test]
    fn test_remove_edge_restores_index() {
        let mut g = nested();
        for (n, (s, t)) in [("a", "b"), ("b", "c"), ("c", "a")].iter().enumerate() {
            g.add_edge(Edge::new(id(&format!("x{n}")), id(s), id(t)))
                .unwrap();
        }
        let undo = g.remove_edge(id("x1")).unwrap();
        undo.apply(&mut g).unwrap();
        let order: Vec<_> = g.edges().map(Edge::id).collect();
        assert_eq!(order, vec![id("x0"), id("x1"), id("x2")]);
    }

    #[test]
    fn test_z_carried_by_centroid() {
        let mut g = Graph::new();
        g.add_node(Node::container(id("box"))).unwrap();
        g.add_node(Node::new(id("p")).with_position(Position::new(0.0, 0.0, 4.0)))
            .unwrap();
        g.add_node(Node::new(id("q")).with_position(Position::new(2.0, 0.0, 0.0)))
            .unwrap();
        g.add_child(id("box"), id("p")).unwrap();
        g.add_child(id("box"), id("q")).unwrap();
        let box_pos = position(&g, "box");
        assert_approx_eq!(f64, box_pos.x(), 1.0);
        assert_approx_eq!(f64, box_pos.z(), 2.0);
    }
}
