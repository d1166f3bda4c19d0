//! Invertible edit commands.
//!
//! Every mutating [`Graph`] operation returns the [`Command`] that undoes it.
//! Applying that command returns the command that redoes the original edit,
//! so a host can keep two stacks of commands and move them back and forth.
//!
//! ```
//! # use trellis_core::{graph::Graph, node::Node, identifier::Id};
//! let mut graph = Graph::new();
//! let undo = graph.add_node(Node::new(Id::new("a"))).unwrap();
//! assert_eq!(graph.node_count(), 1);
//!
//! let redo = undo.apply(&mut graph).unwrap();
//! assert_eq!(graph.node_count(), 0);
//!
//! redo.apply(&mut graph).unwrap();
//! assert_eq!(graph.node_count(), 1);
//! ```

use indexmap::IndexMap;
use log::warn;

use crate::{
    edge::Edge,
    error::Result,
    geometry::Position,
    graph::Graph,
    identifier::Id,
    node::Node,
};

/// State captured when a single node is removed.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedNode {
    pub(crate) node: Node,
    pub(crate) index: usize,
    pub(crate) parent: Option<(Id, usize)>,
    /// Children promoted to the removed container's parent.
    pub(crate) children: Vec<Id>,
    pub(crate) edges: Vec<(usize, Edge)>,
}

/// State captured when a container is removed along with its descendants.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedSubtree {
    pub(crate) root: Id,
    pub(crate) parent: Option<(Id, usize)>,
    /// Removed nodes with their index in the graph, ascending by index.
    pub(crate) nodes: Vec<(usize, Node)>,
    /// Child lists of every removed container, in pre-order.
    pub(crate) links: Vec<(Id, Vec<Id>)>,
    pub(crate) edges: Vec<(usize, Edge)>,
}

/// A single invertible graph edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddNode(Node),
    RemoveNode(Id),
    RestoreNode(Box<RemovedNode>),
    AddEdge { edge: Edge, index: Option<usize> },
    RemoveEdge(Id),
    /// Moves `node` under `parent` at `index`; `None` parent makes it a root.
    Reparent {
        node: Id,
        parent: Option<Id>,
        index: Option<usize>,
    },
    SetExpanded { container: Id, expanded: bool },
    SetPositions(IndexMap<Id, Position>),
    RemoveSubtree(Id),
    RestoreSubtree(Box<RemovedSubtree>),
    /// Applied in order, inverted in reverse order.
    Batch(Vec<Command>),
}

impl Command {
    /// Applies this command to `graph` and returns its inverse.
    ///
    /// # Errors
    ///
    /// Returns the [`GraphError`](crate::error::GraphError) of the failing
    /// edit. A failing batch is rolled back before returning, so the graph is
    /// unchanged on error.
    pub fn apply(self, graph: &mut Graph) -> Result<Command> {
        match self {
            Command::AddNode(node) => graph.add_node(node),
            Command::RemoveNode(id) => graph.remove_node(id),
            Command::RestoreNode(removed) => graph.restore_node(*removed),
            Command::AddEdge { edge, index } => graph.insert_edge(edge, index),
            Command::RemoveEdge(id) => graph.remove_edge(id),
            Command::Reparent {
                node,
                parent,
                index,
            } => graph.reparent(node, parent, index),
            Command::SetExpanded {
                container,
                expanded,
            } => graph.set_expanded(container, expanded),
            Command::SetPositions(positions) => graph.set_positions(positions),
            Command::RemoveSubtree(root) => graph.remove_subtree(root),
            Command::RestoreSubtree(removed) => graph.restore_subtree(*removed),
            Command::Batch(commands) => apply_batch(commands, graph),
        }
    }

    /// Returns `true` for an empty batch.
    pub fn is_noop(&self) -> bool {
        matches!(self, Command::Batch(commands) if commands.iter().all(Command::is_noop))
    }
}

fn apply_batch(commands: Vec<Command>, graph: &mut Graph) -> Result<Command> {
    let mut inverses = Vec::with_capacity(commands.len());
    for command in commands {
        match command.apply(graph) {
            Ok(inverse) => inverses.push(inverse),
            Err(err) => {
                while let Some(inverse) = inverses.pop() {
                    if let Err(rollback_err) = inverse.apply(graph) {
                        warn!(err:% = rollback_err; "Failed to roll back batch step");
                    }
                }
                return Err(err);
            }
        }
    }
    inverses.reverse();
    Ok(Command::Batch(inverses))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;

    fn id(name: &str) -> Id {
        Id::new(name)
    }

    #[test]
    fn test_batch_inverse_runs_backwards() {
        let mut graph = Graph::new();
        let batch = Command::Batch(vec![
            Command::AddNode(Node::container(id("c"))),
            Command::AddNode(Node::new(id("n"))),
            Command::Reparent {
                node: id("n"),
                parent: Some(id("c")),
                index: None,
            },
        ]);

        let undo = batch.apply(&mut graph).unwrap();
        assert_eq!(graph.parent_of(id("n")), Some(id("c")));

        undo.apply(&mut graph).unwrap();
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_failed_batch_rolls_back() {
        let mut graph = Graph::new();
        let batch = Command::Batch(vec![
            Command::AddNode(Node::new(id("x"))),
            Command::RemoveNode(id("missing")),
        ]);

        let err = batch.apply(&mut graph).unwrap_err();
        assert_eq!(err, GraphError::UnknownNode(id("missing")));
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        assert!(Command::Batch(Vec::new()).is_noop());
        assert!(!Command::RemoveNode(id("a")).is_noop());
    }
}
