//! Hierarchical tree layout.
//!
//! Roots are the nodes without incoming edges. Levels come from a
//! breadth-first walk along edge direction, starting from all roots at once.
//! Each level is a row one vertical spacing below the previous one, its
//! nodes centered in the order the walk discovered them: roots in ascending
//! id order, children after their parent's earlier siblings and in edge
//! order among themselves. Subtrees therefore stay on their parent's side.
//!
//! Without any zero in-degree node, the node with the largest out-degree
//! becomes the root, ties going to the smallest id. Nodes the walk never
//! reaches start another tree, chosen among the remaining nodes the same way.

use std::collections::VecDeque;

use log::debug;
use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::{Bfs, VisitMap, Visitable},
};

use trellis_core::geometry::Position;

use crate::{
    error::LayoutError,
    layout::{
        CancelToken, EffectiveGraph,
        engines::{self, Placement},
    },
};

pub struct Engine {
    horizontal_spacing: f64,
    vertical_spacing: f64,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            horizontal_spacing: 100.0,
            vertical_spacing: 100.0,
        }
    }

    pub fn set_spacing(&mut self, horizontal: f64, vertical: f64) -> &mut Self {
        self.horizontal_spacing = horizontal;
        self.vertical_spacing = vertical;
        self
    }
}

/// Depth of every node and the order the walk reached them.
struct Walk {
    levels: Vec<usize>,
    order: Vec<usize>,
}

fn walk(graph: &EffectiveGraph) -> Walk {
    // petgraph yields the newest edge first, so insert them reversed.
    let edges: Vec<(usize, usize)> = graph.edges().collect();
    let mut forest: DiGraph<(), ()> = DiGraph::with_capacity(graph.len(), edges.len());
    for _ in 0..graph.len() {
        forest.add_node(());
    }
    for &(source, target) in edges.iter().rev() {
        forest.add_edge(NodeIndex::new(source), NodeIndex::new(target), ());
    }

    let mut level: Vec<Option<usize>> = vec![None; graph.len()];
    let mut order = Vec::with_capacity(graph.len());
    let mut bfs = Bfs {
        stack: VecDeque::new(),
        discovered: forest.visit_map(),
    };
    loop {
        let remaining: Vec<usize> = (0..graph.len()).filter(|i| level[*i].is_none()).collect();
        if remaining.is_empty() {
            break;
        }
        let roots = pick_roots(&remaining, &edges);
        debug!(roots:? = roots; "Tree roots");

        for root in roots {
            level[root] = Some(0);
            bfs.discovered.visit(NodeIndex::<u32>::new(root));
            bfs.stack.push_back(NodeIndex::new(root));
        }

        while let Some(node) = bfs.next(&forest) {
            order.push(node.index());
            let depth = level[node.index()].unwrap_or_default();
            // The walk has just discovered these; give them their depth.
            for next in forest.neighbors(node) {
                if level[next.index()].is_none() {
                    level[next.index()] = Some(depth + 1);
                }
            }
        }
    }

    Walk {
        levels: level.into_iter().map(Option::unwrap_or_default).collect(),
        order,
    }
}

/// Roots among `remaining`, considering only edges between remaining nodes.
fn pick_roots(remaining: &[usize], edges: &[(usize, usize)]) -> Vec<usize> {
    let count = remaining.last().map_or(0, |last| last + 1);
    let mut in_degree = vec![0usize; count];
    let mut out_degree = vec![0usize; count];
    for &(source, target) in edges {
        if remaining.binary_search(&source).is_ok() && remaining.binary_search(&target).is_ok() {
            in_degree[target] += 1;
            out_degree[source] += 1;
        }
    }

    let sources: Vec<usize> = remaining
        .iter()
        .copied()
        .filter(|node| in_degree[*node] == 0)
        .collect();
    if !sources.is_empty() {
        return sources;
    }

    // `remaining` is ascending, so the first maximum is the smallest id.
    let mut best = remaining[0];
    for &node in remaining {
        if out_degree[node] > out_degree[best] {
            best = node;
        }
    }
    vec![best]
}

impl engines::Engine for Engine {
    fn calculate(
        &self,
        graph: &EffectiveGraph,
        _cancel: &CancelToken,
    ) -> Result<Placement, LayoutError> {
        let Walk { levels, order } = walk(graph);
        let depth = levels.iter().max().map_or(0, |max| max + 1);

        let mut rows: Vec<Vec<usize>> = vec![Vec::new(); depth];
        for node in order {
            rows[levels[node]].push(node);
        }

        let mut positions = vec![Position::ORIGIN; graph.len()];
        for (level, row) in rows.iter().enumerate() {
            let y = level as f64 * self.vertical_spacing;
            for (node, x) in row
                .iter()
                .zip(engines::centered(row.len(), self.horizontal_spacing))
            {
                positions[*node] = Position::planar(x, y);
            }
        }
        Ok(Placement::complete(positions))
    }
}

#[cfg(test)]
mod tests {
    use trellis_core::{edge::Edge, graph::Graph, identifier::Id, node::Node};

    use super::*;
    use crate::layout::engines::Engine as _;

    fn build(nodes: &[&str], edges: &[(&str, &str)]) -> EffectiveGraph {
        let mut graph = Graph::new();
        for name in nodes {
            graph.add_node(Node::new(Id::new(name))).unwrap();
        }
        for (i, (s, t)) in edges.iter().enumerate() {
            graph
                .add_edge(Edge::new(Id::new(&format!("e{i}")), Id::new(s), Id::new(t)))
                .unwrap();
        }
        EffectiveGraph::new(&graph, false)
    }

    #[test]
    fn test_root_with_three_children() {
        let graph = build(
            &["root", "x", "y", "z"],
            &[("root", "x"), ("root", "y"), ("root", "z")],
        );
        let placement = Engine::new()
            .calculate(&graph, &CancelToken::new())
            .unwrap();
        let root = placement.positions[0];
        let children = &placement.positions[1..];

        assert_eq!(root.y(), 0.0);
        assert!(children.iter().all(|c| c.y() == 100.0));
        let mut xs: Vec<f64> = children.iter().map(|c| c.x()).collect();
        xs.sort_by(f64::total_cmp);
        xs.dedup();
        assert_eq!(xs.len(), 3);
    }

    #[test]
    fn test_cycle_falls_back_to_max_out_degree() {
        // a -> b -> c -> a, plus c -> d: `c` has the largest out-degree
        let graph = build(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d")],
        );
        assert_eq!(walk(&graph).levels, vec![1, 2, 0, 1]);
    }

    #[test]
    fn test_out_degree_tie_prefers_smallest_id() {
        let graph = build(&["a", "b"], &[("a", "b"), ("b", "a")]);
        assert_eq!(walk(&graph).levels, vec![0, 1]);
    }

    #[test]
    fn test_unreachable_cycle_starts_new_tree() {
        // `r` reaches only `s`; the cycle x <-> y is picked up afterwards.
        let graph = build(&["r", "s", "x", "y"], &[("r", "s"), ("x", "y"), ("y", "x")]);
        assert_eq!(walk(&graph).levels, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_grandchildren_stay_under_their_parent() {
        // `a` sorts before `z`, but its parent `n` comes after `m`.
        let graph = build(
            &["a", "m", "n", "r", "z"],
            &[("r", "m"), ("r", "n"), ("m", "z"), ("n", "a")],
        );
        let placement = Engine::new()
            .calculate(&graph, &CancelToken::new())
            .unwrap();
        let [a, m, n, _, z] = placement.positions[..] else {
            panic!("five positions expected");
        };

        assert!(m.x() < n.x());
        assert!(z.x() < a.x());
        assert_eq!(walk(&graph).order, vec![3, 1, 2, 4, 0]);
    }

    #[test]
    fn test_siblings_follow_edge_order() {
        let graph = build(&["r", "x", "y"], &[("r", "y"), ("r", "x")]);
        let placement = Engine::new()
            .calculate(&graph, &CancelToken::new())
            .unwrap();
        assert_eq!(placement.positions[2], Position::planar(-50.0, 100.0));
        assert_eq!(placement.positions[1], Position::planar(50.0, 100.0));
    }
}
