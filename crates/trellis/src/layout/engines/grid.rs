//! Grid layout: row-major placement centered on the origin, with
//! `ceil(sqrt(n))` columns.

use log::debug;

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

impl engines::Engine for Engine {
    fn calculate(
        &self,
        graph: &EffectiveGraph,
        _cancel: &CancelToken,
    ) -> Result<Placement, LayoutError> {
        let count = graph.len();
        if count == 0 {
            return Ok(Placement::complete(Vec::new()));
        }
        let columns = (count as f64).sqrt().ceil() as usize;
        let rows = count.div_ceil(columns);
        debug!(columns = columns, rows = rows; "Grid dimensions");

        let xs: Vec<f64> = engines::centered(columns, self.horizontal_spacing).collect();
        let ys: Vec<f64> = engines::centered(rows, self.vertical_spacing).collect();
        Ok(Placement::complete(
            (0..count)
                .map(|index| Position::planar(xs[index % columns], ys[index / columns]))
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use trellis_core::{graph::Graph, identifier::Id, node::Node};

    use super::*;
    use crate::layout::engines::Engine as _;

    fn graph_of(count: usize) -> EffectiveGraph {
        let mut graph = Graph::new();
        for i in 0..count {
            graph.add_node(Node::new(Id::new(&format!("n{i}")))).unwrap();
        }
        EffectiveGraph::new(&graph, false)
    }

    #[test]
    fn test_nine_nodes_form_three_by_three() {
        let placement = Engine::new()
            .calculate(&graph_of(9), &CancelToken::new())
            .unwrap();
        let mut xs: Vec<f64> = placement.positions.iter().map(|p| p.x()).collect();
        let mut ys: Vec<f64> = placement.positions.iter().map(|p| p.y()).collect();
        xs.sort_by(f64::total_cmp);
        xs.dedup();
        ys.sort_by(f64::total_cmp);
        ys.dedup();
        assert_eq!(xs, vec![-100.0, 0.0, 100.0]);
        assert_eq!(ys, vec![-100.0, 0.0, 100.0]);
        assert_eq!(placement.positions[0], Position::planar(-100.0, -100.0));
        assert_eq!(placement.positions[5], Position::planar(100.0, 0.0));
    }

    #[test]
    fn test_partial_last_row() {
        let placement = Engine::new()
            .calculate(&graph_of(5), &CancelToken::new())
            .unwrap();
        // 3 columns, 2 rows
        assert_eq!(placement.positions[4], Position::planar(0.0, 50.0));
    }
}
