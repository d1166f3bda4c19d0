//! Circular layout: nodes at equal angles in ascending id order, on a circle
//! whose radius grows with the node count.

use crate::{
    error::LayoutError,
    layout::{
        CancelToken, EffectiveGraph,
        engines::{self, Placement},
    },
};

pub struct Engine {
    radius_per_node: f64,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            radius_per_node: 50.0,
        }
    }

    pub fn set_radius_per_node(&mut self, radius: f64) -> &mut Self {
        self.radius_per_node = radius;
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
        let radius = count as f64 * self.radius_per_node;
        Ok(Placement::complete(
            (0..count)
                .map(|index| engines::on_circle(index, count, radius))
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use trellis_core::{graph::Graph, identifier::Id, node::Node};

    use super::*;
    use crate::layout::engines::Engine as _;

    #[test]
    fn test_four_nodes_on_axes() {
        let mut graph = Graph::new();
        for name in ["d", "b", "a", "c"] {
            graph.add_node(Node::new(Id::new(name))).unwrap();
        }
        let effective = EffectiveGraph::new(&graph, false);
        let placement = Engine::new()
            .calculate(&effective, &CancelToken::new())
            .unwrap();

        // radius 4 * 50, `a` first at angle zero
        let expected = [(200.0, 0.0), (0.0, 200.0), (-200.0, 0.0), (0.0, -200.0)];
        for (position, (x, y)) in placement.positions.iter().zip(expected) {
            assert_approx_eq!(f64, position.x(), x, epsilon = 1e-9);
            assert_approx_eq!(f64, position.y(), y, epsilon = 1e-9);
        }
    }
}
