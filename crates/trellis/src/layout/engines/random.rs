//! Uniform random placement in a square whose half-width grows with the
//! square root of the node count. Seeded from the thread RNG, so runs differ.

use rand::Rng;

use trellis_core::geometry::Position;

use crate::{
    error::LayoutError,
    layout::{
        CancelToken, EffectiveGraph,
        engines::{self, Placement},
    },
};

pub struct Engine {
    extent: f64,
}

impl Engine {
    pub fn new() -> Self {
        Self { extent: 100.0 }
    }

    /// Set the half-width of the box per square root of the node count
    pub fn set_extent(&mut self, extent: f64) -> &mut Self {
        self.extent = extent;
        self
    }
}

impl engines::Engine for Engine {
    fn calculate(
        &self,
        graph: &EffectiveGraph,
        _cancel: &CancelToken,
    ) -> Result<Placement, LayoutError> {
        let bound = (graph.len() as f64).sqrt() * self.extent;
        if !bound.is_finite() || bound <= 0.0 {
            return Ok(Placement::complete(vec![Position::ORIGIN; graph.len()]));
        }
        let mut rng = rand::rng();
        Ok(Placement::complete(
            (0..graph.len())
                .map(|_| {
                    Position::planar(
                        rng.random_range(-bound..bound),
                        rng.random_range(-bound..bound),
                    )
                })
                .collect(),
        ))
    }
}
