//! Layout engine factory module
//!
//! Each algorithm lives in its own engine type behind the [`Engine`] trait.
//! [`EngineBuilder`] configures engines from [`LayoutOptions`] and caches
//! them per [`Algorithm`].

mod circle;
mod compact;
mod force;
mod grid;
mod layered;
mod radial;
mod random;
mod tree;

use std::{collections::HashMap, f64::consts::TAU};

use log::trace;

use trellis_core::geometry::Position;

use crate::{
    error::LayoutError,
    layout::{Algorithm, CancelToken, EffectiveGraph, LayoutOptions},
};

/// Positions proposed by an engine, parallel to the effective node ids.
#[derive(Debug, Clone)]
pub(crate) struct Placement {
    pub(crate) positions: Vec<Position>,
    pub(crate) cancelled: bool,
}

impl Placement {
    pub(crate) fn complete(positions: Vec<Position>) -> Self {
        Self {
            positions,
            cancelled: false,
        }
    }
}

/// Trait implemented by every layout algorithm.
pub(crate) trait Engine {
    /// Calculate positions for every node of `graph`.
    ///
    /// Iterative engines check `cancel` after each completed iteration and
    /// return the positions reached so far.
    ///
    /// # Errors
    /// Returns `LayoutError` if the graph cannot be laid out by this engine.
    fn calculate(
        &self,
        graph: &EffectiveGraph,
        cancel: &CancelToken,
    ) -> Result<Placement, LayoutError>;
}

/// Builder for creating and configuring layout engines.
pub(crate) struct EngineBuilder<'a> {
    // Cache for reusing engines with the same configuration
    engines: HashMap<Algorithm, Box<dyn Engine>>,
    options: &'a LayoutOptions,
}

impl<'a> EngineBuilder<'a> {
    pub(crate) fn new(options: &'a LayoutOptions) -> Self {
        Self {
            engines: HashMap::new(),
            options,
        }
    }

    /// Get an engine of the specified type with configured options
    pub(crate) fn engine(&mut self, algorithm: Algorithm) -> &dyn Engine {
        let options = self.options;
        let engine = self.engines.entry(algorithm).or_insert_with(|| {
            trace!(algorithm = algorithm.name(); "Creating layout engine");
            let spacing = &options.spacing;
            let engine: Box<dyn Engine> = match algorithm {
                Algorithm::Spring => Box::new(force::Engine::spring(&options.spring)),
                Algorithm::Organic => Box::new(force::Engine::organic(
                    &options.spring,
                    &options.organic,
                )),
                Algorithm::Circle => {
                    let mut e = circle::Engine::new();
                    e.set_radius_per_node(spacing.circle_radius_per_node);
                    Box::new(e)
                }
                Algorithm::Grid => {
                    let mut e = grid::Engine::new();
                    e.set_spacing(spacing.grid_x, spacing.grid_y);
                    Box::new(e)
                }
                Algorithm::Tree => {
                    let mut e = tree::Engine::new();
                    e.set_spacing(spacing.tree_x, spacing.tree_y);
                    Box::new(e)
                }
                Algorithm::Radial => {
                    let mut e = radial::Engine::new();
                    e.set_ring_spacing(spacing.radial_ring);
                    Box::new(e)
                }
                Algorithm::Layered => {
                    let mut e = layered::Engine::new();
                    e.set_layer_spacing(spacing.layer)
                        .set_node_spacing(spacing.layer_node)
                        .set_break_cycles(options.layered.break_cycles);
                    Box::new(e)
                }
                Algorithm::Compact => Box::new(compact::Engine::new(&options.compact)),
                Algorithm::Random => {
                    let mut e = random::Engine::new();
                    e.set_extent(spacing.random_extent);
                    Box::new(e)
                }
            };
            engine
        });
        &**engine
    }
}

/// Unit vector used to push apart two nodes at the same spot.
///
/// The direction depends only on the unordered pair and points from `j`
/// toward `i`, so the two nodes of a pair get opposite pushes.
pub(super) fn separation(i: usize, j: usize) -> Position {
    const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;
    let (low, high) = (i.min(j), i.max(j));
    let angle = (low as f64 * 7.0 + high as f64) * GOLDEN_ANGLE;
    let direction = Position::planar(angle.cos(), angle.sin());
    if i == low {
        direction
    } else {
        direction.scale(-1.0)
    }
}

/// Offsets of `count` slots `spacing` apart, centered on zero.
pub(super) fn centered(count: usize, spacing: f64) -> impl Iterator<Item = f64> {
    let middle = count.saturating_sub(1) as f64 / 2.0;
    (0..count).map(move |slot| (slot as f64 - middle) * spacing)
}

/// Point `index` of `count` equally spaced points on a circle.
pub(super) fn on_circle(index: usize, count: usize, radius: f64) -> Position {
    let angle = TAU * index as f64 / count.max(1) as f64;
    Position::planar(radius * angle.cos(), radius * angle.sin())
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_separation_is_antisymmetric() {
        for (i, j) in [(0, 1), (3, 7), (12, 2)] {
            let forward = separation(i, j);
            let backward = separation(j, i);
            assert_approx_eq!(f64, forward.x(), -backward.x());
            assert_approx_eq!(f64, forward.y(), -backward.y());
            assert_approx_eq!(f64, forward.hypot(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_centered_offsets() {
        assert_eq!(centered(3, 100.0).collect::<Vec<_>>(), vec![-100.0, 0.0, 100.0]);
        assert_eq!(centered(2, 50.0).collect::<Vec<_>>(), vec![-25.0, 25.0]);
        assert_eq!(centered(1, 50.0).collect::<Vec<_>>(), vec![0.0]);
    }

    #[test]
    fn test_engine_cache_reuses_instance() {
        let options = LayoutOptions::new();
        let mut builder = EngineBuilder::new(&options);
        let first = builder.engine(Algorithm::Grid) as *const dyn Engine as *const ();
        let second = builder.engine(Algorithm::Grid) as *const dyn Engine as *const ();
        assert_eq!(first, second);
    }
}
