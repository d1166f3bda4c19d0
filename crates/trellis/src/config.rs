//! Configuration types for Trellis layouts.
//!
//! Every type implements [`serde::Deserialize`] with all fields defaulted, so
//! a configuration file only needs to name the values it changes.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration root.
//! - [`LayoutConfig`] - Default algorithm, container handling and the
//!   parameter groups of the individual algorithms.
//!
//! # Example
//!
//! ```
//! # use trellis::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(!config.layout().respect_collapsed_containers());
//! assert_eq!(config.layout().spring.iterations, 100);
//! ```

use serde::Deserialize;

use crate::{document::BusyPolicy, layout::Algorithm};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,
}

impl AppConfig {
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }
}

/// The `[layout]` section.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LayoutConfig {
    /// Algorithm used when the caller names none. `None` defers to the
    /// advisor's first suggestion.
    #[serde(default)]
    algorithm: Option<Algorithm>,

    /// Treat collapsed containers as single opaque nodes.
    #[serde(default)]
    respect_collapsed_containers: bool,

    /// What a document does with a second layout request.
    #[serde(default)]
    busy_policy: BusyPolicy,

    #[serde(default)]
    pub spring: SpringConfig,

    #[serde(default)]
    pub organic: OrganicConfig,

    #[serde(default)]
    pub compact: CompactConfig,

    #[serde(default)]
    pub layered: LayeredConfig,

    #[serde(default)]
    pub spacing: SpacingConfig,
}

impl LayoutConfig {
    pub fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }

    pub fn respect_collapsed_containers(&self) -> bool {
        self.respect_collapsed_containers
    }

    pub fn busy_policy(&self) -> BusyPolicy {
        self.busy_policy
    }
}

/// Force model shared by `spring` and `organic`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub iterations: usize,
    /// Attraction per unit of edge length.
    pub spring_constant: f64,
    /// Repulsion numerator; the force falls off with squared distance.
    pub repulsion_constant: f64,
    /// Velocity retained after each iteration.
    pub damping_factor: f64,
    /// The run stops early once no node feels a larger force.
    pub convergence_threshold: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            spring_constant: 0.01,
            repulsion_constant: 10_000.0,
            damping_factor: 0.85,
            convergence_threshold: 0.1,
        }
    }
}

/// Annealing schedule of the `organic` layout.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrganicConfig {
    pub iterations: usize,
    /// Largest displacement allowed in the first iteration.
    pub initial_temperature: f64,
    /// Geometric decay applied to the temperature after each iteration.
    pub cooling_factor: f64,
}

impl Default for OrganicConfig {
    fn default() -> Self {
        Self {
            iterations: 300,
            initial_temperature: 100.0,
            cooling_factor: 0.97,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompactConfig {
    pub iterations: usize,
    /// Nodes closer than this are overlapping.
    pub min_distance: f64,
    /// Fraction of the way toward connected neighbours moved per pass.
    pub initial_step: f64,
    pub step_growth: f64,
    pub max_step: f64,
}

impl Default for CompactConfig {
    fn default() -> Self {
        Self {
            iterations: 50,
            min_distance: 50.0,
            initial_step: 0.1,
            step_growth: 1.1,
            max_step: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayeredConfig {
    /// Drop back edges found by a depth-first walk instead of failing.
    pub break_cycles: bool,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self { break_cycles: true }
    }
}

/// Distances used by the geometric layouts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpacingConfig {
    /// Circle radius per node.
    pub circle_radius_per_node: f64,
    pub grid_x: f64,
    pub grid_y: f64,
    pub tree_x: f64,
    pub tree_y: f64,
    /// Distance between consecutive radial rings.
    pub radial_ring: f64,
    pub layer: f64,
    pub layer_node: f64,
    /// Half-width of the random box per square root of the node count.
    pub random_extent: f64,
}

impl Default for SpacingConfig {
    fn default() -> Self {
        Self {
            circle_radius_per_node: 50.0,
            grid_x: 100.0,
            grid_y: 100.0,
            tree_x: 100.0,
            tree_y: 100.0,
            radial_ring: 100.0,
            layer: 100.0,
            layer_node: 50.0,
            random_extent: 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.layout().algorithm(), None);
        assert_eq!(config.layout().spring, SpringConfig::default());
        assert_eq!(config.layout().busy_policy(), BusyPolicy::Reject);
    }

    #[test]
    fn test_partial_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [layout]
            algorithm = "grid"
            respect_collapsed_containers = true
            busy_policy = "cancel_in_flight"

            [layout.spring]
            iterations = 20

            [layout.spacing]
            grid_x = 40.0
            "#,
        )
        .unwrap();

        let layout = config.layout();
        assert_eq!(layout.algorithm(), Some(Algorithm::Grid));
        assert!(layout.respect_collapsed_containers());
        assert_eq!(layout.busy_policy(), BusyPolicy::CancelInFlight);
        assert_eq!(layout.spring.iterations, 20);
        assert_eq!(layout.spring.damping_factor, 0.85);
        assert_eq!(layout.spacing.grid_x, 40.0);
        assert_eq!(layout.spacing.grid_y, 100.0);
        assert!(layout.layered.break_cycles);
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[layout]\nalgorithm = \"fancy\"\n");
        assert!(result.is_err());
    }
}
