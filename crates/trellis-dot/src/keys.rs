//! Attribute names with a meaning of their own.

pub(crate) const LABEL: &str = "label";
/// Graphviz position, `"x,y"` with an optional `z` and pin marker `!`.
pub(crate) const POS: &str = "pos";

pub(crate) const X: &str = "_x";
pub(crate) const Y: &str = "_y";
pub(crate) const Z: &str = "_z";
pub(crate) const IS_EXPANDED: &str = "_is_expanded";
pub(crate) const NODE_ID: &str = "_node_id";

pub(crate) const LAST_LAYOUT: &str = "_last_layout";
pub(crate) const GRAPH_DENSITY: &str = "_graph_density";
pub(crate) const SUGGESTED_LAYOUTS: &str = "_suggested_layouts";

pub(crate) const EDGE_ID: &str = "_edge_id";
pub(crate) const DIRECTED: &str = "_directed";
pub(crate) const RENDERING_TYPE: &str = "_rendering_type";
pub(crate) const CONTROL_POINTS: &str = "_control_points";

/// Keys stored on the graph's advisory record rather than in an attribute map.
pub(crate) fn is_advisory(key: &str) -> bool {
    matches!(key, LAST_LAYOUT | GRAPH_DENSITY | SUGGESTED_LAYOUTS)
}

/// Keys decoded into node fields.
pub(crate) fn is_node_field(key: &str) -> bool {
    matches!(key, LABEL | POS | X | Y | Z | IS_EXPANDED)
}

/// Keys decoded into edge fields.
pub(crate) fn is_edge_field(key: &str) -> bool {
    matches!(key, EDGE_ID | DIRECTED | RENDERING_TYPE | CONTROL_POINTS)
}
