//! Graph nodes.

use indexmap::IndexMap;

use crate::{geometry::Position, identifier::Id};

/// A node of a [`Graph`](crate::graph::Graph).
///
/// A node flagged as a container may own child nodes through the graph's
/// [`ContainerHierarchy`](crate::hierarchy::ContainerHierarchy). The
/// position of a non-empty container is derived from its children and is
/// only ever written by the graph itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: Id,
    label: String,
    position: Position,
    attributes: IndexMap<String, String>,
    container: bool,
    expanded: bool,
}

impl Node {
    /// Creates a leaf node at the origin, labelled with its id.
    pub fn new(id: Id) -> Self {
        Self {
            id,
            label: id.as_string(),
            position: Position::ORIGIN,
            attributes: IndexMap::new(),
            container: false,
            expanded: true,
        }
    }

    /// Creates an expanded container node at the origin.
    pub fn container(id: Id) -> Self {
        Self {
            container: true,
            ..Self::new(id)
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Sets the initial expansion state. Ignored for leaf nodes.
    pub fn with_expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut IndexMap<String, String> {
        &mut self.attributes
    }

    pub fn is_container(&self) -> bool {
        self.container
    }

    /// Expansion state. Always `true` for leaf nodes.
    pub fn is_expanded(&self) -> bool {
        !self.container || self.expanded
    }

    /// Returns `true` for a container whose children are hidden.
    pub fn is_collapsed(&self) -> bool {
        !self.is_expanded()
    }

    pub(crate) fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }
}
