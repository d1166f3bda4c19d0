//! The containment forest.
//!
//! [`ContainerHierarchy`] records which container owns which node. It is an
//! index structure only: parent links in one map, ordered child sets in the
//! other. Cycle checks are ancestor walks over these maps.
//!
//! Every traversal that visits more than one node does so in pre-order, with
//! children in insertion order, so recursive operations are reproducible.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};

use crate::identifier::Id;

/// Parent/child index maps of the containment forest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerHierarchy {
    parents: HashMap<Id, Id>,
    children: IndexMap<Id, IndexSet<Id>>,
}

impl ContainerHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `id` has been registered as a container.
    pub fn is_container(&self, id: Id) -> bool {
        self.children.contains_key(&id)
    }

    /// The container directly owning `id`.
    pub fn parent_of(&self, id: Id) -> Option<Id> {
        self.parents.get(&id).copied()
    }

    /// Parent of `id` together with the index of `id` among its siblings.
    pub fn slot_of(&self, id: Id) -> Option<(Id, usize)> {
        let parent = self.parent_of(id)?;
        let index = self.children.get(&parent)?.get_index_of(&id)?;
        Some((parent, index))
    }

    /// Direct children of `id` in insertion order. Empty for leaves.
    pub fn children_of(&self, id: Id) -> impl Iterator<Item = Id> + '_ {
        self.children
            .get(&id)
            .into_iter()
            .flat_map(|children| children.iter().copied())
    }

    pub fn child_count(&self, id: Id) -> usize {
        self.children.get(&id).map_or(0, IndexSet::len)
    }

    /// Walks from the parent of `id` up to its root, nearest first.
    pub fn ancestors(&self, id: Id) -> Ancestors<'_> {
        Ancestors {
            hierarchy: self,
            current: self.parent_of(id),
        }
    }

    /// Returns `true` if `ancestor` is a (transitive) container of `id`.
    pub fn is_ancestor(&self, ancestor: Id, id: Id) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Number of containers above `id`. Roots are at depth 0.
    pub fn depth(&self, id: Id) -> usize {
        self.ancestors(id).count()
    }

    /// `root` followed by all of its descendants, in pre-order.
    pub fn pre_order_from(&self, root: Id) -> Vec<Id> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(children) = self.children.get(&id) {
                stack.extend(children.iter().rev().copied());
            }
        }
        order
    }

    /// All descendants of `root` in pre-order, excluding `root` itself.
    pub fn descendants(&self, root: Id) -> Vec<Id> {
        let mut order = self.pre_order_from(root);
        order.remove(0);
        order
    }

    pub(crate) fn register_container(&mut self, id: Id) {
        self.children.entry(id).or_default();
    }

    /// Forgets a container. Its children become roots.
    pub(crate) fn unregister_container(&mut self, id: Id) {
        if let Some(children) = self.children.shift_remove(&id) {
            for child in children {
                self.parents.remove(&child);
            }
        }
    }

    /// Attaches `child` under `parent` at `index`, or last when `index` is
    /// `None` or out of range. The caller detaches `child` first.
    pub(crate) fn attach_at(&mut self, parent: Id, child: Id, index: Option<usize>) {
        let siblings = self.children.entry(parent).or_default();
        match index {
            Some(index) if index < siblings.len() => {
                siblings.shift_insert(index, child);
            }
            _ => {
                siblings.insert(child);
            }
        }
        self.parents.insert(child, parent);
    }

    /// Detaches `child` from its parent, returning the slot it occupied.
    pub(crate) fn detach(&mut self, child: Id) -> Option<(Id, usize)> {
        let parent = self.parents.remove(&child)?;
        let (index, _) = self.children.get_mut(&parent)?.shift_remove_full(&child)?;
        Some((parent, index))
    }
}

/// Iterator over the ancestors of a node, nearest first.
pub struct Ancestors<'a> {
    hierarchy: &'a ContainerHierarchy,
    current: Option<Id>,
}

impl Iterator for Ancestors<'_> {
    type Item = Id;

    fn next(&mut self) -> Option<Id> {
        let current = self.current?;
        self.current = self.hierarchy.parent_of(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> Id {
        Id::new(name)
    }

    /// root ─┬─ a ─── a1
    ///       └─ b
    fn sample() -> ContainerHierarchy {
        let mut h = ContainerHierarchy::new();
        h.register_container(id("root"));
        h.register_container(id("a"));
        h.attach_at(id("root"), id("a"), None);
        h.attach_at(id("root"), id("b"), None);
        h.attach_at(id("a"), id("a1"), None);
        h
    }

    #[test]
    fn test_parent_and_children() {
        let h = sample();
        assert_eq!(h.parent_of(id("a1")), Some(id("a")));
        assert_eq!(h.parent_of(id("root")), None);
        let children: Vec<_> = h.children_of(id("root")).collect();
        assert_eq!(children, vec![id("a"), id("b")]);
        assert_eq!(h.child_count(id("b")), 0);
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let h = sample();
        let ancestors: Vec<_> = h.ancestors(id("a1")).collect();
        assert_eq!(ancestors, vec![id("a"), id("root")]);
        assert_eq!(h.depth(id("a1")), 2);
        assert!(h.is_ancestor(id("root"), id("a1")));
        assert!(!h.is_ancestor(id("a1"), id("root")));
    }

    #[test]
    fn test_pre_order() {
        let h = sample();
        assert_eq!(
            h.pre_order_from(id("root")),
            vec![id("root"), id("a"), id("a1"), id("b")]
        );
        assert_eq!(h.descendants(id("root")), vec![id("a"), id("a1"), id("b")]);
        assert_eq!(h.pre_order_from(id("b")), vec![id("b")]);
    }

    #[test]
    fn test_detach_reports_slot() {
        let mut h = sample();
        assert_eq!(h.slot_of(id("b")), Some((id("root"), 1)));
        assert_eq!(h.detach(id("a")), Some((id("root"), 0)));
        assert_eq!(h.parent_of(id("a")), None);
        assert_eq!(h.slot_of(id("b")), Some((id("root"), 0)));
        assert_eq!(h.detach(id("a")), None);
    }

    #[test]
    fn test_attach_at_index_restores_order() {
        let mut h = sample();
        let slot = h.detach(id("a")).unwrap();
        h.attach_at(slot.0, id("a"), Some(slot.1));
        let children: Vec<_> = h.children_of(id("root")).collect();
        assert_eq!(children, vec![id("a"), id("b")]);
    }

    #[test]
    fn test_unregister_orphans_children() {
        let mut h = sample();
        h.unregister_container(id("a"));
        assert!(!h.is_container(id("a")));
        assert_eq!(h.parent_of(id("a1")), None);
    }
}
