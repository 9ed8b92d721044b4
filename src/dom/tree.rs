//! Node table shared by the document implementations.
//!
//! Owns ids, parent/child links and root order; each document stores its
//! own per-node payload alongside.

use std::collections::BTreeMap;

use super::{Element, NodeId};

pub(crate) struct TreeNode<T> {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Root of a portal subtree.
    pub detached: bool,
    pub data: T,
}

pub(crate) struct NodeTable<T> {
    nodes: BTreeMap<NodeId, TreeNode<T>>,
    /// Parentless nodes in insertion order.
    roots: Vec<NodeId>,
    next_id: u64,
}

impl<T> NodeTable<T> {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            roots: Vec::new(),
            next_id: 1,
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode<T>> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut TreeNode<T>> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TreeNode<T>)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Number of ancestors above `id`.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(id) = current {
            depth += 1;
            current = self.parent(id);
        }
        depth
    }

    /// Insert `element` and its descendants, building each payload with
    /// `make`. Only the subtree root can be detached.
    pub fn insert(
        &mut self,
        element: &Element,
        parent: Option<NodeId>,
        detached: bool,
        make: &mut impl FnMut(&Element) -> T,
    ) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;

        self.nodes.insert(
            id,
            TreeNode {
                parent,
                children: Vec::new(),
                detached,
                data: make(element),
            },
        );
        match parent.and_then(|parent| self.nodes.get_mut(&parent)) {
            Some(p) => p.children.push(id),
            None => self.roots.push(id),
        }

        for child in &element.children {
            self.insert(child, Some(id), false, make);
        }
        id
    }

    /// Remove `id` with its whole subtree. Returns false for unknown ids.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let Some(removed) = self.nodes.remove(&id) else {
            return false;
        };
        match removed.parent.and_then(|parent| self.nodes.get_mut(&parent)) {
            Some(p) => p.children.retain(|c| *c != id),
            None => self.roots.retain(|r| *r != id),
        }

        let mut stack = removed.children;
        while let Some(child) = stack.pop() {
            if let Some(node) = self.nodes.remove(&child) {
                stack.extend(node.children);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(table: &NodeTable<String>, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| table.get(*id).map(|n| n.data.clone()))
            .collect()
    }

    fn setup() -> (NodeTable<String>, NodeId) {
        let mut table = NodeTable::new();
        let root = table.insert(
            &Element::new("div")
                .child(Element::new("p").child(Element::new("b")))
                .child(Element::new("span")),
            None,
            false,
            &mut |element: &Element| element.tag.clone(),
        );
        (table, root)
    }

    #[test]
    fn test_insert_links_parents_and_children() {
        let (table, root) = setup();
        assert_eq!(table.len(), 4);
        assert_eq!(table.roots(), &[root]);

        let children = table.get(root).unwrap().children.clone();
        assert_eq!(tags(&table, &children), vec!["p", "span"]);
        assert_eq!(table.parent(children[0]), Some(root));

        let bold = table.get(children[0]).unwrap().children[0];
        assert_eq!(table.depth(bold), 2);
        assert_eq!(table.depth(root), 0);
    }

    #[test]
    fn test_only_subtree_root_is_detached() {
        let mut table = NodeTable::new();
        let root = table.insert(
            &Element::new("div").child(Element::new("p")),
            None,
            true,
            &mut |_: &Element| (),
        );
        let child = table.get(root).unwrap().children[0];
        assert!(table.get(root).unwrap().detached);
        assert!(!table.get(child).unwrap().detached);
    }

    #[test]
    fn test_remove_subtree() {
        let (mut table, root) = setup();
        let p = table.get(root).unwrap().children[0];

        assert!(table.remove(p));
        assert_eq!(table.len(), 2);
        assert_eq!(tags(&table, &table.get(root).unwrap().children), vec!["span"]);

        assert!(table.remove(root));
        assert_eq!(table.len(), 0);
        assert!(table.roots().is_empty());
        assert!(!table.remove(root));
    }
}
