//! In-memory document - a renderer with no layout engine.
//!
//! Node boxes come from explicit [`MemoryDocument::set_rect`] calls or
//! from the element's size hints (placed at the origin). Styles applied
//! to nodes are recorded so callers can inspect them. The
//! [`server`](MemoryDocument::server) variant has no viewport, which is how
//! a server-side render looks to the positioning engine.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::geometry::{Rect, Viewport};
use crate::style::PopupStyle;

use super::{Attributes, Element, NodeId, NodeTable, Renderer};

struct DocNode {
    tag: String,
    attributes: Attributes,
    rect: Option<Rect>,
    style: Option<PopupStyle>,
}

impl DocNode {
    fn from_element(element: &Element) -> Self {
        let rect = match (element.width, element.height) {
            (Some(w), Some(h)) => Some(Rect::sized(w as f64, h as f64)),
            _ => None,
        };
        Self {
            tag: element.tag.clone(),
            attributes: element.attributes.clone(),
            rect,
            style: None,
        }
    }
}

struct DocState {
    nodes: NodeTable<DocNode>,
    viewport: Option<Viewport>,
}

pub struct MemoryDocument {
    state: RefCell<DocState>,
}

impl MemoryDocument {
    pub fn new(viewport: Viewport) -> Rc<Self> {
        Self::with_viewport(Some(viewport))
    }

    /// A document without a window: positioning is skipped entirely.
    pub fn server() -> Rc<Self> {
        Self::with_viewport(None)
    }

    fn with_viewport(viewport: Option<Viewport>) -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(DocState {
                nodes: NodeTable::new(),
                viewport,
            }),
        })
    }

    /// Set a node's viewport-relative box.
    pub fn set_rect(&self, node: NodeId, rect: Rect) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let entry = state.nodes.get_mut(node).ok_or(Error::UnknownNode(node))?;
        entry.data.rect = Some(rect);
        Ok(())
    }

    /// Change the page scroll. Does not dispatch a scroll event.
    pub fn scroll_to(&self, x: f64, y: f64) {
        let mut state = self.state.borrow_mut();
        if let Some(viewport) = state.viewport.as_mut() {
            viewport.scroll_x = x;
            viewport.scroll_y = y;
        }
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.state.borrow_mut().viewport = Some(viewport);
    }

    pub fn is_mounted(&self, node: NodeId) -> bool {
        self.state.borrow().nodes.contains(node)
    }

    pub fn is_detached_root(&self, node: NodeId) -> bool {
        self.state
            .borrow()
            .nodes
            .get(node)
            .is_some_and(|n| n.detached)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.state
            .borrow()
            .nodes
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn tag(&self, node: NodeId) -> Option<String> {
        self.state.borrow().nodes.get(node).map(|n| n.data.tag.clone())
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.state
            .borrow()
            .nodes
            .get(node)
            .and_then(|n| n.data.attributes.get(name).cloned())
    }

    /// Last style applied to the node.
    pub fn style_of(&self, node: NodeId) -> Option<PopupStyle> {
        self.state.borrow().nodes.get(node).and_then(|n| n.data.style)
    }

    /// Roots of detached (portal) subtrees currently mounted.
    pub fn detached_roots(&self) -> Vec<NodeId> {
        self.state
            .borrow()
            .nodes
            .iter()
            .filter(|(_, n)| n.detached)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.state.borrow().nodes.len()
    }

    fn insert(&self, element: &Element, parent: Option<NodeId>, detached: bool) -> NodeId {
        let mut state = self.state.borrow_mut();
        let id = state
            .nodes
            .insert(element, parent, detached, &mut DocNode::from_element);
        fit_to_children(&mut state.nodes, id);
        id
    }
}

/// Unsized wrappers shrink to their children. Returns the node's box.
fn fit_to_children(nodes: &mut NodeTable<DocNode>, id: NodeId) -> Option<Rect> {
    let children = nodes.get(id).map(|n| n.children.clone()).unwrap_or_default();
    let mut extent: Option<(f64, f64)> = None;
    for child in children {
        if let Some(r) = fit_to_children(nodes, child) {
            let (w, h) = extent.unwrap_or((0.0, 0.0));
            extent = Some((w.max(r.width), h.max(r.height)));
        }
    }

    let node = nodes.get_mut(id)?;
    if node.data.rect.is_none() {
        node.data.rect = extent.map(|(w, h)| Rect::sized(w, h));
    }
    node.data.rect
}

impl Renderer for MemoryDocument {
    fn render(&self, element: &Element, parent: Option<NodeId>) -> Result<NodeId> {
        if let Some(parent) = parent {
            if !self.is_mounted(parent) {
                return Err(Error::UnknownNode(parent));
            }
        }
        Ok(self.insert(element, parent, false))
    }

    fn mount_detached(&self, element: &Element) -> Result<NodeId> {
        Ok(self.insert(element, None, true))
    }

    fn remove(&self, node: NodeId) {
        self.state.borrow_mut().nodes.remove(node);
    }

    fn measure(&self, node: NodeId) -> Option<Rect> {
        self.state.borrow().nodes.get(node).and_then(|n| n.data.rect)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.state.borrow().nodes.parent(node)
    }

    fn apply_style(&self, node: NodeId, style: &PopupStyle) {
        if let Some(n) = self.state.borrow_mut().nodes.get_mut(node) {
            n.data.style = Some(*style);
        }
    }

    fn viewport(&self) -> Option<Viewport> {
        self.state.borrow().viewport
    }

    fn node_at(&self, x: f64, y: f64) -> Option<NodeId> {
        let state = self.state.borrow();
        // Deepest wins; among equals the most recently rendered
        state
            .nodes
            .iter()
            .filter(|(_, n)| n.data.rect.is_some_and(|r| r.contains(x, y)))
            .map(|(id, _)| (state.nodes.depth(id), id))
            .max()
            .map(|(_, id)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Rc<MemoryDocument> {
        MemoryDocument::new(Viewport::new(80.0, 24.0))
    }

    #[test]
    fn test_render_tree() {
        let doc = setup();
        let root = doc
            .render(
                &Element::new("div")
                    .attr("class", "ui-popup")
                    .child(Element::new("button"))
                    .child(Element::new("span")),
                None,
            )
            .unwrap();

        let children = doc.children(root);
        assert_eq!(children.len(), 2);
        assert_eq!(doc.tag(children[0]).as_deref(), Some("button"));
        assert_eq!(doc.parent(children[1]), Some(root));
        assert_eq!(doc.attribute(root, "class").as_deref(), Some("ui-popup"));
        assert!(!doc.is_detached_root(root));
    }

    #[test]
    fn test_render_under_unknown_parent_fails() {
        let doc = setup();
        let err = doc.render(&Element::new("div"), Some(NodeId(99))).unwrap_err();
        assert_eq!(err, Error::UnknownNode(NodeId(99)));
    }

    #[test]
    fn test_remove_subtree() {
        let doc = setup();
        let root = doc
            .mount_detached(&Element::new("div").child(Element::new("p").child(Element::new("b"))))
            .unwrap();
        assert_eq!(doc.node_count(), 3);
        assert_eq!(doc.detached_roots(), vec![root]);

        doc.remove(root);
        assert_eq!(doc.node_count(), 0);
        // Idempotent
        doc.remove(root);
    }

    #[test]
    fn test_size_hints_become_rects() {
        let doc = setup();
        let node = doc.render(&Element::new("div").size(8.0, 3.0), None).unwrap();
        assert_eq!(doc.measure(node), Some(Rect::sized(8.0, 3.0)));

        let wrapper = doc
            .render(
                &Element::new("div")
                    .child(Element::new("span").size(5.0, 1.0))
                    .child(Element::new("span").size(3.0, 2.0)),
                None,
            )
            .unwrap();
        assert_eq!(doc.measure(wrapper), Some(Rect::sized(5.0, 2.0)));

        let bare = doc.render(&Element::new("div"), None).unwrap();
        assert_eq!(doc.measure(bare), None);
        doc.set_rect(bare, Rect::new(1.0, 2.0, 3.0, 4.0)).unwrap();
        assert_eq!(doc.measure(bare), Some(Rect::new(1.0, 2.0, 3.0, 4.0)));
    }

    #[test]
    fn test_server_document_has_no_viewport() {
        let doc = MemoryDocument::server();
        assert_eq!(doc.viewport(), None);
        doc.scroll_to(10.0, 10.0);
        assert_eq!(doc.viewport(), None);
    }

    #[test]
    fn test_node_at_prefers_deepest() {
        let doc = setup();
        let root = doc
            .render(&Element::new("div").child(Element::new("span")), None)
            .unwrap();
        let span = doc.children(root)[0];
        doc.set_rect(root, Rect::new(0.0, 0.0, 20.0, 10.0)).unwrap();
        doc.set_rect(span, Rect::new(2.0, 2.0, 4.0, 1.0)).unwrap();

        assert_eq!(doc.node_at(3.0, 2.0), Some(span));
        assert_eq!(doc.node_at(15.0, 8.0), Some(root));
        assert_eq!(doc.node_at(50.0, 20.0), None);
    }
}
