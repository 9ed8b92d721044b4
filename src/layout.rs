//! Layout document - a renderer backed by Taffy flexbox layout.
//!
//! Every mutation marks the tree dirty; the next query rebuilds a
//! [`TaffyTree`] from the node table and computes it against the viewport.
//!
//! - In-flow roots stack in a column from the top-left corner
//! - Text leaves are one cell tall and as wide as their text
//! - Detached (portal) roots are absolutely positioned from the last
//!   [`PopupStyle`] applied to them
//!
//! Boxes are kept in page coordinates; [`Renderer::measure`] subtracts
//! the scroll offset so callers see viewport-relative boxes.
//!
//! # Example
//!
//! ```ignore
//! let doc = LayoutDocument::new(Viewport::new(80.0, 24.0));
//! let host = HostContext::new(doc.clone());
//! let popup = Popup::new(host, props)?;
//!
//! for node in doc.snapshot() {
//!     draw(node.rect, node.text.as_deref());
//! }
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use taffy::{
    AlignItems, AvailableSpace, Dimension, Display, FlexDirection, LengthPercentageAuto,
    NodeId as TaffyNode, Position as TaffyPosition, Rect as TaffyRect, Size, Style, TaffyTree,
};
use tracing::{trace, warn};

use crate::dom::{Attributes, Element, NodeId, NodeTable, Renderer, TreeNode};
use crate::error::{Error, Result};
use crate::geometry::{Rect, Viewport};
use crate::style::{Length, PopupStyle};

struct LayoutNode {
    tag: String,
    text: Option<String>,
    attributes: Attributes,
    width: Option<f32>,
    height: Option<f32>,
    style: Option<PopupStyle>,
}

impl LayoutNode {
    fn from_element(element: &Element) -> Self {
        Self {
            tag: element.tag.clone(),
            text: element.text.clone(),
            attributes: element.attributes.clone(),
            width: element.width,
            height: element.height,
            style: None,
        }
    }
}

struct LayoutState {
    nodes: NodeTable<LayoutNode>,
    viewport: Viewport,
    /// Page-coordinate boxes from the last layout pass.
    rects: BTreeMap<NodeId, Rect>,
    dirty: bool,
}

/// A laid-out node, as handed to a painter.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutNode {
    pub id: NodeId,
    pub tag: String,
    pub text: Option<String>,
    /// Viewport-relative box.
    pub rect: Rect,
    pub detached: bool,
    pub depth: usize,
}

pub struct LayoutDocument {
    state: RefCell<LayoutState>,
}

impl LayoutDocument {
    pub fn new(viewport: Viewport) -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(LayoutState {
                nodes: NodeTable::new(),
                viewport,
                rects: BTreeMap::new(),
                dirty: true,
            }),
        })
    }

    /// Resize the viewport (e.g. on a terminal resize).
    pub fn resize(&self, width: f64, height: f64) {
        let mut state = self.state.borrow_mut();
        state.viewport.width = width;
        state.viewport.height = height;
        state.dirty = true;
    }

    pub fn scroll_to(&self, x: f64, y: f64) {
        let mut state = self.state.borrow_mut();
        state.viewport.scroll_x = x;
        state.viewport.scroll_y = y;
    }

    pub fn text(&self, node: NodeId) -> Option<String> {
        self.state.borrow().nodes.get(node).and_then(|n| n.data.text.clone())
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.state
            .borrow()
            .nodes
            .get(node)
            .and_then(|n| n.data.attributes.get(name).cloned())
    }

    pub fn node_count(&self) -> usize {
        self.state.borrow().nodes.len()
    }

    /// Every node with its current box, parents before children.
    pub fn snapshot(&self) -> Vec<LaidOutNode> {
        if let Err(err) = self.ensure_layout() {
            warn!(%err, "layout failed");
            return Vec::new();
        }

        let state = self.state.borrow();
        let mut out = Vec::new();
        let mut stack: Vec<(NodeId, usize)> =
            state.nodes.roots().iter().rev().map(|id| (*id, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            let (Some(node), Some(rect)) = (state.nodes.get(id), state.rects.get(&id)) else {
                continue;
            };
            out.push(LaidOutNode {
                id,
                tag: node.data.tag.clone(),
                text: node.data.text.clone(),
                rect: to_viewport(rect, &state.viewport),
                detached: node.detached,
                depth,
            });
            stack.extend(node.children.iter().rev().map(|c| (*c, depth + 1)));
        }
        out
    }

    fn insert(&self, element: &Element, parent: Option<NodeId>, detached: bool) -> NodeId {
        let mut state = self.state.borrow_mut();
        let id = state
            .nodes
            .insert(element, parent, detached, &mut LayoutNode::from_element);
        state.dirty = true;
        id
    }
}

fn to_viewport(rect: &Rect, viewport: &Viewport) -> Rect {
    rect.translate(-viewport.scroll_x, -viewport.scroll_y)
}

// =============================================================================
// TAFFY BRIDGE
// =============================================================================

fn dimension(value: Option<f32>) -> Dimension {
    match value {
        Some(v) => Dimension::Length(v),
        None => Dimension::Auto,
    }
}

fn inset(value: Option<Length>) -> LengthPercentageAuto {
    match value.and_then(|l| l.as_px()) {
        Some(px) => LengthPercentageAuto::Length(px as f32),
        None => LengthPercentageAuto::Auto,
    }
}

fn node_style(tree_node: &TreeNode<LayoutNode>) -> Style {
    let node = &tree_node.data;
    let text_width = node.text.as_deref().map(|t| t.chars().count() as f32);

    let mut style = Style {
        display: Display::Flex,
        flex_direction: FlexDirection::Column,
        align_items: Some(AlignItems::FlexStart),
        flex_shrink: 0.0,
        size: Size {
            width: dimension(node.width.or(text_width)),
            height: dimension(node.height.or(text_width.map(|_| 1.0))),
        },
        ..Default::default()
    };

    if tree_node.detached {
        style.position = TaffyPosition::Absolute;
        if let Some(popup) = node.style {
            style.inset = TaffyRect {
                top: inset(popup.top),
                right: inset(popup.right),
                bottom: inset(popup.bottom),
                left: inset(popup.left),
            };
        }
    }
    style
}

fn build(
    tree: &mut TaffyTree<()>,
    state: &LayoutState,
    id: NodeId,
    map: &mut HashMap<NodeId, TaffyNode>,
) -> Result<TaffyNode> {
    let node = state.nodes.get(id).ok_or(Error::UnknownNode(id))?;
    let children = node
        .children
        .iter()
        .map(|child| build(tree, state, *child, map))
        .collect::<Result<Vec<_>>>()?;

    let taffy_node = tree.new_with_children(node_style(node), &children)?;
    map.insert(id, taffy_node);
    Ok(taffy_node)
}

fn compute_rects(state: &LayoutState) -> Result<BTreeMap<NodeId, Rect>> {
    let mut tree: TaffyTree<()> = TaffyTree::new();
    let mut map = HashMap::new();

    let width = state.viewport.width as f32;
    let height = state.viewport.height as f32;
    let page = tree.new_leaf(Style {
        display: Display::Flex,
        flex_direction: FlexDirection::Column,
        align_items: Some(AlignItems::FlexStart),
        size: Size {
            width: Dimension::Length(width),
            height: Dimension::Length(height),
        },
        ..Default::default()
    })?;

    for root in state.nodes.roots() {
        let node = build(&mut tree, state, *root, &mut map)?;
        tree.add_child(page, node)?;
    }

    tree.compute_layout(
        page,
        Size {
            width: AvailableSpace::Definite(width),
            height: AvailableSpace::Definite(height),
        },
    )?;

    // Taffy locations are parent-relative; accumulate into page coordinates
    let mut rects = BTreeMap::new();
    let mut stack: Vec<(NodeId, f64, f64)> =
        state.nodes.roots().iter().map(|id| (*id, 0.0, 0.0)).collect();
    while let Some((id, origin_x, origin_y)) = stack.pop() {
        let Some(taffy_node) = map.get(&id) else {
            continue;
        };
        let layout = tree.layout(*taffy_node)?;
        let left = origin_x + layout.location.x as f64;
        let top = origin_y + layout.location.y as f64;
        rects.insert(
            id,
            Rect::new(top, left, layout.size.width as f64, layout.size.height as f64),
        );

        if let Some(node) = state.nodes.get(id) {
            stack.extend(node.children.iter().map(|child| (*child, left, top)));
        }
    }
    Ok(rects)
}

// =============================================================================
// RENDERER
// =============================================================================

impl Renderer for LayoutDocument {
    fn render(&self, element: &Element, parent: Option<NodeId>) -> Result<NodeId> {
        if let Some(parent) = parent {
            if !self.state.borrow().nodes.contains(parent) {
                return Err(Error::UnknownNode(parent));
            }
        }
        Ok(self.insert(element, parent, false))
    }

    fn mount_detached(&self, element: &Element) -> Result<NodeId> {
        Ok(self.insert(element, None, true))
    }

    fn remove(&self, node: NodeId) {
        let mut state = self.state.borrow_mut();
        if state.nodes.remove(node) {
            state.dirty = true;
        }
    }

    fn measure(&self, node: NodeId) -> Option<Rect> {
        if let Err(err) = self.ensure_layout() {
            warn!(%err, %node, "layout failed");
            return None;
        }
        let state = self.state.borrow();
        state.rects.get(&node).map(|rect| to_viewport(rect, &state.viewport))
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.state.borrow().nodes.parent(node)
    }

    fn apply_style(&self, node: NodeId, style: &PopupStyle) {
        let mut state = self.state.borrow_mut();
        if let Some(n) = state.nodes.get_mut(node) {
            n.data.style = Some(*style);
            state.dirty = true;
        }
    }

    fn viewport(&self) -> Option<Viewport> {
        Some(self.state.borrow().viewport)
    }

    fn node_at(&self, x: f64, y: f64) -> Option<NodeId> {
        if let Err(err) = self.ensure_layout() {
            warn!(%err, "layout failed");
            return None;
        }
        let state = self.state.borrow();
        state
            .rects
            .iter()
            .filter(|(_, rect)| to_viewport(rect, &state.viewport).contains(x, y))
            .map(|(id, _)| (state.nodes.depth(*id), *id))
            .max()
            .map(|(_, id)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Position;

    fn setup() -> Rc<LayoutDocument> {
        LayoutDocument::new(Viewport::new(80.0, 24.0))
    }

    #[test]
    fn test_roots_stack_in_column() {
        let doc = setup();
        let first = doc.render(&Element::new("button").text("Open"), None).unwrap();
        let second = doc.render(&Element::new("p").size(10.0, 3.0), None).unwrap();

        assert_eq!(doc.measure(first), Some(Rect::new(0.0, 0.0, 4.0, 1.0)));
        assert_eq!(doc.measure(second), Some(Rect::new(1.0, 0.0, 10.0, 3.0)));
    }

    #[test]
    fn test_children_are_offset_by_parent() {
        let doc = setup();
        doc.render(&Element::new("div").size(5.0, 2.0), None).unwrap();
        let parent = doc
            .render(
                &Element::new("div")
                    .child(Element::new("span").text("ab"))
                    .child(Element::new("span").text("cde")),
                None,
            )
            .unwrap();

        assert_eq!(doc.measure(parent), Some(Rect::new(2.0, 0.0, 3.0, 2.0)));
        let spans = doc.snapshot();
        let cde = spans.iter().find(|n| n.text.as_deref() == Some("cde")).unwrap();
        assert_eq!(cde.rect, Rect::new(3.0, 0.0, 3.0, 1.0));
        assert_eq!(cde.depth, 1);
    }

    #[test]
    fn test_detached_root_uses_applied_insets() {
        let doc = setup();
        let content = doc.mount_detached(&Element::new("div").text("tip")).unwrap();
        assert_eq!(doc.measure(content), Some(Rect::new(0.0, 0.0, 3.0, 1.0)));

        doc.apply_style(
            content,
            &PopupStyle {
                position: Position::Absolute,
                top: Some(Length::Px(5.0)),
                left: Some(Length::Px(10.0)),
                ..Default::default()
            },
        );
        assert_eq!(doc.measure(content), Some(Rect::new(5.0, 10.0, 3.0, 1.0)));

        doc.apply_style(
            content,
            &PopupStyle {
                position: Position::Absolute,
                bottom: Some(Length::Px(20.0)),
                right: Some(Length::Px(40.0)),
                ..Default::default()
            },
        );
        assert_eq!(doc.measure(content), Some(Rect::new(3.0, 37.0, 3.0, 1.0)));
    }

    #[test]
    fn test_detached_root_does_not_shift_flow() {
        let doc = setup();
        doc.mount_detached(&Element::new("div").size(20.0, 5.0)).unwrap();
        let flow = doc.render(&Element::new("p").text("x"), None).unwrap();
        assert_eq!(doc.measure(flow), Some(Rect::new(0.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn test_measure_is_viewport_relative() {
        let doc = setup();
        doc.render(&Element::new("div").size(1.0, 10.0), None).unwrap();
        let node = doc.render(&Element::new("p").text("hi"), None).unwrap();
        doc.scroll_to(0.0, 4.0);
        assert_eq!(doc.measure(node), Some(Rect::new(6.0, 0.0, 2.0, 1.0)));
        assert_eq!(doc.viewport().map(|v| v.scroll_y), Some(4.0));
    }

    #[test]
    fn test_remove_relayouts() {
        let doc = setup();
        let first = doc.render(&Element::new("p").text("one"), None).unwrap();
        let second = doc.render(&Element::new("p").text("two"), None).unwrap();
        assert_eq!(doc.measure(second).map(|r| r.top), Some(1.0));

        doc.remove(first);
        assert_eq!(doc.measure(first), None);
        assert_eq!(doc.measure(second).map(|r| r.top), Some(0.0));
        assert_eq!(doc.node_count(), 1);
    }

    #[test]
    fn test_node_at() {
        let doc = setup();
        let parent = doc
            .render(&Element::new("div").child(Element::new("b").text("xy")), None)
            .unwrap();
        let child = doc.snapshot()[1].id;

        assert_eq!(doc.node_at(1.0, 0.0), Some(child));
        assert_eq!(doc.parent(child), Some(parent));
        assert_eq!(doc.node_at(30.0, 10.0), None);
    }

    #[test]
    fn test_render_under_unknown_parent_fails() {
        let doc = setup();
        let err = doc.render(&Element::new("p"), Some(NodeId(42))).unwrap_err();
        assert_eq!(err, Error::UnknownNode(NodeId(42)));
    }
}
