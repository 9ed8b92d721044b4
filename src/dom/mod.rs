//! DOM boundary - nodes, events and the host primitives the core consumes.
//!
//! The positioning/portal core never touches a real document. Everything
//! it needs from the hosting UI goes through three injectable services,
//! bundled in [`HostContext`]:
//!
//! - [`Renderer`] - render/mount/remove subtrees, measure nodes, read the viewport
//! - [`EventRegistry`] - subscribe/unsubscribe listeners per target + event kind
//! - [`Timers`] - cancellable timeouts over a virtual clock
//!
//! # Example
//!
//! ```ignore
//! use spark_popup::dom::{DomEvent, HostContext, MemoryDocument};
//!
//! let doc = MemoryDocument::new(Viewport::new(1024.0, 768.0));
//! let host = HostContext::new(doc.clone());
//!
//! host.dispatch(&DomEvent::click(node));
//! host.timers.advance(Duration::from_millis(50));
//! ```

mod document;
mod registry;
mod timers;
mod tree;

pub use document::MemoryDocument;
pub use registry::{EventRegistry, Listener, ListenerId, Subscriptions};
pub use timers::{TimerId, Timers};
pub(crate) use tree::{NodeTable, TreeNode};

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::geometry::{Rect, Viewport};
use crate::style::PopupStyle;

// =============================================================================
// NODES & TARGETS
// =============================================================================

/// Handle to a node rendered by a [`Renderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a listener is attached / where an event originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Document,
    Window,
    Node(NodeId),
}

impl EventTarget {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            EventTarget::Node(id) => Some(*id),
            _ => None,
        }
    }
}

// =============================================================================
// EVENTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Focus,
    Blur,
    MouseEnter,
    MouseLeave,
    Scroll,
    KeyDown,
}

impl EventKind {
    /// Kinds that propagate from the target through its ancestors to the document.
    pub fn bubbles(&self) -> bool {
        matches!(self, EventKind::Click | EventKind::KeyDown)
    }
}

/// A DOM-style event.
///
/// `target` is where the event originated and stays fixed while it
/// bubbles. `related` is the other node of a focus transition (the node
/// receiving focus for a `Blur`).
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    pub kind: EventKind,
    pub target: EventTarget,
    pub related: Option<NodeId>,
    pub key: Option<String>,
}

impl DomEvent {
    pub fn new(kind: EventKind, target: EventTarget) -> Self {
        Self {
            kind,
            target,
            related: None,
            key: None,
        }
    }

    pub fn click(node: NodeId) -> Self {
        Self::new(EventKind::Click, EventTarget::Node(node))
    }

    /// A click that landed on no node at all.
    pub fn document_click() -> Self {
        Self::new(EventKind::Click, EventTarget::Document)
    }

    pub fn focus(node: NodeId) -> Self {
        Self::new(EventKind::Focus, EventTarget::Node(node))
    }

    pub fn blur(node: NodeId, related: Option<NodeId>) -> Self {
        Self {
            related,
            ..Self::new(EventKind::Blur, EventTarget::Node(node))
        }
    }

    pub fn mouse_enter(node: NodeId) -> Self {
        Self::new(EventKind::MouseEnter, EventTarget::Node(node))
    }

    pub fn mouse_leave(node: NodeId) -> Self {
        Self::new(EventKind::MouseLeave, EventTarget::Node(node))
    }

    pub fn scroll() -> Self {
        Self::new(EventKind::Scroll, EventTarget::Window)
    }

    pub fn key_down(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::new(EventKind::KeyDown, EventTarget::Document)
        }
    }
}

// =============================================================================
// ELEMENTS
// =============================================================================

/// Pass-through attributes that the core does not interpret.
pub type Attributes = BTreeMap<String, String>;

/// Declarative description of a subtree to render.
///
/// `width`/`height` are size hints for hosts that measure from layout.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub text: Option<String>,
    pub attributes: Attributes,
    pub children: Vec<Element>,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attrs(mut self, attributes: &Attributes) -> Self {
        self.attributes
            .extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

// =============================================================================
// RENDERER
// =============================================================================

/// Render and measure primitives supplied by the hosting UI.
pub trait Renderer {
    /// Render `element` inline, under `parent` or at the document root.
    fn render(&self, element: &Element, parent: Option<NodeId>) -> Result<NodeId>;

    /// Render `element` into a fresh container detached from any parent.
    fn mount_detached(&self, element: &Element) -> Result<NodeId>;

    /// Remove a subtree. Removing an unknown node is a no-op.
    fn remove(&self, node: NodeId);

    /// Viewport-relative bounding box, `None` if the node is not rendered.
    fn measure(&self, node: NodeId) -> Option<Rect>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Inclusive: a node contains itself.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn apply_style(&self, node: NodeId, style: &PopupStyle);

    /// `None` outside a browser-like environment (server-side rendering).
    fn viewport(&self) -> Option<Viewport>;

    /// Deepest node whose box contains the point.
    fn node_at(&self, x: f64, y: f64) -> Option<NodeId>;
}

// =============================================================================
// HOST CONTEXT
// =============================================================================

/// The injected services a portal or popup runs against.
#[derive(Clone)]
pub struct HostContext {
    pub renderer: Rc<dyn Renderer>,
    pub events: Rc<EventRegistry>,
    pub timers: Rc<Timers>,
}

impl HostContext {
    pub fn new(renderer: Rc<dyn Renderer>) -> Self {
        Self {
            renderer,
            events: Rc::new(EventRegistry::new()),
            timers: Rc::new(Timers::new()),
        }
    }

    /// Dispatch an event to its target.
    ///
    /// Bubbling kinds continue through every ancestor of a node target and
    /// finish at the document. Returns the number of listeners invoked.
    pub fn dispatch(&self, event: &DomEvent) -> usize {
        let mut delivered = self.events.deliver(event.target, event);

        if event.kind.bubbles() {
            if let EventTarget::Node(node) = event.target {
                let mut current = self.renderer.parent(node);
                while let Some(ancestor) = current {
                    delivered += self.events.deliver(EventTarget::Node(ancestor), event);
                    current = self.renderer.parent(ancestor);
                }
                delivered += self.events.deliver(EventTarget::Document, event);
            }
        }

        delivered
    }

    /// Chain of nodes from `node` up to its root, innermost first.
    pub fn ancestry(&self, node: NodeId) -> Vec<NodeId> {
        let mut path = vec![node];
        let mut current = self.renderer.parent(node);
        while let Some(id) = current {
            path.push(id);
            current = self.renderer.parent(id);
        }
        path
    }
}
