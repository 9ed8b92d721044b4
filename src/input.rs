//! Input routing - crossterm events to DOM events.
//!
//! A [`PointerRouter`] turns raw terminal input into the [`DomEvent`]s that
//! portals and popups listen for:
//!
//! - pointer moves → `MouseLeave`/`MouseEnter` for every node leaving or
//!   entering the hover path
//! - press + release on the same node with the same button → `Click`
//!   (a document click when nothing was hit)
//! - wheel → window `Scroll`
//! - keys → document `KeyDown` (`Esc` becomes `"Escape"`)
//! - [`focus`](PointerRouter::focus) → `Blur` on the old node, then `Focus`
//!
//! # Example
//!
//! ```ignore
//! let router = PointerRouter::new(host.clone());
//! loop {
//!     if event::poll(Duration::from_millis(16))? {
//!         router.handle(&event::read()?);
//!     }
//!     host.timers.advance(tick.elapsed());
//! }
//! ```

use std::cell::{Cell, RefCell};

use crossterm::event::{
    Event as CrosstermEvent, KeyCode, KeyEvent as CrosstermKeyEvent, KeyEventKind,
    MouseButton, MouseEvent as CrosstermMouseEvent, MouseEventKind,
};
use tracing::trace;

use crate::dom::{DomEvent, HostContext, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Press {
    node: Option<NodeId>,
    button: MouseButton,
}

pub struct PointerRouter {
    host: HostContext,
    /// Hover path, innermost first.
    hovered: RefCell<Vec<NodeId>>,
    pressed: Cell<Option<Press>>,
    focused: Cell<Option<NodeId>>,
}

impl PointerRouter {
    pub fn new(host: HostContext) -> Self {
        Self {
            host,
            hovered: RefCell::new(Vec::new()),
            pressed: Cell::new(None),
            focused: Cell::new(None),
        }
    }

    /// Innermost hovered node.
    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered.borrow().first().copied()
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused.get()
    }

    /// Route one terminal event. Returns the number of listeners invoked.
    pub fn handle(&self, event: &CrosstermEvent) -> usize {
        match event {
            CrosstermEvent::Mouse(mouse) => self.handle_mouse(mouse),
            CrosstermEvent::Key(key) => self.handle_key(key),
            _ => 0,
        }
    }

    pub fn handle_mouse(&self, event: &CrosstermMouseEvent) -> usize {
        let x = event.column as f64;
        let y = event.row as f64;
        let hit = self.host.renderer.node_at(x, y);

        let mut delivered = self.update_hover(hit);

        match event.kind {
            MouseEventKind::Down(button) => {
                self.pressed.set(Some(Press { node: hit, button }));
            }
            MouseEventKind::Up(button) => {
                let press = self.pressed.take();
                if press == Some(Press { node: hit, button }) {
                    let click = match hit {
                        Some(node) => DomEvent::click(node),
                        None => DomEvent::document_click(),
                    };
                    trace!(?hit, "click");
                    delivered += self.host.dispatch(&click);
                }
            }
            MouseEventKind::ScrollUp
            | MouseEventKind::ScrollDown
            | MouseEventKind::ScrollLeft
            | MouseEventKind::ScrollRight => {
                delivered += self.host.dispatch(&DomEvent::scroll());
            }
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {}
        }

        delivered
    }

    pub fn handle_key(&self, event: &CrosstermKeyEvent) -> usize {
        if event.kind == KeyEventKind::Release {
            return 0;
        }
        match key_name(event.code) {
            Some(name) => self.host.dispatch(&DomEvent::key_down(name)),
            None => 0,
        }
    }

    /// Move focus, firing `Blur` on the previous node then `Focus` on the new one.
    pub fn focus(&self, node: Option<NodeId>) -> usize {
        let previous = self.focused.get();
        if previous == node {
            return 0;
        }
        self.focused.set(node);

        let mut delivered = 0;
        if let Some(previous) = previous {
            delivered += self.host.dispatch(&DomEvent::blur(previous, node));
        }
        if let Some(node) = node {
            delivered += self.host.dispatch(&DomEvent::focus(node));
        }
        delivered
    }

    /// Forget nodes that were removed from the host.
    pub fn forget(&self, node: NodeId) {
        self.hovered.borrow_mut().retain(|n| *n != node);
        if self.focused.get() == Some(node) {
            self.focused.set(None);
        }
        if self.pressed.get().is_some_and(|press| press.node == Some(node)) {
            self.pressed.set(None);
        }
    }

    fn update_hover(&self, hit: Option<NodeId>) -> usize {
        let path = hit.map(|node| self.host.ancestry(node)).unwrap_or_default();
        let previous = self.hovered.replace(path.clone());
        if previous == path {
            return 0;
        }

        let mut delivered = 0;
        // Leave innermost first, enter outermost first
        for node in previous.iter().filter(|n| !path.contains(n)) {
            delivered += self.host.dispatch(&DomEvent::mouse_leave(*node));
        }
        for node in path.iter().rev().filter(|n| !previous.contains(n)) {
            delivered += self.host.dispatch(&DomEvent::mouse_enter(*node));
        }
        delivered
    }
}

/// DOM key name for a crossterm key code.
pub fn key_name(code: KeyCode) -> Option<String> {
    let name = match code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Esc => "Escape".to_string(),
        KeyCode::Up => "ArrowUp".to_string(),
        KeyCode::Down => "ArrowDown".to_string(),
        KeyCode::Left => "ArrowLeft".to_string(),
        KeyCode::Right => "ArrowRight".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crossterm::event::KeyModifiers;

    use crate::dom::{Element, EventKind, EventTarget, MemoryDocument, Renderer};
    use crate::geometry::{Rect, Viewport};

    fn setup() -> (Rc<MemoryDocument>, HostContext, PointerRouter) {
        let doc = MemoryDocument::new(Viewport::new(80.0, 24.0));
        let host = HostContext::new(doc.clone());
        let router = PointerRouter::new(host.clone());
        (doc, host, router)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> CrosstermEvent {
        CrosstermEvent::Mouse(CrosstermMouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::empty(),
        })
    }

    fn record(host: &HostContext, target: EventTarget, kind: EventKind) -> Rc<RefCell<Vec<DomEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        host.events
            .add(target, kind, Rc::new(move |event: &DomEvent| l.borrow_mut().push(event.clone())));
        log
    }

    #[test]
    fn test_hover_enter_and_leave() {
        let (doc, host, router) = setup();
        let outer = doc.render(&Element::new("div").child(Element::new("span")), None).unwrap();
        let inner = doc.children(outer)[0];
        doc.set_rect(outer, Rect::new(0.0, 0.0, 10.0, 5.0)).unwrap();
        doc.set_rect(inner, Rect::new(1.0, 1.0, 3.0, 1.0)).unwrap();

        let enters = record(&host, EventTarget::Node(outer), EventKind::MouseEnter);
        let leaves = record(&host, EventTarget::Node(outer), EventKind::MouseLeave);
        let inner_enters = record(&host, EventTarget::Node(inner), EventKind::MouseEnter);

        router.handle(&mouse(MouseEventKind::Moved, 2, 1));
        assert_eq!(router.hovered(), Some(inner));
        assert_eq!(enters.borrow().len(), 1);
        assert_eq!(inner_enters.borrow().len(), 1);

        // Moving within the outer box does not leave it
        router.handle(&mouse(MouseEventKind::Moved, 8, 3));
        assert_eq!(router.hovered(), Some(outer));
        assert_eq!(leaves.borrow().len(), 0);

        router.handle(&mouse(MouseEventKind::Moved, 40, 20));
        assert_eq!(router.hovered(), None);
        assert_eq!(leaves.borrow().len(), 1);
        assert_eq!(enters.borrow().len(), 1);
    }

    #[test]
    fn test_click_requires_same_node_and_button() {
        let (doc, host, router) = setup();
        let a = doc.render(&Element::new("button").size(4.0, 1.0), None).unwrap();
        let b = doc.render(&Element::new("button"), None).unwrap();
        doc.set_rect(b, Rect::new(2.0, 0.0, 4.0, 1.0)).unwrap();

        let clicks = record(&host, EventTarget::Document, EventKind::Click);

        router.handle(&mouse(MouseEventKind::Down(MouseButton::Left), 1, 0));
        router.handle(&mouse(MouseEventKind::Up(MouseButton::Left), 1, 2));
        assert!(clicks.borrow().is_empty());

        router.handle(&mouse(MouseEventKind::Down(MouseButton::Left), 1, 0));
        router.handle(&mouse(MouseEventKind::Up(MouseButton::Right), 1, 0));
        assert!(clicks.borrow().is_empty());

        router.handle(&mouse(MouseEventKind::Down(MouseButton::Left), 1, 0));
        router.handle(&mouse(MouseEventKind::Up(MouseButton::Left), 2, 0));
        assert_eq!(clicks.borrow().len(), 1);
        assert_eq!(clicks.borrow()[0].target, EventTarget::Node(a));
    }

    #[test]
    fn test_click_on_empty_space_is_document_click() {
        let (_doc, host, router) = setup();
        let clicks = record(&host, EventTarget::Document, EventKind::Click);

        router.handle(&mouse(MouseEventKind::Down(MouseButton::Left), 50, 10));
        router.handle(&mouse(MouseEventKind::Up(MouseButton::Left), 50, 10));

        assert_eq!(clicks.borrow().len(), 1);
        assert_eq!(clicks.borrow()[0].target, EventTarget::Document);
    }

    #[test]
    fn test_wheel_scrolls_window() {
        let (_doc, host, router) = setup();
        let scrolls = record(&host, EventTarget::Window, EventKind::Scroll);

        router.handle(&mouse(MouseEventKind::ScrollDown, 0, 0));
        router.handle(&mouse(MouseEventKind::ScrollUp, 0, 0));
        assert_eq!(scrolls.borrow().len(), 2);
    }

    #[test]
    fn test_escape_key() {
        let (_doc, host, router) = setup();
        let keys = record(&host, EventTarget::Document, EventKind::KeyDown);

        router.handle(&CrosstermEvent::Key(CrosstermKeyEvent::new(KeyCode::Esc, KeyModifiers::empty())));
        router.handle(&CrosstermEvent::Key(CrosstermKeyEvent::new(KeyCode::Null, KeyModifiers::empty())));

        assert_eq!(keys.borrow().len(), 1);
        assert_eq!(keys.borrow()[0].key.as_deref(), Some("Escape"));
    }

    #[test]
    fn test_focus_moves_with_related_target() {
        let (doc, host, router) = setup();
        let a = doc.render(&Element::new("input"), None).unwrap();
        let b = doc.render(&Element::new("input"), None).unwrap();
        let blurs = record(&host, EventTarget::Node(a), EventKind::Blur);
        let focuses = record(&host, EventTarget::Node(b), EventKind::Focus);

        router.focus(Some(a));
        assert_eq!(router.focus(Some(a)), 0);
        router.focus(Some(b));

        assert_eq!(blurs.borrow().len(), 1);
        assert_eq!(blurs.borrow()[0].related, Some(b));
        assert_eq!(focuses.borrow().len(), 1);
        assert_eq!(router.focused(), Some(b));
    }

    #[test]
    fn test_forget_drops_removed_node() {
        let (doc, _host, router) = setup();
        let node = doc.render(&Element::new("div").size(3.0, 3.0), None).unwrap();
        router.handle(&mouse(MouseEventKind::Moved, 1, 1));
        router.focus(Some(node));

        doc.remove(node);
        router.forget(node);
        assert_eq!(router.hovered(), None);
        assert_eq!(router.focused(), None);
    }

    #[test]
    fn test_key_names() {
        assert_eq!(key_name(KeyCode::Char('q')).as_deref(), Some("q"));
        assert_eq!(key_name(KeyCode::F(5)).as_deref(), Some("F5"));
        assert_eq!(key_name(KeyCode::Home), None);
    }
}
