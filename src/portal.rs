//! Portal - mounts floating content outside the trigger's subtree.
//!
//! The portal renders its trigger inline and, while open, a second
//! subtree (the content) into a detached container. DOM events on the
//! trigger, the content and the document drive the open/close state:
//!
//! ```text
//!  unmounted ──(click / focus / hover-intent / open())──▶ mounted
//!  mounted ──(click / blur / leave-intent / outside click / Esc / close())──▶ unmounted
//! ```
//!
//! Hover transitions are debounced: entering arms an open timer that a
//! leave cancels, and leaving arms a close timer that an enter cancels.
//!
//! Every listener the portal attaches goes through its own
//! [`Subscriptions`], so closing and [`teardown`](Portal::teardown) detach
//! exactly what the portal added and nothing else.
//!
//! # Example
//!
//! ```ignore
//! let portal = Portal::new(host, PortalConfig::click(), trigger, content, PortalCallbacks {
//!     on_open: Some(Rc::new(|_event: Option<&DomEvent>, _config: &PortalConfig| println!("opened"))),
//!     ..Default::default()
//! });
//! let trigger_node = portal.render()?;
//!
//! host.dispatch(&DomEvent::click(trigger_node));
//! assert!(portal.is_open());
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use spark_signals::{Signal, signal};
use tracing::{debug, warn};

use crate::dom::{
    DomEvent, Element, EventKind, EventTarget, HostContext, Listener, NodeId, Subscriptions,
    TimerId,
};
use crate::error::Result;

// =============================================================================
// CONFIG
// =============================================================================

/// Which events open and close the portal.
///
/// Field names follow the camelCase prop names when (de)serialized;
/// delays are given in milliseconds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortalConfig {
    pub open_on_trigger_click: bool,
    pub close_on_trigger_click: bool,
    pub close_on_document_click: bool,
    pub open_on_trigger_focus: bool,
    pub close_on_trigger_blur: bool,
    pub open_on_trigger_mouse_enter: bool,
    pub close_on_trigger_mouse_leave: bool,
    pub close_on_portal_mouse_leave: bool,
    pub close_on_escape: bool,
    #[serde(with = "millis")]
    pub mouse_enter_delay: Duration,
    #[serde(with = "millis")]
    pub mouse_leave_delay: Duration,
    pub default_open: bool,
}

impl PortalConfig {
    /// Click to toggle, click elsewhere to close.
    pub fn click() -> Self {
        Self {
            open_on_trigger_click: true,
            close_on_trigger_click: true,
            close_on_document_click: true,
            ..Default::default()
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// =============================================================================
// CALLBACKS
// =============================================================================

/// Lifecycle notification: the triggering event (if any) and the config.
pub type PortalCallback = Rc<dyn Fn(Option<&DomEvent>, &PortalConfig)>;

#[derive(Default, Clone)]
pub struct PortalCallbacks {
    pub on_open: Option<PortalCallback>,
    pub on_close: Option<PortalCallback>,
    pub on_mount: Option<PortalCallback>,
    pub on_unmount: Option<PortalCallback>,
    /// Called with the trigger's root node once it is rendered.
    pub trigger_ref: Option<Rc<dyn Fn(NodeId)>>,
    /// Consulted before every open; returning false keeps the portal shut.
    pub can_open: Option<Rc<dyn Fn() -> bool>>,
}

// =============================================================================
// PORTAL
// =============================================================================

struct PortalState {
    trigger_node: Option<NodeId>,
    content_node: Option<NodeId>,
    trigger_subs: Subscriptions,
    portal_subs: Subscriptions,
    enter_timer: Option<TimerId>,
    leave_timer: Option<TimerId>,
    /// Set while `on_close` runs; opens requested then wait for the unmount.
    closing: bool,
    deferred_open: Option<Option<DomEvent>>,
    torn_down: bool,
}

struct PortalInner {
    host: HostContext,
    config: PortalConfig,
    trigger: Element,
    content: Element,
    callbacks: PortalCallbacks,
    state: RefCell<PortalState>,
    open: Signal<bool>,
}

/// Handle to a portal. Clones share the same portal.
#[derive(Clone)]
pub struct Portal {
    inner: Rc<PortalInner>,
}

impl Portal {
    pub fn new(
        host: HostContext,
        config: PortalConfig,
        trigger: Element,
        content: Element,
        callbacks: PortalCallbacks,
    ) -> Self {
        let state = PortalState {
            trigger_node: None,
            content_node: None,
            trigger_subs: Subscriptions::new(host.events.clone()),
            portal_subs: Subscriptions::new(host.events.clone()),
            enter_timer: None,
            leave_timer: None,
            closing: false,
            deferred_open: None,
            torn_down: false,
        };

        Self {
            inner: Rc::new(PortalInner {
                host,
                config,
                trigger,
                content,
                callbacks,
                state: RefCell::new(state),
                open: signal(false),
            }),
        }
    }

    /// Render the trigger and wire its listeners. Returns the trigger node.
    ///
    /// Calling it again returns the existing node. Opens immediately when
    /// `default_open` is set.
    pub fn render(&self) -> Result<NodeId> {
        let inner = &self.inner;
        if let Some(node) = inner.state.borrow().trigger_node {
            return Ok(node);
        }

        let node = inner.host.renderer.render(&inner.trigger, None)?;
        {
            let weak = Rc::downgrade(inner);
            let target = EventTarget::Node(node);
            let mut state = inner.state.borrow_mut();
            state.trigger_node = Some(node);
            let subs = &mut state.trigger_subs;
            subs.add(target, EventKind::Click, listener(&weak, handle_trigger_click));
            subs.add(target, EventKind::Focus, listener(&weak, handle_trigger_focus));
            subs.add(target, EventKind::Blur, listener(&weak, handle_trigger_blur));
            subs.add(target, EventKind::MouseEnter, listener(&weak, handle_trigger_mouse_enter));
            subs.add(target, EventKind::MouseLeave, listener(&weak, handle_trigger_mouse_leave));
        }
        debug!(trigger = %node, "portal trigger rendered");

        if let Some(trigger_ref) = &inner.callbacks.trigger_ref {
            trigger_ref(node);
        }

        if inner.config.default_open {
            open_portal(inner, None)?;
        }
        Ok(node)
    }

    /// Open programmatically. A no-op while already open.
    pub fn open(&self, event: Option<&DomEvent>) -> Result<()> {
        open_portal(&self.inner, event)
    }

    /// Close programmatically. A no-op while already closed.
    pub fn close(&self, event: Option<&DomEvent>) {
        close_portal(&self.inner, event);
    }

    pub fn is_open(&self) -> bool {
        self.inner.state.borrow().content_node.is_some()
    }

    /// Reactive open flag.
    pub fn open_signal(&self) -> Signal<bool> {
        self.inner.open.clone()
    }

    pub fn trigger_node(&self) -> Option<NodeId> {
        self.inner.state.borrow().trigger_node
    }

    /// Root of the mounted content, while open.
    pub fn content_node(&self) -> Option<NodeId> {
        self.inner.state.borrow().content_node
    }

    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.state.borrow().torn_down
    }

    /// Number of listeners this portal currently holds in the registry.
    pub fn listener_count(&self) -> usize {
        let state = self.inner.state.borrow();
        state.trigger_subs.len() + state.portal_subs.len()
    }

    /// Remove the portal for good.
    ///
    /// Cancels pending hover timers, detaches every listener and removes
    /// both subtrees. Fires `on_unmount` if the content was mounted, but no
    /// further open/close notification.
    pub fn teardown(&self) {
        let inner = &self.inner;
        let (content, trigger) = {
            let mut state = inner.state.borrow_mut();
            if state.torn_down {
                return;
            }
            state.torn_down = true;
            cancel_timers(&inner.host, &mut state);
            state.trigger_subs.clear();
            state.portal_subs.clear();
            (state.content_node.take(), state.trigger_node.take())
        };

        if let Some(node) = content {
            inner.host.renderer.remove(node);
            inner.open.set(false);
            notify(inner, inner.callbacks.on_unmount.as_ref(), None);
        }
        if let Some(node) = trigger {
            inner.host.renderer.remove(node);
        }
        debug!("portal torn down");
    }
}

impl Drop for PortalInner {
    fn drop(&mut self) {
        // Subscriptions detach themselves; timers and nodes do not
        let state = self.state.get_mut();
        cancel_timers(&self.host, state);
        if let Some(node) = state.content_node.take() {
            self.host.renderer.remove(node);
        }
        if let Some(node) = state.trigger_node.take() {
            self.host.renderer.remove(node);
        }
    }
}

// =============================================================================
// TRANSITIONS
// =============================================================================

fn open_portal(inner: &Rc<PortalInner>, event: Option<&DomEvent>) -> Result<()> {
    {
        let mut state = inner.state.borrow_mut();
        if state.torn_down || state.content_node.is_some() {
            return Ok(());
        }
        if state.closing {
            state.deferred_open = Some(event.cloned());
            return Ok(());
        }
    }

    if let Some(can_open) = &inner.callbacks.can_open {
        if !can_open() {
            debug!("portal open vetoed");
            return Ok(());
        }
    }

    let node = inner.host.renderer.mount_detached(&inner.content)?;
    {
        let weak = Rc::downgrade(inner);
        let mut state = inner.state.borrow_mut();
        state.content_node = Some(node);

        let subs = &mut state.portal_subs;
        let target = EventTarget::Node(node);
        subs.add(target, EventKind::MouseEnter, listener(&weak, handle_portal_mouse_enter));
        subs.add(target, EventKind::MouseLeave, listener(&weak, handle_portal_mouse_leave));
        if inner.config.close_on_document_click {
            subs.add(EventTarget::Document, EventKind::Click, listener(&weak, handle_document_click));
        }
        if inner.config.close_on_escape {
            subs.add(EventTarget::Document, EventKind::KeyDown, listener(&weak, handle_escape));
        }
    }
    inner.open.set(true);
    debug!(content = %node, "portal opened");

    notify(inner, inner.callbacks.on_open.as_ref(), event);

    // on_open may already have closed us again
    if inner.state.borrow().content_node == Some(node) {
        notify(inner, inner.callbacks.on_mount.as_ref(), event);
    }
    Ok(())
}

fn close_portal(inner: &Rc<PortalInner>, event: Option<&DomEvent>) {
    let node = {
        let mut state = inner.state.borrow_mut();
        if state.torn_down {
            return;
        }
        let Some(node) = state.content_node.take() else {
            // A close after a deferred open wins
            state.deferred_open = None;
            return;
        };
        state.portal_subs.clear();
        state.closing = true;
        node
    };
    inner.open.set(false);
    debug!(content = %node, "portal closed");

    notify(inner, inner.callbacks.on_close.as_ref(), event);
    inner.host.renderer.remove(node);
    let deferred = {
        let mut state = inner.state.borrow_mut();
        state.closing = false;
        state.deferred_open.take()
    };
    notify(inner, inner.callbacks.on_unmount.as_ref(), event);

    // An open requested from on_close runs once the old mount is gone
    if let Some(event) = deferred {
        if let Err(err) = open_portal(inner, event.as_ref()) {
            warn!(%err, "failed to reopen portal");
        }
    }
}

/// Open from an event handler, where errors cannot propagate.
fn open_from_event(inner: &Rc<PortalInner>, event: &DomEvent) {
    if let Err(err) = open_portal(inner, Some(event)) {
        warn!(%err, "failed to open portal");
    }
}

fn notify(inner: &PortalInner, callback: Option<&PortalCallback>, event: Option<&DomEvent>) {
    if let Some(callback) = callback {
        callback(event, &inner.config);
    }
}

fn cancel_timers(host: &HostContext, state: &mut PortalState) {
    if let Some(id) = state.enter_timer.take() {
        host.timers.clear_timeout(id);
    }
    if let Some(id) = state.leave_timer.take() {
        host.timers.clear_timeout(id);
    }
}

// =============================================================================
// HOVER INTENT
// =============================================================================

fn arm_open(inner: &Rc<PortalInner>, event: &DomEvent, delay: Duration) {
    if delay.is_zero() {
        open_from_event(inner, event);
        return;
    }

    let weak = Rc::downgrade(inner);
    let event = event.clone();
    let id = inner.host.timers.set_timeout(delay, move || {
        if let Some(inner) = weak.upgrade() {
            inner.state.borrow_mut().enter_timer = None;
            open_from_event(&inner, &event);
        }
    });

    let previous = inner.state.borrow_mut().enter_timer.replace(id);
    if let Some(previous) = previous {
        inner.host.timers.clear_timeout(previous);
    }
}

fn arm_close(inner: &Rc<PortalInner>, event: &DomEvent, delay: Duration) {
    if delay.is_zero() {
        close_portal(inner, Some(event));
        return;
    }

    let weak = Rc::downgrade(inner);
    let event = event.clone();
    let id = inner.host.timers.set_timeout(delay, move || {
        if let Some(inner) = weak.upgrade() {
            inner.state.borrow_mut().leave_timer = None;
            close_portal(&inner, Some(&event));
        }
    });

    let previous = inner.state.borrow_mut().leave_timer.replace(id);
    if let Some(previous) = previous {
        inner.host.timers.clear_timeout(previous);
    }
}

fn cancel_enter(inner: &PortalInner) {
    let pending = inner.state.borrow_mut().enter_timer.take();
    if let Some(id) = pending {
        inner.host.timers.clear_timeout(id);
    }
}

fn cancel_leave(inner: &PortalInner) {
    let pending = inner.state.borrow_mut().leave_timer.take();
    if let Some(id) = pending {
        inner.host.timers.clear_timeout(id);
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

fn listener(weak: &Weak<PortalInner>, handler: fn(&Rc<PortalInner>, &DomEvent)) -> Listener {
    let weak = weak.clone();
    Rc::new(move |event: &DomEvent| {
        if let Some(inner) = weak.upgrade() {
            handler(&inner, event);
        }
    })
}

fn handle_trigger_click(inner: &Rc<PortalInner>, event: &DomEvent) {
    let is_open = inner.state.borrow().content_node.is_some();
    if is_open && inner.config.close_on_trigger_click {
        close_portal(inner, Some(event));
    } else if !is_open && inner.config.open_on_trigger_click {
        open_from_event(inner, event);
    }
}

fn handle_trigger_focus(inner: &Rc<PortalInner>, event: &DomEvent) {
    if inner.config.open_on_trigger_focus {
        open_from_event(inner, event);
    }
}

fn handle_trigger_blur(inner: &Rc<PortalInner>, event: &DomEvent) {
    if !inner.config.close_on_trigger_blur {
        return;
    }
    // Focus moving into the content keeps the portal open
    let content = inner.state.borrow().content_node;
    if let (Some(content), Some(related)) = (content, event.related) {
        if inner.host.renderer.contains(content, related) {
            return;
        }
    }
    close_portal(inner, Some(event));
}

fn handle_trigger_mouse_enter(inner: &Rc<PortalInner>, event: &DomEvent) {
    cancel_leave(inner);
    if inner.config.open_on_trigger_mouse_enter {
        arm_open(inner, event, inner.config.mouse_enter_delay);
    }
}

fn handle_trigger_mouse_leave(inner: &Rc<PortalInner>, event: &DomEvent) {
    cancel_enter(inner);
    if inner.config.close_on_trigger_mouse_leave {
        arm_close(inner, event, inner.config.mouse_leave_delay);
    }
}

fn handle_portal_mouse_enter(inner: &Rc<PortalInner>, _event: &DomEvent) {
    cancel_leave(inner);
}

fn handle_portal_mouse_leave(inner: &Rc<PortalInner>, event: &DomEvent) {
    if inner.config.close_on_portal_mouse_leave {
        arm_close(inner, event, inner.config.mouse_leave_delay);
    }
}

fn handle_document_click(inner: &Rc<PortalInner>, event: &DomEvent) {
    let (content, trigger) = {
        let state = inner.state.borrow();
        (state.content_node, state.trigger_node)
    };
    let Some(content) = content else {
        return;
    };

    if let Some(clicked) = event.target.node() {
        let renderer = &inner.host.renderer;
        let inside_trigger = trigger.is_some_and(|t| renderer.contains(t, clicked));
        if renderer.contains(content, clicked) || inside_trigger {
            return;
        }
    }
    close_portal(inner, Some(event));
}

fn handle_escape(inner: &Rc<PortalInner>, event: &DomEvent) {
    if event.key.as_deref() == Some("Escape") {
        close_portal(inner, Some(event));
    }
}
