//! Popup - a trigger plus floating content positioned next to it.
//!
//! The popup delegates mounting to a [`Portal`] and keeps the content's
//! position in sync:
//!
//! - trigger rendered → remember its box
//! - content mounted → measure trigger + content, compute and apply the style
//! - [`reposition`](Popup::reposition) → measure again and recompute
//!
//! Nothing else triggers a recompute; window resizes and page scrolls do
//! not re-measure.
//!
//! With `hide_on_scroll`, a window scroll while the content is mounted
//! closes the popup at once and holds it shut for
//! [`SCROLL_RESTORE_DELAY`] before it may open again.
//!
//! All state lives in one `PopupState` behind a single `update` entry
//! point fed by the portal's callbacks, the scroll listener and the
//! restore timer.
//!
//! # Example
//!
//! ```ignore
//! let popup = Popup::new(
//!     host.clone(),
//!     PopupProps::new(Element::new("button").text("add"))
//!         .content(Element::new("span").text("Add users to your feed"))
//!         .position(Placement::BottomCenter)
//!         .on(Interaction::CLICK),
//! )?;
//!
//! let visible = popup.visibility_signal();
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use spark_signals::{Signal, signal};
use tracing::debug;

use crate::dom::{
    Attributes, DomEvent, Element, EventKind, EventTarget, HostContext, NodeId, Subscriptions,
    TimerId,
};
use crate::error::Result;
use crate::geometry::{Offset, Rect};
use crate::interaction::Interaction;
use crate::placement::Placement;
use crate::portal::{Portal, PortalCallback, PortalCallbacks, PortalConfig};
use crate::position::{POPUP_GAP, PositionInput, compute_popup_style, is_style_in_viewport};
use crate::style::PopupStyle;

/// How long a popup dismissed by scrolling stays shut.
pub const SCROLL_RESTORE_DELAY: Duration = Duration::from_millis(50);

/// Class carried by the content wrapper.
pub const CONTENT_CLASS: &str = "ui-popup__content";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Closed,
    Open,
    /// Dismissed by a window scroll; cannot reopen until the restore delay passes.
    ForcedClosedByScroll,
}

/// Plain-data popup options.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PopupOptions {
    pub position: Placement,
    pub horizontal_offset: f64,
    pub vertical_offset: f64,
    pub on: Interaction,
    /// Keep the popup open while the pointer is over its content.
    pub hoverable: bool,
    pub hide_on_scroll: bool,
    /// Drop the gap between trigger and content for side placements.
    pub basic: bool,
    pub close_on_escape: bool,
    /// Open as soon as the trigger renders.
    pub default_open: bool,
}

impl PopupOptions {
    pub fn offset(&self) -> Offset {
        Offset::new(self.horizontal_offset, self.vertical_offset)
    }

    pub fn gap(&self) -> f64 {
        if self.basic { 0.0 } else { POPUP_GAP }
    }

    /// Portal wiring for these options.
    pub fn portal_config(&self) -> PortalConfig {
        PortalConfig {
            close_on_escape: self.close_on_escape,
            default_open: self.default_open,
            ..self.on.portal_config(self.hoverable)
        }
    }
}

/// Everything a popup is built from.
///
/// `children` take precedence over the `content` shorthand.
#[derive(Clone)]
pub struct PopupProps {
    pub trigger: Element,
    pub content: Option<Element>,
    pub children: Vec<Element>,
    pub options: PopupOptions,
    /// Pass-through attributes for the content wrapper.
    pub attributes: Attributes,
    pub on_open: Option<PortalCallback>,
    pub on_close: Option<PortalCallback>,
    pub on_mount: Option<PortalCallback>,
    pub on_unmount: Option<PortalCallback>,
}

impl PopupProps {
    pub fn new(trigger: Element) -> Self {
        Self {
            trigger,
            content: None,
            children: Vec::new(),
            options: PopupOptions::default(),
            attributes: Attributes::new(),
            on_open: None,
            on_close: None,
            on_mount: None,
            on_unmount: None,
        }
    }

    pub fn content(mut self, content: Element) -> Self {
        self.content = Some(content);
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn options(mut self, options: PopupOptions) -> Self {
        self.options = options;
        self
    }

    pub fn position(mut self, position: Placement) -> Self {
        self.options.position = position;
        self
    }

    pub fn offset(mut self, horizontal: f64, vertical: f64) -> Self {
        self.options.horizontal_offset = horizontal;
        self.options.vertical_offset = vertical;
        self
    }

    pub fn on(mut self, on: Interaction) -> Self {
        self.options.on = on;
        self
    }

    pub fn hoverable(mut self, hoverable: bool) -> Self {
        self.options.hoverable = hoverable;
        self
    }

    pub fn hide_on_scroll(mut self, hide_on_scroll: bool) -> Self {
        self.options.hide_on_scroll = hide_on_scroll;
        self
    }

    pub fn basic(mut self, basic: bool) -> Self {
        self.options.basic = basic;
        self
    }

    pub fn close_on_escape(mut self, close_on_escape: bool) -> Self {
        self.options.close_on_escape = close_on_escape;
        self
    }

    pub fn default_open(mut self, default_open: bool) -> Self {
        self.options.default_open = default_open;
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn on_open(mut self, callback: PortalCallback) -> Self {
        self.on_open = Some(callback);
        self
    }

    pub fn on_close(mut self, callback: PortalCallback) -> Self {
        self.on_close = Some(callback);
        self
    }

    pub fn on_mount(mut self, callback: PortalCallback) -> Self {
        self.on_mount = Some(callback);
        self
    }

    pub fn on_unmount(mut self, callback: PortalCallback) -> Self {
        self.on_unmount = Some(callback);
        self
    }

    /// The wrapper mounted by the portal around the popup body.
    pub fn content_element(&self) -> Element {
        let body: Vec<Element> = if self.children.is_empty() {
            self.content.iter().cloned().collect()
        } else {
            self.children.clone()
        };

        Element::new("div")
            .attrs(&self.attributes)
            .attr("class", CONTENT_CLASS)
            .children(body)
    }
}

// =============================================================================
// STATE
// =============================================================================

struct PopupState {
    visibility: Visibility,
    trigger_rect: Option<Rect>,
    content_rect: Option<Rect>,
    style: PopupStyle,
    restore_timer: Option<TimerId>,
    alive: bool,
}

enum PopupMsg<'a> {
    TriggerRendered(NodeId),
    Opened(Option<&'a DomEvent>),
    Mounted(Option<&'a DomEvent>),
    Closed(Option<&'a DomEvent>),
    Unmounted(Option<&'a DomEvent>),
    Scrolled(&'a DomEvent),
    ScrollRestored,
    Reposition,
}

struct UserCallbacks {
    on_open: Option<PortalCallback>,
    on_close: Option<PortalCallback>,
    on_mount: Option<PortalCallback>,
    on_unmount: Option<PortalCallback>,
}

struct PopupInner {
    host: HostContext,
    options: PopupOptions,
    callbacks: UserCallbacks,
    portal: Portal,
    state: RefCell<PopupState>,
    scroll_subs: RefCell<Subscriptions>,
    visibility: Signal<Visibility>,
    style: Signal<PopupStyle>,
}

pub struct Popup {
    inner: Rc<PopupInner>,
}

impl Popup {
    /// Build the popup and render its trigger.
    pub fn new(host: HostContext, props: PopupProps) -> Result<Self> {
        let config = props.options.portal_config();
        let content = props.content_element();

        let inner = Rc::new_cyclic(|weak: &Weak<PopupInner>| {
            let callbacks = PortalCallbacks {
                on_open: Some(forward(weak, |event| PopupMsg::Opened(event))),
                on_close: Some(forward(weak, |event| PopupMsg::Closed(event))),
                on_mount: Some(forward(weak, |event| PopupMsg::Mounted(event))),
                on_unmount: Some(forward(weak, |event| PopupMsg::Unmounted(event))),
                trigger_ref: Some(trigger_ref(weak)),
                can_open: Some(can_open(weak)),
            };

            PopupInner {
                portal: Portal::new(host.clone(), config, props.trigger.clone(), content, callbacks),
                scroll_subs: RefCell::new(Subscriptions::new(host.events.clone())),
                host,
                options: props.options.clone(),
                callbacks: UserCallbacks {
                    on_open: props.on_open.clone(),
                    on_close: props.on_close.clone(),
                    on_mount: props.on_mount.clone(),
                    on_unmount: props.on_unmount.clone(),
                },
                state: RefCell::new(PopupState {
                    visibility: Visibility::Closed,
                    trigger_rect: None,
                    content_rect: None,
                    style: PopupStyle::default(),
                    restore_timer: None,
                    alive: true,
                }),
                visibility: signal(Visibility::Closed),
                style: signal(PopupStyle::default()),
            }
        });

        inner.portal.render()?;
        Ok(Self { inner })
    }

    pub fn options(&self) -> &PopupOptions {
        &self.inner.options
    }

    pub fn portal(&self) -> &Portal {
        &self.inner.portal
    }

    pub fn trigger_node(&self) -> Option<NodeId> {
        self.inner.portal.trigger_node()
    }

    pub fn content_node(&self) -> Option<NodeId> {
        self.inner.portal.content_node()
    }

    pub fn visibility(&self) -> Visibility {
        self.inner.state.borrow().visibility
    }

    pub fn is_open(&self) -> bool {
        self.visibility() == Visibility::Open
    }

    pub fn visibility_signal(&self) -> Signal<Visibility> {
        self.inner.visibility.clone()
    }

    /// Last computed style (position-only until the content is measured).
    pub fn style(&self) -> PopupStyle {
        self.inner.state.borrow().style
    }

    pub fn style_signal(&self) -> Signal<PopupStyle> {
        self.inner.style.clone()
    }

    /// Last measured trigger box.
    pub fn trigger_rect(&self) -> Option<Rect> {
        self.inner.state.borrow().trigger_rect
    }

    /// Last measured content box.
    pub fn content_rect(&self) -> Option<Rect> {
        self.inner.state.borrow().content_rect
    }

    pub fn open(&self) -> Result<()> {
        self.inner.portal.open(None)
    }

    pub fn close(&self) {
        self.inner.portal.close(None);
    }

    /// Measure trigger and content again and recompute the style.
    pub fn reposition(&self) {
        update(&self.inner, PopupMsg::Reposition);
    }

    /// Whether the current style keeps the content fully on screen.
    ///
    /// `None` until the content has been measured, or without a viewport.
    pub fn fits_viewport(&self) -> Option<bool> {
        let viewport = self.inner.host.renderer.viewport()?;
        let state = self.inner.state.borrow();
        let content = state.content_rect?;
        if state.style.is_unpositioned() {
            return None;
        }
        Some(is_style_in_viewport(&state.style, &content, &viewport))
    }

    /// Remove the popup, its trigger and any mounted content.
    ///
    /// Pending timers are cancelled; no open/close notification follows.
    pub fn teardown(&self) {
        let restore = {
            let mut state = self.inner.state.borrow_mut();
            state.alive = false;
            state.restore_timer.take()
        };
        if let Some(id) = restore {
            self.inner.host.timers.clear_timeout(id);
        }
        self.inner.scroll_subs.borrow_mut().clear();
        self.inner.portal.teardown();
        set_visibility(&self.inner, Visibility::Closed);
    }
}

impl Drop for PopupInner {
    fn drop(&mut self) {
        if let Some(id) = self.state.get_mut().restore_timer.take() {
            self.host.timers.clear_timeout(id);
        }
        // Outstanding signal handles outlive the content
        set_visibility(self, Visibility::Closed);
    }
}

// =============================================================================
// PORTAL WIRING
// =============================================================================

fn forward(weak: &Weak<PopupInner>, msg: fn(Option<&DomEvent>) -> PopupMsg<'_>) -> PortalCallback {
    let weak = weak.clone();
    Rc::new(move |event: Option<&DomEvent>, _config: &PortalConfig| {
        if let Some(inner) = weak.upgrade() {
            update(&inner, msg(event));
        }
    })
}

fn trigger_ref(weak: &Weak<PopupInner>) -> Rc<dyn Fn(NodeId)> {
    let weak = weak.clone();
    Rc::new(move |node: NodeId| {
        if let Some(inner) = weak.upgrade() {
            update(&inner, PopupMsg::TriggerRendered(node));
        }
    })
}

fn can_open(weak: &Weak<PopupInner>) -> Rc<dyn Fn() -> bool> {
    let weak = weak.clone();
    Rc::new(move || {
        weak.upgrade().is_some_and(|inner| {
            let state = inner.state.borrow();
            state.alive && state.visibility != Visibility::ForcedClosedByScroll
        })
    })
}

// =============================================================================
// UPDATE
// =============================================================================

fn update(inner: &Rc<PopupInner>, msg: PopupMsg<'_>) {
    match msg {
        PopupMsg::TriggerRendered(node) => {
            let rect = inner.host.renderer.measure(node);
            inner.state.borrow_mut().trigger_rect = rect;
        }

        PopupMsg::Opened(event) => {
            set_visibility(inner, Visibility::Open);
            notify(inner, inner.callbacks.on_open.as_ref(), event);
        }

        PopupMsg::Mounted(event) => {
            recompute(inner);
            if inner.options.hide_on_scroll {
                subscribe_scroll(inner);
            }
            notify(inner, inner.callbacks.on_mount.as_ref(), event);
        }

        PopupMsg::Closed(event) => {
            // A scroll dismissal keeps its own state until restored
            if inner.state.borrow().visibility == Visibility::Open {
                set_visibility(inner, Visibility::Closed);
            }
            notify(inner, inner.callbacks.on_close.as_ref(), event);
        }

        PopupMsg::Unmounted(event) => {
            inner.scroll_subs.borrow_mut().clear();
            inner.state.borrow_mut().content_rect = None;
            notify(inner, inner.callbacks.on_unmount.as_ref(), event);
        }

        PopupMsg::Scrolled(event) => {
            debug!("popup dismissed by scroll");
            set_visibility(inner, Visibility::ForcedClosedByScroll);
            inner.scroll_subs.borrow_mut().clear();

            let weak = Rc::downgrade(inner);
            let id = inner.host.timers.set_timeout(SCROLL_RESTORE_DELAY, move || {
                if let Some(inner) = weak.upgrade() {
                    update(&inner, PopupMsg::ScrollRestored);
                }
            });
            let previous = inner.state.borrow_mut().restore_timer.replace(id);
            if let Some(previous) = previous {
                inner.host.timers.clear_timeout(previous);
            }

            inner.portal.close(Some(event));
        }

        PopupMsg::ScrollRestored => {
            let restore = {
                let mut state = inner.state.borrow_mut();
                state.restore_timer = None;
                state.alive && state.visibility == Visibility::ForcedClosedByScroll
            };
            if restore {
                set_visibility(inner, Visibility::Closed);
            }
        }

        PopupMsg::Reposition => recompute(inner),
    }
}

fn set_visibility(inner: &PopupInner, visibility: Visibility) {
    {
        let mut state = inner.state.borrow_mut();
        if state.visibility == visibility {
            return;
        }
        state.visibility = visibility;
    }
    debug!(?visibility, "popup visibility changed");
    inner.visibility.set(visibility);
}

fn notify(inner: &PopupInner, callback: Option<&PortalCallback>, event: Option<&DomEvent>) {
    if let Some(callback) = callback {
        callback(event, inner.portal.config());
    }
}

fn recompute(inner: &PopupInner) {
    let renderer = &inner.host.renderer;
    let trigger = inner.portal.trigger_node().and_then(|node| renderer.measure(node));
    let content_node = inner.portal.content_node();
    let content = content_node.and_then(|node| renderer.measure(node));

    let input = PositionInput {
        trigger,
        content,
        placement: inner.options.position,
        offset: inner.options.offset(),
        viewport: renderer.viewport(),
        gap: inner.options.gap(),
    };
    let style = compute_popup_style(&input);

    {
        let mut state = inner.state.borrow_mut();
        state.trigger_rect = trigger;
        state.content_rect = content;
        state.style = style;
    }

    if let Some(node) = content_node {
        renderer.apply_style(node, &style);
    }
    inner.style.set(style);
}

fn subscribe_scroll(inner: &Rc<PopupInner>) {
    let weak = Rc::downgrade(inner);
    let mut subs = inner.scroll_subs.borrow_mut();
    if !subs.is_empty() {
        return;
    }
    subs.add(
        EventTarget::Window,
        EventKind::Scroll,
        Rc::new(move |event: &DomEvent| {
            if let Some(inner) = weak.upgrade() {
                update(&inner, PopupMsg::Scrolled(event));
            }
        }),
    );
}
