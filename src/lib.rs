//! # spark-popup
//!
//! Popup positioning and portal lifecycle for component-based UIs.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for the
//! reactive open/visibility/style state.
//!
//! ## Architecture
//!
//! The core never touches a real document. A host injects a [`Renderer`],
//! an [`EventRegistry`] and [`Timers`] through a [`HostContext`]:
//!
//! ```text
//! input (crossterm) → PointerRouter → HostContext::dispatch → Portal → Popup
//!                                                              ↓
//!                                   compute_popup_style → Renderer::apply_style
//! ```
//!
//! ## Modules
//!
//! - [`position`] - pure placement math (trigger box + content box → style)
//! - [`portal`] - detached mount/unmount driven by trigger and document events
//! - [`popup`] - trigger + floating content kept positioned via a portal
//! - [`interaction`] - hover/click/focus modes and their portal wiring
//! - [`dom`] - host boundary, in-memory document, events and timers
//! - [`layout`] - Taffy-backed document for terminal hosts
//! - [`input`] - crossterm event routing

pub mod dom;
pub mod error;
pub mod geometry;
pub mod input;
pub mod interaction;
pub mod layout;
pub mod placement;
pub mod popup;
pub mod portal;
pub mod position;
pub mod style;

pub use dom::{
    DomEvent, Element, EventKind, EventRegistry, EventTarget, HostContext, MemoryDocument, NodeId,
    Renderer, Subscriptions, Timers,
};
pub use error::{Error, Result};
pub use geometry::{Offset, Rect, Viewport};
pub use input::PointerRouter;
pub use interaction::Interaction;
pub use layout::{LaidOutNode, LayoutDocument};
pub use placement::{Align, Placement, Side};
pub use popup::{Popup, PopupOptions, PopupProps, Visibility};
pub use portal::{Portal, PortalCallback, PortalCallbacks, PortalConfig};
pub use position::{
    POPUP_GAP, PositionInput, apply_offsets, compute_popup_style, is_style_in_viewport,
};
pub use style::{Length, PopupStyle, Position};
