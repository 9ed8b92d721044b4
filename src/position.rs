//! Positioning engine - trigger box + content box + placement → style.
//!
//! The computation is pure: the caller measures both boxes and reads the
//! viewport, then [`compute_popup_style`] anchors the content on exactly
//! one horizontal edge (`left` or `right`) and one vertical edge (`top`
//! or `bottom`) of the page.
//!
//! # Example
//!
//! ```
//! use spark_popup::geometry::{Rect, Viewport};
//! use spark_popup::placement::Placement;
//! use spark_popup::position::{compute_popup_style, PositionInput};
//!
//! let input = PositionInput::new(Placement::BottomLeft, Viewport::new(1024.0, 768.0))
//!     .trigger(Rect::new(100.0, 100.0, 50.0, 20.0))
//!     .content(Rect::sized(80.0, 30.0));
//!
//! let style = compute_popup_style(&input);
//! assert_eq!(style.to_string(), "position: absolute; top: 120px; left: 100px;");
//! ```

use tracing::debug;

use crate::geometry::{Offset, Rect, Viewport};
use crate::placement::{Placement, Side};
use crate::style::{Length, PopupStyle};

/// Gap between trigger and content for `left center` / `right center`.
pub const POPUP_GAP: f64 = 8.0;

/// Everything the positioning engine reads.
///
/// `viewport == None` means a non-browser context; the trigger/content
/// boxes are `None` until they have been measured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionInput {
    pub trigger: Option<Rect>,
    pub content: Option<Rect>,
    pub placement: Placement,
    pub offset: Offset,
    pub viewport: Option<Viewport>,
    pub gap: f64,
}

impl PositionInput {
    pub fn new(placement: Placement, viewport: Viewport) -> Self {
        Self {
            trigger: None,
            content: None,
            placement,
            offset: Offset::default(),
            viewport: Some(viewport),
            gap: POPUP_GAP,
        }
    }

    pub fn trigger(mut self, rect: Rect) -> Self {
        self.trigger = Some(rect);
        self
    }

    pub fn content(mut self, rect: Rect) -> Self {
        self.content = Some(rect);
        self
    }

    pub fn offset(mut self, offset: Offset) -> Self {
        self.offset = offset;
        self
    }

    pub fn gap(mut self, gap: f64) -> Self {
        self.gap = gap;
        self
    }
}

// =============================================================================
// COMPUTE
// =============================================================================

/// Compute the floating content's style.
///
/// Returns the position-only default when the context has no viewport or
/// either box is still unmeasured.
pub fn compute_popup_style(input: &PositionInput) -> PopupStyle {
    let (Some(viewport), Some(coords), Some(popup)) = (input.viewport, input.trigger, input.content)
    else {
        return PopupStyle::default();
    };

    let mut style = PopupStyle::default();
    let placement = input.placement;

    // Horizontal anchor
    if placement.anchors_right() {
        style.right = Some(Length::Px(
            viewport.width - (coords.right() + viewport.scroll_x),
        ));
    } else if placement.anchors_left() {
        style.left = Some(Length::Px(coords.left + viewport.scroll_x));
    } else {
        let x_offset = (coords.width - popup.width) / 2.0;
        style.left = Some(Length::Px(coords.left + viewport.scroll_x + x_offset));
    }

    // Vertical anchor
    match placement.side() {
        Side::Top => {
            style.bottom = Some(Length::Px(
                viewport.height - (coords.top + viewport.scroll_y),
            ));
        }
        Side::Bottom => {
            style.top = Some(Length::Px(coords.bottom() + viewport.scroll_y));
        }
        side @ (Side::Left | Side::Right) => {
            let y_offset = (coords.height + popup.height) / 2.0;
            style.top = Some(Length::Px(coords.bottom() + viewport.scroll_y - y_offset));

            // Move the content beside the trigger instead of over it
            let x_shift = popup.width + input.gap;
            if side == Side::Right {
                style.right = shift(style.right, -x_shift);
            } else {
                style.left = shift(style.left, -x_shift);
            }
        }
    }

    let style = apply_offsets(style, input.offset).rounded();
    debug!(%placement, %style, "computed popup style");
    style
}

/// Apply horizontal/vertical offsets to whichever anchor is numeric.
///
/// The horizontal offset is subtracted from `left` (or else `right`); the
/// vertical offset is added to `top` (or else `bottom`). An anchor holding
/// a keyword is skipped in favour of the opposite edge.
pub fn apply_offsets(mut style: PopupStyle, offset: Offset) -> PopupStyle {
    if offset.horizontal != 0.0 {
        if is_px(style.left) {
            style.left = shift(style.left, -offset.horizontal);
        } else if is_px(style.right) {
            style.right = shift(style.right, -offset.horizontal);
        }
    }

    if offset.vertical != 0.0 {
        if is_px(style.top) {
            style.top = shift(style.top, offset.vertical);
        } else if is_px(style.bottom) {
            style.bottom = shift(style.bottom, offset.vertical);
        }
    }

    style
}

fn is_px(value: Option<Length>) -> bool {
    matches!(value, Some(Length::Px(_)))
}

fn shift(value: Option<Length>, by: f64) -> Option<Length> {
    match value {
        Some(Length::Px(v)) => Some(Length::Px(v + by)),
        other => other,
    }
}

// =============================================================================
// VIEWPORT CONTAINMENT
// =============================================================================

/// Would content placed with `style` be fully visible?
///
/// Right/bottom anchors are converted back to left/top using the content
/// size. Missing or keyword anchors count as zero.
pub fn is_style_in_viewport(style: &PopupStyle, content: &Rect, viewport: &Viewport) -> bool {
    let px = |value: Option<Length>| value.and_then(|v| v.as_px());

    let mut left = px(style.left).unwrap_or(0.0);
    let mut top = px(style.top).unwrap_or(0.0);

    if let Some(right) = px(style.right) {
        left = viewport.width - right - content.width;
    }
    if let Some(bottom) = px(style.bottom) {
        top = viewport.height - bottom - content.height;
    }

    // Hidden on top / bottom
    if top < viewport.scroll_y || top + content.height > viewport.scroll_y + viewport.height {
        return false;
    }
    // Hidden on left / right
    if left < viewport.scroll_x || left + content.width > viewport.scroll_x + viewport.width {
        return false;
    }

    true
}
