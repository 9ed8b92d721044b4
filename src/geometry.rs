//! Geometry primitives - measured boxes, offsets and the viewport.
//!
//! All values are CSS pixels (or terminal cells for terminal hosts) as
//! `f64`. A [`Rect`] is a snapshot: it goes stale as soon as layout
//! changes and nothing invalidates it automatically.

use serde::{Deserialize, Serialize};

// =============================================================================
// RECT
// =============================================================================

/// Axis-aligned bounding box, viewport-relative (like `getBoundingClientRect`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// A box of the given size at the origin.
    pub fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    /// Same box moved by `(dx, dy)`.
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.top + dy, self.left + dx, self.width, self.height)
    }
}

// =============================================================================
// OFFSET
// =============================================================================

/// Pixel adjustments applied after placement-based positioning.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub horizontal: f64,
    pub vertical: f64,
}

impl Offset {
    pub fn new(horizontal: f64, vertical: f64) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.horizontal == 0.0 && self.vertical == 0.0
    }
}

// =============================================================================
// VIEWPORT
// =============================================================================

/// Client area of the document plus the current page scroll.
///
/// Hosts that are not browser-like (server-side rendering) have no
/// viewport at all; see [`crate::dom::Renderer::viewport`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    pub fn with_scroll(mut self, scroll_x: f64, scroll_y: f64) -> Self {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_derived_edges() {
        let rect = Rect::new(100.0, 100.0, 50.0, 20.0);
        assert_eq!(rect.right(), 150.0);
        assert_eq!(rect.bottom(), 120.0);
    }

    #[test]
    fn test_rect_contains_is_half_open() {
        let rect = Rect::new(0.0, 0.0, 10.0, 5.0);
        assert!(rect.contains(0.0, 0.0));
        assert!(rect.contains(9.5, 4.5));
        assert!(!rect.contains(10.0, 2.0));
        assert!(!rect.contains(2.0, 5.0));
        assert!(!rect.contains(-0.1, 2.0));
    }

    #[test]
    fn test_rect_translate() {
        let rect = Rect::sized(4.0, 2.0).translate(3.0, 7.0);
        assert_eq!(rect, Rect::new(7.0, 3.0, 4.0, 2.0));
    }

    #[test]
    fn test_viewport_scroll() {
        let vp = Viewport::new(1024.0, 768.0).with_scroll(5.0, 40.0);
        assert_eq!(vp.scroll_x, 5.0);
        assert_eq!(vp.scroll_y, 40.0);
        assert_eq!(vp.width, 1024.0);
    }
}
