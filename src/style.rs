//! Popup style - the computed absolute position of the floating content.
//!
//! Mirrors the inline style object a browser host would receive:
//! `position: absolute` plus at most one horizontal and one vertical
//! anchor. Pixel values print with a `px` suffix; keywords such as
//! `auto` pass through untouched.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

// =============================================================================
// LENGTH
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f64),
    Auto,
}

impl Length {
    pub fn as_px(&self) -> Option<f64> {
        match self {
            Length::Px(v) => Some(*v),
            Length::Auto => None,
        }
    }

    /// Round pixel values the way `Math.round` does. Keywords are unchanged.
    pub fn rounded(self) -> Self {
        match self {
            Length::Px(v) => Length::Px(round_px(v)),
            Length::Auto => Length::Auto,
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Px(v) => write!(f, "{v}px"),
            Length::Auto => f.write_str("auto"),
        }
    }
}

/// Half-way values round toward positive infinity, and `-0` becomes `0`.
pub fn round_px(value: f64) -> f64 {
    let rounded = (value + 0.5).floor();
    if rounded == 0.0 { 0.0 } else { rounded }
}

// =============================================================================
// POPUP STYLE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Absolute,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Absolute => "absolute",
        }
    }
}

/// Computed style for the floating content.
///
/// The default value (position only) is what a popup carries before both
/// the trigger and the content have been measured.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PopupStyle {
    pub position: Position,
    pub top: Option<Length>,
    pub right: Option<Length>,
    pub bottom: Option<Length>,
    pub left: Option<Length>,
}

impl PopupStyle {
    /// True when no anchor has been computed.
    pub fn is_unpositioned(&self) -> bool {
        self.top.is_none() && self.right.is_none() && self.bottom.is_none() && self.left.is_none()
    }

    pub fn rounded(self) -> Self {
        Self {
            position: self.position,
            top: self.top.map(Length::rounded),
            right: self.right.map(Length::rounded),
            bottom: self.bottom.map(Length::rounded),
            left: self.left.map(Length::rounded),
        }
    }

    /// Declarations in a stable order: position, top, right, bottom, left.
    pub fn declarations(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![("position", self.position.as_str().to_string())];
        let edges = [
            ("top", self.top),
            ("right", self.right),
            ("bottom", self.bottom),
            ("left", self.left),
        ];
        for (name, value) in edges {
            if let Some(value) = value {
                out.push((name, value.to_string()));
            }
        }
        out
    }
}

impl fmt::Display for PopupStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decls = self.declarations();
        for (i, (name, value)) in decls.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{name}: {value};")?;
        }
        Ok(())
    }
}

impl Serialize for PopupStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let decls = self.declarations();
        let mut map = serializer.serialize_map(Some(decls.len()))?;
        for (name, value) in &decls {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
