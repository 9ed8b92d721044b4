//! Placement - where the floating content sits relative to its trigger.
//!
//! A placement combines a primary side with a secondary alignment. Only
//! eight combinations are valid:
//!
//! ```text
//!  top left      top center      top right
//!  left center   [  trigger  ]   right center
//!  bottom left   bottom center   bottom right
//! ```
//!
//! Both spellings of the alignment are accepted when parsing: `left`/`right`
//! and the writing-direction neutral `start`/`end` (`"top start"`,
//! `"end center"`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Primary side of the trigger the content is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

/// Secondary alignment along the side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Align {
    Start,
    End,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Placement {
    #[default]
    TopLeft,
    TopRight,
    TopCenter,
    BottomLeft,
    BottomRight,
    BottomCenter,
    LeftCenter,
    RightCenter,
}

impl Placement {
    pub const ALL: [Placement; 8] = [
        Placement::TopLeft,
        Placement::TopRight,
        Placement::TopCenter,
        Placement::BottomLeft,
        Placement::BottomRight,
        Placement::BottomCenter,
        Placement::LeftCenter,
        Placement::RightCenter,
    ];

    pub fn side(self) -> Side {
        match self {
            Placement::TopLeft | Placement::TopRight | Placement::TopCenter => Side::Top,
            Placement::BottomLeft | Placement::BottomRight | Placement::BottomCenter => {
                Side::Bottom
            }
            Placement::LeftCenter => Side::Left,
            Placement::RightCenter => Side::Right,
        }
    }

    pub fn align(self) -> Align {
        match self {
            Placement::TopLeft | Placement::BottomLeft => Align::Start,
            Placement::TopRight | Placement::BottomRight => Align::End,
            _ => Align::Center,
        }
    }

    /// Which horizontal edge anchors the content.
    ///
    /// Side placements anchor on the edge of their own side, so
    /// `left center` is left-anchored and `right center` right-anchored.
    pub(crate) fn anchors_right(self) -> bool {
        matches!(
            self,
            Placement::TopRight | Placement::BottomRight | Placement::RightCenter
        )
    }

    pub(crate) fn anchors_left(self) -> bool {
        matches!(
            self,
            Placement::TopLeft | Placement::BottomLeft | Placement::LeftCenter
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Placement::TopLeft => "top left",
            Placement::TopRight => "top right",
            Placement::TopCenter => "top center",
            Placement::BottomLeft => "bottom left",
            Placement::BottomRight => "bottom right",
            Placement::BottomCenter => "bottom center",
            Placement::LeftCenter => "left center",
            Placement::RightCenter => "right center",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Placement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let words: Vec<String> = s.split_whitespace().map(str::to_ascii_lowercase).collect();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();

        let placement = match words.as_slice() {
            ["top", "left" | "start"] => Placement::TopLeft,
            ["top", "right" | "end"] => Placement::TopRight,
            ["top", "center"] => Placement::TopCenter,
            ["bottom", "left" | "start"] => Placement::BottomLeft,
            ["bottom", "right" | "end"] => Placement::BottomRight,
            ["bottom", "center"] => Placement::BottomCenter,
            ["left" | "start", "center"] => Placement::LeftCenter,
            ["right" | "end", "center"] => Placement::RightCenter,
            _ => return Err(Error::UnknownPlacement(s.to_string())),
        };
        Ok(placement)
    }
}

impl TryFrom<String> for Placement {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Placement> for String {
    fn from(placement: Placement) -> Self {
        placement.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_top_left() {
        assert_eq!(Placement::default(), Placement::TopLeft);
    }

    #[test]
    fn test_display_parse_roundtrip() {
        for placement in Placement::ALL {
            assert_eq!(placement.as_str().parse::<Placement>(), Ok(placement));
        }
    }

    #[test]
    fn test_parse_start_end_aliases() {
        assert_eq!("top start".parse(), Ok(Placement::TopLeft));
        assert_eq!("bottom end".parse(), Ok(Placement::BottomRight));
        assert_eq!("start center".parse(), Ok(Placement::LeftCenter));
        assert_eq!("end center".parse(), Ok(Placement::RightCenter));
        assert_eq!("  Top   Center ".parse(), Ok(Placement::TopCenter));
    }

    #[test]
    fn test_parse_rejects_invalid_combinations() {
        for bad in ["center center", "top", "left top", "middle", ""] {
            assert_eq!(
                bad.parse::<Placement>(),
                Err(Error::UnknownPlacement(bad.to_string()))
            );
        }
    }

    #[test]
    fn test_side_and_align() {
        assert_eq!(Placement::TopRight.side(), Side::Top);
        assert_eq!(Placement::TopRight.align(), Align::End);
        assert_eq!(Placement::LeftCenter.side(), Side::Left);
        assert_eq!(Placement::LeftCenter.align(), Align::Center);
        assert_eq!(Placement::BottomLeft.align(), Align::Start);
    }

    #[test]
    fn test_horizontal_anchor() {
        assert!(Placement::RightCenter.anchors_right());
        assert!(Placement::LeftCenter.anchors_left());
        assert!(!Placement::TopCenter.anchors_left());
        assert!(!Placement::TopCenter.anchors_right());
    }
}
