//! Interaction modes - which DOM events open and close a popup.
//!
//! A popup reacts to any combination of `hover`, `click` and `focus`. The
//! set is fixed at construction and translated once into a
//! [`PortalConfig`].

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use bitflags::bitflags;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::portal::PortalConfig;

/// Hover-intent delay before opening.
pub const HOVER_ENTER_DELAY: Duration = Duration::from_millis(50);
/// Hover-intent delay before closing.
pub const HOVER_LEAVE_DELAY: Duration = Duration::from_millis(70);
/// Leave delay for hoverable popups, long enough to cross from trigger to content.
pub const HOVERABLE_LEAVE_DELAY: Duration = Duration::from_millis(300);

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Interaction: u8 {
        const HOVER = 1 << 0;
        const CLICK = 1 << 1;
        const FOCUS = 1 << 2;
    }
}

impl Default for Interaction {
    fn default() -> Self {
        Interaction::HOVER
    }
}

impl Interaction {
    /// Names of the contained modes, in hover/click/focus order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Interaction::HOVER) {
            names.push("hover");
        }
        if self.contains(Interaction::CLICK) {
            names.push("click");
        }
        if self.contains(Interaction::FOCUS) {
            names.push("focus");
        }
        names
    }

    /// Derive the portal wiring for these modes.
    ///
    /// `hoverable` keeps the popup open while the pointer is over the
    /// content and is applied last, so its leave delay takes precedence.
    pub fn portal_config(&self, hoverable: bool) -> PortalConfig {
        let mut config = PortalConfig::default();

        if self.contains(Interaction::CLICK) {
            config.open_on_trigger_click = true;
            config.close_on_trigger_click = true;
            config.close_on_document_click = true;
        }

        if self.contains(Interaction::FOCUS) {
            config.open_on_trigger_focus = true;
            config.close_on_trigger_blur = true;
        }

        if self.contains(Interaction::HOVER) {
            config.open_on_trigger_mouse_enter = true;
            config.close_on_trigger_mouse_leave = true;
            config.mouse_enter_delay = HOVER_ENTER_DELAY;
            config.mouse_leave_delay = HOVER_LEAVE_DELAY;
        }

        if hoverable {
            config.close_on_portal_mouse_leave = true;
            config.mouse_leave_delay = HOVERABLE_LEAVE_DELAY;
        }

        config
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(" "))
    }
}

impl FromStr for Interaction {
    type Err = Error;

    /// Accepts one or more mode names separated by spaces, commas or `|`.
    fn from_str(s: &str) -> Result<Self, Error> {
        let mut on = Interaction::empty();
        for name in s
            .split(|c: char| c.is_whitespace() || c == ',' || c == '|')
            .filter(|part| !part.is_empty())
        {
            on |= match name.to_ascii_lowercase().as_str() {
                "hover" => Interaction::HOVER,
                "click" => Interaction::CLICK,
                "focus" => Interaction::FOCUS,
                _ => return Err(Error::UnknownInteraction(name.to_string())),
            };
        }

        if on.is_empty() {
            return Err(Error::UnknownInteraction(s.to_string()));
        }
        Ok(on)
    }
}

impl Serialize for Interaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let names = self.names();
        let mut seq = serializer.serialize_seq(Some(names.len()))?;
        for name in names {
            seq.serialize_element(name)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Interaction {
    /// Either a single mode (`"click"`) or a list (`["hover", "focus"]`).
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            One(String),
            Many(Vec<String>),
        }

        let names = match Repr::deserialize(deserializer)? {
            Repr::One(name) => vec![name],
            Repr::Many(names) => names,
        };

        let mut on = Interaction::empty();
        for name in names {
            on |= name.parse::<Interaction>().map_err(de::Error::custom)?;
        }
        if on.is_empty() {
            return Err(de::Error::custom("no interaction modes given"));
        }
        Ok(on)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_hover() {
        assert_eq!(Interaction::default(), Interaction::HOVER);
    }

    #[test]
    fn test_parse_single_and_combined() {
        assert_eq!("click".parse(), Ok(Interaction::CLICK));
        assert_eq!(
            "hover, focus".parse(),
            Ok(Interaction::HOVER | Interaction::FOCUS)
        );
        assert_eq!("click|FOCUS".parse(), Ok(Interaction::CLICK | Interaction::FOCUS));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(
            "press".parse::<Interaction>(),
            Err(Error::UnknownInteraction("press".into()))
        );
        assert!("".parse::<Interaction>().is_err());
    }

    #[test]
    fn test_display() {
        let on = Interaction::FOCUS | Interaction::HOVER;
        assert_eq!(on.to_string(), "hover focus");
    }

    #[test]
    fn test_hover_config() {
        let config = Interaction::HOVER.portal_config(false);
        assert!(config.open_on_trigger_mouse_enter);
        assert!(config.close_on_trigger_mouse_leave);
        assert!(!config.close_on_portal_mouse_leave);
        assert!(!config.open_on_trigger_click);
        assert_eq!(config.mouse_enter_delay, Duration::from_millis(50));
        assert_eq!(config.mouse_leave_delay, Duration::from_millis(70));
    }

    #[test]
    fn test_click_config() {
        let config = Interaction::CLICK.portal_config(false);
        assert!(config.open_on_trigger_click);
        assert!(config.close_on_trigger_click);
        assert!(config.close_on_document_click);
        assert!(!config.open_on_trigger_mouse_enter);
        assert_eq!(config.mouse_enter_delay, Duration::ZERO);
    }

    #[test]
    fn test_focus_config() {
        let config = Interaction::FOCUS.portal_config(false);
        assert!(config.open_on_trigger_focus);
        assert!(config.close_on_trigger_blur);
        assert!(!config.close_on_document_click);
    }

    #[test]
    fn test_hoverable_overrides_leave_delay() {
        let config = Interaction::HOVER.portal_config(true);
        assert!(config.close_on_portal_mouse_leave);
        assert_eq!(config.mouse_leave_delay, Duration::from_millis(300));
        assert_eq!(config.mouse_enter_delay, Duration::from_millis(50));
    }
}
