//! Placement table and positioning properties.

use proptest::prelude::*;
use test_case::test_case;

use spark_popup::geometry::{Offset, Rect, Viewport};
use spark_popup::placement::Placement;
use spark_popup::position::{PositionInput, compute_popup_style, is_style_in_viewport};
use spark_popup::style::{Length, PopupStyle};

fn trigger() -> Rect {
    Rect::new(100.0, 100.0, 50.0, 20.0)
}

fn content() -> Rect {
    Rect::sized(80.0, 30.0)
}

fn viewport() -> Viewport {
    Viewport::new(1024.0, 768.0)
}

fn px(value: f64) -> Option<Length> {
    Some(Length::Px(value))
}

fn style_for(placement: Placement) -> PopupStyle {
    compute_popup_style(
        &PositionInput::new(placement, viewport())
            .trigger(trigger())
            .content(content()),
    )
}

#[test_case("top left", None, px(100.0), None, px(668.0) ; "top left")]
#[test_case("top right", px(874.0), None, None, px(668.0) ; "top right")]
#[test_case("top center", None, px(85.0), None, px(668.0) ; "top center")]
#[test_case("bottom left", None, px(100.0), px(120.0), None ; "bottom left")]
#[test_case("bottom right", px(874.0), None, px(120.0), None ; "bottom right")]
#[test_case("bottom center", None, px(85.0), px(120.0), None ; "bottom center")]
#[test_case("left center", None, px(12.0), px(95.0), None ; "left center")]
#[test_case("right center", px(786.0), None, px(95.0), None ; "right center")]
fn test_placement_table(
    placement: &str,
    right: Option<Length>,
    left: Option<Length>,
    top: Option<Length>,
    bottom: Option<Length>,
) {
    let placement: Placement = placement.parse().unwrap();
    let style = style_for(placement);

    assert_eq!(style.right, right);
    assert_eq!(style.left, left);
    assert_eq!(style.top, top);
    assert_eq!(style.bottom, bottom);
}

#[test_case("top start", Placement::TopLeft)]
#[test_case("bottom end", Placement::BottomRight)]
#[test_case("left center", Placement::LeftCenter)]
fn test_placement_aliases(name: &str, expected: Placement) {
    assert_eq!(name.parse::<Placement>(), Ok(expected));
}

#[test]
fn test_every_placement_sets_one_edge_per_axis() {
    for placement in Placement::ALL {
        let style = style_for(placement);
        assert!(style.left.is_some() ^ style.right.is_some(), "{placement}");
        assert!(style.top.is_some() ^ style.bottom.is_some(), "{placement}");
    }
}

#[test]
fn test_css_output() {
    assert_eq!(
        style_for(Placement::TopLeft).to_string(),
        "position: absolute; bottom: 668px; left: 100px;"
    );
    assert_eq!(
        serde_json::to_value(style_for(Placement::RightCenter)).unwrap(),
        serde_json::json!({ "position": "absolute", "top": "95px", "right": "786px" })
    );
}

#[test]
fn test_scrolled_page() {
    let style = compute_popup_style(
        &PositionInput::new(Placement::BottomLeft, viewport().with_scroll(10.0, 200.0))
            .trigger(trigger())
            .content(content()),
    );
    assert_eq!(style.top, px(320.0));
    assert_eq!(style.left, px(110.0));
}

#[test]
fn test_offsets_shift_content() {
    let style = compute_popup_style(
        &PositionInput::new(Placement::BottomLeft, viewport())
            .trigger(trigger())
            .content(content())
            .offset(Offset::new(10.0, 5.0)),
    );
    assert_eq!(style.left, px(90.0));
    assert_eq!(style.top, px(125.0));

    let style = compute_popup_style(
        &PositionInput::new(Placement::TopRight, viewport())
            .trigger(trigger())
            .content(content())
            .offset(Offset::new(10.0, 5.0)),
    );
    assert_eq!(style.right, px(864.0));
    assert_eq!(style.bottom, px(673.0));
}

#[test]
fn test_missing_measurements() {
    let input = PositionInput::new(Placement::TopLeft, viewport()).trigger(trigger());
    assert_eq!(compute_popup_style(&input), PopupStyle::default());

    let mut input = input.content(content());
    input.viewport = None;
    assert_eq!(compute_popup_style(&input), PopupStyle::default());
}

#[test]
fn test_viewport_containment() {
    let style = style_for(Placement::BottomLeft);
    assert!(is_style_in_viewport(&style, &content(), &viewport()));

    // Near the right edge a left-anchored popup overflows
    let edge = compute_popup_style(
        &PositionInput::new(Placement::BottomLeft, viewport())
            .trigger(Rect::new(100.0, 990.0, 20.0, 20.0))
            .content(content()),
    );
    assert!(!is_style_in_viewport(&edge, &content(), &viewport()));
}

fn placement_strategy() -> impl Strategy<Value = Placement> {
    prop::sample::select(Placement::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_values_are_whole_pixels(
        placement in placement_strategy(),
        top in 0.0f64..700.0,
        left in 0.0f64..900.0,
        width in 1.0f64..120.0,
        height in 1.0f64..60.0,
        content_width in 1.0f64..200.0,
        content_height in 1.0f64..100.0,
    ) {
        let style = compute_popup_style(
            &PositionInput::new(placement, viewport())
                .trigger(Rect::new(top, left, width, height))
                .content(Rect::sized(content_width, content_height)),
        );
        for edge in [style.top, style.right, style.bottom, style.left].into_iter().flatten() {
            let value = edge.as_px().unwrap();
            prop_assert_eq!(value, value.round());
        }
    }

    #[test]
    fn prop_same_input_same_css(
        placement in placement_strategy(),
        scroll_y in 0.0f64..2000.0,
        horizontal in -40.0f64..40.0,
        vertical in -40.0f64..40.0,
    ) {
        let input = PositionInput::new(placement, viewport().with_scroll(0.0, scroll_y))
            .trigger(trigger())
            .content(content())
            .offset(Offset::new(horizontal, vertical));

        let first = compute_popup_style(&input);
        let second = compute_popup_style(&input);
        prop_assert_eq!(first, second);
        prop_assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn prop_horizontal_offset_moves_against_anchor(
        placement in placement_strategy(),
        horizontal in 1.0f64..50.0,
    ) {
        let base = style_for(placement);
        let shifted = compute_popup_style(
            &PositionInput::new(placement, viewport())
                .trigger(trigger())
                .content(content())
                .offset(Offset::new(horizontal.round(), 0.0)),
        );

        match (base.left, shifted.left, base.right, shifted.right) {
            (Some(Length::Px(a)), Some(Length::Px(b)), None, None) => {
                prop_assert_eq!(a - b, horizontal.round());
            }
            (None, None, Some(Length::Px(a)), Some(Length::Px(b))) => {
                prop_assert_eq!(a - b, horizontal.round());
            }
            other => prop_assert!(false, "unexpected anchors {:?}", other),
        }
    }
}
