use kurbo::Shape as _;

use crate::{color::Rgba8, surface::Surface};

const LINE_COLOR: Rgba8 = Rgba8::opaque(0xcc, 0xcc, 0xcc);
const LINE_WIDTH: f64 = 1.0;
const EDGE_INSET: f64 = 16.0;
const STAMP_WIDTH: f64 = 120.0;
const STAMP_HEIGHT: f64 = 160.0;

/// Draw the back face's fixed decoration: a stamp box in the top-right
/// corner and a vertical divider at half the surface width. Runs once at
/// surface creation; idempotent (the surface is cleared first).
pub fn draw_back_template(surface: &mut Surface) {
    surface.clear();

    let w = f64::from(surface.width());
    let h = f64::from(surface.height());

    let style = kurbo::Stroke::new(LINE_WIDTH);

    let stamp = kurbo::Rect::new(
        w - STAMP_WIDTH - EDGE_INSET,
        EDGE_INSET,
        w - EDGE_INSET,
        EDGE_INSET + STAMP_HEIGHT,
    );
    let stamp_outline = kurbo::stroke(
        stamp.to_path(0.1),
        &style,
        &kurbo::StrokeOpts::default(),
        0.1,
    );
    surface.fill_path(&stamp_outline, kurbo::Affine::IDENTITY, LINE_COLOR);

    let mut divider = kurbo::BezPath::new();
    divider.move_to((w / 2.0, EDGE_INSET));
    divider.line_to((w / 2.0, h - EDGE_INSET));
    let divider_outline =
        kurbo::stroke(divider, &style, &kurbo::StrokeOpts::default(), 0.1);
    surface.fill_path(&divider_outline, kurbo::Affine::IDENTITY, LINE_COLOR);
}
