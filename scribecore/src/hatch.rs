//! Hatched overlays - pencil-style fills for selection and secondary content
//!
//! Immediate-mode equivalents of a crosshatch pencil texture: diagonal
//! strokes clipped to a rect. Used for selected notes, harmony notes, and
//! window drop shadows.

use egui::{Color32, Painter, Pos2, Rect, Stroke};

use crate::theme::ScribeColors;

const HATCH_STEP: f32 = 4.0;

/// Diagonal hatch lines across `rect`, clipped to it.
fn hatch_lines(painter: &Painter, rect: Rect, stroke: Stroke) {
    let painter = painter.with_clip_rect(rect);
    // Lines run bottom-left to top-right; start left of the rect so the
    // first stroke still crosses the top-left corner.
    let mut x = rect.min.x - rect.height();
    while x < rect.max.x {
        painter.line_segment(
            [
                Pos2::new(x, rect.max.y),
                Pos2::new(x + rect.height(), rect.min.y),
            ],
            stroke,
        );
        x += HATCH_STEP;
    }
}

/// Selection overlay: accent-colored hatching plus a 1px accent border.
pub fn draw_hatch_selection(painter: &Painter, rect: Rect) {
    hatch_lines(painter, rect, Stroke::new(1.0, ScribeColors::ACCENT));
    painter.rect_stroke(rect, 0.0, Stroke::new(1.5, ScribeColors::ACCENT));
}

/// Light hover overlay.
pub fn draw_hatch_hover(painter: &Painter, rect: Rect) {
    hatch_lines(painter, rect, Stroke::new(0.5, ScribeColors::FAINT));
}

/// Ink hatching used to fill secondary (harmony) note bodies.
pub fn draw_hatch_fill(painter: &Painter, rect: Rect) {
    hatch_lines(painter, rect, Stroke::new(1.0, ScribeColors::INK));
    painter.rect_stroke(rect, 0.0, Stroke::new(1.0, ScribeColors::INK));
}

/// Drop shadow behind a floating window: a hatched band offset down-right.
pub fn draw_window_shadow(ctx: &egui::Context, rect: Rect) {
    let shadow = rect.translate(egui::vec2(4.0, 4.0));
    let painter = ctx.layer_painter(egui::LayerId::background());
    // Only the exposed L-shaped band, not the area under the window.
    let right = Rect::from_min_max(
        Pos2::new(rect.max.x, shadow.min.y + 4.0),
        shadow.max,
    );
    let bottom = Rect::from_min_max(
        Pos2::new(shadow.min.x + 4.0, rect.max.y),
        Pos2::new(rect.max.x, shadow.max.y),
    );
    let stroke = Stroke::new(1.0, Color32::from_black_alpha(80));
    hatch_lines(&painter, right, stroke);
    hatch_lines(&painter, bottom, stroke);
}
