//! Tunescribe theme - paper and ink
//!
//! Warm paper background, near-black ink strokes, one blue accent for
//! selected and active elements. Square corners, 1px outlines.

use egui::{Color32, FontId, Margin, Rounding, Stroke, Style, TextStyle, Visuals};

/// The application palette.
pub struct ScribeColors;

impl ScribeColors {
    pub const PAPER: Color32 = Color32::from_rgb(250, 248, 243);
    pub const INK: Color32 = Color32::from_rgb(28, 27, 24);
    pub const FAINT: Color32 = Color32::from_rgb(214, 210, 200);
    pub const ACCENT: Color32 = Color32::from_rgb(38, 98, 181);
}

/// Theme configuration for tunescribe windows.
pub struct ScribeTheme {
    pub font_size_body: f32,
    pub font_size_heading: f32,
    pub font_size_small: f32,
    pub window_padding: f32,
    pub item_spacing: f32,
}

impl Default for ScribeTheme {
    fn default() -> Self {
        Self {
            font_size_body: 14.0,
            font_size_heading: 20.0,
            font_size_small: 11.0,
            window_padding: 8.0,
            item_spacing: 4.0,
        }
    }
}

impl ScribeTheme {
    /// Apply the theme to an egui context.
    pub fn apply(&self, ctx: &egui::Context) {
        let mut style = Style::default();

        style.text_styles = [
            (TextStyle::Small, FontId::proportional(self.font_size_small)),
            (TextStyle::Body, FontId::proportional(self.font_size_body)),
            (TextStyle::Button, FontId::proportional(self.font_size_body)),
            (TextStyle::Heading, FontId::proportional(self.font_size_heading)),
            (TextStyle::Monospace, FontId::monospace(self.font_size_body)),
        ]
        .into();

        let mut visuals = Visuals::light();

        visuals.window_fill = ScribeColors::PAPER;
        visuals.panel_fill = ScribeColors::PAPER;
        visuals.faint_bg_color = ScribeColors::PAPER;
        visuals.extreme_bg_color = ScribeColors::PAPER;

        visuals.window_rounding = Rounding::ZERO;
        visuals.menu_rounding = Rounding::ZERO;
        visuals.window_stroke = Stroke::new(1.0, ScribeColors::INK);

        let outlined = |ws: &mut egui::style::WidgetVisuals| {
            ws.bg_fill = ScribeColors::PAPER;
            ws.bg_stroke = Stroke::new(1.0, ScribeColors::INK);
            ws.fg_stroke = Stroke::new(1.0, ScribeColors::INK);
            ws.rounding = Rounding::ZERO;
        };
        outlined(&mut visuals.widgets.noninteractive);
        outlined(&mut visuals.widgets.inactive);
        outlined(&mut visuals.widgets.hovered);
        outlined(&mut visuals.widgets.active);
        outlined(&mut visuals.widgets.open);
        visuals.widgets.hovered.bg_fill = ScribeColors::FAINT;
        visuals.widgets.active.bg_fill = ScribeColors::FAINT;

        visuals.selection.bg_fill = ScribeColors::ACCENT.gamma_multiply(0.35);
        visuals.selection.stroke = Stroke::new(1.0, ScribeColors::ACCENT);

        style.visuals = visuals;

        style.spacing.window_margin = Margin::same(self.window_padding);
        style.spacing.item_spacing = egui::vec2(self.item_spacing, self.item_spacing);
        style.spacing.button_padding = egui::vec2(8.0, 4.0);

        ctx.set_style(style);
    }
}

/// Menu bar frame: paper fill, 1px ink outline.
pub fn menu_bar<R>(
    ui: &mut egui::Ui,
    add_contents: impl FnOnce(&mut egui::Ui) -> R,
) -> egui::InnerResponse<R> {
    let frame_resp = egui::Frame::none()
        .fill(ScribeColors::PAPER)
        .stroke(Stroke::new(1.0, ScribeColors::INK))
        .inner_margin(Margin::symmetric(4.0, 2.0))
        .show(ui, |ui| ui.horizontal(add_contents).inner);
    egui::InnerResponse {
        inner: frame_resp.inner,
        response: frame_resp.response,
    }
}

/// Strip key events the editor handles itself so egui's defaults don't fire:
/// Tab focus cycling, and Cmd+/Cmd- zoom scaling (the piano roll owns +/-).
pub fn consume_special_keys(ctx: &egui::Context) {
    ctx.input_mut(|i| {
        let mut kept = Vec::new();
        for event in i.events.iter() {
            match event {
                egui::Event::Key {
                    key: egui::Key::Tab, ..
                } => {}
                egui::Event::Key { key, modifiers, .. }
                    if modifiers.command
                        && matches!(
                            key,
                            egui::Key::Plus | egui::Key::Minus | egui::Key::Equals
                        ) => {}
                _ => kept.push(event.clone()),
            }
        }
        i.events = kept;
    });
}
