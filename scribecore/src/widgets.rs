//! Custom widgets shared by tunescribe windows

use egui::{Response, Ui, Widget};

use crate::hatch;
use crate::theme::ScribeColors;

/// Toolbar separator (vertical 1px ink line).
pub fn toolbar_separator(ui: &mut Ui) {
    let height = ui.spacing().interact_size.y;
    let (rect, _) = ui.allocate_exact_size(egui::vec2(8.0, height), egui::Sense::hover());
    if ui.is_rect_visible(rect) {
        ui.painter().vline(
            rect.center().x,
            rect.y_range(),
            egui::Stroke::new(1.0, ScribeColors::INK),
        );
    }
}

/// Status bar: paper fill, 1px ink border.
pub fn status_bar(ui: &mut Ui, text: &str) {
    egui::Frame::none()
        .fill(ScribeColors::PAPER)
        .stroke(egui::Stroke::new(1.0, ScribeColors::INK))
        .inner_margin(egui::Margin::symmetric(8.0, 2.0))
        .show(ui, |ui| {
            ui.label(text);
        });
}

/// File list row for the open/save dialog.
/// Selected rows get the hatched accent overlay.
pub struct FileListItem<'a> {
    name: &'a str,
    is_directory: bool,
    selected: bool,
}

impl<'a> FileListItem<'a> {
    pub fn new(name: &'a str, is_directory: bool) -> Self {
        Self {
            name,
            is_directory,
            selected: false,
        }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

impl<'a> Widget for FileListItem<'a> {
    fn ui(self, ui: &mut Ui) -> Response {
        let height = 20.0;
        let (rect, response) = ui.allocate_exact_size(
            egui::vec2(ui.available_width(), height),
            egui::Sense::click(),
        );

        if ui.is_rect_visible(rect) {
            let painter = ui.painter();
            painter.rect_filled(rect, 0.0, ScribeColors::PAPER);

            if self.selected {
                hatch::draw_hatch_selection(painter, rect);
            } else if response.hovered() {
                hatch::draw_hatch_hover(painter, rect);
            }

            let icon = if self.is_directory { "📁" } else { "🎵" };
            painter.text(
                egui::pos2(rect.min.x + 12.0, rect.center().y),
                egui::Align2::CENTER_CENTER,
                icon,
                egui::FontId::proportional(12.0),
                ScribeColors::INK,
            );
            painter.text(
                egui::pos2(rect.min.x + 24.0, rect.center().y),
                egui::Align2::LEFT_CENTER,
                self.name,
                egui::FontId::proportional(12.0),
                ScribeColors::INK,
            );
        }

        response
    }
}
