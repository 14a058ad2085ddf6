//! Overlay rendering functions.
//!
//! Contains layout and widget code; returns what the user clicked.

use eframe::egui::{self, Color32, RichText};

/// What the user did in the choice panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceAction {
    Pick(usize),
    Dismiss,
}

fn overlay_button(text: &str, size: f32) -> egui::Button<'static> {
    egui::Button::new(RichText::new(text.to_string()).size(size).color(Color32::WHITE)).frame(false)
}

/// Render the minimise and close buttons in the top-right corner.
/// Returns (toggle_clicked, close_clicked).
pub fn render_window_controls(ui: &mut egui::Ui) -> (bool, bool) {
    let mut toggle_clicked = false;
    let mut close_clicked = false;

    ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
        if ui.add(overlay_button("✕", 16.0)).clicked() {
            close_clicked = true;
        }
        if ui.add(overlay_button("-", 14.0)).clicked() {
            toggle_clicked = true;
        }
    });

    (toggle_clicked, close_clicked)
}

/// Render the region results block.
pub fn render_results(ui: &mut egui::Ui, text: &str) {
    ui.label(
        RichText::new(text)
            .monospace()
            .size(14.0)
            .color(Color32::WHITE),
    );
}

/// Render one "Select Alternative Match" button per region.
/// Returns the region whose button was clicked.
pub fn render_alternatives(ui: &mut egui::Ui, regions: &[String]) -> Option<String> {
    let mut clicked = None;

    if regions.is_empty() {
        return None;
    }

    ui.add_space(8.0);
    for region in regions {
        let label = if regions.len() == 1 {
            "Select Alternative Match".to_string()
        } else {
            format!("Select Alternative Match ({})", region)
        };
        if ui.add(overlay_button(&label, 13.0)).clicked() {
            clicked = Some(region.clone());
        }
    }

    clicked
}

/// Render the blocking choice panel.
pub fn render_choice(ui: &mut egui::Ui, labels: &[String]) -> Option<ChoiceAction> {
    let mut action = None;

    ui.label(RichText::new("Select Match").strong().size(15.0).color(Color32::YELLOW));
    ui.add_space(6.0);

    for (i, label) in labels.iter().enumerate() {
        if ui.add(overlay_button(label, 13.0)).clicked() {
            action = Some(ChoiceAction::Pick(i));
        }
    }

    ui.add_space(6.0);
    if ui.add(overlay_button("Dismiss", 13.0)).clicked() {
        action = Some(ChoiceAction::Dismiss);
    }

    action
}
