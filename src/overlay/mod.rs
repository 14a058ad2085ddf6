//! Always-on-top overlay window.
//!
//! Shows the scan loop's output using egui/eframe. The scan thread talks to
//! it only through `OverlayEvent`s; clicks that need the scan loop (choosing
//! an alternative match) travel back as `ScanCommand`s.

pub mod render;
pub mod sink;
pub mod state;

pub use sink::{create_overlay_channel, OverlayEvent};

use std::sync::mpsc::{Receiver, Sender};
use std::time::Duration;

use eframe::egui::{self, Color32, Vec2};

use crate::config::OverlayConfig;
use crate::scan::ScanCommand;

use render::ChoiceAction;
use state::OverlayState;

/// Size used while minimised.
const COMPACT_SIZE: Vec2 = Vec2::new(200.0, 100.0);

/// Room for the window controls and panel margins around the text.
const CHROME_HEIGHT: f32 = 60.0;

/// Main overlay application struct.
pub struct OverlayApp {
    state: OverlayState,
    config: OverlayConfig,
    events: Receiver<OverlayEvent>,
    commands: Sender<ScanCommand>,
    /// Last size requested from the window system
    requested_size: Vec2,
}

impl OverlayApp {
    pub fn new(
        config: OverlayConfig,
        events: Receiver<OverlayEvent>,
        commands: Sender<ScanCommand>,
    ) -> Self {
        let requested_size = Vec2::new(config.width, config.min_height);
        Self {
            state: OverlayState::default(),
            config,
            events,
            commands,
            requested_size,
        }
    }

    /// Drain scan-thread events.
    fn poll_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.state.apply(event);
        }
    }

    /// Handle a "Select Alternative Match" click.
    fn handle_alternative(&self, region: String) {
        crate::log(&format!("Overlay: alternative requested for {}", region));
        if self
            .commands
            .send(ScanCommand::ChooseAlternative { region })
            .is_err()
        {
            crate::log("Overlay: scan loop is gone");
        }
    }

    /// Fits the window height to the content, within the configured bounds.
    fn resize_to(&mut self, ctx: &egui::Context, content_height: f32) {
        let target = if self.state.minimized {
            COMPACT_SIZE
        } else {
            let height = (content_height + CHROME_HEIGHT)
                .clamp(self.config.min_height, self.config.max_height);
            Vec2::new(self.config.width, height)
        };

        if (target - self.requested_size).length() > 1.0 {
            self.requested_size = target;
            ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(target));
        }
    }

    fn background(&self) -> Color32 {
        let alpha = (self.config.opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        Color32::from_black_alpha(alpha)
    }
}

impl eframe::App for OverlayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();

        // Keep polling for scan updates
        ctx.request_repaint_after(Duration::from_millis(100));

        let frame = egui::Frame::none()
            .fill(self.background())
            .inner_margin(egui::Margin::same(10.0));

        let mut content_height = 0.0;

        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            // Drag anywhere that isn't a button to move the window
            let drag = ui.interact(ui.max_rect(), ui.id().with("drag"), egui::Sense::drag());
            if drag.drag_started() {
                ctx.send_viewport_cmd(egui::ViewportCommand::StartDrag);
            }

            let (toggle_clicked, close_clicked) = render::render_window_controls(ui);
            if close_clicked {
                crate::log("Overlay: close requested");
                self.state.resolve_pending(None);
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
            if toggle_clicked {
                self.state.minimized = !self.state.minimized;
            }

            if self.state.minimized {
                return;
            }

            let top = ui.cursor().top();
            egui::ScrollArea::vertical().show(ui, |ui| {
                if let Some(pending) = &self.state.pending {
                    match render::render_choice(ui, &pending.labels) {
                        Some(ChoiceAction::Pick(i)) => self.state.resolve_pending(Some(i)),
                        Some(ChoiceAction::Dismiss) => self.state.resolve_pending(None),
                        None => {}
                    }
                } else {
                    render::render_results(ui, &self.state.text);
                    if let Some(region) = render::render_alternatives(ui, &self.state.alternatives) {
                        self.handle_alternative(region);
                    }
                }
            });
            content_height = ui.min_rect().bottom() - top;
        });

        self.resize_to(ctx, content_height);
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0; 4]
    }
}

/// Run the overlay.
/// This function blocks until the window is closed.
pub fn run_overlay(
    config: OverlayConfig,
    events: Receiver<OverlayEvent>,
    commands: Sender<ScanCommand>,
) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(Vec2::new(config.width, config.min_height))
            .with_position(egui::pos2(config.x, config.y))
            .with_always_on_top()
            .with_decorations(false)
            .with_transparent(true)
            .with_title("Event Overlay"),
        ..Default::default()
    };

    crate::log("Overlay: starting");

    eframe::run_native(
        "Event Overlay",
        options,
        Box::new(move |_cc| Ok(Box::new(OverlayApp::new(config, events, commands)))),
    )
}
