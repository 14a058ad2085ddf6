//! Overlay state management.
//!
//! Holds what the overlay shows between frames, fed by `OverlayEvent`s.

use std::sync::mpsc::Sender;

use super::sink::OverlayEvent;

/// A choice the scan thread is blocked on.
#[derive(Debug)]
pub struct PendingChoice {
    pub labels: Vec<String>,
    reply: Sender<Option<usize>>,
}

impl PendingChoice {
    /// Unblocks the scan thread with the user's answer.
    pub fn answer(self, choice: Option<usize>) {
        let _ = self.reply.send(choice);
    }
}

/// Overlay application state.
#[derive(Debug)]
pub struct OverlayState {
    /// Latest region block from the scan loop
    pub text: String,
    /// Regions offering "Select Alternative Match"
    pub alternatives: Vec<String>,
    pub pending: Option<PendingChoice>,
    /// Compact mode toggled by the "-" button
    pub minimized: bool,
}

impl Default for OverlayState {
    fn default() -> Self {
        Self {
            text: "Loading OCR...".to_string(),
            alternatives: Vec::new(),
            pending: None,
            minimized: false,
        }
    }
}

impl OverlayState {
    pub fn apply(&mut self, event: OverlayEvent) {
        match event {
            OverlayEvent::Display(text) => self.text = text,
            OverlayEvent::Alternatives(regions) => self.alternatives = regions,
            OverlayEvent::ChoiceRequested { labels, reply } => {
                // The scan thread blocks on each request, so a second one
                // means the first was abandoned.
                if let Some(stale) = self.pending.take() {
                    stale.answer(None);
                }
                self.pending = Some(PendingChoice { labels, reply });
            }
        }
    }

    /// Answers the pending choice, if any.
    pub fn resolve_pending(&mut self, choice: Option<usize>) {
        if let Some(pending) = self.pending.take() {
            pending.answer(choice);
        }
    }
}
