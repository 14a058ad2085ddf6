//! Channel-backed `PresentationSink` used by the scan thread.
//!
//! The scan thread never touches the overlay directly. Updates travel as
//! `OverlayEvent`s; a choice request carries its own reply channel and the
//! scan thread blocks on it until the overlay answers.

use std::sync::mpsc::{channel, Receiver, Sender};

use crate::matching::MatchCandidate;
use crate::scan::format::format_choice;
use crate::scan::PresentationSink;

/// Messages from the scan thread to the overlay.
#[derive(Debug)]
pub enum OverlayEvent {
    /// Replace the visible text
    Display(String),
    /// Regions that currently have an overridable pick
    Alternatives(Vec<String>),
    /// Ask the user to pick one of `labels`; answer on `reply`
    ChoiceRequested {
        labels: Vec<String>,
        reply: Sender<Option<usize>>,
    },
}

/// Scan-thread end of the overlay channel.
#[derive(Debug, Clone)]
pub struct OverlaySink {
    events: Sender<OverlayEvent>,
}

/// Creates the sink and the receiver the overlay drains each frame.
pub fn create_overlay_channel() -> (OverlaySink, Receiver<OverlayEvent>) {
    let (events, receiver) = channel();
    (OverlaySink { events }, receiver)
}

impl PresentationSink for OverlaySink {
    fn display_block(&self, text: &str) {
        let _ = self.events.send(OverlayEvent::Display(text.to_string()));
    }

    fn request_choice(&self, candidates: &[MatchCandidate]) -> Option<MatchCandidate> {
        let (reply, answer) = channel();
        let request = OverlayEvent::ChoiceRequested {
            labels: candidates.iter().map(format_choice).collect(),
            reply,
        };

        if self.events.send(request).is_err() {
            crate::log("Overlay closed, cannot ask for a choice");
            return None;
        }

        // Blocks until the overlay answers or drops the request
        answer
            .recv()
            .ok()
            .flatten()
            .and_then(|i| candidates.get(i).cloned())
    }

    fn offer_alternatives(&self, regions: &[String]) {
        let _ = self.events.send(OverlayEvent::Alternatives(regions.to_vec()));
    }
}
