//! Boundary between the scan loop and whatever presents its results.

use crate::matching::MatchCandidate;

/// Presentation surface driven by the scan loop.
///
/// The loop never touches rendering state directly; it only calls these.
pub trait PresentationSink {
    /// Replaces the visible text. Fire-and-forget.
    fn display_block(&self, text: &str);

    /// Blocks until the user picks one of `candidates`, or returns `None`
    /// if the prompt is dismissed or the surface is gone.
    fn request_choice(&self, candidates: &[MatchCandidate]) -> Option<MatchCandidate>;

    /// Regions whose automatic pick can currently be overridden.
    fn offer_alternatives(&self, _regions: &[String]) {}
}

/// Requests sent from the presentation surface back to the scan loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanCommand {
    /// Re-open the choice over the region's last candidate list.
    ChooseAlternative { region: String },
}
