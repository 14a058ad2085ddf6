use crate::config::RegionSpec;
use crate::matching::MatchCandidate;
use crate::ocr::NO_TEXT_SENTINEL;

/// Per-region cache carried between scan cycles.
///
/// `selected` and `candidates` are only recomputed when `last_text` changes.
#[derive(Debug, Clone)]
pub struct RegionState {
    pub spec: RegionSpec,
    /// Text recognized on the previous cycle; `None` before the first cycle
    pub last_text: Option<String>,
    /// Candidate list from the last re-match
    pub candidates: Vec<MatchCandidate>,
    /// Resolved record, `None` meaning no confident match
    pub selected: Option<MatchCandidate>,
}

impl RegionState {
    pub fn new(spec: RegionSpec) -> Self {
        Self {
            spec,
            last_text: None,
            candidates: Vec::new(),
            selected: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// True if `text` differs from what was recognized last cycle.
    pub fn text_changed(&self, text: &str) -> bool {
        self.last_text.as_deref() != Some(text)
    }

    /// The text to show for this region.
    pub fn display_text(&self) -> &str {
        self.last_text.as_deref().unwrap_or(NO_TEXT_SENTINEL)
    }

    /// Whether the automatic pick may be overridden from the overlay.
    pub fn has_alternatives(&self) -> bool {
        self.selected.is_some() && self.candidates.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScreenRect;

    fn spec() -> RegionSpec {
        RegionSpec {
            name: "Event".to_string(),
            rect: ScreenRect { x: 0, y: 0, width: 10, height: 10 },
        }
    }

    #[test]
    fn test_new_state_treats_any_text_as_change() {
        let state = RegionState::new(spec());
        assert!(state.text_changed(NO_TEXT_SENTINEL));
        assert!(state.text_changed("EVENT1"));
        assert_eq!(state.display_text(), NO_TEXT_SENTINEL);
        assert!(!state.has_alternatives());
    }

    #[test]
    fn test_text_changed_compares_last_text() {
        let mut state = RegionState::new(spec());
        state.last_text = Some("EVENT1".to_string());
        assert!(!state.text_changed("EVENT1"));
        assert!(state.text_changed("EVENT2"));
    }
}
