//! Region scan loop - capture, recognize, match, present.
//!
//! One background thread walks the configured regions in order every cycle.
//! Matching only runs for a region whose recognized text changed since the
//! previous cycle; otherwise the cached selection is shown again.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::capture::ScreenCapture;
use crate::config::{AppConfig, RegionSpec};
use crate::dataset::DatasetIndex;
use crate::matching::{resolve, FuzzyMatcher, MatchCandidate};
use crate::ocr::{read_region, Recognizer, NO_TEXT_SENTINEL};

use super::format::{format_choice, format_region, REGION_SEPARATOR};
use super::sink::{PresentationSink, ScanCommand};
use super::state::RegionState;

/// Timing and tuning for the scan loop.
#[derive(Debug, Clone, Copy)]
pub struct ScanSettings {
    pub interval: Duration,
    pub startup_delay: Duration,
    pub binarize_threshold: u8,
    pub matcher: FuzzyMatcher,
}

impl ScanSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            interval: config.scan_interval(),
            startup_delay: config.startup_delay(),
            binarize_threshold: config.binarize_threshold,
            matcher: FuzzyMatcher::new(config.min_score, config.candidate_limit),
        }
    }
}

/// The scan loop and everything it owns.
pub struct ScanLoop<C, R, S> {
    states: Vec<RegionState>,
    index: Arc<DatasetIndex>,
    settings: ScanSettings,
    capture: C,
    recognizer: R,
    sink: S,
    commands: Receiver<ScanCommand>,
    /// Number of times matching has run (for diagnostics)
    rematches: u64,
}

impl<C, R, S> ScanLoop<C, R, S>
where
    C: ScreenCapture,
    R: Recognizer,
    S: PresentationSink,
{
    pub fn new(
        regions: Vec<RegionSpec>,
        index: Arc<DatasetIndex>,
        settings: ScanSettings,
        capture: C,
        recognizer: R,
        sink: S,
        commands: Receiver<ScanCommand>,
    ) -> Self {
        Self {
            states: regions.into_iter().map(RegionState::new).collect(),
            index,
            settings,
            capture,
            recognizer,
            sink,
            commands,
            rematches: 0,
        }
    }

    /// Runs forever: one cycle, then wait out the interval while serving
    /// overlay commands.
    pub fn run(mut self) -> ! {
        crate::log(&format!(
            "Scan loop started: {} region(s), interval {:?}",
            self.states.len(),
            self.settings.interval
        ));
        std::thread::sleep(self.settings.startup_delay);

        loop {
            self.run_cycle();
            self.wait(self.settings.interval);
        }
    }

    /// Scans every region once in configured order and pushes a single
    /// update to the sink. Returns the text that was displayed.
    pub fn run_cycle(&mut self) -> String {
        self.drain_commands();

        for i in 0..self.states.len() {
            self.scan_region(i);
        }

        self.publish()
    }

    /// Waits for `duration`, handling any commands that arrive meanwhile.
    pub fn wait(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;

        loop {
            let now = Instant::now();
            if now >= deadline {
                return;
            }

            match self.commands.recv_timeout(deadline - now) {
                Ok(command) => self.handle_command(command),
                Err(RecvTimeoutError::Timeout) => return,
                Err(RecvTimeoutError::Disconnected) => {
                    // Overlay gone; nothing left to serve
                    std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
                    return;
                }
            }
        }
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            self.handle_command(command);
        }
    }

    /// Applies one overlay command.
    pub fn handle_command(&mut self, command: ScanCommand) {
        match command {
            ScanCommand::ChooseAlternative { region } => self.choose_alternative(&region),
        }
    }

    fn choose_alternative(&mut self, region: &str) {
        let Some(state) = self.states.iter_mut().find(|s| s.name() == region) else {
            crate::log(&format!("Alternative requested for unknown region: {}", region));
            return;
        };

        if state.candidates.is_empty() {
            crate::log(&format!("{}: no candidates to choose from", region));
            return;
        }

        crate::log(&format!(
            "{}: offering {} alternative(s)",
            region,
            state.candidates.len()
        ));

        match self.sink.request_choice(&state.candidates) {
            Some(choice) => {
                crate::log(&format!("{}: user chose {}", region, format_choice(&choice)));
                state.selected = Some(choice);
                self.publish();
            }
            None => {
                crate::log(&format!("{}: alternative dismissed, keeping selection", region));
            }
        }
    }

    fn scan_region(&mut self, i: usize) {
        let rect = self.states[i].spec.rect;
        let text = match self.capture.capture(&rect) {
            Ok(img) => read_region(&self.recognizer, &img, self.settings.binarize_threshold),
            Err(e) => {
                crate::log(&format!("{}: capture failed: {}", self.states[i].name(), e));
                NO_TEXT_SENTINEL.to_string()
            }
        };

        let state = &mut self.states[i];
        if !state.text_changed(&text) {
            return;
        }

        crate::log(&format!(
            "{}: text changed {:?} -> {:?}",
            state.name(),
            state.last_text.as_deref().unwrap_or(""),
            text
        ));

        let candidates = if text == NO_TEXT_SENTINEL {
            Vec::new()
        } else {
            self.rematches += 1;
            self.settings.matcher.rank_candidates(&text, &self.index)
        };

        let sink = &self.sink;
        let name = state.spec.name.as_str();
        let selected = resolve(&candidates, |offered: &[MatchCandidate]| {
            crate::log(&format!(
                "{}: {} identical candidates, asking user",
                name,
                offered.len()
            ));
            let choice = sink.request_choice(offered);
            if choice.is_none() {
                crate::log(&format!("{}: choice dismissed", name));
            }
            choice
        });

        match &selected {
            Some(choice) => crate::log(&format!("{}: matched {}", name, format_choice(choice))),
            None => crate::log(&format!("{}: no match", name)),
        }

        state.last_text = Some(text);
        state.candidates = candidates;
        state.selected = selected;
    }

    /// Renders all regions as one region-delimited block.
    pub fn render(&self) -> String {
        self.states
            .iter()
            .map(|s| format_region(s.name(), s.display_text(), s.selected.as_ref()))
            .collect::<Vec<_>>()
            .join(REGION_SEPARATOR)
    }

    fn publish(&self) -> String {
        let text = self.render();
        self.sink.display_block(&text);

        let offered: Vec<String> = self
            .states
            .iter()
            .filter(|s| s.has_alternatives())
            .map(|s| s.name().to_string())
            .collect();
        self.sink.offer_alternatives(&offered);

        text
    }

    pub fn states(&self) -> &[RegionState] {
        &self.states
    }

    pub fn rematch_count(&self) -> u64 {
        self.rematches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScreenRect;
    use crate::scan::format::format_result;
    use anyhow::{anyhow, Result};
    use image::{ImageBuffer, Luma, Rgba};
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::sync::mpsc::{channel, Sender};

    /// Blank capture; fails for regions placed at x = -1.
    struct StubCapture;

    impl ScreenCapture for StubCapture {
        fn capture(&self, rect: &ScreenRect) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
            if rect.x == -1 {
                return Err(anyhow!("capture unavailable"));
            }
            Ok(ImageBuffer::new(rect.width, rect.height))
        }
    }

    /// Returns scripted texts in call order.
    struct ScriptedRecognizer {
        texts: RefCell<VecDeque<&'static str>>,
    }

    impl ScriptedRecognizer {
        fn new(texts: &[&'static str]) -> Self {
            Self {
                texts: RefCell::new(texts.iter().copied().collect()),
            }
        }
    }

    impl Recognizer for ScriptedRecognizer {
        fn recognize(&self, _img: &ImageBuffer<Luma<u8>, Vec<u8>>) -> Result<String> {
            self.texts
                .borrow_mut()
                .pop_front()
                .map(str::to_string)
                .ok_or_else(|| anyhow!("script exhausted"))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        answer: Option<usize>,
        displays: RefCell<Vec<String>>,
        choices: RefCell<Vec<Vec<String>>>,
        offered: RefCell<Vec<Vec<String>>>,
    }

    impl PresentationSink for RecordingSink {
        fn display_block(&self, text: &str) {
            self.displays.borrow_mut().push(text.to_string());
        }

        fn request_choice(&self, candidates: &[MatchCandidate]) -> Option<MatchCandidate> {
            self.choices
                .borrow_mut()
                .push(candidates.iter().map(|c| c.code().to_string()).collect());
            self.answer.and_then(|i| candidates.get(i).cloned())
        }

        fn offer_alternatives(&self, regions: &[String]) {
            self.offered.borrow_mut().push(regions.to_vec());
        }
    }

    fn region(name: &str, x: i32) -> RegionSpec {
        RegionSpec {
            name: name.to_string(),
            rect: ScreenRect { x, y: 0, width: 8, height: 8 },
        }
    }

    fn settings() -> ScanSettings {
        ScanSettings {
            interval: Duration::from_millis(10),
            startup_delay: Duration::ZERO,
            binarize_threshold: 125,
            matcher: FuzzyMatcher::default(),
        }
    }

    fn event_index() -> Arc<DatasetIndex> {
        Arc::new(
            DatasetIndex::build(&json!({
                "supports": {
                    "charA": {
                        "EVENT1": ["opt1", "opt2"],
                        "Festival Fun": ["Energy +20"],
                        "Festival Run": ["Guts +5"]
                    }
                }
            }))
            .unwrap(),
        )
    }

    fn scan_loop(
        regions: Vec<RegionSpec>,
        texts: &[&'static str],
        sink: RecordingSink,
    ) -> (
        ScanLoop<StubCapture, ScriptedRecognizer, RecordingSink>,
        Sender<ScanCommand>,
    ) {
        let (tx, rx) = channel();
        let scan = ScanLoop::new(
            regions,
            event_index(),
            settings(),
            StubCapture,
            ScriptedRecognizer::new(texts),
            sink,
            rx,
        );
        (scan, tx)
    }

    #[test]
    fn test_end_to_end_format() {
        let (mut scan, _tx) = scan_loop(vec![region("Event", 0)], &["event1\n"], RecordingSink::default());

        let block = scan.run_cycle();

        let selected = scan.states()[0].selected.as_ref().unwrap();
        assert_eq!(
            format_result(Some(selected)),
            "[supports > charA > EVENT1]\n\nOption 1: opt1\nOption 2: opt2"
        );
        assert_eq!(
            block,
            "Event: EVENT1\n[supports > charA > EVENT1]\n\nOption 1: opt1\nOption 2: opt2"
        );
        assert_eq!(scan.sink.displays.borrow().as_slice(), &[block]);
    }

    #[test]
    fn test_unchanged_text_skips_matching() {
        let (mut scan, _tx) = scan_loop(
            vec![region("Event", 0)],
            &["EVENT1", "EVENT1"],
            RecordingSink::default(),
        );

        scan.run_cycle();
        let first = scan.states()[0].selected.clone();
        scan.run_cycle();

        assert_eq!(scan.rematch_count(), 1);
        assert_eq!(scan.states()[0].selected, first);
        assert_eq!(scan.sink.displays.borrow().len(), 2);
    }

    #[test]
    fn test_changed_text_rematches() {
        let (mut scan, _tx) = scan_loop(
            vec![region("Event", 0)],
            &["EVENT1", "QQQQQQ"],
            RecordingSink::default(),
        );

        scan.run_cycle();
        assert!(scan.states()[0].selected.is_some());

        let block = scan.run_cycle();
        assert_eq!(scan.rematch_count(), 2);
        assert!(scan.states()[0].selected.is_none());
        assert_eq!(block, "Event: QQQQQQ\nNo close match found");
    }

    #[test]
    fn test_failed_region_does_not_affect_others() {
        let (mut scan, _tx) = scan_loop(
            vec![region("Broken", -1), region("Event", 0)],
            &["EVENT1"],
            RecordingSink::default(),
        );

        let block = scan.run_cycle();

        assert_eq!(
            block,
            "Broken: [No text detected]\nNo close match found\n\n\
             Event: EVENT1\n[supports > charA > EVENT1]\n\nOption 1: opt1\nOption 2: opt2"
        );
        // The sentinel is never matched
        assert_eq!(scan.rematch_count(), 1);
    }

    #[test]
    fn test_close_candidates_auto_select_and_offer_alternative() {
        let (mut scan, _tx) = scan_loop(
            vec![region("Event", 0)],
            &["FESTIVAL XUN"],
            RecordingSink::default(),
        );

        scan.run_cycle();

        let state = &scan.states()[0];
        assert_eq!(state.candidates.len(), 2);
        assert_eq!(state.selected.as_ref().unwrap().code(), "FESTIVALFUN");
        assert!(scan.sink.choices.borrow().is_empty());
        assert_eq!(
            scan.sink.offered.borrow().last().unwrap(),
            &vec!["Event".to_string()]
        );
    }

    #[test]
    fn test_choose_alternative_overrides_selection() {
        let sink = RecordingSink {
            answer: Some(1),
            ..Default::default()
        };
        let (mut scan, tx) = scan_loop(vec![region("Event", 0)], &["FESTIVAL XUN"], sink);

        scan.run_cycle();
        tx.send(ScanCommand::ChooseAlternative {
            region: "Event".to_string(),
        })
        .unwrap();
        scan.wait(Duration::from_millis(20));

        assert_eq!(
            scan.sink.choices.borrow().as_slice(),
            &[vec!["FESTIVALFUN".to_string(), "FESTIVALRUN".to_string()]]
        );
        assert_eq!(
            scan.states()[0].selected.as_ref().unwrap().code(),
            "FESTIVALRUN"
        );
        // Override re-publishes immediately
        assert_eq!(scan.sink.displays.borrow().len(), 2);
        assert!(scan.sink.displays.borrow()[1].contains("FESTIVALRUN"));
    }

    #[test]
    fn test_dismissed_alternative_keeps_selection() {
        let (mut scan, _tx) = scan_loop(
            vec![region("Event", 0)],
            &["FESTIVAL XUN"],
            RecordingSink::default(),
        );

        scan.run_cycle();
        scan.handle_command(ScanCommand::ChooseAlternative {
            region: "Event".to_string(),
        });

        assert_eq!(scan.sink.choices.borrow().len(), 1);
        assert_eq!(
            scan.states()[0].selected.as_ref().unwrap().code(),
            "FESTIVALFUN"
        );
        assert_eq!(scan.sink.displays.borrow().len(), 1);
    }

    #[test]
    fn test_alternative_for_unknown_or_empty_region_is_ignored() {
        let (mut scan, _tx) = scan_loop(vec![region("Event", 0)], &["QQQQQQ"], RecordingSink::default());

        scan.run_cycle();
        scan.handle_command(ScanCommand::ChooseAlternative {
            region: "Event".to_string(),
        });
        scan.handle_command(ScanCommand::ChooseAlternative {
            region: "Missing".to_string(),
        });

        assert!(scan.sink.choices.borrow().is_empty());
    }

    #[test]
    fn test_wait_returns_when_commands_disconnected() {
        let (mut scan, tx) = scan_loop(vec![region("Event", 0)], &[], RecordingSink::default());
        drop(tx);

        let start = Instant::now();
        scan.wait(Duration::from_millis(20));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
