//! Text shown in the overlay.

use crate::matching::MatchCandidate;

pub const NO_MATCH_TEXT: &str = "No close match found";

/// Separator between region blocks in one overlay update.
pub const REGION_SEPARATOR: &str = "\n\n";

/// Renders a resolved record: breadcrumb header, blank line, numbered options.
pub fn format_result(selected: Option<&MatchCandidate>) -> String {
    let Some(candidate) = selected else {
        return NO_MATCH_TEXT.to_string();
    };

    let record = &candidate.record;
    let options = record
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| format!("Option {}: {}", i + 1, option))
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}\n\n{}", breadcrumb(candidate), options)
}

/// One region's block: `name: recognized text` followed by the result.
pub fn format_region(name: &str, detected: &str, selected: Option<&MatchCandidate>) -> String {
    format!("{}: {}\n{}", name, detected, format_result(selected))
}

/// Label used for a candidate in the choice prompt.
pub fn format_choice(candidate: &MatchCandidate) -> String {
    format!("{} (Score: {})", breadcrumb(candidate), candidate.score)
}

fn breadcrumb(candidate: &MatchCandidate) -> String {
    let record = &candidate.record;
    format!(
        "[{} > {} > {}]",
        record.category, record.subcategory, record.code
    )
}
