//! Canonical key form shared by reference codes and recognized text.

/// Characters dropped from a key in addition to whitespace.
const STRIPPED_CHARS: [char; 3] = ['(', ')', '-'];

/// Normalizes raw text into the key space used by the dataset index.
///
/// Uppercases, then drops every whitespace character along with `(`, `)`
/// and `-`. Applying it twice gives the same result as applying it once.
pub fn normalize(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !STRIPPED_CHARS.contains(c))
        .flat_map(char::to_uppercase)
        .collect()
}
