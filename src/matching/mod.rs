//! Text normalization, fuzzy ranking and disambiguation.

pub mod disambiguation;
pub mod fuzzy;
pub mod normalize;

pub use disambiguation::resolve;
pub use fuzzy::{FuzzyMatcher, MatchCandidate};
pub use normalize::normalize;
