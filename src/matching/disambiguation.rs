//! Picks one candidate out of a ranked list, asking the user when the
//! ranking alone cannot tell the candidates apart.

use super::fuzzy::MatchCandidate;

/// What to do with a ranked candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Nothing cleared the threshold
    NoMatch,
    /// Take the candidate at this position without asking
    Auto(usize),
    /// Every candidate is the same code with the same score; ask the user
    AskUser,
}

/// Classifies a ranked candidate list.
pub fn decide(candidates: &[MatchCandidate]) -> Decision {
    match candidates {
        [] => Decision::NoMatch,
        [_] => Decision::Auto(0),
        [first, rest @ ..] if rest.iter().all(|c| c.same_as(first)) => Decision::AskUser,
        _ => Decision::Auto(0),
    }
}

/// Resolves a ranked candidate list to a single selection.
///
/// `ask` is only called for [`Decision::AskUser`]; it blocks until the user
/// picks a candidate or dismisses the prompt (`None`).
pub fn resolve<F>(candidates: &[MatchCandidate], ask: F) -> Option<MatchCandidate>
where
    F: FnOnce(&[MatchCandidate]) -> Option<MatchCandidate>,
{
    match decide(candidates) {
        Decision::NoMatch => None,
        Decision::Auto(i) => candidates.get(i).cloned(),
        Decision::AskUser => ask(candidates),
    }
}
