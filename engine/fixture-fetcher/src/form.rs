//! Recent-form classification
//!
//! Turns a team's finished matches into a W/L/D sequence. Results are always
//! taken from the queried team's side of the scoreline, whichever venue it
//! played at.

use crate::models::{ApiMatch, FormResult};

/// Number of results kept in a form sequence
pub const FORM_LENGTH: usize = 5;

/// Result for a team that scored `scored` and conceded `conceded`
pub fn result_from_goals(scored: u32, conceded: u32) -> FormResult {
    match scored.cmp(&conceded) {
        std::cmp::Ordering::Greater => FormResult::Win,
        std::cmp::Ordering::Less => FormResult::Loss,
        std::cmp::Ordering::Equal => FormResult::Draw,
    }
}

/// Result of one historical match for `team_id`.
///
/// Returns `None` when either full-time goal count is missing. A team that
/// is not the listed home side is treated as the away side.
pub fn classify_match(team_id: u64, historical: &ApiMatch) -> Option<FormResult> {
    let goals = historical.score.full_time;
    let (home, away) = (goals.home?, goals.away?);

    if historical.home_team.id == Some(team_id) {
        Some(result_from_goals(home, away))
    } else {
        Some(result_from_goals(away, home))
    }
}

/// Form sequence for `team_id`, in the order the history was given
/// (most recent first), capped at [`FORM_LENGTH`].
pub fn classify_form(team_id: u64, history: &[ApiMatch]) -> Vec<FormResult> {
    history
        .iter()
        .filter_map(|m| classify_match(team_id, m))
        .take(FORM_LENGTH)
        .collect()
}
