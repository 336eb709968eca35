//! Client-side search over shows and episodes
//!
//! All matching is case-insensitive substring matching on a trimmed term.
//! Results are always a subsequence of the input, in input order.

use crate::catalog::{Episode, Show, strip_markup};

/// Trims and lowercases a search term.
pub fn normalize_term(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Returns the shows matching `term`.
///
/// A show matches if the term is empty, or appears in its name, in any of its
/// genres, or in its summary once markup is stripped.
pub fn filter_shows(shows: &[Show], term: &str) -> Vec<Show> {
    let term = normalize_term(term);
    if term.is_empty() {
        return shows.to_vec();
    }

    shows
        .iter()
        .filter(|show| show_matches(show, &term))
        .cloned()
        .collect()
}

/// Returns the episodes matching `term`.
///
/// An episode matches if the term is empty, or appears in its name or in its
/// raw summary text (markup included).
pub fn filter_episodes(episodes: &[Episode], term: &str) -> Vec<Episode> {
    let term = normalize_term(term);
    if term.is_empty() {
        return episodes.to_vec();
    }

    episodes
        .iter()
        .filter(|episode| episode_matches(episode, &term))
        .cloned()
        .collect()
}

/// `term` must already be normalized.
fn show_matches(show: &Show, term: &str) -> bool {
    contains_ignore_case(&show.name, term)
        || show.genres.iter().any(|genre| contains_ignore_case(genre, term))
        || show
            .summary
            .as_deref()
            .is_some_and(|summary| contains_ignore_case(&strip_markup(summary), term))
}

/// `term` must already be normalized.
fn episode_matches(episode: &Episode, term: &str) -> bool {
    contains_ignore_case(&episode.name, term)
        || episode
            .summary
            .as_deref()
            .is_some_and(|summary| contains_ignore_case(summary, term))
}

fn contains_ignore_case(haystack: &str, lowercase_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowercase_needle)
}
