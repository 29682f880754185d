//! Picks the single provider that handles a request.

use crate::selector::DocumentSelector;
use crate::uri::UriComponents;

/// Scores every candidate against the document and returns the best one.
///
/// Candidates scoring `0` are discarded. Among the rest the highest score
/// wins; ties go to the candidate that comes first in `candidates`, so
/// callers pass candidates in registration order. Returns `None` when
/// nothing matches.
///
/// # Examples
///
/// ```
/// use mapped_edits_core::{DocumentFilter, DocumentSelector, UriComponents, select};
///
/// let python = DocumentSelector::new(vec![DocumentFilter::language("python")]);
/// let any = DocumentSelector::new(vec![DocumentFilter::language("*")]);
/// let uri = UriComponents::parse("file:///app/main.py").unwrap();
///
/// let chosen = select(vec![(&any, "any"), (&python, "python")], &uri, "python");
/// assert_eq!(chosen, Some("python"));
///
/// let chosen = select(vec![(&python, "python")], &uri, "rust");
/// assert_eq!(chosen, None);
/// ```
pub fn select<'a, T>(
    candidates: impl IntoIterator<Item = (&'a DocumentSelector, T)>,
    uri: &UriComponents,
    language_id: &str,
) -> Option<T> {
    let mut scored: Vec<(u32, T)> = candidates
        .into_iter()
        .map(|(selector, candidate)| (selector.score(uri, language_id), candidate))
        .filter(|(score, _)| *score > 0)
        .collect();

    // stable: equal scores keep their input order
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let (score, best) = scored.into_iter().next()?;
    tracing::debug!("selected provider with score {} for {}", score, uri);
    Some(best)
}
