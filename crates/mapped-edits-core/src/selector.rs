//! Document selectors and the scoring rule used to match them.

use crate::uri::UriComponents;
use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Score for an exact language or scheme match, and for a matching pattern.
pub const SCORE_EXACT: u32 = 10;
/// Score for a `*` wildcard language or scheme.
pub const SCORE_WILDCARD: u32 = 5;

/// A path glob, either absolute or relative to a base folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GlobPattern {
    Pattern(String),
    Relative { base: String, pattern: String },
}

impl From<&str> for GlobPattern {
    fn from(pattern: &str) -> Self {
        Self::Pattern(pattern.to_string())
    }
}

/// One filter of a document selector.
///
/// Every constraint that is present must be satisfied; a filter with no
/// constraints matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<GlobPattern>,
}

impl DocumentFilter {
    /// Filter matching a language id (`"*"` for any language).
    pub fn language(language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            ..Default::default()
        }
    }

    /// Filter matching a URI scheme (`"*"` for any scheme).
    pub fn scheme(scheme: impl Into<String>) -> Self {
        Self {
            scheme: Some(scheme.into()),
            ..Default::default()
        }
    }

    /// Filter matching a path glob.
    pub fn pattern(pattern: impl Into<GlobPattern>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<GlobPattern>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}

enum PatternMatcher {
    Unconstrained,
    Glob {
        raw: String,
        base: Option<String>,
        matcher: GlobMatcher,
    },
    Invalid,
}

struct CompiledFilter {
    filter: DocumentFilter,
    pattern: PatternMatcher,
}

impl CompiledFilter {
    fn new(filter: DocumentFilter) -> Self {
        let pattern = match &filter.pattern {
            None => PatternMatcher::Unconstrained,
            Some(GlobPattern::Pattern(raw)) => compile(raw, None),
            Some(GlobPattern::Relative { base, pattern }) => {
                compile(pattern, Some(base.trim_end_matches('/').to_string()))
            }
        };
        Self { filter, pattern }
    }

    fn score(&self, uri: &UriComponents, language_id: &str) -> u32 {
        let mut ret = 0;

        if let Some(scheme) = &self.filter.scheme {
            if *scheme == uri.scheme {
                ret = SCORE_EXACT;
            } else if scheme == "*" {
                ret = SCORE_WILDCARD;
            } else {
                return 0;
            }
        }

        if let Some(language) = &self.filter.language {
            if language == language_id {
                ret = SCORE_EXACT;
            } else if language == "*" {
                ret = ret.max(SCORE_WILDCARD);
            } else {
                return 0;
            }
        }

        match &self.pattern {
            PatternMatcher::Unconstrained => {}
            PatternMatcher::Invalid => return 0,
            PatternMatcher::Glob { raw, base, matcher } => {
                let path = uri.decoded_path();
                let matched = match base {
                    None => *raw == path || matcher.is_match(&path),
                    Some(base) => path
                        .strip_prefix(base.as_str())
                        .and_then(|rest| rest.strip_prefix('/'))
                        .is_some_and(|rest| matcher.is_match(rest)),
                };
                if !matched {
                    return 0;
                }
                ret = SCORE_EXACT;
            }
        }

        ret
    }
}

fn compile(pattern: &str, base: Option<String>) -> PatternMatcher {
    match GlobBuilder::new(pattern).literal_separator(true).build() {
        Ok(glob) => PatternMatcher::Glob {
            raw: pattern.to_string(),
            base,
            matcher: glob.compile_matcher(),
        },
        Err(e) => {
            tracing::warn!(
                "invalid glob pattern {:?} in document selector: {}",
                pattern,
                e
            );
            PatternMatcher::Invalid
        }
    }
}

/// An ordered, immutable set of document filters ready for scoring.
///
/// Glob patterns are compiled once when the selector is built. A filter with
/// an invalid pattern is kept but never matches.
///
/// # Examples
///
/// ```
/// use mapped_edits_core::{DocumentFilter, DocumentSelector, UriComponents};
///
/// let selector = DocumentSelector::new(vec![
///     DocumentFilter::language("python"),
///     DocumentFilter::pattern("**/*.pyi"),
/// ]);
/// let uri = UriComponents::parse("file:///proj/app.py").unwrap();
///
/// assert_eq!(selector.score(&uri, "python"), 10);
/// assert_eq!(selector.score(&uri, "rust"), 0);
/// ```
pub struct DocumentSelector {
    filters: Vec<CompiledFilter>,
}

impl DocumentSelector {
    pub fn new(filters: Vec<DocumentFilter>) -> Self {
        Self {
            filters: filters.into_iter().map(CompiledFilter::new).collect(),
        }
    }

    /// The filters this selector was built from, in order.
    pub fn filters(&self) -> Vec<DocumentFilter> {
        self.filters.iter().map(|f| f.filter.clone()).collect()
    }

    /// Scores a document against this selector.
    ///
    /// The result is the best score of any filter; `0` means no match.
    pub fn score(&self, uri: &UriComponents, language_id: &str) -> u32 {
        let mut best = 0;
        for filter in &self.filters {
            best = best.max(filter.score(uri, language_id));
            if best == SCORE_EXACT {
                break;
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl From<Vec<DocumentFilter>> for DocumentSelector {
    fn from(filters: Vec<DocumentFilter>) -> Self {
        Self::new(filters)
    }
}

impl fmt::Debug for DocumentSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.filters.iter().map(|c| &c.filter))
            .finish()
    }
}
