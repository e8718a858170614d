//! Relevance scoring for search results
//!
//! A score is a plain integer built from two sources:
//! - every case-insensitive occurrence of the whole query adds 1
//! - every occurrence of a whitespace-separated query term adds 1, plus 1
//!   for a word boundary at its start, 1 for one at its end and 1 more
//!   when it is a whole word
//!
//! A word boundary is the edge of the text or a neighbour that is not a
//! Unicode letter. A score of 0 means the text does not match at all.

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::error::Result;
use crate::utils::fold_case;

/// Compiled form of the query, built once and applied to many texts
#[derive(Debug, Clone)]
enum Matcher {
    Pattern {
        full: Option<Regex>,
        terms: Vec<Regex>,
    },
    /// Plain lower-cased substring counting, used when compilation fails
    Literal { full: String, terms: Vec<String> },
}

/// Scorer calculates relevance scores of texts for one query
#[derive(Debug, Clone)]
pub struct Scorer {
    matcher: Matcher,
}

impl Scorer {
    /// Compile a scorer, falling back to literal matching on failure
    pub fn new(query: &str) -> Self {
        Self::compile(query).unwrap_or_else(|err| {
            warn!(query, error = %err, "query pattern rejected, using literal matching");
            Self::literal(query)
        })
    }

    /// Compile a scorer, surfacing pattern errors
    pub fn compile(query: &str) -> Result<Self> {
        let query = query.trim();
        let full = if query.is_empty() {
            None
        } else {
            Some(literal_pattern(query)?)
        };
        let terms = query
            .split_whitespace()
            .map(literal_pattern)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            matcher: Matcher::Pattern { full, terms },
        })
    }

    /// A scorer that only counts lower-cased substrings
    pub fn literal(query: &str) -> Self {
        let query = fold_case(query.trim());
        let terms = query.split_whitespace().map(str::to_string).collect();
        Self {
            matcher: Matcher::Literal { full: query, terms },
        }
    }

    /// Calculate the score of `text`
    pub fn score(&self, text: &str) -> u32 {
        match &self.matcher {
            Matcher::Pattern { full, terms } => {
                let mut score = full
                    .as_ref()
                    .map_or(0, |re| re.find_iter(text).count() as u32);
                for term in terms {
                    score += term
                        .find_iter(text)
                        .map(|m| occurrence_score(text, m.start(), m.end()))
                        .sum::<u32>();
                }
                score
            }
            Matcher::Literal { full, terms } => {
                if full.is_empty() {
                    return 0;
                }
                let lower = fold_case(text);
                let mut score = lower.matches(full.as_str()).count() as u32;
                for term in terms {
                    score += lower.matches(term.as_str()).count() as u32;
                }
                score
            }
        }
    }
}

/// Case-insensitive regex matching `literal` verbatim
pub(crate) fn literal_pattern(literal: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(&regex::escape(literal))
        .case_insensitive(true)
        .build()
}

/// Points for a single term occurrence at `start..end` of `text`
fn occurrence_score(text: &str, start: usize, end: usize) -> u32 {
    let starts_word = text[..start]
        .chars()
        .next_back()
        .is_none_or(|ch| !ch.is_alphabetic());
    let ends_word = text[end..]
        .chars()
        .next()
        .is_none_or(|ch| !ch.is_alphabetic());

    let mut score = 1;
    if starts_word {
        score += 1;
    }
    if ends_word {
        score += 1;
    }
    if starts_word && ends_word {
        score += 1;
    }
    score
}

/// Score `text` for `query`; see the module docs for the rules
pub fn score(query: &str, text: &str) -> u32 {
    Scorer::new(query).score(text)
}
