//! Highlighting and excerpt extraction for result previews

use regex::{Captures, Regex, RegexBuilder};
use tracing::debug;

use crate::error::Result;
use crate::query::scorer::Scorer;

/// Markers wrapped around every match
pub const MARK_START: &str = "<b>";
pub const MARK_END: &str = "</b>";

// Lengths below are counted in chars

/// Texts shorter than this are shown whole
const SHORT_TEXT_LEN: usize = 100;

/// Hard cap for texts that are shown whole
pub(crate) const MAX_TEXT_LEN: usize = 400;

/// Excerpts taken after the leading one
const MAX_EXCERPTS: usize = 4;

/// Context kept on either side of a match
const EXCERPT_HALF_WIDTH: usize = 50;

const ELLIPSIS: &str = " … ";

/// Marks the query and its terms in texts and extracts excerpts around them
#[derive(Debug, Clone)]
pub struct Highlighter {
    /// `None` for an empty query, which marks nothing
    pattern: Option<Regex>,
    scorer: Scorer,
}

impl Highlighter {
    /// Highlighter for the whole query and its whitespace-separated terms
    pub fn new(query: &str) -> Result<Self> {
        let terms: Vec<&str> = query.split_whitespace().collect();
        Self::with_terms(query, &terms)
    }

    pub fn with_terms<S: AsRef<str>>(query: &str, terms: &[S]) -> Result<Self> {
        let mut alternatives: Vec<String> = std::iter::once(query)
            .chain(terms.iter().map(|t| t.as_ref()))
            .map(|alt| alt.trim().to_lowercase())
            .filter(|alt| !alt.is_empty())
            .collect();
        // Longest first, so an alternation never stops inside a longer match
        alternatives.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        alternatives.dedup();

        let pattern = if alternatives.is_empty() {
            None
        } else {
            let source = alternatives
                .iter()
                .map(|alt| regex::escape(alt))
                .collect::<Vec<_>>()
                .join("|");
            Some(RegexBuilder::new(&source).case_insensitive(true).build()?)
        };
        Ok(Self {
            pattern,
            scorer: Scorer::compile(query)?,
        })
    }

    /// Wrap every match in `text` with the emphasis markers
    pub fn mark(&self, text: &str) -> String {
        match &self.pattern {
            Some(pattern) => pattern
                .replace_all(text, |caps: &Captures| {
                    format!("{MARK_START}{}{MARK_END}", &caps[0])
                })
                .into_owned(),
            None => text.to_string(),
        }
    }

    /// Marked-up text together with its score
    pub fn highlight(&self, text: &str) -> (String, u32) {
        (self.mark(text), self.scorer.score(text))
    }

    /// Excerpt `text` around the matches and highlight the excerpt
    pub fn snippets(&self, text: &str) -> String {
        if text.chars().nth(SHORT_TEXT_LEN - 1).is_none() {
            return self.mark(truncate(text, MAX_TEXT_LEN));
        }

        let lead_end = last_break_before(text, forward(text, 0, SHORT_TEXT_LEN));
        let mut excerpt = text[..lead_end].trim_end().to_string();
        let mut pos = lead_end;

        for _ in 0..MAX_EXCERPTS {
            let Some(found) = self.pattern.as_ref().and_then(|p| p.find_at(text, pos)) else {
                break;
            };
            let start = word_start(text, back(text, found.start(), EXCERPT_HALF_WIDTH)).max(pos);
            let end = word_end(text, forward(text, found.end(), EXCERPT_HALF_WIDTH));
            excerpt.push_str(ELLIPSIS);
            excerpt.push_str(text[start..end].trim());
            pos = end;
            if pos >= text.len() {
                break;
            }
        }

        if !text[pos..].trim().is_empty() {
            excerpt.push_str(ELLIPSIS.trim_end());
        }
        self.mark(&excerpt)
    }
}

/// Mark the query and `terms` in `text`; also returns the text's score
pub fn highlight<S: AsRef<str>>(query: &str, terms: &[S], text: &str) -> (String, u32) {
    match Highlighter::with_terms(query, terms) {
        Ok(highlighter) => highlighter.highlight(text),
        Err(err) => {
            debug!(query, error = %err, "highlighting skipped");
            (text.to_string(), Scorer::literal(query).score(text))
        }
    }
}

/// Highlighted excerpts of `text` for `query`.
///
/// Falls back to plain truncation when the query cannot be compiled.
pub fn snippets(query: &str, text: &str) -> String {
    match Highlighter::new(query) {
        Ok(highlighter) => highlighter.snippets(text),
        Err(err) => {
            debug!(query, error = %err, "snippets fall back to truncation");
            truncate(text, MAX_TEXT_LEN).to_string()
        }
    }
}

/// At most `max` chars of `text`
pub(crate) fn truncate(text: &str, max: usize) -> &str {
    &text[..forward(text, 0, max)]
}

/// Byte index `chars` chars after `from`, or the end of the text
fn forward(text: &str, from: usize, chars: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(offset, _)| from + offset)
}

/// Byte index `chars` chars before `from`, or 0
fn back(text: &str, from: usize, chars: usize) -> usize {
    if chars == 0 {
        return from;
    }
    text[..from]
        .char_indices()
        .rev()
        .nth(chars - 1)
        .map_or(0, |(idx, _)| idx)
}

/// Position of the last whitespace before byte index `limit`, or `limit`
fn last_break_before(text: &str, limit: usize) -> usize {
    text[..limit]
        .rfind(char::is_whitespace)
        .filter(|&idx| idx > 0)
        .unwrap_or(limit)
}

/// Move `idx` back to the start of the word it falls in
fn word_start(text: &str, idx: usize) -> usize {
    text[..idx]
        .char_indices()
        .rev()
        .find(|(_, ch)| ch.is_whitespace())
        .map_or(0, |(i, ch)| i + ch.len_utf8())
}

/// Move `idx` forward to the end of the word it falls in
fn word_end(text: &str, idx: usize) -> usize {
    text[idx..]
        .find(char::is_whitespace)
        .map_or(text.len(), |offset| idx + offset)
}
