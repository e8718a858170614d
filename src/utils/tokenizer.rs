/// Terms of this many characters or fewer are dropped (acronyms excepted)
const MIN_TERM_CHARS: usize = 3;

/// A term boundary is anything other than a letter, a digit or `#`
#[inline]
fn is_term_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '#'
}

fn raw_terms(text: &str) -> impl Iterator<Item = &str> {
    text.split(|ch: char| !is_term_char(ch))
        .filter(|term| !term.is_empty())
}

/// Three upper-case characters, e.g. "CHF" or "USA"
fn is_acronym(term: &str) -> bool {
    term.chars().count() == MIN_TERM_CHARS && term.chars().all(char::is_uppercase)
}

/// Lower-case `text` one char at a time.
///
/// Unlike `str::to_lowercase` this ignores word context, so a word folds the
/// same whether it stands alone or inside a document. Final sigma is folded
/// to `σ`, matching the case-insensitive matcher which treats them alike.
pub fn fold_case(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|ch| if ch == 'ς' { 'σ' } else { ch })
        .collect()
}

/// Split text into normalized index terms.
///
/// Hashtags stay single terms. Short words are dropped unless they are
/// three-letter acronyms; survivors are lower-cased.
pub fn tokens(text: &str) -> Vec<String> {
    raw_terms(text)
        .filter(|term| term.chars().count() > MIN_TERM_CHARS || is_acronym(term))
        .map(fold_case)
        .collect()
}

/// Extract the distinct hashtags of a text, lower-cased, in order of first use
pub fn hashtags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for term in raw_terms(text) {
        let mut chars = term.chars();
        if chars.next() != Some('#') || !chars.next().is_some_and(char::is_alphanumeric) {
            continue;
        }
        let tag = fold_case(term);
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}
