//! Output formatting for the command line

use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::query::SearchPage;

/// Trailer printed when later pages exist
pub const MORE_RESULTS: &str = "There are more results";

/// Print a result page as a Markdown list: `* [title](name) (score)`
pub fn write_results<W: Write>(out: &mut W, page: &SearchPage) -> io::Result<()> {
    for result in &page.results {
        writeln!(out, "* [{}]({}) ({})", result.title, result.name, result.score)?;
    }
    if page.has_more {
        writeln!(out, "{MORE_RESULTS}")?;
    }
    Ok(())
}

/// Print a result page as pretty JSON
pub fn write_json<W: Write>(out: &mut W, page: &SearchPage) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, page)?;
    writeln!(out)
}

/// `name<TAB>title` per document
pub fn write_titles<W: Write>(out: &mut W, titles: &BTreeMap<String, String>) -> io::Result<()> {
    for (name, title) in titles {
        writeln!(out, "{name}\t{title}")?;
    }
    Ok(())
}

/// `count<TAB>#tag` per hashtag, in the given order
pub fn write_hashtags<W: Write>(out: &mut W, counts: &[(String, usize)]) -> io::Result<()> {
    for (tag, count) in counts {
        writeln!(out, "{count}\t{tag}")?;
    }
    Ok(())
}
