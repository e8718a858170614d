#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    query: &'a str,
    text: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    // Excerpt windows are cut at byte offsets; they must land on char
    // boundaries whatever the text
    let snippet = pagesift::query::snippets(input.query, input.text);
    let _ = pagesift::query::score(input.query, &snippet);

    let terms: Vec<&str> = input.query.split_whitespace().collect();
    let (marked, _) = pagesift::query::highlight(input.query, &terms, input.text);
    assert!(marked.len() >= input.text.len());
});
