#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    for token in pagesift::utils::tokens(&text) {
        // Every kept term yields trigrams, so it narrows candidates
        assert!(!pagesift::utils::text_trigrams(&token).is_empty());
    }
    let _ = pagesift::utils::hashtags(&text);
    let _ = pagesift::utils::extract_trigrams(data);
});
