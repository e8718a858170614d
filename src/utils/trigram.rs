use crate::index::types::{Trigram, bytes_to_trigram};
use crate::utils::tokenizer::fold_case;

/// Bitset for tracking which trigrams have been seen.
/// Uses 2MB to cover all 16M possible trigram values (24 bits).
struct TrigramBitset {
    bits: Vec<u64>,
}

impl TrigramBitset {
    #[inline]
    fn new() -> Self {
        // 16M trigrams / 64 bits per u64 = 262144 u64s = 2MB
        Self {
            bits: vec![0u64; 262144],
        }
    }

    /// Set a trigram. Returns true if it was already set.
    #[inline]
    fn test_and_set(&mut self, trigram: Trigram) -> bool {
        let idx = (trigram >> 6) as usize;
        let bit = 1u64 << (trigram & 63);
        let was_set = (self.bits[idx] & bit) != 0;
        self.bits[idx] |= bit;
        was_set
    }

    fn collect(&self) -> Vec<Trigram> {
        let mut result = Vec::with_capacity(4096);
        for (word_idx, &word) in self.bits.iter().enumerate() {
            if word == 0 {
                continue;
            }
            let base = (word_idx as u32) << 6;
            let mut w = word;
            while w != 0 {
                result.push(base | w.trailing_zeros());
                w &= w - 1; // clear lowest set bit
            }
        }
        result
    }
}

/// Content above this size deduplicates through the bitset instead of sorting
const BITSET_THRESHOLD: usize = 64 * 1024;

/// Extract the unique trigrams of raw bytes.
///
/// The result is unique but only sorted for small inputs.
pub fn extract_trigrams(content: &[u8]) -> Vec<Trigram> {
    if content.len() < 3 {
        return Vec::new();
    }

    if content.len() < BITSET_THRESHOLD {
        let mut trigrams: Vec<Trigram> = content
            .windows(3)
            .map(|w| bytes_to_trigram(w[0], w[1], w[2]))
            .collect();
        trigrams.sort_unstable();
        trigrams.dedup();
        return trigrams;
    }

    let mut bitset = TrigramBitset::new();
    for window in content.windows(3) {
        bitset.test_and_set(bytes_to_trigram(window[0], window[1], window[2]));
    }
    bitset.collect()
}

/// Trigrams of a document or query term, case-folded.
///
/// Indexing and lookup must both go through here so that a lower-cased
/// term is always a byte substring of the lower-cased content it matches.
pub fn text_trigrams(text: &str) -> Vec<Trigram> {
    extract_trigrams(fold_case(text).as_bytes())
}
