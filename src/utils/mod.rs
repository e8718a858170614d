//! Text utilities shared by the index and the query side.
//!
//! - [`tokenizer`] - query/index terms and hashtags
//! - [`trigram`] - 3-byte sequence extraction for the trigram index
//!
//! ```
//! use pagesift::utils::{text_trigrams, tokens};
//!
//! assert_eq!(tokens("This is a test of CHF"), vec!["this", "test", "chf"]);
//! assert_eq!(text_trigrams("Hello").len(), 3); // "hel", "ell", "llo"
//! ```

pub mod tokenizer;
pub mod trigram;

pub use tokenizer::*;
pub use trigram::*;
