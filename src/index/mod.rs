pub mod corpus;
pub mod store;
pub mod trigram_index;
pub mod types;

pub use corpus::Corpus;
pub use store::{CandidatePage, IndexStore, Update};
pub use trigram_index::TrigramIndex;
pub use types::*;
