//! Corpus records and loading

pub mod corpus;
pub mod records;
pub mod reference;

pub use corpus::{load_csv, CorpusItem};
pub use records::{Ayah, Hadith};
pub use reference::VerseRef;
