use serde::{Deserialize, Serialize};

use super::corpus::CorpusItem;

/// One verse of the Quran with its English translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ayah {
    /// Surah number or name, as given by the source file
    #[serde(rename = "surahs")]
    pub surah: String,
    #[serde(rename = "ayahs")]
    pub ayah: u32,
    #[serde(rename = "ayahs-translation")]
    pub translation: String,
}

impl CorpusItem for Ayah {
    const CORPUS: &'static str = "quran";

    fn text(&self) -> &str {
        &self.translation
    }

    fn key(&self) -> String {
        format!("{}:{}", self.surah, self.ayah)
    }

    fn citation(&self) -> String {
        format!("Surah {} - Ayat {}", self.surah, self.ayah)
    }
}

/// One hadith record with its English text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hadith {
    pub source: String,
    pub hadith_no: String,
    #[serde(rename = "text_en")]
    pub text: String,
}

impl CorpusItem for Hadith {
    const CORPUS: &'static str = "hadith";

    fn text(&self) -> &str {
        &self.text
    }

    fn key(&self) -> String {
        format!("{}#{}", self.source, self.hadith_no)
    }

    fn citation(&self) -> String {
        format!("Source: {}, Hadith No: {}", self.source, self.hadith_no)
    }
}
