//! Verse references extracted from free text

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::records::Ayah;

lazy_static! {
    static ref COLON_RE: Regex = Regex::new(r"\b(\d{1,3})\s*:\s*(\d{1,3})\b").unwrap();
    static ref NAMED_RE: Regex = Regex::new(
        r"(?i)\b(?:surah|surat|sura|chapter)\s+([\p{L}\d'\-]+(?:\s+[\p{L}'\-]+)?)[\s,]+(?:ayah|ayat|aya|verse)\s+(\d{1,3})\b"
    )
    .unwrap();
}

/// A surah/ayah pair; the surah may be a number or a name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerseRef {
    pub surah: String,
    pub ayah: u32,
}

impl VerseRef {
    /// Find the first verse reference in `text`.
    ///
    /// Recognises `2:255`, `surah 2 ayah 255`, `chapter 2 verse 255` and
    /// `surah al-baqarah verse 255`.
    pub fn parse(text: &str) -> Option<Self> {
        if let Some(caps) = NAMED_RE.captures(text) {
            let ayah = caps[2].parse().ok()?;
            return Some(Self {
                surah: caps[1].trim().to_string(),
                ayah,
            });
        }

        let caps = COLON_RE.captures(text)?;
        Some(Self {
            surah: caps[1].to_string(),
            ayah: caps[2].parse().ok()?,
        })
    }

    /// Whether this reference points at `ayah`.
    ///
    /// Numeric surahs compare by value, names compare case-insensitively and
    /// ignore a leading "al-".
    pub fn matches(&self, ayah: &Ayah) -> bool {
        if self.ayah != ayah.ayah {
            return false;
        }
        match (self.surah.parse::<u32>(), ayah.surah.trim().parse::<u32>()) {
            (Ok(a), Ok(b)) => a == b,
            _ => normalize_name(&self.surah) == normalize_name(&ayah.surah),
        }
    }
}

impl std::fmt::Display for VerseRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.surah, self.ayah)
    }
}

fn normalize_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let stripped = lower
        .strip_prefix("al-")
        .or_else(|| lower.strip_prefix("al "))
        .unwrap_or(&lower);
    stripped.replace(['-', '\'', ' '], "")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ayah(surah: &str, number: u32) -> Ayah {
        Ayah {
            surah: surah.to_string(),
            ayah: number,
            translation: String::new(),
        }
    }

    #[test]
    fn test_parse_colon_form() {
        let r = VerseRef::parse("please read 2:255 for me").unwrap();
        assert_eq!(r.surah, "2");
        assert_eq!(r.ayah, 255);
    }

    #[test]
    fn test_parse_named_forms() {
        let r = VerseRef::parse("What does Surah 18 ayah 10 say?").unwrap();
        assert_eq!(r, VerseRef { surah: "18".into(), ayah: 10 });

        let r = VerseRef::parse("chapter 2 verse 286").unwrap();
        assert_eq!(r, VerseRef { surah: "2".into(), ayah: 286 });

        let r = VerseRef::parse("recite surah Al-Baqarah verse 255").unwrap();
        assert_eq!(r, VerseRef { surah: "Al-Baqarah".into(), ayah: 255 });
    }

    #[test]
    fn test_parse_none() {
        assert!(VerseRef::parse("tell me about patience").is_none());
        assert!(VerseRef::parse("").is_none());
    }

    #[test]
    fn test_matches() {
        let by_number = VerseRef { surah: "002".into(), ayah: 255 };
        assert!(by_number.matches(&ayah("2", 255)));
        assert!(!by_number.matches(&ayah("2", 256)));
        assert!(!by_number.matches(&ayah("3", 255)));

        let by_name = VerseRef { surah: "al-baqarah".into(), ayah: 255 };
        assert!(by_name.matches(&ayah("Al-Baqarah", 255)));
        assert!(by_name.matches(&ayah("Baqarah", 255)));
        assert!(!by_name.matches(&ayah("2", 255)));
    }

    #[test]
    fn test_display() {
        assert_eq!(VerseRef { surah: "2".into(), ayah: 255 }.to_string(), "2:255");
    }
}
