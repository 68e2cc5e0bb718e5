use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the seven SNBT subtests the question bank is partitioned by.
///
/// Serialized with the full Indonesian subtest name so stored banks stay
/// readable and compatible with previously exported data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subject {
    #[serde(rename = "Penalaran Umum")]
    PenalaranUmum,
    #[serde(rename = "Pengetahuan Kuantitatif")]
    PengetahuanKuantitatif,
    #[serde(rename = "Literasi Bahasa Indonesia")]
    LiterasiIndonesia,
    #[serde(rename = "Literasi Bahasa Inggris")]
    LiterasiInggris,
    #[serde(rename = "Penalaran Matematika")]
    PenalaranMatematika,
    #[serde(rename = "Pengetahuan & Pemahaman Umum")]
    PengetahuanPemahamanUmum,
    #[serde(rename = "Pemahaman Bacaan & Menulis")]
    PemahamanBacaanMenulis,
}

impl Subject {
    /// All subjects in their canonical display order.
    pub const ALL: [Subject; 7] = [
        Subject::PenalaranUmum,
        Subject::PengetahuanKuantitatif,
        Subject::LiterasiIndonesia,
        Subject::LiterasiInggris,
        Subject::PenalaranMatematika,
        Subject::PengetahuanPemahamanUmum,
        Subject::PemahamanBacaanMenulis,
    ];

    /// Full subtest name as shown to students and sent to the tutor.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Subject::PenalaranUmum => "Penalaran Umum",
            Subject::PengetahuanKuantitatif => "Pengetahuan Kuantitatif",
            Subject::LiterasiIndonesia => "Literasi Bahasa Indonesia",
            Subject::LiterasiInggris => "Literasi Bahasa Inggris",
            Subject::PenalaranMatematika => "Penalaran Matematika",
            Subject::PengetahuanPemahamanUmum => "Pengetahuan & Pemahaman Umum",
            Subject::PemahamanBacaanMenulis => "Pemahaman Bacaan & Menulis",
        }
    }

    /// Short code used in charts and lesson ids.
    #[must_use]
    pub fn abbreviation(self) -> &'static str {
        match self {
            Subject::PenalaranUmum => "PU",
            Subject::PengetahuanKuantitatif => "PK",
            Subject::LiterasiIndonesia => "LBI",
            Subject::LiterasiInggris => "LBE",
            Subject::PenalaranMatematika => "PM",
            Subject::PengetahuanPemahamanUmum => "PPU",
            Subject::PemahamanBacaanMenulis => "PBM",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSubjectError {
    raw: String,
}

impl fmt::Display for ParseSubjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown subject: {}", self.raw)
    }
}

impl std::error::Error for ParseSubjectError {}

impl FromStr for Subject {
    type Err = ParseSubjectError;

    /// Accepts either the full name or the abbreviation, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Subject::ALL
            .into_iter()
            .find(|subject| {
                subject.name().eq_ignore_ascii_case(needle)
                    || subject.abbreviation().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| ParseSubjectError {
                raw: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_abbreviation() {
        assert_eq!("pk".parse::<Subject>().unwrap(), Subject::PengetahuanKuantitatif);
        assert_eq!(
            "Literasi Bahasa Inggris".parse::<Subject>().unwrap(),
            Subject::LiterasiInggris
        );
        assert!("Kimia".parse::<Subject>().is_err());
    }

    #[test]
    fn serializes_with_display_name() {
        let json = serde_json::to_string(&Subject::PengetahuanPemahamanUmum).unwrap();
        assert_eq!(json, "\"Pengetahuan & Pemahaman Umum\"");
    }

    #[test]
    fn abbreviations_are_unique() {
        let mut codes: Vec<_> = Subject::ALL.iter().map(|s| s.abbreviation()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), Subject::ALL.len());
    }
}
