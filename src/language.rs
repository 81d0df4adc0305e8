//! The fixed set of languages the site is published in.

use crate::error::TranscacheError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ko,
    En,
    Ja,
    Zh,
}

impl Language {
    /// Language content is authored in.
    pub const SOURCE: Language = Language::Ko;

    /// Every supported language, source first.
    pub const ALL: [Language; 4] = [Language::Ko, Language::En, Language::Ja, Language::Zh];

    /// Every supported language except the source.
    pub fn targets() -> impl Iterator<Item = Language> {
        Self::ALL.into_iter().filter(|l| !l.is_source())
    }

    pub fn is_source(self) -> bool {
        self == Self::SOURCE
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::Ko => "ko",
            Language::En => "en",
            Language::Ja => "ja",
            Language::Zh => "zh",
        }
    }

    /// Human-readable name, used when prompting the model.
    pub fn name(self) -> &'static str {
        match self {
            Language::Ko => "Korean",
            Language::En => "English",
            Language::Ja => "Japanese",
            Language::Zh => "Simplified Chinese",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = TranscacheError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        // Accept region-tagged codes like "en-US" or "zh_CN".
        let primary = s
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match primary.as_str() {
            "ko" => Ok(Language::Ko),
            "en" => Ok(Language::En),
            "ja" => Ok(Language::Ja),
            "zh" => Ok(Language::Zh),
            _ => Err(TranscacheError::Unsupported(s.to_string())),
        }
    }
}
