//! Locale-aware text values
//!
//! Every reader-facing text field in the system exists in three languages:
//! English, Vietnamese and French. `Localized<T>` bundles the three variants
//! into one value that serializes as a nested JSON object
//! (`{"en": ..., "vi": ..., "fr": ...}`) and maps to three database columns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The languages the system publishes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English
    En,
    /// Vietnamese
    Vi,
    /// French
    Fr,
}

impl Locale {
    /// All supported locales, in canonical order.
    pub const ALL: [Locale; 3] = [Locale::En, Locale::Vi, Locale::Fr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Vi => "vi",
            Locale::Fr => "fr",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "vi" => Ok(Locale::Vi),
            "fr" => Ok(Locale::Fr),
            _ => Err(anyhow::anyhow!("Unsupported locale: {}", s)),
        }
    }
}

/// A value carried in all three locales.
///
/// `Localized<String>` is used for required text (every variant present);
/// `Localized<Option<String>>` for text that may be missing per locale,
/// such as rich-text content that is translated incrementally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Localized<T> {
    #[serde(default)]
    pub en: T,
    #[serde(default)]
    pub vi: T,
    #[serde(default)]
    pub fr: T,
}

impl<T> Localized<T> {
    pub fn new(en: T, vi: T, fr: T) -> Self {
        Self { en, vi, fr }
    }

    /// The variant for the given locale.
    pub fn get(&self, locale: Locale) -> &T {
        match locale {
            Locale::En => &self.en,
            Locale::Vi => &self.vi,
            Locale::Fr => &self.fr,
        }
    }

    /// Apply `f` to each variant, keeping the locale structure.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Localized<U> {
        Localized {
            en: f(self.en),
            vi: f(self.vi),
            fr: f(self.fr),
        }
    }
}

impl Localized<String> {
    /// Locales whose variant is empty or whitespace-only.
    ///
    /// Required localized fields treat a blank variant as missing.
    pub fn blank_locales(&self) -> Vec<Locale> {
        Locale::ALL
            .iter()
            .copied()
            .filter(|l| self.get(*l).trim().is_empty())
            .collect()
    }
}

impl From<&str> for Localized<String> {
    /// Convenience for tests and seeds: the same text in every locale.
    fn from(s: &str) -> Self {
        Self::new(s.to_string(), s.to_string(), s.to_string())
    }
}
