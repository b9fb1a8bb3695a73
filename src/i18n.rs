//! Localization – supported languages, localized data fields and section
//! labels.
//!
//! A localized field is either a plain value (already resolved, used for
//! names, dates and other language-neutral data) or a map from language code
//! to value. Resolution never fails: the requested language wins, then the
//! fallback language, then the first variant in code order.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SelectionError;
use crate::selection::Layout;

// ---------------------------------------------------------------------------
// Languages
// ---------------------------------------------------------------------------

/// A supported UI / content language.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
    De,
    Ar,
    It,
}

impl Language {
    /// Every supported language, in picker order.
    pub const ALL: [Language; 5] = [
        Language::En,
        Language::Fr,
        Language::De,
        Language::Ar,
        Language::It,
    ];

    /// Language whose content is authoritative when a translation is missing.
    pub const FALLBACK: Language = Language::En;

    /// ISO 639-1 code used as key in the data file and in file names.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
            Language::De => "de",
            Language::Ar => "ar",
            Language::It => "it",
        }
    }

    /// Short picker label.
    pub fn label(self) -> &'static str {
        match self {
            Language::En => "EN",
            Language::Fr => "FR",
            Language::De => "DE",
            Language::Ar => "AR",
            Language::It => "IT",
        }
    }

    /// Exactly one supported language is written right-to-left.
    pub fn is_rtl(self) -> bool {
        matches!(self, Language::Ar)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Language::ALL
            .into_iter()
            .find(|l| l.code() == wanted)
            .ok_or_else(|| SelectionError::UnknownLanguage(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Localized fields
// ---------------------------------------------------------------------------

/// A data value that is either language-neutral or varies by language code.
///
/// Keys are kept as raw codes so a data file may carry translations for
/// languages the picker does not offer; they are simply never selected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Localized<T> {
    Plain(T),
    Localized(Variants<T>),
}

pub type LocalizedText = Localized<String>;
pub type LocalizedList = Localized<Vec<String>>;

/// Per-language values, never empty. The variant with the lowest code is
/// held apart so there is always something to fall back to.
#[derive(Debug, Clone, PartialEq)]
pub struct Variants<T> {
    first: (String, T),
    rest: BTreeMap<String, T>,
}

impl<T> Variants<T> {
    /// `None` for an empty map.
    pub fn from_map(mut map: BTreeMap<String, T>) -> Option<Self> {
        let first = map.pop_first()?;
        Some(Self { first, rest: map })
    }

    pub fn get(&self, code: &str) -> Option<&T> {
        if self.first.0 == code {
            Some(&self.first.1)
        } else {
            self.rest.get(code)
        }
    }

    /// Value for the lowest language code.
    pub fn first(&self) -> &T {
        &self.first.1
    }

    /// Variants in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        std::iter::once((self.first.0.as_str(), &self.first.1))
            .chain(self.rest.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

impl<T: Serialize> Serialize for Variants<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LocalizedRepr<T> {
    Plain(T),
    Localized(BTreeMap<String, T>),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Localized<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match LocalizedRepr::deserialize(deserializer)? {
            LocalizedRepr::Plain(value) => Ok(Localized::Plain(value)),
            LocalizedRepr::Localized(map) => Variants::from_map(map)
                .map(Localized::Localized)
                .ok_or_else(|| D::Error::custom("localized field must have at least one variant")),
        }
    }
}

impl<T> Localized<T> {
    /// Build a localized value from `(code, value)` pairs.
    ///
    /// Returns `None` for an empty iterator, which could never resolve.
    pub fn from_variants<I, K>(variants: I) -> Option<Self>
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
    {
        let map: BTreeMap<String, T> = variants.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Variants::from_map(map).map(Localized::Localized)
    }

    /// Resolve for `language`: requested code, then fallback, then the first
    /// variant.
    pub fn resolve(&self, language: Language) -> &T {
        match self {
            Localized::Plain(value) => value,
            Localized::Localized(variants) => variants
                .get(language.code())
                .or_else(|| variants.get(Language::FALLBACK.code()))
                .unwrap_or_else(|| variants.first()),
        }
    }

    /// True when `language` has its own variant (plain values count as
    /// present for every language).
    pub fn has_variant(&self, language: Language) -> bool {
        match self {
            Localized::Plain(_) => true,
            Localized::Localized(variants) => variants.get(language.code()).is_some(),
        }
    }
}

impl<T> From<T> for Localized<T> {
    fn from(value: T) -> Self {
        Localized::Plain(value)
    }
}

impl From<&str> for Localized<String> {
    fn from(value: &str) -> Self {
        Localized::Plain(value.to_string())
    }
}

/// Emptiness check for resolved values.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl<T> Blank for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Section labels
// ---------------------------------------------------------------------------

/// Fixed UI strings used by the templates. The data file may override any of
/// them per language through its `labels` map, keyed by [`LabelKey::key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKey {
    Objective,
    Experience,
    Projects,
    Certifications,
    Skills,
    Education,
    Awards,
    References,
    Languages,
    ReferencesOnRequest,
    Impact,
    Gpa,
    Coursework,
    Born,
    IdNumber,
    DriverLicense,
}

impl LabelKey {
    pub fn key(self) -> &'static str {
        match self {
            LabelKey::Objective => "objective",
            LabelKey::Experience => "experience",
            LabelKey::Projects => "projects",
            LabelKey::Certifications => "certifications",
            LabelKey::Skills => "skills",
            LabelKey::Education => "education",
            LabelKey::Awards => "awards",
            LabelKey::References => "references",
            LabelKey::Languages => "languages",
            LabelKey::ReferencesOnRequest => "references_on_request",
            LabelKey::Impact => "impact",
            LabelKey::Gpa => "gpa",
            LabelKey::Coursework => "coursework",
            LabelKey::Born => "born",
            LabelKey::IdNumber => "id_number",
            LabelKey::DriverLicense => "driver_license",
        }
    }

    /// Built-in English label. The compact layout uses terser headings.
    pub fn default_text(self, layout: Layout) -> &'static str {
        match (self, layout) {
            (LabelKey::Objective, Layout::Compact) => "Objective",
            (LabelKey::Objective, Layout::Full) => "Career Objective",
            (LabelKey::Experience, Layout::Compact) => "Work Experience",
            (LabelKey::Experience, Layout::Full) => "Professional Experience",
            (LabelKey::References, Layout::Compact) => "References",
            (LabelKey::References, Layout::Full) => "Professional References",
            (LabelKey::Projects, _) => "Key Projects",
            (LabelKey::Certifications, _) => "Certifications",
            (LabelKey::Skills, _) => "Technical Skills",
            (LabelKey::Education, _) => "Education",
            (LabelKey::Awards, _) => "Awards & Recognition",
            (LabelKey::Languages, _) => "Languages",
            (LabelKey::ReferencesOnRequest, _) => "Available upon request",
            (LabelKey::Impact, _) => "Impact",
            (LabelKey::Gpa, _) => "GPA",
            (LabelKey::Coursework, _) => "Key Coursework",
            (LabelKey::Born, _) => "Born",
            (LabelKey::IdNumber, _) => "ID",
            (LabelKey::DriverLicense, _) => "Driver License",
        }
    }
}

/// Resolve a section label: document override for the language (with the
/// usual fallback), else the built-in default for the layout.
pub fn section_label<'a>(
    overrides: &'a BTreeMap<String, LocalizedText>,
    key: LabelKey,
    language: Language,
    layout: Layout,
) -> Cow<'a, str> {
    match overrides.get(key.key()) {
        Some(text) => Cow::Borrowed(text.resolve(language).as_str()),
        None => Cow::Borrowed(key.default_text(layout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LocalizedText {
        Localized::from_variants([("en", "Engineer".to_string()), ("fr", "Ingénieur".to_string())])
            .unwrap()
    }

    #[test]
    fn resolves_requested_language() {
        assert_eq!(sample().resolve(Language::Fr), "Ingénieur");
    }

    #[test]
    fn missing_translation_falls_back_to_english() {
        assert_eq!(sample().resolve(Language::De), "Engineer");
        assert_eq!(sample().resolve(Language::Ar), "Engineer");
    }

    #[test]
    fn plain_value_is_returned_unchanged() {
        let plain: LocalizedText = "ACME Corp".into();
        for lang in Language::ALL {
            assert_eq!(plain.resolve(lang), "ACME Corp");
        }
    }

    #[test]
    fn map_without_fallback_uses_first_variant() {
        let only_it = Localized::from_variants([("it", "Ingegnere".to_string())]).unwrap();
        assert_eq!(only_it.resolve(Language::En), "Ingegnere");
    }

    #[test]
    fn empty_map_is_rejected() {
        let parsed: Result<LocalizedText, _> = serde_json::from_str("{}");
        assert!(parsed.is_err());
        assert!(Localized::<String>::from_variants(Vec::<(String, String)>::new()).is_none());
    }

    #[test]
    fn deserializes_both_shapes() {
        let plain: LocalizedList = serde_json::from_str(r#"["Rust", "Go"]"#).unwrap();
        assert_eq!(plain.resolve(Language::Fr).len(), 2);

        let map: LocalizedList =
            serde_json::from_str(r#"{"en": ["Rust"], "de": ["Rust", "Go"]}"#).unwrap();
        assert_eq!(map.resolve(Language::De).len(), 2);
        assert_eq!(map.resolve(Language::It), &vec!["Rust".to_string()]);
    }

    #[test]
    fn only_arabic_is_rtl() {
        for lang in Language::ALL {
            assert_eq!(lang.is_rtl(), lang == Language::Ar, "{lang}");
        }
    }

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!("FR".parse::<Language>().unwrap(), Language::Fr);
        assert!("es".parse::<Language>().is_err());
    }

    #[test]
    fn label_override_wins_over_default() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "objective".to_string(),
            Localized::from_variants([("en", "Goal".to_string()), ("fr", "Objectif".to_string())])
                .unwrap(),
        );
        let fr = section_label(&overrides, LabelKey::Objective, Language::Fr, Layout::Full);
        assert_eq!(fr, "Objectif");
        let skills = section_label(&overrides, LabelKey::Skills, Language::Fr, Layout::Full);
        assert_eq!(skills, "Technical Skills");
    }
}
