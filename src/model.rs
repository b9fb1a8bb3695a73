//! Document model – the static biography that drives every render.
//!
//! Loaded once from JSON and never mutated. Text fields that vary by
//! language are [`Localized`] values; everything else is plain.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ModelError;
use crate::i18n::{Blank, Language, Localized, LocalizedList, LocalizedText};

/// Bundled sample résumé, used by the tests and as a template for authors.
pub const SAMPLE_JSON: &str = include_str!("../data/cv.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvDocument {
    pub personal: Personal,
    pub objective: LocalizedText,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub awards: Vec<Award>,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub skills: Skills,
    /// Per-language overrides for the built-in section headings.
    #[serde(default)]
    pub labels: BTreeMap<String, LocalizedText>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Personal {
    pub name: String,
    pub title: LocalizedText,
    pub location: LocalizedText,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub location_url: Option<String>,
    #[serde(default)]
    pub born: Option<LocalizedText>,
    #[serde(default)]
    pub id_number: Option<String>,
    #[serde(default)]
    pub driver_license: Option<LocalizedText>,
    #[serde(default)]
    pub links: Vec<Link>,
    /// Portrait as a base64 `data:` URI.
    #[serde(default)]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub title: LocalizedText,
    pub company: String,
    pub location: LocalizedText,
    pub period: String,
    pub achievements: LocalizedList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Education {
    pub degree: LocalizedText,
    pub institution: String,
    #[serde(default)]
    pub location: Option<LocalizedText>,
    #[serde(deserialize_with = "string_or_number")]
    pub year: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub gpa: Option<String>,
    #[serde(default)]
    pub coursework: Option<LocalizedText>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    pub issuer: String,
    #[serde(deserialize_with = "string_or_number")]
    pub year: String,
    #[serde(default = "Certification::default_status")]
    pub status: String,
}

impl Certification {
    fn default_status() -> String {
        "Active".to_string()
    }

    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub title: LocalizedText,
    pub description: LocalizedText,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub period: String,
    pub impact: LocalizedText,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Award {
    pub title: LocalizedText,
    pub issuer: String,
    #[serde(deserialize_with = "string_or_number")]
    pub year: String,
    pub description: LocalizedText,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub position: String,
    pub company: String,
    pub relationship: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skills {
    pub technical: LocalizedList,
    #[serde(default = "Skills::no_languages")]
    pub languages: Localized<Vec<SpokenLanguage>>,
}

impl Skills {
    fn no_languages() -> Localized<Vec<SpokenLanguage>> {
        Localized::Plain(Vec::new())
    }
}

impl Default for Skills {
    fn default() -> Self {
        Self {
            technical: Localized::Plain(Vec::new()),
            languages: Self::no_languages(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpokenLanguage {
    pub language: String,
    pub level: String,
}

/// A localized field that resolves to a blank value for some language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizationGap {
    pub field: String,
    pub language: Language,
}

impl CvDocument {
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let json = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let doc = Self::from_json(&json)?;
        for gap in doc.localization_gaps() {
            log::warn!("'{}' is blank for language '{}'", gap.field, gap.language);
        }
        log::info!(
            "Loaded CV for '{}' from '{}'",
            doc.personal.name,
            path.display()
        );
        Ok(doc)
    }

    /// The bundled sample document.
    pub fn sample() -> Result<Self, ModelError> {
        Self::from_json(SAMPLE_JSON)
    }

    /// Every localized field that would render blank for some supported
    /// language even after fallback. Optional fields are checked when present.
    pub fn localization_gaps(&self) -> Vec<LocalizationGap> {
        let mut gaps = Vec::new();
        let p = &self.personal;
        check(&mut gaps, "personal.title", &p.title);
        check(&mut gaps, "personal.location", &p.location);
        if let Some(born) = &p.born {
            check(&mut gaps, "personal.born", born);
        }
        if let Some(license) = &p.driver_license {
            check(&mut gaps, "personal.driver_license", license);
        }
        check(&mut gaps, "objective", &self.objective);
        for (i, e) in self.experience.iter().enumerate() {
            check(&mut gaps, &format!("experience[{i}].title"), &e.title);
            check(&mut gaps, &format!("experience[{i}].location"), &e.location);
            check(&mut gaps, &format!("experience[{i}].achievements"), &e.achievements);
        }
        for (i, e) in self.education.iter().enumerate() {
            check(&mut gaps, &format!("education[{i}].degree"), &e.degree);
            if let Some(location) = &e.location {
                check(&mut gaps, &format!("education[{i}].location"), location);
            }
            if let Some(coursework) = &e.coursework {
                check(&mut gaps, &format!("education[{i}].coursework"), coursework);
            }
        }
        for (i, pr) in self.projects.iter().enumerate() {
            check(&mut gaps, &format!("projects[{i}].title"), &pr.title);
            check(&mut gaps, &format!("projects[{i}].description"), &pr.description);
            check(&mut gaps, &format!("projects[{i}].impact"), &pr.impact);
        }
        for (i, a) in self.awards.iter().enumerate() {
            check(&mut gaps, &format!("awards[{i}].title"), &a.title);
            check(&mut gaps, &format!("awards[{i}].description"), &a.description);
        }
        check(&mut gaps, "skills.technical", &self.skills.technical);
        check(&mut gaps, "skills.languages", &self.skills.languages);
        for (key, label) in &self.labels {
            check(&mut gaps, &format!("labels.{key}"), label);
        }
        gaps
    }
}

fn check<T: Blank>(gaps: &mut Vec<LocalizationGap>, field: &str, value: &Localized<T>) {
    for language in Language::ALL {
        if value.resolve(language).is_blank() {
            gaps.push(LocalizationGap {
                field: field.to_string(),
                language,
            });
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_document_loads() {
        let doc = CvDocument::sample().unwrap();
        assert!(!doc.personal.name.is_empty());
        assert!(!doc.experience.is_empty());
        assert!(!doc.skills.languages.resolve(Language::En).is_empty());
    }

    #[test]
    fn sample_document_has_no_localization_gaps() {
        let doc = CvDocument::sample().unwrap();
        assert_eq!(doc.localization_gaps(), Vec::new());
    }

    #[test]
    fn numeric_years_are_accepted() {
        let json = r#"{"name": "AWS SAA", "issuer": "Amazon", "year": 2023}"#;
        let cert: Certification = serde_json::from_str(json).unwrap();
        assert_eq!(cert.year, "2023");
        assert!(cert.is_active());
    }

    #[test]
    fn optional_gpa_accepts_numbers() {
        let json = r#"{"degree": "BSc", "institution": "ETH", "year": "2016", "gpa": 3.8}"#;
        let edu: Education = serde_json::from_str(json).unwrap();
        assert_eq!(edu.gpa.as_deref(), Some("3.8"));
        assert!(edu.coursework.is_none());
    }

    #[test]
    fn blank_translation_is_reported() {
        let mut doc = CvDocument::sample().unwrap();
        doc.objective =
            Localized::from_variants([("en", "Build things".to_string()), ("fr", " ".to_string())])
                .unwrap();
        let gaps = doc.localization_gaps();
        assert_eq!(
            gaps,
            vec![LocalizationGap {
                field: "objective".to_string(),
                language: Language::Fr,
            }]
        );
    }

    #[test]
    fn empty_spoken_languages_are_reported() {
        let mut doc = CvDocument::sample().unwrap();
        doc.skills.languages =
            Localized::from_variants([("en", Vec::new()), ("fr", Vec::new())]).unwrap();
        let gaps = doc.localization_gaps();
        assert_eq!(gaps.len(), Language::ALL.len());
        assert!(gaps.iter().all(|g| g.field == "skills.languages"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = CvDocument::load(Path::new("/nonexistent/cv.json")).unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }
}
