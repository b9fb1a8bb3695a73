//! Selection state – the language/layout pair the user is looking at.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SelectionError;
use crate::i18n::Language;

/// One of the two visual arrangements of the same data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Single column, optimised for one printed page.
    #[serde(alias = "canadian")]
    Compact,
    /// Header band plus cards for every section.
    #[default]
    #[serde(alias = "european")]
    Full,
}

impl Layout {
    pub const ALL: [Layout; 2] = [Layout::Compact, Layout::Full];

    pub fn name(self) -> &'static str {
        match self {
            Layout::Compact => "compact",
            Layout::Full => "full",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Layout {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "canadian" | "ca" => Ok(Layout::Compact),
            "full" | "european" | "eu" => Ok(Layout::Full),
            _ => Err(SelectionError::UnknownLayout(s.to_string())),
        }
    }
}

/// Writing direction of the rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

impl TextDirection {
    pub fn for_language(language: Language) -> Self {
        if language.is_rtl() {
            TextDirection::Rtl
        } else {
            TextDirection::Ltr
        }
    }

    pub fn is_rtl(self) -> bool {
        self == TextDirection::Rtl
    }

    /// Value of the HTML `dir` attribute.
    pub fn as_attr(self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
        }
    }
}

/// The current picker state. Both fields always hold a valid value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub language: Language,
    pub layout: Layout,
}

impl Selection {
    pub fn new(language: Language, layout: Layout) -> Self {
        Self { language, layout }
    }

    pub fn direction(&self) -> TextDirection {
        TextDirection::for_language(self.language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_english_full() {
        let s = Selection::default();
        assert_eq!(s.language, Language::En);
        assert_eq!(s.layout, Layout::Full);
    }

    #[test]
    fn legacy_layout_names_are_accepted() {
        assert_eq!("canadian".parse::<Layout>().unwrap(), Layout::Compact);
        assert_eq!("EU".parse::<Layout>().unwrap(), Layout::Full);
        assert!("tabloid".parse::<Layout>().is_err());
    }

    #[test]
    fn direction_follows_language() {
        assert!(Selection::new(Language::Ar, Layout::Compact).direction().is_rtl());
        assert!(!Selection::new(Language::It, Layout::Full).direction().is_rtl());
    }
}
