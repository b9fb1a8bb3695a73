//! Font loading and text measurement using `ttf-parser`.
//!
//! Nothing is bundled: faces come from explicit files (`--font`) or from a
//! probe of common system locations. Without any real face the manager
//! falls back to synthetic Helvetica-like metrics, so layout still works and
//! the rasterizer draws placeholder bars instead of glyphs.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::FontError;

/// Family name every template style resolves to.
pub const DEFAULT_FAMILY: &str = "Sans";

/// Regular/bold pairs probed by [`FontManager::discover_system_fonts`].
/// DejaVu and Noto carry Arabic glyphs; Liberation does not.
const SYSTEM_FONT_CANDIDATES: &[(&str, &str)] = &[
    (
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    ),
    (
        "/Library/Fonts/Arial Unicode.ttf",
        "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    ),
    ("C:\\Windows\\Fonts\\arial.ttf", "C:\\Windows\\Fonts\\arialbd.ttf"),
];

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes; empty for synthetic metrics.
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
    pub line_gap: f32,
}

impl FontData {
    fn synthetic() -> Self {
        Self {
            bytes: Vec::new(),
            units_per_em: 1000.0,
            ascender: 750.0,
            descender: -250.0,
            line_gap: 0.0,
        }
    }

    fn parse(bytes: Vec<u8>) -> Result<Self, FontError> {
        let face = ttf_parser::Face::parse(&bytes, 0)?;
        Ok(Self {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            line_gap: face.line_gap() as f32,
            bytes,
        })
    }

    pub fn is_synthetic(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Manages loaded fonts.
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
    default_key: FontKey,
    synthetic: FontData,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            bold,
            italic,
        }
    }
}

impl FontManager {
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
            default_key: FontKey::new(DEFAULT_FAMILY, false, false),
            synthetic: FontData::synthetic(),
        }
    }

    /// Load a TTF/OTF font from bytes.
    pub fn load_font(
        &mut self,
        family: &str,
        bold: bool,
        italic: bool,
        bytes: Vec<u8>,
    ) -> Result<(), FontError> {
        let data = FontData::parse(bytes)?;
        let key = FontKey::new(family, bold, italic);
        if !self.has_real_fonts() && !bold && !italic {
            self.default_key = key.clone();
        }
        log::debug!("Loaded font {key:?} ({} bytes)", data.bytes.len());
        self.fonts.insert(key, data);
        Ok(())
    }

    /// Load a font file as the regular or bold face of [`DEFAULT_FAMILY`].
    pub fn load_font_file(&mut self, path: &Path, bold: bool) -> Result<(), FontError> {
        let bytes = fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_font(DEFAULT_FAMILY, bold, false, bytes)
    }

    /// Probe well-known system locations for a regular (and bold) sans face.
    /// Returns `true` when a regular face was loaded.
    pub fn discover_system_fonts(&mut self) -> bool {
        for (regular, bold) in SYSTEM_FONT_CANDIDATES {
            let regular = Path::new(regular);
            if !regular.exists() {
                continue;
            }
            if let Err(e) = self.load_font_file(regular, false) {
                log::warn!("Skipping '{}': {e}", regular.display());
                continue;
            }
            log::info!("Using system font '{}'", regular.display());
            let bold = Path::new(bold);
            if bold.exists() {
                if let Err(e) = self.load_font_file(bold, true) {
                    log::warn!("Skipping '{}': {e}", bold.display());
                }
            }
            return true;
        }
        log::warn!("No system font found; text will be drawn as placeholder bars");
        false
    }

    /// Get font data for a key: exact match, then the same weight in the
    /// default family, then the default face, then synthetic metrics.
    pub fn get(&self, key: &FontKey) -> &FontData {
        self.fonts
            .get(key)
            .or_else(|| {
                self.fonts
                    .get(&FontKey::new(&self.default_key.family, key.bold, false))
            })
            .or_else(|| self.fonts.get(&self.default_key))
            .unwrap_or(&self.synthetic)
    }

    /// Measure the width of a string at a given font size (in px).
    /// If we have actual font bytes, we sum glyph advances. Otherwise we
    /// use an average character width heuristic (0.5 × font_size per char).
    pub fn measure_text_width(
        &self,
        text: &str,
        font_size: f32,
        bold: bool,
        italic: bool,
        family: &str,
    ) -> f32 {
        let data = self.get(&FontKey::new(family, bold, italic));

        let face = match ttf_parser::Face::parse(&data.bytes, 0) {
            Ok(face) if !data.is_synthetic() => face,
            _ => {
                // Bold is ~10 % wider.
                let avg = if bold { 0.55 } else { 0.5 };
                return text.chars().count() as f32 * font_size * avg;
            }
        };

        let scale = font_size / data.units_per_em;
        text.chars()
            .map(|ch| match face.glyph_index(ch) {
                Some(gid) => face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
                None => font_size * 0.5,
            })
            .sum()
    }

    /// Get the ascender in px for the given font.
    pub fn ascender_px(&self, font_size: f32, bold: bool, italic: bool, family: &str) -> f32 {
        let data = self.get(&FontKey::new(family, bold, italic));
        data.ascender * font_size / data.units_per_em
    }

    /// Get the descender in px (positive, below the baseline).
    pub fn descender_px(&self, font_size: f32, bold: bool, italic: bool, family: &str) -> f32 {
        let data = self.get(&FontKey::new(family, bold, italic));
        -data.descender * font_size / data.units_per_em
    }

    /// Check if real font bytes are loaded for the default font.
    pub fn has_real_fonts(&self) -> bool {
        self.fonts
            .get(&self.default_key)
            .is_some_and(|d| !d.is_synthetic())
    }

    /// Font bytes for glyph rendering, resolved like [`FontManager::get`].
    pub fn font_bytes(&self, key: &FontKey) -> Option<&[u8]> {
        let data = self.get(key);
        (!data.is_synthetic()).then_some(data.bytes.as_slice())
    }
}

impl Default for FontManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Word-wrap text to fit within `max_width` pixels. Returns a vec of lines.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    bold: bool,
    italic: bool,
    family: &str,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{current_line} {word}")
            };
            let w = fonts.measure_text_width(&candidate, font_size, bold, italic, family);
            if w > max_width && !current_line.is_empty() {
                lines.push(std::mem::replace(&mut current_line, word.to_string()));
            } else {
                current_line = candidate;
            }
        }
        lines.push(current_line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_text_width() {
        let mgr = FontManager::default();
        let w = mgr.measure_text_width("Hello", 16.0, false, false, DEFAULT_FAMILY);
        // 5 chars × 16 × 0.5 = 40
        assert!((w - 40.0).abs() < 0.1);
    }

    #[test]
    fn word_wrap_basic() {
        let mgr = FontManager::default();
        let lines = wrap_text("Hello world foo bar", 16.0, false, false, DEFAULT_FAMILY, 60.0, &mgr);
        assert!(lines.len() >= 2, "Expected wrapping, got {:?}", lines);
    }

    #[test]
    fn single_long_word_is_not_split() {
        let mgr = FontManager::default();
        let lines = wrap_text("Kubernetes", 16.0, false, false, DEFAULT_FAMILY, 10.0, &mgr);
        assert_eq!(lines, vec!["Kubernetes".to_string()]);
    }

    #[test]
    fn synthetic_manager_has_no_glyph_bytes() {
        let mgr = FontManager::new();
        assert!(!mgr.has_real_fonts());
        assert!(mgr.font_bytes(&FontKey::new(DEFAULT_FAMILY, true, false)).is_none());
        assert!((mgr.ascender_px(20.0, false, false, DEFAULT_FAMILY) - 15.0).abs() < 1e-4);
        assert!((mgr.descender_px(20.0, false, false, DEFAULT_FAMILY) - 5.0).abs() < 1e-4);
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let mut mgr = FontManager::new();
        let err = mgr.load_font(DEFAULT_FAMILY, false, false, vec![0, 1, 2, 3]);
        assert!(matches!(err, Err(FontError::Parse(_))));
        assert!(!mgr.has_real_fonts());
    }

    #[test]
    fn missing_font_file_is_an_io_error() {
        let mut mgr = FontManager::new();
        let err = mgr.load_font_file(Path::new("/nonexistent/font.ttf"), false);
        assert!(matches!(err, Err(FontError::Io { .. })));
    }
}
