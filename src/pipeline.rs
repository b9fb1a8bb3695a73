//! Pipeline – configuration plus the paint step that ties together parsing,
//! styling and layout into a single [`Surface`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dom::body_children;
use crate::error::{ConfigError, PaintError};
use crate::fonts::FontManager;
use crate::layout::compute_layout;
use crate::style::build_styled_tree;
use crate::surface::Surface;
use crate::templates::VisualDocument;

/// Configuration for painting and capture. Every field has a default, so a
/// config file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Document title embedded in the PDF metadata. Empty means
    /// "derive from the subject's name".
    pub title: String,
    /// Width of the page the templates are laid out in, in CSS px.
    pub viewport_width: f32,
    /// Oversampling factor for the capture bitmap.
    pub scale: f32,
    /// Opaque canvas colour behind the document.
    pub background: String,
    /// JPEG quality, 1–100.
    pub jpeg_quality: u8,
    /// Upper bound on the capture bitmap's pixel count.
    pub max_pixels: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            viewport_width: 896.0,
            scale: 2.0,
            background: "#ffffff".to_string(),
            jpeg_quality: 90,
            max_pixels: 64_000_000,
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

/// Lay out a rendered document into a paintable surface spanning its full
/// height.
pub fn paint(
    visual: &VisualDocument,
    fonts: &FontManager,
    config: &PipelineConfig,
) -> Result<Surface, PaintError> {
    // 1. Style the DOM
    let dom_nodes = body_children(&visual.nodes);
    let styled = build_styled_tree(&dom_nodes, None);

    // 2. Compute layout
    let boxes = compute_layout(&styled, config.viewport_width, fonts)?;

    // 3. Freeze into a display list
    let title = if config.title.is_empty() {
        match visual.field_text("name") {
            Some(name) => format!("CV - {name}"),
            None => "Curriculum Vitae".to_string(),
        }
    } else {
        config.title.clone()
    };
    let surface = Surface::from_layout(title, visual.direction, config.viewport_width, &boxes, fonts);
    log::debug!(
        "Painted {}x{} px surface ({} top-level boxes)",
        surface.width,
        surface.height,
        surface.boxes.len()
    );
    Ok(surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CvDocument;
    use crate::selection::Selection;
    use crate::templates::render;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = PipelineConfig::from_json(r#"{"scale": 1.5}"#).unwrap();
        assert_eq!(config.scale, 1.5);
        assert_eq!(config.jpeg_quality, 90);
        assert_eq!(config.viewport_width, 896.0);
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(matches!(
            PipelineConfig::from_json(r#"{"jpeg_quality": "high"}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn paint_spans_viewport_width_and_names_document() {
        let doc = CvDocument::sample().unwrap();
        let visual = render(&doc, &Selection::default());
        let config = PipelineConfig::default();
        let surface = paint(&visual, &FontManager::default(), &config).unwrap();
        assert_eq!(surface.width, 896.0);
        assert!(surface.height > 500.0);
        assert_eq!(surface.title, "CV - Jane Q. Doe");
        assert!(surface.text_lines().contains(&"Jane Q. Doe"));
    }
}
