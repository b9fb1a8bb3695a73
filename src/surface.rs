//! Painted surface – the frozen display list between layout and capture.
//!
//! A [`Surface`] spans the document's full scroll extent as one tall canvas.
//! Every box carries absolute coordinates in CSS px and already-aligned text
//! lines, so the rasterizer never needs the style tree.

use serde::{Deserialize, Serialize};

use crate::fonts::FontManager;
use crate::layout::{BoxContent, PositionedBox};
use crate::selection::TextDirection;
use crate::style::{Edges, TextAlign, TextDecoration};

/// The painted document, ready for capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surface {
    /// Title embedded in the PDF metadata.
    pub title: String,
    pub direction: TextDirection,
    /// Extent of the document in CSS px.
    pub width: f32,
    pub height: f32,
    pub boxes: Vec<LayoutBox>,
}

/// A positioned rectangle with optional content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutBox {
    /// Position relative to the document's top-left corner.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub background_color: Option<[f32; 4]>,
    pub border: Option<BorderStyle>,
    #[serde(default)]
    pub border_radius: f32,

    pub text: Option<TextContent>,
    pub image: Option<ImageContent>,

    pub children: Vec<LayoutBox>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorderStyle {
    /// Top, right, bottom, left.
    pub widths: [f32; 4],
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    /// Pre-wrapped lines of text.
    pub lines: Vec<TextLine>,
    pub font_family: String,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: [f32; 4],
    /// Line box height in px.
    pub line_height: f32,
    /// Physical alignment: `left`, `center` or `right`.
    pub text_align: String,
    pub direction: TextDirection,
    pub underline: bool,
    /// Bullet drawn in the gutter on the inline-start side.
    pub list_marker: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// X offset of the line's left edge within the box (padding and alignment included).
    pub x_offset: f32,
    /// Y offset of the line box top within the box.
    pub y_offset: f32,
    /// Measured advance width.
    pub width: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageContent {
    pub src: String,
    pub width: f32,
    pub height: f32,
}

impl Surface {
    /// Freeze laid-out boxes into a surface. The height is the bottom of the
    /// lowest top-level margin box.
    pub fn from_layout(
        title: impl Into<String>,
        direction: TextDirection,
        width: f32,
        boxes: &[PositionedBox],
        fonts: &FontManager,
    ) -> Self {
        let height = boxes
            .iter()
            .map(|b| b.y + b.height + b.style.margin.bottom)
            .fold(0.0f32, f32::max);
        Self {
            title: title.into(),
            direction,
            width,
            height,
            boxes: boxes.iter().map(|b| build_layout_box(b, fonts)).collect(),
        }
    }

    /// Bitmap dimensions when captured at `scale`.
    pub fn pixel_size(&self, scale: f32) -> (u32, u32) {
        (
            (self.width * scale).ceil().max(0.0) as u32,
            (self.height * scale).ceil().max(0.0) as u32,
        )
    }

    /// Every painted text line in paint order.
    pub fn text_lines(&self) -> Vec<&str> {
        fn walk<'a>(b: &'a LayoutBox, out: &mut Vec<&'a str>) {
            if let Some(t) = &b.text {
                out.extend(t.lines.iter().map(|l| l.text.as_str()));
            }
            for c in &b.children {
                walk(c, out);
            }
        }
        let mut out = Vec::new();
        for b in &self.boxes {
            walk(b, &mut out);
        }
        out
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            background_color: None,
            border: None,
            border_radius: 0.0,
            text: None,
            image: None,
            children: Vec::new(),
        }
    }
}

/// Recursively convert a positioned box; coordinates are already
/// document-absolute because `extract` accumulates offsets.
fn build_layout_box(pbox: &PositionedBox, fonts: &FontManager) -> LayoutBox {
    let style = &pbox.style;
    let mut lb = LayoutBox::new(pbox.x, pbox.y, pbox.width, pbox.height);

    if !style.background_color.is_transparent() {
        lb.background_color = Some(style.background_color.to_array());
    }
    if !style.border.is_zero() && !style.border_color.is_transparent() {
        let Edges {
            top,
            right,
            bottom,
            left,
        } = style.border;
        lb.border = Some(BorderStyle {
            widths: [top, right, bottom, left],
            color: style.border_color.to_array(),
        });
    }
    lb.border_radius = style.border_radius.min(pbox.width / 2.0).min(pbox.height / 2.0);

    match &pbox.content {
        BoxContent::Text { lines, .. } => {
            let bold = style.is_bold();
            let italic = style.is_italic();
            let line_height = style.font_size * style.line_height;
            let inner_left = style.padding.left + style.border.left;
            let inner_right = pbox.width - style.padding.right - style.border.right;
            let top = style.padding.top + style.border.top;
            let align = style.physical_align();

            let text_lines = lines
                .iter()
                .enumerate()
                .map(|(i, line)| {
                    let width = fonts.measure_text_width(
                        line,
                        style.font_size,
                        bold,
                        italic,
                        &style.font_family,
                    );
                    let x_offset = match align {
                        TextAlign::Center => (inner_left + inner_right - width) / 2.0,
                        TextAlign::Right => inner_right - width,
                        TextAlign::Left | TextAlign::Start => inner_left,
                    };
                    TextLine {
                        text: line.clone(),
                        x_offset,
                        y_offset: top + i as f32 * line_height,
                        width,
                    }
                })
                .collect();

            lb.text = Some(TextContent {
                lines: text_lines,
                font_family: style.font_family.clone(),
                font_size: style.font_size,
                bold,
                italic,
                color: style.color.to_array(),
                line_height,
                text_align: match align {
                    TextAlign::Center => "center",
                    TextAlign::Right => "right",
                    TextAlign::Left | TextAlign::Start => "left",
                }
                .to_string(),
                direction: style.direction,
                underline: style.text_decoration == TextDecoration::Underline,
                list_marker: pbox.marker.clone(),
            });
        }
        BoxContent::Image { src } => {
            lb.image = Some(ImageContent {
                src: src.clone(),
                width: pbox.width,
                height: pbox.height,
            });
        }
        BoxContent::None => {}
    }

    lb.children = pbox
        .children
        .iter()
        .map(|child| build_layout_box(child, fonts))
        .collect();
    lb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::layout::compute_layout;
    use crate::style::build_styled_tree;

    fn paint(html: &str) -> Surface {
        let fonts = FontManager::default();
        let styled = build_styled_tree(&parse_html(html), None);
        let boxes = compute_layout(&styled, 400.0, &fonts).unwrap();
        Surface::from_layout("test", TextDirection::Ltr, 400.0, &boxes, &fonts)
    }

    fn first_text(b: &LayoutBox) -> Option<&TextContent> {
        b.text
            .as_ref()
            .or_else(|| b.children.iter().find_map(first_text))
    }

    #[test]
    fn right_aligned_text_ends_at_padding_edge() {
        let surface = paint(r#"<div><p class="text-right px-4">Hi</p></div>"#);
        let text = first_text(&surface.boxes[0]).unwrap();
        let line = &text.lines[0];
        // 400 wide, 16px right padding, "Hi" is 16px
        assert!((line.x_offset - (400.0 - 16.0 - 16.0)).abs() < 0.01);
    }

    #[test]
    fn rtl_start_alignment_is_right() {
        let surface = paint(r#"<div dir="rtl"><p>abcd</p></div>"#);
        let text = first_text(&surface.boxes[0]).unwrap();
        assert_eq!(text.direction, TextDirection::Rtl);
        assert!((text.lines[0].x_offset - (400.0 - 32.0)).abs() < 0.01);
    }

    #[test]
    fn height_covers_whole_document() {
        let surface = paint("<div><p>One</p><p>Two</p><p>Three</p></div>");
        // Three lines of 22.4px plus 4px paragraph margins
        assert!(surface.height >= 3.0 * 22.4);
        assert_eq!(surface.pixel_size(2.0).0, 800);
    }

    #[test]
    fn json_round_trip_preserves_lines() {
        let surface = paint("<p>Hello world</p>");
        let json = surface.to_json().unwrap();
        let back = Surface::from_json(&json).unwrap();
        assert_eq!(back.text_lines(), vec!["Hello world"]);
    }
}
