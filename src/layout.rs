//! Layout engine – uses Taffy to compute flexbox / grid layout from a styled
//! DOM tree, then converts the result into a tree of positioned boxes in
//! document coordinates. There is no pagination: the result spans the full
//! scroll height of the document.

use std::collections::HashMap;
use taffy::prelude::*;

use crate::dom::Tag;
use crate::error::PaintError;
use crate::fonts::{wrap_text, FontManager};
use crate::selection::TextDirection;
use crate::style::{self, ComputedStyle, StyledNode};

/// Bullet drawn in the gutter of list items.
pub const BULLET: &str = "\u{2022}";

/// A positioned box in document coordinates.
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub style: ComputedStyle,
    pub content: BoxContent,
    /// List marker for `<li>` boxes, drawn in the list's gutter.
    pub marker: Option<String>,
    pub children: Vec<PositionedBox>,
}

#[derive(Debug, Clone)]
pub enum BoxContent {
    None,
    Text { text: String, lines: Vec<String> },
    Image { src: String },
}

// ---------------------------------------------------------------------------
// Build Taffy tree from styled nodes
// ---------------------------------------------------------------------------

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_content: HashMap<NodeId, BoxContent>,
    node_markers: HashMap<NodeId, String>,
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            node_styles: HashMap::new(),
            node_content: HashMap::new(),
            node_markers: HashMap::new(),
        }
    }

    /// Collect all text content from an inline subtree (spans, text nodes).
    fn collect_inline_text(node: &StyledNode) -> String {
        match node {
            StyledNode::Text { text, .. } => text.clone(),
            StyledNode::Element { children, .. } => {
                children.iter().map(Self::collect_inline_text).collect()
            }
        }
    }

    /// Return true when every child is a text node or a display:inline element
    /// (no block-level children).
    fn all_inline(children: &[StyledNode]) -> bool {
        children.iter().all(|c| match c {
            StyledNode::Text { .. } => true,
            StyledNode::Element {
                style,
                children: gc,
                ..
            } => style.display == style::Display::Inline && Self::all_inline(gc),
        })
    }

    fn build_node(&mut self, styled: &StyledNode, parent_width: f32) -> Result<NodeId, PaintError> {
        match styled {
            StyledNode::Text { text, style } => self.build_text_node(text, style, parent_width),
            StyledNode::Element {
                tag,
                style,
                children,
                attrs,
            } => self.build_element_node(tag, style, children, attrs, parent_width),
        }
    }

    /// Leaf holding pre-wrapped text. The box keeps the style's padding and
    /// border, so its size is the text block plus those edges.
    fn build_text_node(
        &mut self,
        text: &str,
        style: &ComputedStyle,
        parent_width: f32,
    ) -> Result<NodeId, PaintError> {
        let bold = style.is_bold();
        let italic = style.is_italic();
        let family = &style.font_family;
        let font_size = style.font_size;
        let line_height_px = font_size * style.line_height;

        let text = text.trim();
        let max_w = content_width(style, parent_width);
        let lines = wrap_text(text, font_size, bold, italic, family, max_w, self.fonts);

        let text_width = lines
            .iter()
            .map(|l| self.fonts.measure_text_width(l, font_size, bold, italic, family))
            .fold(0.0f32, f32::max);
        let text_height = lines.len() as f32 * line_height_px;

        let edges_w = style.padding.horizontal() + style.border.horizontal();
        let edges_h = style.padding.vertical() + style.border.vertical();
        let taffy_style = Style {
            size: Size {
                width: dim_to_taffy(style.width),
                height: Dimension::Length(text_height + edges_h),
            },
            min_size: Size {
                width: Dimension::Length(text_width + edges_w),
                height: Dimension::Auto,
            },
            margin: margin_rect(style),
            padding: padding_rect(style),
            border: border_rect(style),
            flex_shrink: 0.0,
            ..Default::default()
        };

        let node = self.taffy.new_leaf(taffy_style)?;
        self.node_styles.insert(node, style.clone());
        self.node_content.insert(
            node,
            BoxContent::Text {
                text: text.to_string(),
                lines,
            },
        );
        Ok(node)
    }

    fn build_element_node(
        &mut self,
        tag: &Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        attrs: &HashMap<String, String>,
        parent_width: f32,
    ) -> Result<NodeId, PaintError> {
        // Paragraph-like block elements whose children are all inline get their
        // text merged into a single wrapped text node so spans flow correctly.
        if tag.is_text_block() && !children.is_empty() && Self::all_inline(children) {
            let raw: String = children.iter().map(Self::collect_inline_text).collect();
            let combined = crate::dom::collapse_whitespace(&raw);
            if !combined.is_empty() {
                return self.build_text_node(&combined, style, parent_width);
            }
        }

        let inner_width = content_width(style, parent_width);

        // Estimate per-child width for non-wrapping rows and grids so that
        // text is word-wrapped to the right column width at build time.
        // Fixed-width children keep their width; the rest share what is left.
        let mut elem_child_count = 0usize;
        let mut fixed_count = 0usize;
        let mut fixed_width = 0.0f32;
        for child in children {
            if let StyledNode::Element { style: cs, .. } = child {
                elem_child_count += 1;
                if let style::Dimension::Px(w) = cs.width {
                    fixed_count += 1;
                    fixed_width += w + cs.margin.horizontal();
                }
            }
        }
        let child_build_width = match style.display {
            style::Display::Flex
                if style.flex_direction == style::FlexDirection::Row
                    && style.flex_wrap == style::FlexWrap::NoWrap
                    && elem_child_count > 1 =>
            {
                let gap_total = style.gap * (elem_child_count - 1) as f32;
                let shared = (elem_child_count - fixed_count).max(1) as f32;
                ((inner_width - gap_total - fixed_width) / shared).max(1.0)
            }
            style::Display::Grid if style.grid_columns > 1 && elem_child_count > 1 => {
                let cols = style.grid_columns.min(elem_child_count) as f32;
                ((inner_width - style.gap * (cols - 1.0)) / cols).max(1.0)
            }
            _ => inner_width,
        };

        let mut child_nodes = Vec::with_capacity(children.len());
        for child in children {
            let child_id = self.build_node(child, child_build_width)?;
            let is_li = matches!(child, StyledNode::Element { tag: Tag::Li, .. });
            if is_li && *tag == Tag::Ul && style.list_bullets {
                self.node_markers.insert(child_id, BULLET.to_string());
            }
            child_nodes.push(child_id);
        }

        // Images without explicit dimensions take their intrinsic size.
        let style_override = if *tag == Tag::Img
            && (style.width == style::Dimension::Auto || style.height == style::Dimension::Auto)
        {
            let src = attrs.get("src").map(String::as_str).unwrap_or("");
            resolve_img_auto_dimensions(src, style, parent_width)
        } else {
            None
        };

        let effective_style = style_override.as_ref().unwrap_or(style);
        let taffy_style = computed_to_taffy(effective_style, tag);
        let node = self.taffy.new_with_children(taffy_style, &child_nodes)?;
        self.node_styles.insert(node, effective_style.clone());

        if *tag == Tag::Img {
            let src = attrs.get("src").cloned().unwrap_or_default();
            self.node_content.insert(node, BoxContent::Image { src });
        }

        Ok(node)
    }

    /// Extract positioned boxes after layout computation.
    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> Result<PositionedBox, PaintError> {
        let layout = self.taffy.layout(node)?;
        let style = self.node_styles.get(&node).cloned().unwrap_or_default();
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;

        let children = self
            .taffy
            .children(node)?
            .into_iter()
            .map(|child| self.extract(child, x, y))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PositionedBox {
            x,
            y,
            width: layout.size.width,
            height: layout.size.height,
            style,
            content,
            marker: self.node_markers.get(&node).cloned(),
            children,
        })
    }
}

/// Width available to the content box of an element placed in `parent_width`.
fn content_width(s: &ComputedStyle, parent_width: f32) -> f32 {
    let outer = match s.width {
        style::Dimension::Px(w) => w,
        style::Dimension::Percent(p) => parent_width * p / 100.0,
        style::Dimension::Auto => parent_width - s.margin.horizontal(),
    };
    let outer = match s.max_width {
        style::Dimension::Px(m) => outer.min(m),
        _ => outer,
    };
    (outer - s.padding.horizontal() - s.border.horizontal()).max(1.0)
}

fn computed_to_taffy(s: &ComputedStyle, tag: &Tag) -> Style {
    let mut ts = Style::default();
    let rtl = s.direction == TextDirection::Rtl;

    match s.display {
        style::Display::Flex => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = match (s.flex_direction, rtl) {
                (style::FlexDirection::Row, false) => taffy::FlexDirection::Row,
                (style::FlexDirection::Row, true) => taffy::FlexDirection::RowReverse,
                (style::FlexDirection::Column, _) => taffy::FlexDirection::Column,
            };
            ts.flex_wrap = match s.flex_wrap {
                style::FlexWrap::NoWrap => taffy::FlexWrap::NoWrap,
                style::FlexWrap::Wrap => taffy::FlexWrap::Wrap,
            };
            // Main-axis relative, so row-reverse packs from the right.
            ts.justify_content = Some(match s.justify_content {
                style::JustifyContent::Start => taffy::JustifyContent::FlexStart,
                style::JustifyContent::End => taffy::JustifyContent::FlexEnd,
                style::JustifyContent::Center => taffy::JustifyContent::Center,
                style::JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
                style::JustifyContent::SpaceAround => taffy::JustifyContent::SpaceAround,
                style::JustifyContent::SpaceEvenly => taffy::JustifyContent::SpaceEvenly,
            });
            // Cross axis of a column is horizontal and must mirror in RTL.
            let mirror = rtl && s.flex_direction == style::FlexDirection::Column;
            ts.align_items = Some(match (s.align_items, mirror) {
                (style::AlignItems::Start, false) | (style::AlignItems::End, true) => {
                    taffy::AlignItems::Start
                }
                (style::AlignItems::End, false) | (style::AlignItems::Start, true) => {
                    taffy::AlignItems::End
                }
                (style::AlignItems::Center, _) => taffy::AlignItems::Center,
                (style::AlignItems::Stretch, _) => taffy::AlignItems::Stretch,
            });
        }
        style::Display::Grid => {
            ts.display = taffy::Display::Grid;
            ts.grid_template_columns =
                vec![taffy::TrackSizingFunction::from_flex(1.0); s.grid_columns];
        }
        style::Display::Block | style::Display::ListItem | style::Display::InlineBlock => {
            // Use flex column for block-level elements (vertical stacking)
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Column;
        }
        style::Display::Inline => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = if rtl {
                taffy::FlexDirection::RowReverse
            } else {
                taffy::FlexDirection::Row
            };
            ts.flex_wrap = taffy::FlexWrap::Wrap;
        }
        style::Display::None => {
            ts.display = taffy::Display::None;
        }
    }

    ts.size = Size {
        width: dim_to_taffy(s.width),
        height: dim_to_taffy(s.height),
    };
    // Allow flex/shrink items to compress below their natural content size
    ts.min_size = Size {
        width: if s.flex_shrink > 0.0 || s.flex_grow > 0.0 {
            Dimension::Length(0.0)
        } else {
            Dimension::Auto
        },
        height: Dimension::Auto,
    };
    ts.max_size = Size {
        width: dim_to_taffy(s.max_width),
        height: Dimension::Auto,
    };
    ts.flex_grow = s.flex_grow;
    ts.flex_shrink = s.flex_shrink;

    ts.margin = margin_rect(s);
    ts.padding = padding_rect(s);
    // The list gutter sits on the inline-start side.
    if *tag == Tag::Ul && rtl {
        std::mem::swap(&mut ts.padding.left, &mut ts.padding.right);
    }
    ts.border = border_rect(s);
    ts.gap = Size {
        width: LengthPercentage::Length(s.gap),
        height: LengthPercentage::Length(s.gap),
    };

    ts
}

fn margin_rect(s: &ComputedStyle) -> Rect<LengthPercentageAuto> {
    Rect {
        top: LengthPercentageAuto::Length(s.margin.top),
        right: LengthPercentageAuto::Length(s.margin.right),
        bottom: LengthPercentageAuto::Length(s.margin.bottom),
        left: LengthPercentageAuto::Length(s.margin.left),
    }
}

fn padding_rect(s: &ComputedStyle) -> Rect<LengthPercentage> {
    Rect {
        top: LengthPercentage::Length(s.padding.top),
        right: LengthPercentage::Length(s.padding.right),
        bottom: LengthPercentage::Length(s.padding.bottom),
        left: LengthPercentage::Length(s.padding.left),
    }
}

fn border_rect(s: &ComputedStyle) -> Rect<LengthPercentage> {
    Rect {
        top: LengthPercentage::Length(s.border.top),
        right: LengthPercentage::Length(s.border.right),
        bottom: LengthPercentage::Length(s.border.bottom),
        left: LengthPercentage::Length(s.border.left),
    }
}

fn dim_to_taffy(d: style::Dimension) -> Dimension {
    match d {
        style::Dimension::Auto => Dimension::Auto,
        style::Dimension::Px(v) => Dimension::Length(v),
        style::Dimension::Percent(v) => Dimension::Percent(v / 100.0),
    }
}

// ---------------------------------------------------------------------------
// Image intrinsic-size helper
// ---------------------------------------------------------------------------

/// Decode a data-URI image and return a cloned [`ComputedStyle`] with any
/// `Auto` width/height replaced by values derived from the image's intrinsic
/// dimensions.
///
/// Returns `None` when the src is not a decodable data URI or when both
/// dimensions are already specified.
fn resolve_img_auto_dimensions(
    src: &str,
    style: &ComputedStyle,
    parent_width: f32,
) -> Option<ComputedStyle> {
    let img = crate::raster::decode_data_uri(src)?;
    let (px_w, px_h) = (img.width() as f32, img.height() as f32);
    if px_w == 0.0 || px_h == 0.0 {
        return None;
    }
    let aspect = px_w / px_h;

    let known_w = match style.width {
        style::Dimension::Px(v) => Some(v),
        style::Dimension::Percent(p) => Some(parent_width * p / 100.0),
        style::Dimension::Auto => None,
    };
    let known_h = match style.height {
        style::Dimension::Px(v) => Some(v),
        _ => None,
    };

    let mut s = style.clone();
    match (known_w, known_h) {
        (Some(w), None) => s.height = style::Dimension::Px((w / aspect).max(1.0)),
        (None, Some(h)) => s.width = style::Dimension::Px((h * aspect).max(1.0)),
        (None, None) => {
            s.width = style::Dimension::Px(px_w);
            s.height = style::Dimension::Px(px_h);
        }
        (Some(_), Some(_)) => return None,
    }
    Some(s)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute layout for a styled tree inside a viewport of `viewport_width`
/// px, returning the top-level positioned boxes in document coordinates.
pub fn compute_layout(
    styled_nodes: &[StyledNode],
    viewport_width: f32,
    fonts: &FontManager,
) -> Result<Vec<PositionedBox>, PaintError> {
    let mut builder = LayoutBuilder::new(fonts);

    let child_ids = styled_nodes
        .iter()
        .map(|node| builder.build_node(node, viewport_width))
        .collect::<Result<Vec<_>, _>>()?;

    let root_style = Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Column,
        size: Size {
            width: Dimension::Length(viewport_width),
            height: Dimension::Auto,
        },
        ..Default::default()
    };
    let root = builder.taffy.new_with_children(root_style, &child_ids)?;

    builder.taffy.compute_layout(
        root,
        Size {
            width: AvailableSpace::Definite(viewport_width),
            height: AvailableSpace::MaxContent,
        },
    )?;

    Ok(builder.extract(root, 0.0, 0.0)?.children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::style::build_styled_tree;

    fn layout(html: &str) -> Vec<PositionedBox> {
        let dom = parse_html(html);
        let styled = build_styled_tree(&dom, None);
        let fonts = FontManager::default();
        compute_layout(&styled, 600.0, &fonts).unwrap()
    }

    #[test]
    fn layout_simple_paragraph() {
        let boxes = layout("<p>Hello world</p>");
        assert!(!boxes.is_empty(), "Should produce at least one box");
        let first = &boxes[0];
        assert!(first.width > 0.0, "Box should have width");
        assert!(first.height > 0.0, "Box should have height");
    }

    #[test]
    fn paragraph_height_includes_padding() {
        let boxes = layout(r#"<p class="py-2">Hello</p>"#);
        // 16px × 1.4 line height + 2 × 8px padding, snapped to whole px
        assert_eq!(boxes[0].height, (22.4f32 + 16.0).round());
    }

    #[test]
    fn rtl_row_is_mirrored() {
        let html = r#"<div dir="rtl" class="flex"><span>A</span><span>B</span></div>"#;
        let boxes = layout(html);
        let row = &boxes[0];
        assert_eq!(row.children.len(), 2);
        assert!(row.children[0].x > row.children[1].x);
    }

    #[test]
    fn ltr_row_flows_left_to_right() {
        let boxes = layout(r#"<div class="flex"><span>A</span><span>B</span></div>"#);
        let row = &boxes[0];
        assert!(row.children[0].x < row.children[1].x);
    }

    #[test]
    fn list_items_get_bullets_unless_disabled() {
        let boxes = layout("<ul><li>One</li><li>Two</li></ul>");
        let ul = &boxes[0];
        assert_eq!(ul.children.len(), 2);
        assert!(ul.children.iter().all(|li| li.marker.as_deref() == Some(BULLET)));

        let boxes = layout(r#"<ul class="list-none"><li>One</li></ul>"#);
        assert!(boxes[0].children[0].marker.is_none());
    }

    #[test]
    fn wrapping_row_keeps_chip_widths() {
        let html = r#"<div class="flex flex-wrap gap-2"><span class="px-3">Rust</span><span class="px-3">Go</span></div>"#;
        let boxes = layout(html);
        let chip = &boxes[0].children[0];
        // 4 chars × 8px + 24px padding
        assert!((chip.width - 56.0).abs() < 0.01, "chip width {}", chip.width);
    }
}
