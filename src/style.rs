//! Style resolver – maps inline styles, the `dir` attribute and Tailwind-like
//! utility classes to a flat [`ComputedStyle`] consumed by the layout engine.

use std::collections::HashMap;

use crate::dom::{DomNode, ElementNode, Tag};
use crate::selection::TextDirection;

/// Fully resolved style for a single element.
#[derive(Debug, Clone)]
pub struct ComputedStyle {
    // Display / layout
    pub display: Display,
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub gap: f32,
    pub grid_columns: usize,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,
    pub max_width: Dimension,

    // Spacing (px)
    pub margin: Edges,
    pub padding: Edges,

    // Border
    pub border: Edges,
    pub border_color: Color,
    pub border_radius: f32,

    // Typography
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_family: String,
    pub color: Color,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub text_decoration: TextDecoration,
    pub font_style: FontStyle,
    pub direction: TextDirection,
    /// Whether `<li>` children of this list get a bullet.
    pub list_bullets: bool,

    // Background
    pub background_color: Color,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            flex_direction: FlexDirection::Row,
            flex_wrap: FlexWrap::NoWrap,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            gap: 0.0,
            grid_columns: 1,
            width: Dimension::Auto,
            height: Dimension::Auto,
            max_width: Dimension::Auto,
            margin: Edges::ZERO,
            padding: Edges::ZERO,
            border: Edges::ZERO,
            border_color: Color::BLACK,
            border_radius: 0.0,
            font_size: 16.0,
            font_weight: FontWeight::Normal,
            font_family: crate::fonts::DEFAULT_FAMILY.to_string(),
            color: Color::BLACK,
            text_align: TextAlign::Start,
            line_height: 1.4,
            text_decoration: TextDecoration::None,
            font_style: FontStyle::Normal,
            direction: TextDirection::Ltr,
            list_bullets: false,
            background_color: Color::TRANSPARENT,
        }
    }
}

impl ComputedStyle {
    /// Physical alignment after applying the writing direction.
    pub fn physical_align(&self) -> TextAlign {
        match (self.text_align, self.direction) {
            (TextAlign::Start, TextDirection::Ltr) => TextAlign::Left,
            (TextAlign::Start, TextDirection::Rtl) => TextAlign::Right,
            (other, _) => other,
        }
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight == FontWeight::Bold
    }

    pub fn is_italic(&self) -> bool {
        self.font_style == FontStyle::Italic
    }

    /// Strip box-model properties so the style can be used for a bare text
    /// run inside its parent box.
    fn for_text_run(&self) -> Self {
        Self {
            margin: Edges::ZERO,
            padding: Edges::ZERO,
            border: Edges::ZERO,
            border_radius: 0.0,
            background_color: Color::TRANSPARENT,
            width: Dimension::Auto,
            height: Dimension::Auto,
            max_width: Dimension::Auto,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Flex,
    Grid,
    Inline,
    InlineBlock,
    ListItem,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexWrap {
    NoWrap,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    End,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignItems {
    Start,
    End,
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    /// Left in LTR documents, right in RTL ones.
    Start,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDecoration {
    None,
    Underline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Px(f32),
    Percent(f32),
}

/// Per-side lengths in px.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub const ZERO: Self = Self::all(0.0);

    pub const fn all(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    pub fn is_zero(&self) -> bool {
        self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0 && self.left == 0.0
    }
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
        match hex.len() {
            6 => Some(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => Some(Self::rgb(
                channel(&hex[0..1].repeat(2))?,
                channel(&hex[1..2].repeat(2))?,
                channel(&hex[2..3].repeat(2))?,
            )),
            _ => None,
        }
    }

    /// Parse a CSS colour: `#rgb`, `#rrggbb`, `rgb(r, g, b)`,
    /// `rgba(r, g, b, a)` or one of a few keywords.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.starts_with('#') {
            return Self::from_hex(value);
        }
        if let Some(args) = value
            .strip_prefix("rgba(")
            .or_else(|| value.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<f32> = args
                .split(',')
                .map(|p| p.trim().parse::<f32>())
                .collect::<Result<_, _>>()
                .ok()?;
            return match parts.as_slice() {
                [r, g, b] => Some(Self::rgb(r / 255.0, g / 255.0, b / 255.0)),
                [r, g, b, a] => Some(Self {
                    r: r / 255.0,
                    g: g / 255.0,
                    b: b / 255.0,
                    a: a.clamp(0.0, 1.0),
                }),
                _ => None,
            };
        }
        match value {
            "white" => Some(Self::WHITE),
            "black" => Some(Self::BLACK),
            "transparent" => Some(Self::TRANSPARENT),
            _ => None,
        }
    }
}

/// Tailwind palette subset used by the templates.
fn palette(name: &str) -> Option<Color> {
    let hex = match name {
        "white" => return Some(Color::WHITE),
        "black" => return Some(Color::BLACK),
        "gray-50" => "#f9fafb",
        "gray-100" => "#f3f4f6",
        "gray-200" => "#e5e7eb",
        "gray-300" => "#d1d5db",
        "gray-500" => "#6b7280",
        "gray-600" => "#4b5563",
        "gray-700" => "#374151",
        "gray-800" => "#1f2937",
        "gray-900" => "#111827",
        "green-100" => "#dcfce7",
        "green-800" => "#166534",
        "yellow-100" => "#fef9c3",
        "yellow-800" => "#854d0e",
        "blue-500" => "#3b82f6",
        "blue-600" => "#2563eb",
        "red-500" => "#ef4444",
        _ => return None,
    };
    Color::from_hex(hex)
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Resolve the style for an element, inheriting text properties from its parent.
pub fn resolve_style(element: &ElementNode, parent: Option<&ComputedStyle>) -> ComputedStyle {
    let mut style = base_style_for_tag(&element.tag);

    if let Some(p) = parent {
        style.font_size = p.font_size;
        style.font_weight = p.font_weight;
        style.font_family = p.font_family.clone();
        style.color = p.color;
        style.text_align = p.text_align;
        style.line_height = p.line_height;
        style.font_style = p.font_style;
        style.direction = p.direction;
    }
    // Headings keep their own weight/size even inside styled parents.
    apply_heading_defaults(&mut style, &element.tag);

    match element.dir() {
        Some("rtl") => style.direction = TextDirection::Rtl,
        Some("ltr") => style.direction = TextDirection::Ltr,
        _ => {}
    }

    for class in element.classes() {
        apply_tailwind_class(&mut style, class);
    }

    if let Some(inline) = element.inline_style() {
        apply_inline_style(&mut style, inline);
    }

    style
}

/// Default styles based on tag semantics.
fn base_style_for_tag(tag: &Tag) -> ComputedStyle {
    let mut s = ComputedStyle::default();
    match tag {
        Tag::P => {
            s.margin.bottom = 4.0;
        }
        Tag::Ul => {
            s.padding.left = 20.0;
            s.list_bullets = true;
        }
        Tag::Li => {
            s.display = Display::ListItem;
            s.margin.bottom = 2.0;
        }
        Tag::Span | Tag::A => {
            s.display = Display::Inline;
        }
        Tag::Img => {
            s.display = Display::InlineBlock;
        }
        Tag::H1 | Tag::H2 | Tag::H3 | Tag::H4 => {}
        Tag::Div | Tag::Section | Tag::Header | Tag::Body | Tag::Html => {}
        Tag::Head | Tag::Unknown(_) => {
            s.display = Display::None;
        }
    }
    s
}

fn apply_heading_defaults(s: &mut ComputedStyle, tag: &Tag) {
    let size = match tag {
        Tag::H1 => 32.0,
        Tag::H2 => 24.0,
        Tag::H3 => 20.0,
        Tag::H4 => 16.0,
        _ => return,
    };
    s.font_size = size;
    s.font_weight = FontWeight::Bold;
    s.line_height = 1.25;
}

/// Apply a single Tailwind utility class.
fn apply_tailwind_class(s: &mut ComputedStyle, class: &str) {
    match class {
        // Display
        "flex" => s.display = Display::Flex,
        "grid" => s.display = Display::Grid,
        "block" => s.display = Display::Block,
        "inline" => s.display = Display::Inline,
        "inline-block" => s.display = Display::InlineBlock,
        "hidden" => s.display = Display::None,

        // Flex
        "flex-row" => s.flex_direction = FlexDirection::Row,
        "flex-col" => s.flex_direction = FlexDirection::Column,
        "flex-wrap" => s.flex_wrap = FlexWrap::Wrap,
        "flex-nowrap" => s.flex_wrap = FlexWrap::NoWrap,
        "flex-grow" | "grow" => s.flex_grow = 1.0,
        "shrink-0" | "flex-shrink-0" => s.flex_shrink = 0.0,
        "flex-1" => {
            s.flex_grow = 1.0;
            s.flex_shrink = 1.0;
        }

        // Justify content
        "justify-start" => s.justify_content = JustifyContent::Start,
        "justify-end" => s.justify_content = JustifyContent::End,
        "justify-center" => s.justify_content = JustifyContent::Center,
        "justify-between" => s.justify_content = JustifyContent::SpaceBetween,
        "justify-around" => s.justify_content = JustifyContent::SpaceAround,
        "justify-evenly" => s.justify_content = JustifyContent::SpaceEvenly,

        // Align items
        "items-start" => s.align_items = AlignItems::Start,
        "items-end" => s.align_items = AlignItems::End,
        "items-center" => s.align_items = AlignItems::Center,
        "items-stretch" => s.align_items = AlignItems::Stretch,

        // Font weight / style
        "font-bold" | "font-semibold" => s.font_weight = FontWeight::Bold,
        "font-normal" | "font-medium" => s.font_weight = FontWeight::Normal,
        "italic" => s.font_style = FontStyle::Italic,
        "not-italic" => s.font_style = FontStyle::Normal,
        "underline" => s.text_decoration = TextDecoration::Underline,
        "no-underline" => s.text_decoration = TextDecoration::None,

        // Text alignment
        "text-start" => s.text_align = TextAlign::Start,
        "text-left" => s.text_align = TextAlign::Left,
        "text-center" => s.text_align = TextAlign::Center,
        "text-right" => s.text_align = TextAlign::Right,

        // Font sizes
        "text-xs" => s.font_size = 12.0,
        "text-sm" => s.font_size = 14.0,
        "text-base" => s.font_size = 16.0,
        "text-lg" => s.font_size = 18.0,
        "text-xl" => s.font_size = 20.0,
        "text-2xl" => s.font_size = 24.0,
        "text-3xl" => s.font_size = 30.0,
        "text-4xl" => s.font_size = 36.0,

        // Line height
        "leading-tight" => s.line_height = 1.25,
        "leading-normal" => s.line_height = 1.5,
        "leading-relaxed" => s.line_height = 1.625,

        // Lists
        "list-disc" => s.list_bullets = true,
        "list-none" => s.list_bullets = false,

        // Width
        "w-full" => s.width = Dimension::Percent(100.0),
        "w-auto" => s.width = Dimension::Auto,
        "w-1/2" => s.width = Dimension::Percent(50.0),
        "w-1/3" => s.width = Dimension::Percent(33.333),
        "w-2/3" => s.width = Dimension::Percent(66.666),
        "max-w-4xl" => s.max_width = Dimension::Px(896.0),

        // Borders / corners
        "border" => s.border = Edges::all(1.0),
        "rounded" => s.border_radius = 4.0,
        "rounded-md" => s.border_radius = 6.0,
        "rounded-lg" => s.border_radius = 8.0,
        "rounded-xl" => s.border_radius = 12.0,
        "rounded-full" => s.border_radius = 9999.0,

        _ => {
            try_parse_spacing_class(s, class);
            try_parse_color_class(s, class);
            try_parse_border_class(s, class);
            try_parse_gap_class(s, class);
            try_parse_grid_cols_class(s, class);
            try_parse_size_class(s, class);
        }
    }
}

fn try_parse_spacing_class(s: &mut ComputedStyle, class: &str) {
    // p-{n}, px-{n}, mb-{n}, ... (1 unit = 4px, fractional units allowed)
    let Some((prefix, value_str)) = class.rsplit_once('-') else {
        return;
    };
    let value: f32 = match value_str.parse::<f32>() {
        Ok(v) => v * 4.0,
        Err(_) => return,
    };

    let (edges, sides): (&mut Edges, &str) = if let Some(sides) = prefix.strip_prefix('p') {
        (&mut s.padding, sides)
    } else if let Some(sides) = prefix.strip_prefix('m') {
        (&mut s.margin, sides)
    } else {
        return;
    };
    match sides {
        "" => *edges = Edges::all(value),
        "x" => {
            edges.left = value;
            edges.right = value;
        }
        "y" => {
            edges.top = value;
            edges.bottom = value;
        }
        "t" => edges.top = value,
        "r" => edges.right = value,
        "b" => edges.bottom = value,
        "l" => edges.left = value,
        _ => {}
    }
}

fn try_parse_color_class(s: &mut ComputedStyle, class: &str) {
    if let Some(color) = class.strip_prefix("text-").and_then(palette) {
        s.color = color;
    } else if let Some(color) = class.strip_prefix("bg-").and_then(palette) {
        s.background_color = color;
    } else if let Some(color) = class.strip_prefix("border-").and_then(palette) {
        s.border_color = color;
    }
}

fn try_parse_border_class(s: &mut ComputedStyle, class: &str) {
    // border-{n}, border-{t|r|b|l}-{n}, border-{t|r|b|l}
    let Some(rest) = class.strip_prefix("border-") else {
        return;
    };
    let (side, width) = match rest.split_once('-') {
        Some((side, n)) => match n.parse::<f32>() {
            Ok(w) => (side, w),
            Err(_) => return,
        },
        None => match rest.parse::<f32>() {
            Ok(w) => ("", w),
            Err(_) => (rest, 1.0),
        },
    };
    match side {
        "" => s.border = Edges::all(width),
        "t" => s.border.top = width,
        "r" => s.border.right = width,
        "b" => s.border.bottom = width,
        "l" => s.border.left = width,
        _ => {}
    }
}

fn try_parse_gap_class(s: &mut ComputedStyle, class: &str) {
    if let Some(rest) = class.strip_prefix("gap-") {
        if let Ok(v) = rest.parse::<f32>() {
            s.gap = v * 4.0;
        }
    }
}

fn try_parse_grid_cols_class(s: &mut ComputedStyle, class: &str) {
    if let Some(rest) = class.strip_prefix("grid-cols-") {
        if let Ok(n) = rest.parse::<usize>() {
            s.grid_columns = n.max(1);
        }
    }
}

fn try_parse_size_class(s: &mut ComputedStyle, class: &str) {
    if let Some(v) = class.strip_prefix("w-").and_then(|r| r.parse::<f32>().ok()) {
        s.width = Dimension::Px(v * 4.0);
    } else if let Some(v) = class.strip_prefix("h-").and_then(|r| r.parse::<f32>().ok()) {
        s.height = Dimension::Px(v * 4.0);
    }
}

// ---------------------------------------------------------------------------
// Inline style parsing (limited subset)
// ---------------------------------------------------------------------------

fn apply_inline_style(s: &mut ComputedStyle, style_str: &str) {
    for decl in style_str.split(';') {
        let Some((prop, val)) = decl.split_once(':') else {
            continue;
        };
        apply_css_property(s, prop.trim(), val.trim());
    }
}

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    match prop {
        "display" => {
            s.display = match val {
                "flex" => Display::Flex,
                "grid" => Display::Grid,
                "block" => Display::Block,
                "inline" => Display::Inline,
                "inline-block" => Display::InlineBlock,
                "none" => Display::None,
                _ => s.display,
            }
        }
        "flex-direction" => {
            s.flex_direction = match val {
                "row" => FlexDirection::Row,
                "column" => FlexDirection::Column,
                _ => s.flex_direction,
            }
        }
        "font-size" => {
            if let Some(px) = parse_px(val) {
                s.font_size = px;
            }
        }
        "font-weight" => {
            s.font_weight = match val {
                "bold" | "600" | "700" | "800" | "900" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }
        }
        "font-style" => {
            s.font_style = match val {
                "italic" => FontStyle::Italic,
                _ => FontStyle::Normal,
            }
        }
        "color" => {
            if let Some(c) = Color::parse(val) {
                s.color = c;
            }
        }
        "background-color" | "background" => {
            if let Some(c) = Color::parse(val) {
                s.background_color = c;
            }
        }
        "text-align" => {
            s.text_align = match val {
                "center" => TextAlign::Center,
                "right" => TextAlign::Right,
                "left" => TextAlign::Left,
                _ => TextAlign::Start,
            }
        }
        "direction" => {
            s.direction = match val {
                "rtl" => TextDirection::Rtl,
                _ => TextDirection::Ltr,
            }
        }
        "width" => s.width = parse_dimension(val),
        "height" => s.height = parse_dimension(val),
        "max-width" => s.max_width = parse_dimension(val),
        "margin" => apply_shorthand_spacing(val, &mut s.margin),
        "padding" => apply_shorthand_spacing(val, &mut s.padding),
        "margin-top" | "margin-right" | "margin-bottom" | "margin-left" => {
            if let Some(px) = parse_px(val) {
                set_side(&mut s.margin, &prop["margin-".len()..], px);
            }
        }
        "padding-top" | "padding-right" | "padding-bottom" | "padding-left" => {
            if let Some(px) = parse_px(val) {
                set_side(&mut s.padding, &prop["padding-".len()..], px);
            }
        }
        "border" => apply_border_shorthand(s, None, val),
        "border-top" | "border-right" | "border-bottom" | "border-left" => {
            apply_border_shorthand(s, Some(&prop["border-".len()..]), val)
        }
        "border-width" => {
            if let Some(px) = parse_px(val) {
                s.border = Edges::all(px);
            }
        }
        "border-color" => {
            if let Some(c) = Color::parse(val) {
                s.border_color = c;
            }
        }
        "border-radius" => {
            if let Some(px) = parse_px(val) {
                s.border_radius = px;
            }
        }
        "line-height" => {
            if let Ok(v) = val.parse::<f32>() {
                s.line_height = v;
            } else if let Some(px) = parse_px(val) {
                s.line_height = px / s.font_size;
            }
        }
        "gap" => {
            if let Some(px) = parse_px(val) {
                s.gap = px;
            }
        }
        _ => {}
    }
}

fn set_side(edges: &mut Edges, side: &str, px: f32) {
    match side {
        "top" => edges.top = px,
        "right" => edges.right = px,
        "bottom" => edges.bottom = px,
        "left" => edges.left = px,
        _ => {}
    }
}

/// `border[-side]: <width> [style] [color]`
fn apply_border_shorthand(s: &mut ComputedStyle, side: Option<&str>, val: &str) {
    // Colours like rgba(1, 2, 3, 0.5) contain spaces; only split what precedes them.
    let (head, func_color) = match val.find("rgb") {
        Some(i) => (&val[..i], Color::parse(&val[i..])),
        None => (val, None),
    };
    let mut width = None;
    let mut color = func_color;
    for token in head.split_whitespace() {
        if let Some(px) = parse_px(token) {
            width = Some(px);
        } else if let Some(c) = Color::parse(token) {
            color = Some(c);
        }
    }
    if let Some(px) = width {
        match side {
            Some(side) => set_side(&mut s.border, side, px),
            None => s.border = Edges::all(px),
        }
    }
    if let Some(c) = color {
        s.border_color = c;
    }
}

fn parse_px(s: &str) -> Option<f32> {
    s.trim().trim_end_matches("px").parse().ok()
}

fn parse_dimension(s: &str) -> Dimension {
    let s = s.trim();
    if s == "auto" {
        Dimension::Auto
    } else if let Some(pct) = s.strip_suffix('%') {
        pct.parse::<f32>()
            .map(Dimension::Percent)
            .unwrap_or(Dimension::Auto)
    } else {
        parse_px(s).map(Dimension::Px).unwrap_or(Dimension::Auto)
    }
}

fn apply_shorthand_spacing(val: &str, edges: &mut Edges) {
    let parts: Vec<f32> = val.split_whitespace().filter_map(parse_px).collect();
    match parts.as_slice() {
        [all] => *edges = Edges::all(*all),
        [vertical, horizontal] => {
            *edges = Edges {
                top: *vertical,
                right: *horizontal,
                bottom: *vertical,
                left: *horizontal,
            }
        }
        [top, right, bottom, left] => {
            *edges = Edges {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Styled DOM tree
// ---------------------------------------------------------------------------

/// A DOM node annotated with its computed style.
#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        tag: Tag,
        style: ComputedStyle,
        children: Vec<StyledNode>,
        /// Original attributes (image src etc.)
        attrs: HashMap<String, String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

/// Build a styled tree from a DOM tree, resolving styles top-down.
pub fn build_styled_tree(
    nodes: &[DomNode],
    parent_style: Option<&ComputedStyle>,
) -> Vec<StyledNode> {
    let mut result = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(e) => {
                let style = resolve_style(e, parent_style);
                let children = build_styled_tree(&e.children, Some(&style));
                result.push(StyledNode::Element {
                    tag: e.tag.clone(),
                    style,
                    children,
                    attrs: e.attributes.clone(),
                });
            }
            DomNode::Text(text) => {
                if !text.trim().is_empty() {
                    let style = parent_style
                        .map(ComputedStyle::for_text_run)
                        .unwrap_or_default();
                    result.push(StyledNode::Text {
                        text: text.clone(),
                        style,
                    });
                }
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    #[test]
    fn tailwind_padding_and_margin() {
        let mut s = ComputedStyle::default();
        apply_tailwind_class(&mut s, "p-4");
        apply_tailwind_class(&mut s, "mb-1.5");
        apply_tailwind_class(&mut s, "px-2");
        assert_eq!(s.padding.top, 16.0);
        assert_eq!(s.padding.left, 8.0);
        assert_eq!(s.margin.bottom, 6.0);
    }

    #[test]
    fn odd_spacing_classes_are_ignored() {
        let mut s = ComputedStyle::default();
        apply_tailwind_class(&mut s, "-2");
        apply_tailwind_class(&mut s, "é-2");
        apply_tailwind_class(&mut s, "pé-2");
        assert!(s.padding.is_zero());
        assert!(s.margin.is_zero());
    }

    #[test]
    fn border_classes_set_single_sides() {
        let mut s = ComputedStyle::default();
        apply_tailwind_class(&mut s, "border-b-2");
        apply_tailwind_class(&mut s, "border-gray-200");
        assert_eq!(s.border.bottom, 2.0);
        assert_eq!(s.border.top, 0.0);
        assert_eq!(s.border_color, Color::from_hex("#e5e7eb").unwrap());
    }

    #[test]
    fn inline_border_shorthand_with_rgba() {
        let mut s = ComputedStyle::default();
        apply_inline_style(&mut s, "border-left: 4px solid rgba(26, 26, 46, 0.5)");
        assert_eq!(s.border.left, 4.0);
        assert!((s.border_color.a - 0.5).abs() < 1e-6);
    }

    #[test]
    fn rgba_background_keeps_alpha() {
        let c = Color::parse("rgba(26, 26, 46, 0.05)").unwrap();
        assert!((c.r - 26.0 / 255.0).abs() < 1e-6);
        assert!((c.a - 0.05).abs() < 1e-6);
        assert!(Color::parse("hsl(1, 2%, 3%)").is_none());
    }

    #[test]
    fn dir_attribute_is_inherited_and_flips_start_alignment() {
        let dom = parse_html(r#"<div dir="rtl"><p>مرحبا</p></div>"#);
        let styled = build_styled_tree(&dom, None);
        let StyledNode::Element { children, .. } = &styled[0] else {
            panic!("Expected element");
        };
        let StyledNode::Element { style, .. } = &children[0] else {
            panic!("Expected p");
        };
        assert_eq!(style.direction, TextDirection::Rtl);
        assert_eq!(style.physical_align(), TextAlign::Right);
    }

    #[test]
    fn text_runs_do_not_inherit_box_model() {
        let dom = parse_html(r#"<span class="px-3 rounded-full bg-gray-100">Rust</span>"#);
        let styled = build_styled_tree(&dom, None);
        let StyledNode::Element { children, .. } = &styled[0] else {
            panic!("Expected span");
        };
        let StyledNode::Text { style, .. } = &children[0] else {
            panic!("Expected text");
        };
        assert!(style.padding.is_zero());
        assert!(style.background_color.is_transparent());
        assert_eq!(style.border_radius, 0.0);
    }

    #[test]
    fn headings_are_bold_inside_plain_parents() {
        let dom = parse_html(r#"<div class="text-sm"><h4>Title</h4></div>"#);
        let styled = build_styled_tree(&dom, None);
        let StyledNode::Element { children, .. } = &styled[0] else {
            panic!("Expected div");
        };
        let StyledNode::Element { style, .. } = &children[0] else {
            panic!("Expected h4");
        };
        assert!(style.is_bold());
        assert_eq!(style.font_size, 16.0);
    }
}
