//! Rasterizer – captures a painted [`Surface`] into an opaque RGB bitmap
//! with `tiny-skia`.
//!
//! Text is shaped with `rustybuzz` per bidi run (so Arabic joins and RTL
//! runs read correctly) and filled from `ttf-parser` glyph outlines. When no
//! real font is loaded, each word is drawn as a placeholder bar instead.

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use image::{DynamicImage, RgbImage};
use tiny_skia::{
    FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Transform,
};
use unicode_bidi::{BidiInfo, Level};

use crate::error::ExportError;
use crate::fonts::{FontKey, FontManager};
use crate::pipeline::PipelineConfig;
use crate::selection::TextDirection;
use crate::style::Color;
use crate::surface::{LayoutBox, Surface, TextContent, TextLine};

/// Gap between a list bullet and its item, in px.
const MARKER_GAP: f32 = 10.0;

/// Capture the full extent of `surface` at `config.scale` onto an opaque
/// background.
pub fn rasterize(
    surface: &Surface,
    fonts: &FontManager,
    config: &PipelineConfig,
) -> Result<RgbImage, ExportError> {
    if !(config.scale.is_finite() && config.scale > 0.0) {
        return Err(ExportError::Rasterization(format!(
            "invalid scale {}",
            config.scale
        )));
    }
    let (width, height) = surface.pixel_size(config.scale);
    if width == 0 || height == 0 {
        return Err(ExportError::Rasterization(format!(
            "surface has no extent ({width}x{height})"
        )));
    }
    let pixels = u64::from(width) * u64::from(height);
    if pixels > config.max_pixels {
        return Err(ExportError::Rasterization(format!(
            "{width}x{height} capture exceeds the {} pixel limit",
            config.max_pixels
        )));
    }

    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        ExportError::Rasterization(format!("cannot allocate {width}x{height} pixmap"))
    })?;
    let background = Color::parse(&config.background).unwrap_or_else(|| {
        log::warn!("Unparsable background '{}', using white", config.background);
        Color::WHITE
    });
    pixmap.fill(tiny_skia::Color::from_rgba8(
        channel(background.r),
        channel(background.g),
        channel(background.b),
        255,
    ));

    if !fonts.has_real_fonts() {
        log::warn!("No font loaded; text is drawn as placeholder bars");
    }

    let mut painter = Painter {
        pixmap: &mut pixmap,
        fonts,
        transform: Transform::from_scale(config.scale, config.scale),
    };
    for b in &surface.boxes {
        painter.paint_box(b);
    }

    log::debug!("Rasterized {width}x{height} px at scale {}", config.scale);
    // The canvas is opaque, so premultiplied RGBA equals straight RGB.
    let rgb: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| ExportError::Rasterization("pixel buffer size mismatch".to_string()))
}

/// Decode a `data:<mime>;base64,<data>` image. Anything else yields `None`.
pub(crate) fn decode_data_uri(src: &str) -> Option<DynamicImage> {
    let rest = src.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    if !header.contains(";base64") {
        log::warn!("Skipping image: only base64 data URIs are supported");
        return None;
    }
    let bytes = match BASE64_STD.decode(data.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Skipping image: base64 decode error: {e}");
            return None;
        }
    };
    match image::load_from_memory(&bytes) {
        Ok(img) => Some(img),
        Err(e) => {
            log::warn!("Skipping image: decode error: {e}");
            None
        }
    }
}

fn channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn solid(color: [f32; 4]) -> Paint<'static> {
    let [r, g, b, a] = color;
    let mut paint = Paint::default();
    paint.set_color_rgba8(channel(r), channel(g), channel(b), channel(a));
    paint.anti_alias = true;
    paint
}

struct Painter<'a> {
    pixmap: &'a mut Pixmap,
    fonts: &'a FontManager,
    transform: Transform,
}

impl Painter<'_> {
    fn paint_box(&mut self, b: &LayoutBox) {
        if let Some(bg) = b.background_color {
            self.fill_rounded(b.x, b.y, b.width, b.height, b.border_radius, bg);
        }

        if let Some(border) = &b.border {
            let [top, right, bottom, left] = border.widths;
            let uniform = top == right && right == bottom && bottom == left;
            if uniform && b.border_radius > 0.0 {
                self.stroke_rounded(b, top, border.color);
            } else {
                let c = border.color;
                self.fill_rect(b.x, b.y, b.width, top, c);
                self.fill_rect(b.x, b.y + b.height - bottom, b.width, bottom, c);
                self.fill_rect(b.x, b.y, left, b.height, c);
                self.fill_rect(b.x + b.width - right, b.y, right, b.height, c);
            }
        }

        if let Some(img) = &b.image {
            self.draw_image(&img.src, b.x, b.y, img.width, img.height);
        }

        if let Some(text) = &b.text {
            self.draw_text(b, text);
        }

        for child in &b.children {
            self.paint_box(child);
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: [f32; 4]) {
        if let Some(rect) = Rect::from_xywh(x, y, w, h) {
            self.pixmap
                .fill_rect(rect, &solid(color), self.transform, None);
        }
    }

    fn fill_rounded(&mut self, x: f32, y: f32, w: f32, h: f32, r: f32, color: [f32; 4]) {
        if r <= 0.0 {
            self.fill_rect(x, y, w, h, color);
            return;
        }
        if let Some(path) = rounded_rect(x, y, w, h, r) {
            self.pixmap
                .fill_path(&path, &solid(color), FillRule::Winding, self.transform, None);
        }
    }

    fn stroke_rounded(&mut self, b: &LayoutBox, width: f32, color: [f32; 4]) {
        let half = width / 2.0;
        let Some(path) = rounded_rect(
            b.x + half,
            b.y + half,
            b.width - width,
            b.height - width,
            (b.border_radius - half).max(0.0),
        ) else {
            return;
        };
        let stroke = tiny_skia::Stroke {
            width,
            ..Default::default()
        };
        self.pixmap
            .stroke_path(&path, &solid(color), &stroke, self.transform, None);
    }

    fn draw_image(&mut self, src: &str, x: f32, y: f32, w: f32, h: f32) {
        let Some(img) = decode_data_uri(src) else {
            return;
        };
        let rgba = img.to_rgba8();
        let (iw, ih) = rgba.dimensions();
        let Some(mut source) = Pixmap::new(iw, ih) else {
            return;
        };
        // tiny-skia stores premultiplied alpha.
        for (dst, px) in source.data_mut().chunks_exact_mut(4).zip(rgba.pixels()) {
            let [r, g, b, a] = px.0;
            let premul = |c: u8| ((u16::from(c) * u16::from(a) + 127) / 255) as u8;
            dst.copy_from_slice(&[premul(r), premul(g), premul(b), a]);
        }
        let placement = self
            .transform
            .pre_translate(x, y)
            .pre_scale(w / iw as f32, h / ih as f32);
        let paint = PixmapPaint {
            quality: FilterQuality::Bicubic,
            ..Default::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &paint, placement, None);
    }

    fn draw_text(&mut self, b: &LayoutBox, text: &TextContent) {
        let fonts = self.fonts;
        let key = FontKey::new(&text.font_family, text.bold, text.italic);
        let ascender = fonts.ascender_px(text.font_size, text.bold, text.italic, &text.font_family);
        let descender =
            fonts.descender_px(text.font_size, text.bold, text.italic, &text.font_family);
        let half_leading = (text.line_height - (ascender + descender)) / 2.0;
        let paint = solid(text.color);

        if let (Some(marker), Some(first)) = (&text.list_marker, text.lines.first()) {
            if !marker.is_empty() {
                self.draw_marker(b, text, first);
            }
        }

        for line in &text.lines {
            let baseline = b.y + line.y_offset + half_leading + ascender;
            let left = b.x + line.x_offset;
            let drawn_width = match fonts.font_bytes(&key) {
                Some(bytes) => self.draw_shaped_line(bytes, line, text, left, baseline, &paint),
                None => {
                    self.draw_placeholder_line(line, text, left, baseline, &paint);
                    line.width
                }
            };
            if text.underline {
                let start = anchored_left(left, line.width, drawn_width, &text.text_align);
                let thickness = (text.font_size / 16.0).max(1.0);
                self.fill_rect(
                    start,
                    baseline + text.font_size * 0.1,
                    drawn_width,
                    thickness,
                    text.color,
                );
            }
        }
    }

    /// Bullet on the inline-start side of the first line.
    fn draw_marker(&mut self, b: &LayoutBox, text: &TextContent, first: &TextLine) {
        let radius = text.font_size * 0.15;
        let cy = b.y + first.y_offset + text.line_height / 2.0;
        let cx = match text.direction {
            TextDirection::Ltr => b.x - MARKER_GAP,
            TextDirection::Rtl => b.x + b.width + MARKER_GAP,
        };
        if let Some(path) = PathBuilder::from_circle(cx, cy, radius) {
            self.pixmap.fill_path(
                &path,
                &solid(text.color),
                FillRule::Winding,
                self.transform,
                None,
            );
        }
    }

    /// Shape each bidi run and fill the glyph outlines in visual order.
    /// Returns the advance width actually drawn.
    fn draw_shaped_line(
        &mut self,
        bytes: &[u8],
        line: &TextLine,
        text: &TextContent,
        left: f32,
        baseline: f32,
        paint: &Paint,
    ) -> f32 {
        let (Some(shaper), Ok(outlines)) = (
            rustybuzz::Face::from_slice(bytes, 0),
            ttf_parser::Face::parse(bytes, 0),
        ) else {
            log::warn!("Loaded font can no longer be parsed; skipping line");
            return 0.0;
        };
        let scale = text.font_size / outlines.units_per_em() as f32;

        let glyphs = shape_line(&shaper, &line.text, text.direction);
        let total: f32 = glyphs.iter().map(|g| g.advance as f32 * scale).sum();

        let mut pen = anchored_left(left, line.width, total, &text.text_align);
        let mut builder = PathBuilder::new();
        for glyph in &glyphs {
            let mut outline = GlyphOutline {
                builder: &mut builder,
                origin_x: pen + glyph.x_offset as f32 * scale,
                baseline: baseline - glyph.y_offset as f32 * scale,
                scale,
                italic: text.italic,
            };
            outlines.outline_glyph(ttf_parser::GlyphId(glyph.id), &mut outline);
            pen += glyph.advance as f32 * scale;
        }
        if let Some(path) = builder.finish() {
            self.pixmap
                .fill_path(&path, paint, FillRule::Winding, self.transform, None);
        }
        total
    }

    fn draw_placeholder_line(
        &mut self,
        line: &TextLine,
        text: &TextContent,
        left: f32,
        baseline: f32,
        paint: &Paint,
    ) {
        let space = self.fonts.measure_text_width(
            " ",
            text.font_size,
            text.bold,
            text.italic,
            &text.font_family,
        );
        let bar_height = text.font_size * 0.5;
        let mut x = left;
        for word in line.text.split_whitespace() {
            let w = self.fonts.measure_text_width(
                word,
                text.font_size,
                text.bold,
                text.italic,
                &text.font_family,
            );
            if let Some(rect) = Rect::from_xywh(x, baseline - bar_height, w, bar_height) {
                self.pixmap.fill_rect(rect, paint, self.transform, None);
            }
            x += w + space;
        }
    }
}

/// Left edge for a run of `drawn` width laid out in a slot measured as
/// `measured` starting at `left`, keeping the slot's alignment anchor.
fn anchored_left(left: f32, measured: f32, drawn: f32, align: &str) -> f32 {
    match align {
        "right" => left + measured - drawn,
        "center" => left + (measured - drawn) / 2.0,
        _ => left,
    }
}

struct ShapedGlyph {
    id: u16,
    advance: i32,
    x_offset: i32,
    y_offset: i32,
}

/// Shape `line` into glyphs in left-to-right visual order.
fn shape_line(face: &rustybuzz::Face, line: &str, direction: TextDirection) -> Vec<ShapedGlyph> {
    let base = match direction {
        TextDirection::Ltr => Level::ltr(),
        TextDirection::Rtl => Level::rtl(),
    };
    let info = BidiInfo::new(line, Some(base));
    let mut glyphs = Vec::new();
    for para in &info.paragraphs {
        let (levels, runs) = info.visual_runs(para, para.range.clone());
        for run in runs {
            let rtl = levels[run.start].is_rtl();
            let mut buffer = rustybuzz::UnicodeBuffer::new();
            buffer.push_str(&line[run]);
            buffer.set_direction(if rtl {
                rustybuzz::Direction::RightToLeft
            } else {
                rustybuzz::Direction::LeftToRight
            });
            buffer.guess_segment_properties();
            let shaped = rustybuzz::shape(face, &[], buffer);
            glyphs.extend(
                shaped
                    .glyph_infos()
                    .iter()
                    .zip(shaped.glyph_positions())
                    .map(|(info, pos)| ShapedGlyph {
                        id: info.glyph_id as u16,
                        advance: pos.x_advance,
                        x_offset: pos.x_offset,
                        y_offset: pos.y_offset,
                    }),
            );
        }
    }
    glyphs
}

/// Feeds `ttf-parser` outlines (font units, y up) into a path in document
/// px (y down).
struct GlyphOutline<'a> {
    builder: &'a mut PathBuilder,
    origin_x: f32,
    baseline: f32,
    scale: f32,
    italic: bool,
}

impl GlyphOutline<'_> {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        // Synthetic oblique when no italic face is loaded.
        let skew = if self.italic { 0.2 * y } else { 0.0 };
        (
            self.origin_x + (x + skew) * self.scale,
            self.baseline - y * self.scale,
        )
    }
}

impl ttf_parser::OutlineBuilder for GlyphOutline<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

fn rounded_rect(x: f32, y: f32, w: f32, h: f32, r: f32) -> Option<tiny_skia::Path> {
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    let r = r.min(w / 2.0).min(h / 2.0);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(width: f32, height: f32, boxes: Vec<LayoutBox>) -> Surface {
        Surface {
            title: "test".to_string(),
            direction: TextDirection::Ltr,
            width,
            height,
            boxes,
        }
    }

    #[test]
    fn bitmap_is_scaled_surface_extent() {
        let img = rasterize(
            &surface(100.0, 50.5, Vec::new()),
            &FontManager::default(),
            &PipelineConfig::default(),
        )
        .unwrap();
        assert_eq!(img.dimensions(), (200, 101));
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn backgrounds_are_painted() {
        let mut b = LayoutBox::new(0.0, 0.0, 10.0, 10.0);
        b.background_color = Some([1.0, 0.0, 0.0, 1.0]);
        let img = rasterize(
            &surface(20.0, 20.0, vec![b]),
            &FontManager::default(),
            &PipelineConfig::default(),
        )
        .unwrap();
        assert_eq!(img.get_pixel(5, 5).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(30, 30).0, [255, 255, 255]);
    }

    #[test]
    fn empty_surface_is_a_rasterization_error() {
        let err = rasterize(
            &surface(0.0, 0.0, Vec::new()),
            &FontManager::default(),
            &PipelineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::Rasterization(_)));
    }

    #[test]
    fn pixel_limit_is_enforced() {
        let config = PipelineConfig {
            max_pixels: 100,
            ..PipelineConfig::default()
        };
        let err = rasterize(&surface(100.0, 100.0, Vec::new()), &FontManager::default(), &config)
            .unwrap_err();
        assert!(matches!(err, ExportError::Rasterization(_)));
    }

    #[test]
    fn non_data_uris_are_ignored() {
        assert!(decode_data_uri("https://example.com/me.png").is_none());
        assert!(decode_data_uri("data:image/png,rawbytes").is_none());
    }

    #[test]
    fn data_uri_png_decodes() {
        let mut png = Vec::new();
        image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let uri = format!("data:image/png;base64,{}", BASE64_STD.encode(&png));
        let img = decode_data_uri(&uri).unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
    }
}
