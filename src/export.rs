//! Export pipeline – surface → bitmap → JPEG → single-page PDF.
//!
//! The page is exactly as large as the captured bitmap (1 px = 1 pt), with
//! the JPEG as its only content.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ::image::codecs::jpeg::JpegEncoder;
use ::image::RgbImage;
use printpdf::*;

use crate::error::{ExportError, Result};
use crate::fonts::FontManager;
use crate::i18n::Language;
use crate::pipeline::PipelineConfig;
use crate::raster::rasterize;
use crate::selection::Layout;
use crate::surface::Surface;

/// Millimetres per PostScript point.
const MM_PER_PT: f32 = 0.352778;

/// A finished export, ready to be handed to a [`Downloader`].
#[derive(Debug, Clone)]
pub struct ExportedPdf {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Pixel size of the captured bitmap, which is also the page size in pt.
    pub page_width_px: u32,
    pub page_height_px: u32,
}

/// Receives finished PDFs. The binary writes them to a directory; tests
/// record them.
pub trait Downloader: Send {
    fn deliver(&mut self, pdf: &ExportedPdf) -> io::Result<()>;
}

/// Writes each PDF into a fixed directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectoryDownloader {
    dir: PathBuf,
}

impl DirectoryDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where `file_name` ends up once delivered.
    pub fn target(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

impl Downloader for DirectoryDownloader {
    fn deliver(&mut self, pdf: &ExportedPdf) -> io::Result<()> {
        if !self.dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.dir)?;
        }
        let path = self.target(&pdf.file_name);
        // Write beside the target and rename, so a failed write never
        // leaves a truncated PDF under the final name.
        let partial = self.dir.join(format!(".{}.part", pdf.file_name));
        if let Err(e) = fs::write(&partial, &pdf.bytes).and_then(|()| fs::rename(&partial, &path)) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        log::info!("Wrote '{}' ({} bytes)", path.display(), pdf.bytes.len());
        Ok(())
    }
}

/// `CV_<name>_<lang>_<layout>.pdf`, with every whitespace run in the name
/// replaced by a single underscore.
pub fn export_file_name(name: &str, language: Language, layout: Layout) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_space = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_space {
                slug.push('_');
            }
            in_space = true;
        } else {
            slug.push(ch);
            in_space = false;
        }
    }
    format!("CV_{slug}_{}_{}.pdf", language.code(), layout.name())
}

/// Encode the capture as baseline JPEG.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    encoder.encode_image(image)?;
    Ok(out)
}

/// Wrap a JPEG in a one-page PDF whose page matches the image's pixel size.
pub fn build_pdf(jpeg: &[u8], width_px: u32, height_px: u32, title: &str) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::new(title);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let raw = RawImage::decode_from_bytes(jpeg, &mut warnings)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    for w in &warnings {
        log::debug!("printpdf: {w:?}");
    }
    let xobj_id = doc.add_image(&raw);

    // At 72 dpi one image pixel covers one point.
    let ops = vec![Op::UseXobject {
        id: xobj_id,
        transform: XObjectTransform {
            translate_x: Some(Pt(0.0)),
            translate_y: Some(Pt(0.0)),
            rotate: None,
            scale_x: Some(1.0),
            scale_y: Some(1.0),
            dpi: Some(72.0),
        },
    }];

    let page = PdfPage::new(
        Mm(width_px as f32 * MM_PER_PT),
        Mm(height_px as f32 * MM_PER_PT),
        ops,
    );
    doc.with_pages(vec![page]);
    Ok(doc.save(&PdfSaveOptions::default(), &mut Vec::new()))
}

/// Capture an already painted surface into a named PDF. Nothing is
/// re-rendered.
pub fn export_surface(
    surface: &Surface,
    fonts: &FontManager,
    config: &PipelineConfig,
    file_name: String,
) -> Result<ExportedPdf> {
    // 1. Capture
    let bitmap = rasterize(surface, fonts, config)?;
    let (width, height) = bitmap.dimensions();

    // 2. Encode
    let jpeg = encode_jpeg(&bitmap, config.jpeg_quality)?;
    log::debug!("Encoded {width}x{height} capture as {} byte JPEG", jpeg.len());

    // 3. Wrap
    let bytes = build_pdf(&jpeg, width, height, &surface.title)?;
    log::info!("Exported '{file_name}' ({} bytes)", bytes.len());

    Ok(ExportedPdf {
        file_name,
        bytes,
        page_width_px: width,
        page_height_px: height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_collapses_whitespace_runs() {
        assert_eq!(
            export_file_name("Jane  Q.\tDoe", Language::De, Layout::Full),
            "CV_Jane_Q._Doe_de_full.pdf"
        );
    }

    #[test]
    fn jpeg_has_soi_marker() {
        let img = RgbImage::from_pixel(8, 4, ::image::Rgb([200, 10, 10]));
        let jpeg = encode_jpeg(&img, 90).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn pdf_wraps_jpeg() {
        let img = RgbImage::from_pixel(20, 30, ::image::Rgb([255, 255, 255]));
        let jpeg = encode_jpeg(&img, 90).unwrap();
        let pdf = build_pdf(&jpeg, 20, 30, "t").unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
    }

    #[test]
    fn directory_downloader_writes_file() {
        let dir = std::env::temp_dir().join(format!("cv-forge-dl-{}", std::process::id()));
        let mut dl = DirectoryDownloader::new(&dir);
        let pdf = ExportedPdf {
            file_name: "x.pdf".to_string(),
            bytes: b"%PDF-1.3".to_vec(),
            page_width_px: 1,
            page_height_px: 1,
        };
        dl.deliver(&pdf).unwrap();
        assert_eq!(fs::read(dl.target("x.pdf")).unwrap(), b"%PDF-1.3");
        let names: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("x.pdf")]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn failed_delivery_leaves_no_file_behind() {
        let dir = std::env::temp_dir().join(format!("cv-forge-dl-fail-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        // A directory already occupies the target name, so the rename fails.
        fs::create_dir_all(dir.join("taken.pdf")).unwrap();
        let mut dl = DirectoryDownloader::new(&dir);
        let pdf = ExportedPdf {
            file_name: "taken.pdf".to_string(),
            bytes: b"%PDF-1.3".to_vec(),
            page_width_px: 1,
            page_height_px: 1,
        };
        assert!(dl.deliver(&pdf).is_err());
        assert!(!dir.join(".taken.pdf.part").exists());
        assert!(dir.join("taken.pdf").is_dir());
        fs::remove_dir_all(&dir).unwrap();
    }
}
