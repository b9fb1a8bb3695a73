//! Integration tests for the cv-forge pipeline.
//!
//! These tests validate:
//! - Every language/layout pair renders the subject's identity
//! - Localized content is consistent across layouts
//! - Captured PDFs match the painted surface
//! - The control surface reports failures without delivering anything

use std::io;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};

use cv_forge::fonts::FontManager;
use cv_forge::raster::rasterize;
use cv_forge::templates::COMPACT_MAX_ACHIEVEMENTS;
use cv_forge::{
    export_file_name, export_surface, paint, render, Action, ControlSurface, CvDocument,
    Downloader, ExportedPdf, Language, Layout, Notice, PipelineConfig, Selection,
};

// =====================================================================
// Helpers
// =====================================================================

fn sample() -> CvDocument {
    CvDocument::sample().expect("bundled sample parses")
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

/// The page's `/MediaBox` as written into the PDF, in points.
fn media_box(pdf: &[u8]) -> [f32; 4] {
    let text = String::from_utf8_lossy(pdf);
    let start = text.find("/MediaBox").expect("PDF has a /MediaBox") + "/MediaBox".len();
    let rest = &text[start..];
    let end = rest.find(']').expect("/MediaBox array is closed");
    let values: Vec<f32> = rest[..end]
        .trim_start()
        .trim_start_matches('[')
        .split_whitespace()
        .map(|v| v.parse().expect("numeric /MediaBox entry"))
        .collect();
    assert_eq!(values.len(), 4, "/MediaBox has four entries");
    [values[0], values[1], values[2], values[3]]
}

/// Keeps every delivered PDF so tests can inspect them after the fact.
#[derive(Clone, Default)]
struct RecordingDownloader {
    delivered: Arc<Mutex<Vec<ExportedPdf>>>,
}

impl RecordingDownloader {
    fn file_names(&self) -> Vec<String> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.file_name.clone())
            .collect()
    }
}

impl Downloader for RecordingDownloader {
    fn deliver(&mut self, pdf: &ExportedPdf) -> io::Result<()> {
        self.delivered.lock().unwrap().push(pdf.clone());
        Ok(())
    }
}

fn control(config: PipelineConfig, recorder: &RecordingDownloader) -> ControlSurface {
    ControlSurface::new(
        sample(),
        FontManager::default(),
        config,
        Box::new(recorder.clone()),
    )
}

/// Smaller captures keep the export tests quick.
fn quick_config() -> PipelineConfig {
    PipelineConfig {
        scale: 1.0,
        ..PipelineConfig::default()
    }
}

// =====================================================================
// Rendering
// =====================================================================

#[test]
fn every_selection_renders_the_name() {
    let doc = sample();
    for language in Language::ALL {
        for layout in Layout::ALL {
            let visual = render(&doc, &Selection::new(language, layout));
            assert!(!visual.html.is_empty());
            assert!(
                visual.text_content().contains("Jane Q. Doe"),
                "name missing for {language}/{layout}"
            );
            assert_eq!(visual.field_text("name").as_deref(), Some("Jane Q. Doe"));
        }
    }
}

#[test]
fn sample_resolves_in_every_language() {
    assert!(sample().localization_gaps().is_empty());
}

#[test]
fn objective_is_the_same_in_both_layouts() {
    let doc = sample();
    for language in Language::ALL {
        let compact = render(&doc, &Selection::new(language, Layout::Compact));
        let full = render(&doc, &Selection::new(language, Layout::Full));
        let objective = compact.field_text("objective");
        assert!(objective.as_deref().is_some_and(|t| !t.is_empty()));
        assert_eq!(objective, full.field_text("objective"), "{language}");
    }
}

#[test]
fn only_arabic_is_right_to_left() {
    let doc = sample();
    for language in Language::ALL {
        for layout in Layout::ALL {
            let visual = render(&doc, &Selection::new(language, layout));
            assert_eq!(visual.is_rtl(), language == Language::Ar);
            assert_eq!(
                visual.html.contains(r#"dir="rtl""#),
                language == Language::Ar
            );
        }
    }
}

#[test]
fn compact_caps_achievements_per_role() {
    let doc = sample();
    let compact = render(&doc, &Selection::new(Language::En, Layout::Compact));
    let full = render(&doc, &Selection::new(Language::En, Layout::Full));

    let total: usize = doc
        .experience
        .iter()
        .map(|e| e.achievements.resolve(Language::En).len())
        .sum();
    let capped: usize = doc
        .experience
        .iter()
        .map(|e| {
            e.achievements
                .resolve(Language::En)
                .len()
                .min(COMPACT_MAX_ACHIEVEMENTS)
        })
        .sum();
    assert!(capped < total, "sample should exercise the cap");
    assert_eq!(compact.html.matches("<li").count(), capped);
    assert_eq!(full.html.matches("<li").count(), total);
}

#[test]
fn rendering_is_byte_identical() {
    let doc = sample();
    let sel = Selection::new(Language::Fr, Layout::Full);
    let a = Sha256::digest(render(&doc, &sel).html.as_bytes());
    let b = Sha256::digest(render(&doc, &sel).html.as_bytes());
    assert_eq!(a, b);
}

// =====================================================================
// Paint & capture
// =====================================================================

#[test]
fn arabic_surfaces_paint_in_both_layouts() {
    let doc = sample();
    let fonts = FontManager::default();
    for layout in Layout::ALL {
        let visual = render(&doc, &Selection::new(Language::Ar, layout));
        let surface = paint(&visual, &fonts, &PipelineConfig::default()).unwrap();
        assert!(surface.direction.is_rtl());
        assert!(surface.height > 0.0);
    }
}

#[test]
fn capture_is_deterministic() {
    let doc = sample();
    let fonts = FontManager::default();
    let config = quick_config();
    let visual = render(&doc, &Selection::new(Language::De, Layout::Compact));
    let surface = paint(&visual, &fonts, &config).unwrap();

    let first = rasterize(&surface, &fonts, &config).unwrap();
    let second = rasterize(&surface, &fonts, &config).unwrap();
    assert_eq!(
        Sha256::digest(first.as_raw()),
        Sha256::digest(second.as_raw())
    );
}

#[test]
fn exported_page_matches_capture_size() {
    let doc = sample();
    let fonts = FontManager::default();
    let config = PipelineConfig::default();
    let visual = render(&doc, &Selection::new(Language::En, Layout::Compact));
    let surface = paint(&visual, &fonts, &config).unwrap();

    let pdf = export_surface(&surface, &fonts, &config, "cv.pdf".to_string()).unwrap();
    assert_valid_pdf(&pdf.bytes);

    let (width, height) = surface.pixel_size(config.scale);
    assert_eq!(width, 1792);
    let [x0, y0, x1, y1] = media_box(&pdf.bytes);
    assert_eq!((x0, y0), (0.0, 0.0));
    assert!((x1 - width as f32).abs() < 0.5, "page width {x1} vs {width} px");
    assert!((y1 - height as f32).abs() < 0.5, "page height {y1} vs {height} px");
}

#[test]
fn file_name_pattern() {
    assert_eq!(
        export_file_name("Jane Q. Doe", Language::Fr, Layout::Compact),
        "CV_Jane_Q._Doe_fr_compact.pdf"
    );
}

// =====================================================================
// Control surface
// =====================================================================

#[test]
fn export_before_mount_does_nothing() {
    let recorder = RecordingDownloader::default();
    let mut cs = control(quick_config(), &recorder);
    assert_eq!(cs.dispatch(Action::Export), Notice::CaptureNotReady);
    assert!(cs.wait_for_export().is_none());
    assert!(recorder.file_names().is_empty());
}

#[test]
fn export_delivers_for_current_selection() {
    let recorder = RecordingDownloader::default();
    let mut cs = control(quick_config(), &recorder);
    cs.mount();
    cs.dispatch(Action::SelectLanguage(Language::Fr));
    cs.dispatch(Action::SelectLayout(Layout::Compact));

    let started = cs.dispatch(Action::Export);
    assert_eq!(
        started,
        Notice::ExportStarted {
            file_name: "CV_Jane_Q._Doe_fr_compact.pdf".to_string()
        }
    );
    let done = cs.wait_for_export().unwrap();
    assert!(matches!(done, Notice::Exported { .. }), "{done:?}");
    assert_eq!(recorder.file_names(), vec!["CV_Jane_Q._Doe_fr_compact.pdf"]);

    let delivered = recorder.delivered.lock().unwrap();
    assert_valid_pdf(&delivered[0].bytes);
}

#[test]
fn second_export_while_running_is_refused() {
    let recorder = RecordingDownloader::default();
    let mut cs = control(quick_config(), &recorder);
    cs.mount();

    assert!(matches!(
        cs.dispatch(Action::Export),
        Notice::ExportStarted { .. }
    ));
    assert_eq!(cs.dispatch(Action::Export), Notice::ExportBusy);
    cs.wait_for_export();
    assert_eq!(recorder.file_names().len(), 1);
    assert!(!cs.is_exporting());
}

#[test]
fn capture_failure_reports_and_delivers_nothing() {
    let recorder = RecordingDownloader::default();
    let config = PipelineConfig {
        max_pixels: 1_000,
        ..quick_config()
    };
    let mut cs = control(config, &recorder);
    cs.mount();
    let before = cs.selection();

    assert!(matches!(
        cs.dispatch(Action::Export),
        Notice::ExportStarted { .. }
    ));
    let done = cs.wait_for_export().unwrap();
    assert!(matches!(done, Notice::ExportFailed { .. }));
    assert_eq!(done.to_string(), "Error generating PDF. Please try again.");
    assert!(recorder.file_names().is_empty());
    assert_eq!(cs.selection(), before);
    assert!(cs.surface().is_some());
}
