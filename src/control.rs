//! Control surface – owns the selection, keeps the painted surface in sync
//! with it and runs exports in the background.
//!
//! Everything here lives on one thread. The only concurrency is the export
//! worker, which gets shared read-only handles to the surface and the fonts
//! and hands its result back through its join handle.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{ExportError, Result};
use crate::export::{export_file_name, export_surface, Downloader, ExportedPdf};
use crate::fonts::FontManager;
use crate::i18n::Language;
use crate::model::CvDocument;
use crate::pipeline::{paint, PipelineConfig};
use crate::selection::{Layout, Selection};
use crate::surface::Surface;
use crate::templates::{render, VisualDocument};

/// Message shown to the user whenever an export fails, whatever the cause.
pub const EXPORT_FAILED_MESSAGE: &str = "Error generating PDF. Please try again.";

/// A user interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SelectLanguage(Language),
    SelectLayout(Layout),
    Export,
}

/// Outcome of an action, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The document was re-rendered for the new selection.
    Rendered(Selection),
    /// Repainting failed; exports are unavailable until the next change.
    RenderFailed(String),
    /// Nothing is painted yet. Not shown to the user.
    CaptureNotReady,
    ExportStarted { file_name: String },
    /// An export is already running.
    ExportBusy,
    Exported { file_name: String, bytes: usize },
    ExportFailed { reason: String },
}

impl Notice {
    /// Whether the notice should be surfaced at all.
    pub fn is_silent(&self) -> bool {
        matches!(self, Notice::CaptureNotReady)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Rendered(sel) => write!(f, "Showing {} layout in {}", sel.layout, sel.language),
            Notice::RenderFailed(reason) => write!(f, "Rendering failed: {reason}"),
            Notice::CaptureNotReady => Ok(()),
            Notice::ExportStarted { file_name } => write!(f, "Generating {file_name}..."),
            Notice::ExportBusy => f.write_str("A PDF is already being generated."),
            Notice::Exported { file_name, bytes } => {
                write!(f, "Downloaded {file_name} ({bytes} bytes)")
            }
            Notice::ExportFailed { .. } => f.write_str(EXPORT_FAILED_MESSAGE),
        }
    }
}

/// Passed to post-render hooks after every successful repaint.
#[derive(Debug, Clone, Copy)]
pub struct RenderEvent<'a> {
    pub selection: Selection,
    pub surface: &'a Surface,
}

type RenderHook = Box<dyn FnMut(&RenderEvent<'_>)>;

struct PendingExport {
    file_name: String,
    handle: JoinHandle<Result<ExportedPdf>>,
}

pub struct ControlSurface {
    document: CvDocument,
    fonts: Arc<FontManager>,
    config: PipelineConfig,
    selection: Selection,
    visual: Option<VisualDocument>,
    surface: Option<Arc<Surface>>,
    downloader: Box<dyn Downloader>,
    hooks: Vec<RenderHook>,
    pending: Option<PendingExport>,
}

impl ControlSurface {
    pub fn new(
        document: CvDocument,
        fonts: FontManager,
        config: PipelineConfig,
        downloader: Box<dyn Downloader>,
    ) -> Self {
        Self {
            document,
            fonts: Arc::new(fonts),
            config,
            selection: Selection::default(),
            visual: None,
            surface: None,
            downloader,
            hooks: Vec::new(),
            pending: None,
        }
    }

    /// Start from `selection` instead of the default.
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Run `hook` after every repaint, including the first one.
    pub fn on_render(&mut self, hook: impl FnMut(&RenderEvent<'_>) + 'static) {
        self.hooks.push(Box::new(hook));
    }

    /// First paint. Until this runs, exports are ignored.
    pub fn mount(&mut self) -> Notice {
        self.refresh()
    }

    pub fn is_mounted(&self) -> bool {
        self.visual.is_some()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn document(&self) -> &CvDocument {
        &self.document
    }

    pub fn visual(&self) -> Option<&VisualDocument> {
        self.visual.as_ref()
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_deref()
    }

    pub fn is_exporting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn dispatch(&mut self, action: Action) -> Notice {
        match action {
            Action::SelectLanguage(language) => {
                self.selection.language = language;
                self.after_selection_change()
            }
            Action::SelectLayout(layout) => {
                self.selection.layout = layout;
                self.after_selection_change()
            }
            Action::Export => self.start_export(),
        }
    }

    /// Settle the running export if it has finished.
    pub fn poll(&mut self) -> Option<Notice> {
        let finished = self
            .pending
            .as_ref()
            .is_some_and(|p| p.handle.is_finished());
        if finished {
            self.pending.take().map(|p| self.settle(p))
        } else {
            None
        }
    }

    /// Block until the running export settles.
    pub fn wait_for_export(&mut self) -> Option<Notice> {
        self.pending.take().map(|p| self.settle(p))
    }

    fn after_selection_change(&mut self) -> Notice {
        if self.is_mounted() {
            self.refresh()
        } else {
            Notice::Rendered(self.selection)
        }
    }

    fn refresh(&mut self) -> Notice {
        let visual = render(&self.document, &self.selection);
        log::info!(
            "Rendered {} layout in '{}'",
            self.selection.layout,
            self.selection.language
        );
        match paint(&visual, &self.fonts, &self.config) {
            Ok(surface) => {
                let surface = Arc::new(surface);
                let event = RenderEvent {
                    selection: self.selection,
                    surface: &surface,
                };
                for hook in &mut self.hooks {
                    hook(&event);
                }
                self.surface = Some(surface);
                self.visual = Some(visual);
                Notice::Rendered(self.selection)
            }
            Err(e) => {
                log::error!("Repaint failed: {e}");
                self.surface = None;
                self.visual = Some(visual);
                Notice::RenderFailed(e.to_string())
            }
        }
    }

    fn start_export(&mut self) -> Notice {
        let Some(surface) = self.surface.clone() else {
            log::debug!("Export ignored: {}", ExportError::CaptureNotReady);
            return Notice::CaptureNotReady;
        };
        if self.pending.is_some() {
            log::warn!("Export ignored: one is already running");
            return Notice::ExportBusy;
        }

        let file_name = export_file_name(
            &self.document.personal.name,
            self.selection.language,
            self.selection.layout,
        );
        let fonts = Arc::clone(&self.fonts);
        let config = self.config.clone();
        let name = file_name.clone();
        let spawned = thread::Builder::new()
            .name("cv-export".to_string())
            .spawn(move || export_surface(&surface, &fonts, &config, name));

        match spawned {
            Ok(handle) => {
                self.pending = Some(PendingExport {
                    file_name: file_name.clone(),
                    handle,
                });
                Notice::ExportStarted { file_name }
            }
            Err(e) => {
                log::error!("Could not start export worker: {e}");
                Notice::ExportFailed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn settle(&mut self, pending: PendingExport) -> Notice {
        let result = pending
            .handle
            .join()
            .unwrap_or(Err(ExportError::TaskPanicked));
        let pdf = match result {
            Ok(pdf) => pdf,
            Err(e) => {
                log::error!("Export of '{}' failed: {e}", pending.file_name);
                return Notice::ExportFailed {
                    reason: e.to_string(),
                };
            }
        };
        match self.downloader.deliver(&pdf) {
            Ok(()) => Notice::Exported {
                file_name: pdf.file_name,
                bytes: pdf.bytes.len(),
            },
            Err(e) => {
                log::error!("Delivering '{}' failed: {e}", pdf.file_name);
                Notice::ExportFailed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    struct NullDownloader;

    impl Downloader for NullDownloader {
        fn deliver(&mut self, _pdf: &ExportedPdf) -> io::Result<()> {
            Ok(())
        }
    }

    fn control() -> ControlSurface {
        ControlSurface::new(
            CvDocument::sample().unwrap(),
            FontManager::default(),
            PipelineConfig::default(),
            Box::new(NullDownloader),
        )
    }

    #[test]
    fn export_before_mount_is_silent() {
        let mut cs = control();
        let notice = cs.dispatch(Action::Export);
        assert_eq!(notice, Notice::CaptureNotReady);
        assert!(notice.is_silent());
        assert!(!cs.is_exporting());
    }

    #[test]
    fn selection_change_repaints_and_runs_hooks() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut cs = control();
        let log = Rc::clone(&seen);
        cs.on_render(move |ev| log.borrow_mut().push(ev.selection));
        cs.mount();
        cs.dispatch(Action::SelectLanguage(Language::Ar));
        cs.dispatch(Action::SelectLayout(Layout::Compact));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2], Selection::new(Language::Ar, Layout::Compact));
        assert!(cs.visual().unwrap().is_rtl());
        assert!(cs.surface().is_some());
    }

    #[test]
    fn failure_notice_is_generic() {
        let notice = Notice::ExportFailed {
            reason: "rasterization failed: boom".to_string(),
        };
        assert_eq!(notice.to_string(), EXPORT_FAILED_MESSAGE);
    }
}
