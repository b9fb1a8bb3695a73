//! # cv-forge – localized résumé renderer with raster PDF export
//!
//! A static résumé (one JSON file) is rendered in one of five languages and
//! two layouts, painted onto a single tall surface and exported as a
//! one-page PDF holding a bitmap of that surface. The stages are:
//!
//! 1. **Model** – load the document, resolve localized fields ([`model`], [`i18n`])
//! 2. **Render** – document + selection → HTML → DOM ([`templates`], [`dom`])
//! 3. **Paint** – Tailwind-like styling and flex/grid layout with Taffy
//!    into a display list ([`style`], [`layout`], [`surface`], [`pipeline`])
//! 4. **Capture** – rasterize with tiny-skia, encode JPEG, wrap in a PDF
//!    ([`raster`], [`export`])
//!
//! The [`control`] module ties these together behind language/layout
//! pickers and an export trigger.

pub mod control;
pub mod dom;
pub mod error;
pub mod export;
pub mod fonts;
pub mod i18n;
pub mod layout;
pub mod model;
pub mod pipeline;
pub mod raster;
pub mod selection;
pub mod style;
pub mod surface;
pub mod templates;

// Re-exports for convenience
pub use control::{Action, ControlSurface, Notice};
pub use error::ExportError;
pub use export::{export_file_name, export_surface, DirectoryDownloader, Downloader, ExportedPdf};
pub use i18n::{Language, Localized};
pub use model::CvDocument;
pub use pipeline::{paint, PipelineConfig};
pub use selection::{Layout, Selection};
pub use templates::{render, VisualDocument};
