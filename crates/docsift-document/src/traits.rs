// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator traits for the extraction pipeline.
//
// The pipeline never talks to lopdf, poppler, or an OCR engine directly. Each
// backend sits behind one of these traits so the orchestrator can be driven
// by in-memory fakes in tests and by different engines in production.

use std::path::{Path, PathBuf};

use docsift_core::error::Result;
use docsift_core::types::{PageTable, PositionedTextItem};
use image::DynamicImage;

/// Converts raw PDF bytes directly to plain text.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, pdf: &[u8]) -> Result<String>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Renders every page of a PDF to an image file.
pub trait PageRasterizer: Send + Sync {
    /// Write one image per page into `out_dir` and return their paths in page
    /// order.
    fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>>;

    fn backend_name(&self) -> &str;
}

/// Recognizes the text in one preprocessed page image.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String>;

    fn backend_name(&self) -> &str;
}

/// Extracts page-indexed table matrices straight from a PDF file.
pub trait TableExtractor: Send + Sync {
    fn extract_tables(&self, pdf: &Path) -> Result<Vec<PageTable>>;

    fn backend_name(&self) -> &str;
}

/// Lazy stream of positioned text items. An `Err` element means the stream
/// itself broke; nothing after it is meaningful.
pub type PositionedItems<'a> = Box<dyn Iterator<Item = Result<PositionedTextItem>> + 'a>;

/// Produces the positioned text items of a PDF file, page by page.
pub trait PositionalReader: Send + Sync {
    fn read_items<'a>(&'a self, pdf: &Path) -> Result<PositionedItems<'a>>;

    fn backend_name(&self) -> &str;
}
