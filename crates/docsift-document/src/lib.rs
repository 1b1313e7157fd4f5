// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docsift-document — text and table extraction from PDF documents.
//
// The pipeline reads the text layer, falls back to OCR when the layer is
// missing or too thin, extracts tables with a layout-based extractor, and
// rebuilds tables from positioned text when that extractor fails.

pub mod image;
pub mod pdf;
pub mod pipeline;
pub mod scan;
pub mod table;
pub mod tools;
pub mod traits;

pub use pipeline::{CleanupReport, ExtractionPipeline, ExtractionRequest, PipelineBuilder};
pub use traits::{
    PageRasterizer, PositionalReader, PositionedItems, TableExtractor, TextExtractor,
    TextRecognizer,
};
