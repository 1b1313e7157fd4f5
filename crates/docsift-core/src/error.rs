// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for docsift.

use thiserror::Error;

/// Top-level error type for all docsift operations.
///
/// Only [`DocsiftError::Input`] is fatal to an extraction request. Every other
/// variant is raised by a single stage and recovered by the pipeline.
#[derive(Debug, Error)]
pub enum DocsiftError {
    // -- Request errors --
    #[error("input document unavailable: {0}")]
    Input(String),

    // -- Stage errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("page rasterization failed: {0}")]
    RasterError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("OCR failed: {0}")]
    OcrError(String),

    #[error("table extraction failed: {0}")]
    TableError(String),

    #[error("positional text reader failed: {0}")]
    ReaderError(String),

    // -- External tools --
    #[error("{0} not found. Install poppler-utils / tesseract-ocr or point the config at the binary")]
    ToolNotFound(String),

    #[error("{tool} failed with exit code {code}: {stderr}")]
    ToolFailed {
        tool: String,
        code: i32,
        stderr: String,
    },

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DocsiftError {
    /// Whether this error must abort the request instead of degrading it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Input(_))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocsiftError>;
