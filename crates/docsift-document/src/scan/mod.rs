// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline: page rasterization, optical character recognition
// (OCR), and the OCR fallback used when a PDF has no usable text layer.

pub mod fallback;
pub mod raster;
pub mod tesseract;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use fallback::{OcrFallback, OcrOutput};
pub use raster::PdftoppmRasterizer;
pub use tesseract::TesseractRecognizer;

#[cfg(feature = "ocr")]
pub use ocr::{OcrsModels, OcrsRecognizer};
