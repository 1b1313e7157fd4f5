// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text recognition via the `tesseract` command-line engine.

use docsift_core::error::{DocsiftError, Result};
use image::DynamicImage;
use tracing::{debug, instrument};

use crate::image::ImageProcessor;
use crate::tools;
use crate::traits::TextRecognizer;

/// Runs `tesseract stdin stdout -l <lang>` on a PNG-encoded page.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    bin: String,
}

impl TesseractRecognizer {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    /// Check if tesseract can be launched.
    pub fn is_available(&self) -> bool {
        tools::is_available(&self.bin, "--version")
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TextRecognizer for TesseractRecognizer {
    #[instrument(skip_all, fields(width = image.width(), height = image.height(), language = %language))]
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String> {
        let png = ImageProcessor::from_dynamic(image.clone()).to_png_bytes()?;
        let stdout = tools::run_with_stdin(&self.bin, ["stdin", "stdout", "-l", language], &png)
            .map_err(|err| DocsiftError::OcrError(err.to_string()))?;
        let text = String::from_utf8_lossy(&stdout).into_owned();
        debug!(chars = text.chars().count(), "tesseract recognition complete");
        Ok(text)
    }

    fn backend_name(&self) -> &str {
        "tesseract"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    #[test]
    fn missing_binary_is_ocr_error() {
        let recognizer = TesseractRecognizer::new("docsift-no-such-tesseract");
        let page = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
        let err = recognizer.recognize(&page, "eng").unwrap_err();
        assert!(matches!(err, DocsiftError::OcrError(_)));
        assert!(!recognizer.is_available());
    }
}
