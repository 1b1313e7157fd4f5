// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: OCR preprocessing (grayscale, Otsu binarization) for
// rasterized pages. Operates on in-memory images using the `image` and
// `imageproc` crates.

use docsift_core::error::{DocsiftError, Result};
use image::{DynamicImage, GrayImage, ImageFormat};
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use tracing::{debug, info, instrument};

/// Preprocessing pipeline operating on a single in-memory page image.
///
/// Each method consumes `self` and returns a new `ImageProcessor` wrapping the
/// transformed image, enabling method chaining.
///
/// ```ignore
/// let page = ImageProcessor::open("page-01.png")?
///     .grayscale()
///     .binarize()
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            DocsiftError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        debug!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (PNG, JPEG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data).map_err(|err| {
            DocsiftError::ImageError(format!("failed to decode image: {}", err))
        })?;
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Convert the image to 8-bit luma.
    pub fn grayscale(self) -> Self {
        Self {
            image: DynamicImage::ImageLuma8(self.image.to_luma8()),
        }
    }

    /// Binarize with a global Otsu threshold: pixels at or below the level
    /// become black, everything else white.
    #[instrument(skip(self), fields(width = self.image.width(), height = self.image.height()))]
    pub fn binarize(self) -> Self {
        let gray: GrayImage = self.image.to_luma8();
        let level = otsu_level(&gray);
        info!(level, "Applying Otsu binarization");

        let binary = threshold(&gray, level, ThresholdType::Binary);
        Self {
            image: DynamicImage::ImageLuma8(binary),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| DocsiftError::ImageError(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }
}

/// Prepare a rasterized page for recognition.
pub fn preprocess_for_ocr(image: DynamicImage, binarize: bool) -> DynamicImage {
    let processor = ImageProcessor::from_dynamic(image).grayscale();
    if binarize {
        processor.binarize().into_dynamic()
    } else {
        processor.into_dynamic()
    }
}
