// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR fallback. Recovers text from PDFs without a usable text layer by
// rasterizing every page, preprocessing the images, and recognizing pages
// concurrently. Page texts are always joined in ascending page order, no
// matter which page finishes first.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docsift_core::config::ExtractionConfig;
use docsift_core::error::{DocsiftError, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::image::{ImageProcessor, preprocess_for_ocr};
use crate::traits::{PageRasterizer, TextRecognizer};

/// Separator placed between the texts of consecutive pages.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Result of one OCR pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OcrOutput {
    /// Recognized text, possibly empty.
    pub text: String,
    /// Set when the pass was degraded (rasterization failed, or some pages
    /// could not be recognized).
    pub note: Option<String>,
}

impl OcrOutput {
    fn degraded(note: String) -> Self {
        Self {
            text: String::new(),
            note: Some(note),
        }
    }
}

/// Rasterize → preprocess → recognize, for every page of one document.
pub struct OcrFallback {
    rasterizer: Arc<dyn PageRasterizer>,
    recognizer: Arc<dyn TextRecognizer>,
    language: String,
    concurrency: usize,
    binarize: bool,
}

impl OcrFallback {
    pub fn new(
        rasterizer: Arc<dyn PageRasterizer>,
        recognizer: Arc<dyn TextRecognizer>,
        config: &ExtractionConfig,
    ) -> Self {
        Self {
            rasterizer,
            recognizer,
            language: config.ocr_language.clone(),
            concurrency: config.ocr_concurrency.max(1),
            binarize: config.ocr_binarize,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Recover the text of `pdf`, writing page images into `scratch_dir`.
    ///
    /// Never fails: a rasterization failure yields empty text plus a note, and
    /// a page that cannot be recognized contributes an empty string.
    #[instrument(skip_all, fields(
        pdf = %pdf.display(),
        rasterizer = self.rasterizer.backend_name(),
        recognizer = self.recognizer.backend_name(),
        language = %self.language,
    ))]
    pub async fn run(&self, pdf: &Path, scratch_dir: &Path) -> OcrOutput {
        let pages = match self.rasterize(pdf, scratch_dir).await {
            Ok(pages) => pages,
            Err(err) => {
                warn!(stage = "ocr", %err, "Rasterization failed, continuing without OCR text");
                return OcrOutput::degraded(format!("OCR unavailable: {}", err));
            }
        };

        let page_count = pages.len();
        info!(pages = page_count, concurrency = self.concurrency, "Starting OCR");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for (index, image_path) in pages.into_iter().enumerate() {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let recognizer = Arc::clone(&self.recognizer);
            let language = self.language.clone();
            let binarize = self.binarize;
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let text = recognize_page(&image_path, &*recognizer, &language, binarize);
                (index, text)
            });
        }

        let mut texts = vec![String::new(); page_count];
        let mut failed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(text))) => {
                    debug!(page = index + 1, chars = text.chars().count(), "Page recognized");
                    texts[index] = text;
                }
                Ok((index, Err(err))) => {
                    failed += 1;
                    warn!(stage = "ocr", page = index + 1, %err, "Page recognition failed");
                }
                Err(err) => {
                    failed += 1;
                    warn!(stage = "ocr", %err, "Page recognition task aborted");
                }
            }
        }

        let text = join_pages(&texts);
        info!(
            pages = page_count,
            failed,
            chars = text.chars().count(),
            "OCR complete"
        );

        OcrOutput {
            text,
            note: (failed > 0)
                .then(|| format!("OCR failed on {} of {} pages", failed, page_count)),
        }
    }

    async fn rasterize(&self, pdf: &Path, scratch_dir: &Path) -> Result<Vec<PathBuf>> {
        let rasterizer = Arc::clone(&self.rasterizer);
        let pdf = pdf.to_path_buf();
        let out_dir = scratch_dir.to_path_buf();
        let pages = tokio::task::spawn_blocking(move || rasterizer.rasterize(&pdf, &out_dir))
            .await
            .map_err(|err| DocsiftError::RasterError(format!("rasterizer task aborted: {}", err)))??;
        if pages.is_empty() {
            return Err(DocsiftError::RasterError(
                "rasterizer produced no pages".into(),
            ));
        }
        Ok(pages)
    }
}

fn recognize_page(
    image_path: &Path,
    recognizer: &dyn TextRecognizer,
    language: &str,
    binarize: bool,
) -> Result<String> {
    let image = ImageProcessor::open(image_path)?.into_dynamic();
    let prepared = preprocess_for_ocr(image, binarize);
    recognizer.recognize(&prepared, language)
}

/// Join page texts in order, trimming trailing whitespace from each page.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    pages
        .iter()
        .map(|page| page.as_ref().trim_end())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR)
}
