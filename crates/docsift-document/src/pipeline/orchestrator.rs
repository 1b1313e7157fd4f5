// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction pipeline: text layer, OCR fallback, primary tables, table
// reconstruction fallback, then cleanup.
//
// Only an unreadable input is reported as an error. Every other stage failure
// is logged with its stage name and folded into the result's diagnostic
// message, and the pipeline moves on to the next fallback.

use std::path::PathBuf;
use std::sync::Arc;

use docsift_core::config::ExtractionConfig;
use docsift_core::error::Result;
use docsift_core::types::{ExtractionResult, PageTable};
use tracing::{info, instrument, warn};

use crate::pdf::{LopdfPositionalReader, LopdfTextExtractor};
use crate::pipeline::request::ExtractionRequest;
use crate::scan::{OcrFallback, OcrOutput, PdftoppmRasterizer, TesseractRecognizer};
use crate::table::{LayoutTableExtractor, TableOutcome, attempt, reconstruct_tables};
use crate::traits::{PageRasterizer, PositionalReader, TableExtractor, TextExtractor, TextRecognizer};

/// Separator between diagnostic notes in [`ExtractionResult::message`].
const NOTE_SEPARATOR: &str = "; ";

/// True when `text` has at least `min_chars` characters once trimmed.
pub fn is_sufficient(text: &str, min_chars: usize) -> bool {
    text.trim().chars().count() >= min_chars
}

/// Runs one request at a time through every stage. Holds no per-request
/// state, so a single pipeline can be shared behind an `Arc`.
pub struct ExtractionPipeline {
    config: ExtractionConfig,
    text_extractor: Arc<dyn TextExtractor>,
    ocr: OcrFallback,
    table_extractor: Arc<dyn TableExtractor>,
    positional_reader: Arc<dyn PositionalReader>,
}

impl std::fmt::Debug for ExtractionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionPipeline")
            .field("text_extractor", &self.text_extractor.backend_name())
            .field("table_extractor", &self.table_extractor.backend_name())
            .field("positional_reader", &self.positional_reader.backend_name())
            .field("ocr_language", &self.ocr.language())
            .finish()
    }
}

/// Assembles an [`ExtractionPipeline`], falling back to the default backend
/// for every collaborator left unset.
pub struct PipelineBuilder {
    config: ExtractionConfig,
    text_extractor: Option<Arc<dyn TextExtractor>>,
    rasterizer: Option<Arc<dyn PageRasterizer>>,
    recognizer: Option<Arc<dyn TextRecognizer>>,
    table_extractor: Option<Arc<dyn TableExtractor>>,
    positional_reader: Option<Arc<dyn PositionalReader>>,
}

impl PipelineBuilder {
    fn new(config: ExtractionConfig) -> Self {
        Self {
            config,
            text_extractor: None,
            rasterizer: None,
            recognizer: None,
            table_extractor: None,
            positional_reader: None,
        }
    }

    pub fn text_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.text_extractor = Some(extractor);
        self
    }

    pub fn rasterizer(mut self, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn table_extractor(mut self, extractor: Arc<dyn TableExtractor>) -> Self {
        self.table_extractor = Some(extractor);
        self
    }

    pub fn positional_reader(mut self, reader: Arc<dyn PositionalReader>) -> Self {
        self.positional_reader = Some(reader);
        self
    }

    /// Validate the configuration and fill in default backends.
    pub fn build(self) -> Result<ExtractionPipeline> {
        self.config.validate()?;
        let config = self.config;

        let text_extractor = self
            .text_extractor
            .unwrap_or_else(|| Arc::new(LopdfTextExtractor::new()));
        let rasterizer = self.rasterizer.unwrap_or_else(|| {
            Arc::new(PdftoppmRasterizer::new(
                config.pdftoppm_bin.clone(),
                config.raster_dpi,
            ))
        });
        let recognizer = match self.recognizer {
            Some(recognizer) => recognizer,
            None => default_recognizer(&config)?,
        };
        let table_extractor = self
            .table_extractor
            .unwrap_or_else(|| Arc::new(LayoutTableExtractor::new(config.pdftotext_bin.clone())));
        let positional_reader = self
            .positional_reader
            .unwrap_or_else(|| Arc::new(LopdfPositionalReader::new(config.grid_unit_pt)));

        info!(
            text = text_extractor.backend_name(),
            rasterizer = rasterizer.backend_name(),
            recognizer = recognizer.backend_name(),
            tables = table_extractor.backend_name(),
            positions = positional_reader.backend_name(),
            "Extraction pipeline ready"
        );

        let ocr = OcrFallback::new(rasterizer, recognizer, &config);
        Ok(ExtractionPipeline {
            config,
            text_extractor,
            ocr,
            table_extractor,
            positional_reader,
        })
    }
}

/// tesseract, unless the `ocr` feature is on and a model directory is set.
#[cfg(feature = "ocr")]
fn default_recognizer(config: &ExtractionConfig) -> Result<Arc<dyn TextRecognizer>> {
    match &config.ocr_model_dir {
        Some(dir) => Ok(Arc::new(crate::scan::OcrsRecognizer::from_model_dir(Some(dir.as_path()))?)),
        None => Ok(Arc::new(TesseractRecognizer::new(config.tesseract_bin.clone()))),
    }
}

#[cfg(not(feature = "ocr"))]
fn default_recognizer(config: &ExtractionConfig) -> Result<Arc<dyn TextRecognizer>> {
    if config.ocr_model_dir.is_some() {
        warn!("ocr_model_dir is set but the `ocr` feature is disabled; using tesseract");
    }
    Ok(Arc::new(TesseractRecognizer::new(config.tesseract_bin.clone())))
}

impl ExtractionPipeline {
    pub fn builder(config: ExtractionConfig) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    /// Pipeline with the default backend for every collaborator.
    pub fn with_defaults(config: ExtractionConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Process one request and release its resources.
    ///
    /// Returns `Err` only for an unreadable document. Resources are released
    /// exactly once on every path.
    #[instrument(skip_all, fields(request_id = %request.id(), filename = %request.filename()))]
    pub async fn extract(&self, mut request: ExtractionRequest) -> Result<ExtractionResult> {
        let outcome = self.run_stages(&mut request).await;
        let cleanup = request.release();

        match &outcome {
            Ok(result) => info!(
                chars = result.text().chars().count(),
                tables = result.tables().len(),
                degraded = result.is_degraded(),
                cleaned = cleanup.is_clean(),
                "Extraction complete"
            ),
            Err(err) => warn!(%err, cleaned = cleanup.is_clean(), "Extraction rejected"),
        }
        outcome
    }

    async fn run_stages(&self, request: &mut ExtractionRequest) -> Result<ExtractionResult> {
        let bytes = request.read_bytes()?;
        let mut notes: Vec<String> = Vec::new();

        let primary = self.primary_text(bytes).await;
        let text = if is_sufficient(&primary, self.config.min_text_chars) {
            info!(chars = primary.chars().count(), "Text layer sufficient, skipping OCR");
            primary
        } else {
            info!(
                chars = primary.trim().chars().count(),
                threshold = self.config.min_text_chars,
                "Text layer insufficient, running OCR"
            );
            let output = self.run_ocr(request).await;
            notes.extend(output.note);
            output.text
        };

        let tables = self.tables(request, &mut notes).await;

        let message = (!notes.is_empty()).then(|| notes.join(NOTE_SEPARATOR));
        Ok(ExtractionResult::new(text, tables, message))
    }

    async fn primary_text(&self, bytes: Vec<u8>) -> String {
        let extractor = Arc::clone(&self.text_extractor);
        match tokio::task::spawn_blocking(move || extractor.extract_text(&bytes)).await {
            Ok(Ok(text)) => text,
            Ok(Err(err)) => {
                warn!(stage = "primary_text", %err, "Text layer extraction failed");
                String::new()
            }
            Err(err) => {
                warn!(stage = "primary_text", %err, "Text layer task aborted");
                String::new()
            }
        }
    }

    async fn run_ocr(&self, request: &mut ExtractionRequest) -> OcrOutput {
        match ocr_inputs(request) {
            Ok((pdf, scratch)) => self.ocr.run(&pdf, &scratch).await,
            Err(err) => {
                warn!(stage = "ocr", %err, "Could not prepare OCR inputs");
                OcrOutput {
                    text: String::new(),
                    note: Some(format!("OCR unavailable: {}", err)),
                }
            }
        }
    }

    async fn tables(&self, request: &mut ExtractionRequest, notes: &mut Vec<String>) -> Vec<PageTable> {
        let pdf = match request.pdf_path() {
            Ok(pdf) => pdf,
            Err(err) => {
                warn!(stage = "primary_tables", %err, "Document path unavailable");
                notes.push(format!("table extraction unavailable: {}", err));
                return Vec::new();
            }
        };

        match attempt(Arc::clone(&self.table_extractor), &pdf).await {
            TableOutcome::Success(tables) => tables,
            TableOutcome::Failure(_) => {
                let reader = Arc::clone(&self.positional_reader);
                let joined =
                    tokio::task::spawn_blocking(move || reconstruct_tables(&*reader, &pdf)).await;
                match joined {
                    Ok(Ok(tables)) => tables,
                    Ok(Err(err)) => {
                        notes.push(format!("table reconstruction failed: {}", err));
                        Vec::new()
                    }
                    Err(err) => {
                        warn!(stage = "table_reconstruction", %err, "Reconstruction task aborted");
                        notes.push(format!("table reconstruction failed: {}", err));
                        Vec::new()
                    }
                }
            }
        }
    }
}

fn ocr_inputs(request: &mut ExtractionRequest) -> Result<(PathBuf, PathBuf)> {
    let pdf = request.pdf_path()?;
    let scratch = request.scratch_dir()?.to_path_buf();
    Ok((pdf, scratch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sufficiency_counts_trimmed_characters() {
        assert!(is_sufficient("  0123456789  ", 10));
        assert!(!is_sufficient("  012345678\n", 10));
        assert!(!is_sufficient("", 10));
        assert!(is_sufficient("ÄÖÜäöüßéèê", 10));
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let config = ExtractionConfig {
            min_text_chars: 0,
            ..ExtractionConfig::default()
        };
        assert!(ExtractionPipeline::builder(config).build().is_err());
    }

    #[test]
    fn defaults_build_without_touching_tools() {
        let pipeline = ExtractionPipeline::with_defaults(ExtractionConfig::default()).unwrap();
        let debug = format!("{:?}", pipeline);
        assert!(debug.contains("lopdf"));
        assert!(debug.contains("pdftotext-layout"));
        assert_eq!(pipeline.config().min_text_chars, 10);
    }
}
