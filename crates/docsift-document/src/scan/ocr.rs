// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pure-Rust OCR backend using the `ocrs` crate, backed by neural network
// models executed via `rten`.
//
// # Feature Gate
//
// This module is only available when the `ocr` feature is enabled:
//
// ```toml
// docsift-document = { path = "crates/docsift-document", features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine requires two model files, `text-detection.rten` and
// `text-recognition.rten`. Running `ocrs-cli` once downloads them to
// `$XDG_CACHE_HOME/ocrs` (typically `~/.cache/ocrs`), which is also the
// default lookup directory here.
//
// The shipped models recognize Latin script only; the language code passed
// by the pipeline is logged and otherwise ignored.

use std::path::{Path, PathBuf};

use docsift_core::error::{DocsiftError, Result};
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument};

use crate::traits::TextRecognizer;

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Default directory for cached OCR model files.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Locations of the two model files.
#[derive(Debug, Clone)]
pub struct OcrsModels {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrsModels {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrsModels {
    /// Expect `text-detection.rten` and `text-recognition.rten` inside `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(DocsiftError::OcrError(format!(
                    "model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Recognizer wrapping a loaded `ocrs` engine.
///
/// Model loading is the expensive step; build one recognizer and share it
/// across requests.
pub struct OcrsRecognizer {
    engine: OcrsEngine,
}

impl OcrsRecognizer {
    #[instrument(skip_all, fields(
        detection = %models.detection_model_path.display(),
        recognition = %models.recognition_model_path.display(),
    ))]
    pub fn new(models: OcrsModels) -> Result<Self> {
        models.validate()?;

        let detection_model = Model::load_file(&models.detection_model_path).map_err(|err| {
            DocsiftError::OcrError(format!(
                "failed to load detection model from {}: {}",
                models.detection_model_path.display(),
                err
            ))
        })?;
        let recognition_model = Model::load_file(&models.recognition_model_path).map_err(|err| {
            DocsiftError::OcrError(format!(
                "failed to load recognition model from {}: {}",
                models.recognition_model_path.display(),
                err
            ))
        })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| DocsiftError::OcrError(format!("failed to initialise OCR engine: {}", err)))?;

        info!("ocrs engine initialised");
        Ok(Self { engine })
    }

    /// Load models from `dir`, or from the ocrs cache directory when `None`.
    pub fn from_model_dir(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(dir) => Self::new(OcrsModels::from_dir(dir)),
            None => Self::new(OcrsModels::default()),
        }
    }
}

impl TextRecognizer for OcrsRecognizer {
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String> {
        if language != "eng" {
            debug!(language, "ocrs models are Latin-only; language hint ignored");
        }

        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            DocsiftError::OcrError(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| DocsiftError::OcrError(format!("OCR preprocessing failed: {}", err)))?;
        let text = self
            .engine
            .get_text(&input)
            .map_err(|err| DocsiftError::OcrError(format!("OCR text recognition failed: {}", err)))?;

        debug!(lines = text.lines().count(), "ocrs recognition complete");
        Ok(text)
    }

    fn backend_name(&self) -> &str {
        "ocrs"
    }
}
