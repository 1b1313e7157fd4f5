// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocsiftError, Result};

/// Environment variable overriding [`ExtractionConfig::ocr_language`].
pub const OCR_LANG_ENV: &str = "DOCSIFT_OCR_LANG";

/// Tunables for one extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Language code handed to the OCR recognizer (tesseract naming, e.g. "eng").
    pub ocr_language: String,
    /// Minimum trimmed character count for primary text to skip OCR.
    pub min_text_chars: usize,
    /// Resolution used when rasterizing pages for OCR.
    pub raster_dpi: u32,
    /// Upper bound on pages recognized at the same time.
    pub ocr_concurrency: usize,
    /// Apply Otsu binarization after grayscale conversion.
    pub ocr_binarize: bool,
    /// Size of one positional grid unit in PDF points.
    pub grid_unit_pt: f64,
    pub pdftoppm_bin: String,
    pub pdftotext_bin: String,
    pub tesseract_bin: String,
    /// Directory holding `ocrs` models. `None` uses the ocrs cache directory.
    pub ocr_model_dir: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ocr_language: "eng".to_string(),
            min_text_chars: 10,
            raster_dpi: 300,
            ocr_concurrency: 4,
            ocr_binarize: false,
            grid_unit_pt: 16.0,
            pdftoppm_bin: "pdftoppm".to_string(),
            pdftotext_bin: "pdftotext".to_string(),
            tesseract_bin: "tesseract".to_string(),
            ocr_model_dir: None,
        }
    }
}

impl ExtractionConfig {
    /// Load a JSON config file. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|err| {
            DocsiftError::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(lang) = std::env::var(OCR_LANG_ENV) {
            let lang = lang.trim();
            if !lang.is_empty() {
                self.ocr_language = lang.to_string();
            }
        }
        self
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.ocr_language.trim().is_empty() {
            return Err(DocsiftError::Config("ocr_language must not be empty".into()));
        }
        if self.min_text_chars == 0 {
            return Err(DocsiftError::Config(
                "min_text_chars must be at least 1".into(),
            ));
        }
        if self.ocr_concurrency == 0 {
            return Err(DocsiftError::Config(
                "ocr_concurrency must be at least 1".into(),
            ));
        }
        if !(self.grid_unit_pt.is_finite() && self.grid_unit_pt > 0.0) {
            return Err(DocsiftError::Config(format!(
                "grid_unit_pt must be a positive number, got {}",
                self.grid_unit_pt
            )));
        }
        if self.raster_dpi == 0 {
            return Err(DocsiftError::Config("raster_dpi must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ExtractionConfig::default();
        assert_eq!(config.ocr_language, "eng");
        assert_eq!(config.min_text_chars, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_fills_missing_keys_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"ocr_language": "deu", "raster_dpi": 150}}"#).unwrap();

        let config = ExtractionConfig::load(file.path()).unwrap();
        assert_eq!(config.ocr_language, "deu");
        assert_eq!(config.raster_dpi, 150);
        assert_eq!(config.min_text_chars, 10);
        assert_eq!(config.pdftotext_bin, "pdftotext");
    }

    #[test]
    fn load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"grid_unit_pt": -2.0}}"#).unwrap();
        assert!(matches!(
            ExtractionConfig::load(file.path()),
            Err(DocsiftError::Config(_))
        ));
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = ExtractionConfig::load("/nonexistent/docsift.json").unwrap_err();
        assert!(matches!(err, DocsiftError::Config(_)));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config = ExtractionConfig {
            ocr_concurrency: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
