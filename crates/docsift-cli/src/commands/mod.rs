// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

pub mod config;
pub mod doctor;
pub mod extract;

use std::path::Path;

use docsift_core::config::ExtractionConfig;
use docsift_core::error::{DocsiftError, Result};
use tracing::debug;

/// Configuration from `path` (or defaults), then environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<ExtractionConfig> {
    let config = match path {
        Some(path) => {
            debug!(path = %path.display(), "Loading configuration");
            ExtractionConfig::load(path)?
        }
        None => ExtractionConfig::default(),
    };
    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

/// The `{"message": ...}` body printed for a rejected document.
pub fn error_payload(err: &DocsiftError) -> String {
    serde_json::json!({ "message": err.to_string() }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_payload_is_a_message_object() {
        let err = DocsiftError::Input("cannot read /tmp/x.pdf".into());
        let value: serde_json::Value = serde_json::from_str(&error_payload(&err)).unwrap();
        assert_eq!(
            value["message"],
            "input document unavailable: cannot read /tmp/x.pdf"
        );
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docsift.json");
        std::fs::write(&path, r#"{"min_text_chars": 25, "raster_dpi": 150}"#).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.min_text_chars, 25);
        assert_eq!(config.raster_dpi, 150);
        assert_eq!(config.pdftotext_bin, "pdftotext");
    }

    #[test]
    fn invalid_config_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docsift.json");
        std::fs::write(&path, r#"{"ocr_concurrency": 0}"#).unwrap();

        assert!(load_config(Some(&path)).is_err());
    }
}
