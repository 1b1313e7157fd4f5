// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use std::path::Path;

use docsift_core::error::Result;
use docsift_document::scan::{PdftoppmRasterizer, TesseractRecognizer};
use docsift_document::table::LayoutTableExtractor;

pub fn run(config: Option<&Path>) -> Result<()> {
    let config = super::load_config(config)?;

    let checks = [
        (
            "pdftoppm",
            config.pdftoppm_bin.as_str(),
            PdftoppmRasterizer::new(config.pdftoppm_bin.clone(), config.raster_dpi).is_available(),
            "OCR fallback (page rasterization)",
        ),
        (
            "pdftotext",
            config.pdftotext_bin.as_str(),
            LayoutTableExtractor::new(config.pdftotext_bin.clone()).is_available(),
            "primary table extraction",
        ),
        (
            "tesseract",
            config.tesseract_bin.as_str(),
            TesseractRecognizer::new(config.tesseract_bin.clone()).is_available(),
            "OCR fallback (text recognition)",
        ),
    ];

    for (tool, bin, available, used_for) in &checks {
        let status = if *available { "ok" } else { "missing" };
        println!("{tool:<10} {status:<8} {bin}  ({used_for})");
    }
    println!("{:<10} {:<8}", "ocrs", ocrs_status(&config));

    let missing = checks.iter().filter(|(_, _, available, _)| !available).count();
    if missing > 0 {
        eprintln!("{missing} tool(s) missing; affected stages will degrade instead of failing");
    }
    Ok(())
}

#[cfg(feature = "ocr")]
fn ocrs_status(config: &docsift_core::config::ExtractionConfig) -> &'static str {
    let models = match &config.ocr_model_dir {
        Some(dir) => docsift_document::scan::OcrsModels::from_dir(dir),
        None => docsift_document::scan::OcrsModels::default(),
    };
    if models.validate().is_ok() { "ok" } else { "missing" }
}

#[cfg(not(feature = "ocr"))]
fn ocrs_status(_config: &docsift_core::config::ExtractionConfig) -> &'static str {
    "disabled"
}
