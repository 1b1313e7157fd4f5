// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization via poppler's `pdftoppm`.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use docsift_core::error::{DocsiftError, Result};
use tracing::{debug, info, instrument};

use crate::tools;
use crate::traits::PageRasterizer;

/// Filename prefix given to `pdftoppm`; it appends `-<page>.png`.
const PAGE_PREFIX: &str = "page";

/// Renders pages to PNG files with `pdftoppm -png -r <dpi>`.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    bin: String,
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(bin: impl Into<String>, dpi: u32) -> Self {
        Self {
            bin: bin.into(),
            dpi,
        }
    }

    /// Check if pdftoppm can be launched.
    pub fn is_available(&self) -> bool {
        tools::is_available(&self.bin, "-v")
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm", 300)
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    #[instrument(skip_all, fields(pdf = %pdf.display(), dpi = self.dpi))]
    fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let prefix = out_dir.join(PAGE_PREFIX);
        let dpi = self.dpi.to_string();
        tools::run(
            &self.bin,
            [
                OsStr::new("-png"),
                OsStr::new("-r"),
                OsStr::new(&dpi),
                pdf.as_os_str(),
                prefix.as_os_str(),
            ],
        )
        .map_err(|err| DocsiftError::RasterError(err.to_string()))?;

        let pages = collect_page_images(out_dir)?;
        if pages.is_empty() {
            return Err(DocsiftError::RasterError(format!(
                "{} produced no page images",
                self.bin
            )));
        }
        info!(pages = pages.len(), "Pages rasterized");
        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "pdftoppm"
    }
}

/// List `page-<n>.png` files in `dir`, ordered by page number.
///
/// pdftoppm zero-pads the page number to the width of the page count, so the
/// number is parsed rather than relying on lexical order.
pub(crate) fn collect_page_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut numbered: Vec<(u32, PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter_map(|path| page_number(&path).map(|n| (n, path)))
        .collect();
    numbered.sort_by_key(|(n, _)| *n);
    debug!(images = numbered.len(), dir = %dir.display(), "Page images collected");
    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}

fn page_number(path: &Path) -> Option<u32> {
    if path.extension()? != "png" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.strip_prefix(PAGE_PREFIX)?.strip_prefix('-')?;
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_images_sort_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-10.png", "page-2.png", "page-1.png", "notes.txt", "page-x.png"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let pages = collect_page_images(dir.path()).unwrap();
        let names: Vec<_> = pages
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["page-1.png", "page-2.png", "page-10.png"]);
    }

    #[test]
    fn zero_padded_numbers_parse() {
        assert_eq!(page_number(Path::new("/tmp/page-007.png")), Some(7));
        assert_eq!(page_number(Path::new("/tmp/page-007.jpg")), None);
    }

    #[test]
    fn missing_binary_is_raster_error() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = PdftoppmRasterizer::new("docsift-no-such-pdftoppm", 72);
        let err = rasterizer
            .rasterize(Path::new("/nonexistent.pdf"), dir.path())
            .unwrap_err();
        assert!(matches!(err, DocsiftError::RasterError(_)));
        assert!(!rasterizer.is_available());
    }
}
