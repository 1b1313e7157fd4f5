// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Primary table extraction from `pdftotext -layout` output.
//
// pdftotext -layout preserves column alignment using runs of spaces. Any line
// that splits into two or more cells on gaps of at least two spaces is taken
// as a table row; pages are separated by form feeds.

use std::ffi::OsStr;
use std::path::Path;

use docsift_core::error::{DocsiftError, Result};
use docsift_core::types::PageTable;
use tracing::{debug, instrument};

use crate::tools;
use crate::traits::TableExtractor;

/// Minimum run of spaces that separates two cells.
const MIN_COLUMN_GAP: usize = 2;

/// Table extractor backed by poppler's `pdftotext -layout`.
#[derive(Debug, Clone)]
pub struct LayoutTableExtractor {
    bin: String,
}

impl LayoutTableExtractor {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    /// Check if pdftotext can be launched.
    pub fn is_available(&self) -> bool {
        tools::is_available(&self.bin, "-v")
    }
}

impl Default for LayoutTableExtractor {
    fn default() -> Self {
        Self::new("pdftotext")
    }
}

impl TableExtractor for LayoutTableExtractor {
    #[instrument(skip_all, fields(pdf = %pdf.display()))]
    fn extract_tables(&self, pdf: &Path) -> Result<Vec<PageTable>> {
        let stdout = tools::run(
            &self.bin,
            [OsStr::new("-layout"), pdf.as_os_str(), OsStr::new("-")],
        )
        .map_err(|err| DocsiftError::TableError(err.to_string()))?;
        let text = String::from_utf8_lossy(&stdout);
        let tables = tables_from_layout(&text);
        debug!(pages_with_tables = tables.len(), "Layout tables extracted");
        Ok(tables)
    }

    fn backend_name(&self) -> &str {
        "pdftotext-layout"
    }
}

/// Build one table per page from layout text. Pages without any multi-cell
/// line are left out.
pub fn tables_from_layout(text: &str) -> Vec<PageTable> {
    text.split('\x0c')
        .enumerate()
        .filter_map(|(index, page_text)| {
            let rows: Vec<Vec<String>> = page_text
                .lines()
                .map(split_columns)
                .filter(|cells| cells.len() >= 2)
                .collect();
            if rows.is_empty() {
                None
            } else {
                Some(PageTable::from_rows(index as u32 + 1, rows))
            }
        })
        .collect()
}

/// Split a layout line into cells on runs of at least [`MIN_COLUMN_GAP`]
/// spaces.
pub fn split_columns(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut spaces = 0usize;

    for ch in line.trim().chars() {
        if ch == ' ' {
            spaces += 1;
            continue;
        }
        if spaces >= MIN_COLUMN_GAP && !current.is_empty() {
            cells.push(std::mem::take(&mut current));
        } else if spaces > 0 {
            current.extend(std::iter::repeat_n(' ', spaces));
        }
        spaces = 0;
        current.push(ch);
    }
    if !current.is_empty() {
        cells.push(current);
    }
    cells
}
