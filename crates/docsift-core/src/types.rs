// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the docsift extraction pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one extraction request, used for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A text fragment tagged with its page and approximate on-page position.
///
/// Every field but `text` is optional because positional readers do not
/// always repeat the page marker or report a coordinate. Missing pages are
/// inherited from the last item that carried one; missing coordinates count
/// as 0.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionedTextItem {
    /// 1-based page number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    pub text: String,
}

impl PositionedTextItem {
    /// Item with an explicit page and position.
    pub fn new(page: u32, x: f64, y: f64, text: impl Into<String>) -> Self {
        Self {
            page: Some(page),
            x: Some(x),
            y: Some(y),
            text: text.into(),
        }
    }

    /// Item that inherits its page from whatever preceded it in the stream.
    pub fn on_current_page(x: f64, y: f64, text: impl Into<String>) -> Self {
        Self {
            page: None,
            x: Some(x),
            y: Some(y),
            text: text.into(),
        }
    }
}

/// A dense table recovered from one page.
///
/// Every row holds exactly `width` cells and `height == rows.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTable {
    /// 1-based page number.
    pub page: u32,
    #[serde(rename = "tables")]
    pub rows: Vec<Vec<String>>,
    pub width: usize,
    pub height: usize,
}

impl PageTable {
    /// Build a table from rows, padding short rows with empty cells so all of
    /// them match the longest one.
    pub fn from_rows(page: u32, mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        let height = rows.len();
        Self {
            page,
            rows,
            width,
            height,
        }
    }
}

/// Final outcome of one extraction request.
///
/// Built once by the pipeline and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    text: String,
    tables: Vec<PageTable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl ExtractionResult {
    pub fn new(text: String, tables: Vec<PageTable>, message: Option<String>) -> Self {
        Self {
            text,
            tables,
            message,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tables(&self) -> &[PageTable] {
        &self.tables
    }

    /// Diagnostic note set when a stage degraded the result.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_degraded(&self) -> bool {
        self.message.is_some()
    }
}
