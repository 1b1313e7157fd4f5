// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-outcome wrapper around the primary table extractor.

use std::path::Path;
use std::sync::Arc;

use docsift_core::error::DocsiftError;
use docsift_core::types::PageTable;
use tracing::{debug, instrument, warn};

use crate::traits::TableExtractor;

/// What one attempt at primary table extraction produced.
#[derive(Debug)]
pub enum TableOutcome {
    Success(Vec<PageTable>),
    Failure(DocsiftError),
}

impl TableOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TableOutcome::Success(_))
    }
}

impl From<docsift_core::error::Result<Vec<PageTable>>> for TableOutcome {
    fn from(result: docsift_core::error::Result<Vec<PageTable>>) -> Self {
        match result {
            Ok(tables) => TableOutcome::Success(tables),
            Err(err) => TableOutcome::Failure(err),
        }
    }
}

/// Run `extractor` once on the blocking pool. No retries; a panicked task is
/// a failure like any other.
#[instrument(skip_all, fields(pdf = %pdf.display(), extractor = extractor.backend_name()))]
pub async fn attempt(extractor: Arc<dyn TableExtractor>, pdf: &Path) -> TableOutcome {
    let path = pdf.to_path_buf();
    let joined = tokio::task::spawn_blocking(move || extractor.extract_tables(&path)).await;

    let outcome = match joined {
        Ok(result) => TableOutcome::from(result),
        Err(err) => TableOutcome::Failure(DocsiftError::TableError(format!(
            "table extractor task aborted: {}",
            err
        ))),
    };
    match &outcome {
        TableOutcome::Success(tables) => debug!(pages = tables.len(), "Primary tables extracted"),
        TableOutcome::Failure(err) => {
            warn!(stage = "primary_tables", %err, "Primary table extraction failed")
        }
    }
    outcome
}
