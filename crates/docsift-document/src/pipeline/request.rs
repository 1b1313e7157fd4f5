// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request-scoped resources: the stored document and a scratch directory for
// rasterized pages. Everything is released exactly once, either explicitly
// through `release()` or on drop.

use std::path::{Path, PathBuf};

use docsift_core::error::{DocsiftError, Result};
use docsift_core::types::RequestId;
use tempfile::TempDir;
use tracing::{debug, warn};

/// File name used when an in-memory document has to be written to disk.
const SPILL_FILENAME: &str = "source.pdf";

/// Where the document of a request lives.
#[derive(Debug)]
enum StoredDocument {
    /// Uploaded file owned by the request; deleted at release.
    Owned(PathBuf),
    /// Caller's file; never deleted.
    Borrowed(PathBuf),
    /// In-memory document, written into the scratch directory on demand.
    Buffer(Vec<u8>),
}

/// What a release removed and what it could not.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, String)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One document going through the pipeline.
#[derive(Debug)]
pub struct ExtractionRequest {
    id: RequestId,
    filename: String,
    document: StoredDocument,
    scratch: Option<TempDir>,
    spilled: Option<PathBuf>,
    released: bool,
}

impl ExtractionRequest {
    fn new(filename: impl Into<String>, document: StoredDocument) -> Self {
        Self {
            id: RequestId::new(),
            filename: filename.into(),
            document,
            scratch: None,
            spilled: None,
            released: false,
        }
    }

    /// A stored upload. The file is deleted when the request is released.
    pub fn from_path(path: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
        Self::new(filename, StoredDocument::Owned(path.into()))
    }

    /// A file the caller keeps. Release leaves it in place.
    pub fn borrowed(path: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
        Self::new(filename, StoredDocument::Borrowed(path.into()))
    }

    /// A document already held in memory.
    pub fn from_bytes(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self::new(filename, StoredDocument::Buffer(bytes))
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Original filename as supplied by the caller.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Read the whole document. A missing or unreadable file is an
    /// [`DocsiftError::Input`] error.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        match &self.document {
            StoredDocument::Owned(path) | StoredDocument::Borrowed(path) => {
                std::fs::read(path).map_err(|err| {
                    DocsiftError::Input(format!("cannot read {}: {}", path.display(), err))
                })
            }
            StoredDocument::Buffer(bytes) => {
                if bytes.is_empty() {
                    return Err(DocsiftError::Input(format!(
                        "{} is empty",
                        self.filename
                    )));
                }
                Ok(bytes.clone())
            }
        }
    }

    /// Path of the document on disk, writing an in-memory document into the
    /// scratch directory the first time it is asked for.
    pub fn pdf_path(&mut self) -> Result<PathBuf> {
        if let StoredDocument::Owned(path) | StoredDocument::Borrowed(path) = &self.document {
            return Ok(path.clone());
        }
        if let Some(path) = &self.spilled {
            return Ok(path.clone());
        }

        let path = self.scratch_dir()?.join(SPILL_FILENAME);
        if let StoredDocument::Buffer(bytes) = &self.document {
            std::fs::write(&path, bytes)?;
        }
        debug!(path = %path.display(), "In-memory document written to scratch");
        self.spilled = Some(path.clone());
        Ok(path)
    }

    /// Scratch directory for this request, created on first use.
    pub fn scratch_dir(&mut self) -> Result<&Path> {
        if self.released {
            return Err(DocsiftError::Input(format!(
                "request {} was already released",
                self.id
            )));
        }
        if self.scratch.is_none() {
            let dir = tempfile::Builder::new()
                .prefix(&format!("docsift-{}-", self.id))
                .tempdir()?;
            debug!(dir = %dir.path().display(), "Scratch directory created");
            self.scratch = Some(dir);
        }
        match &self.scratch {
            Some(dir) => Ok(dir.path()),
            None => Err(DocsiftError::Input("scratch directory unavailable".into())),
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Delete the owned document and the scratch directory. Later calls do
    /// nothing and return an empty report. Failures are logged, not raised.
    pub fn release(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();
        if self.released {
            return report;
        }
        self.released = true;

        if let StoredDocument::Owned(path) = &self.document {
            match std::fs::remove_file(path) {
                Ok(()) => report.removed.push(path.clone()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "Owned document already gone");
                }
                Err(err) => report.failures.push((path.clone(), err.to_string())),
            }
        }
        if let StoredDocument::Buffer(bytes) = &mut self.document {
            *bytes = Vec::new();
        }

        if let Some(dir) = self.scratch.take() {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => report.removed.push(path),
                Err(err) => report.failures.push((path, err.to_string())),
            }
        }

        for (path, err) in &report.failures {
            warn!(stage = "cleanup", request_id = %self.id, path = %path.display(), %err, "Cleanup failed");
        }
        debug!(request_id = %self.id, removed = report.removed.len(), "Request released");
        report
    }
}

impl Drop for ExtractionRequest {
    fn drop(&mut self) {
        if !self.released {
            self.release();
        }
    }
}
