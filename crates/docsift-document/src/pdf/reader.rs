// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader. Opens existing PDF documents and pulls their text layer
// using the `lopdf` crate.

use std::path::Path;

use docsift_core::error::{DocsiftError, Result};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, info, instrument, warn};

use crate::traits::TextExtractor;

/// Height of a US Letter page, used when a page has no usable /MediaBox.
const DEFAULT_PAGE_HEIGHT_PT: f64 = 792.0;

/// Reads existing PDF files.
///
/// Wraps `lopdf::Document` and exposes the page tree and text layer the
/// extraction pipeline needs.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            DocsiftError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
        })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            DocsiftError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// Page numbers (1-indexed) paired with their object ids, in page order.
    pub fn pages(&self) -> Vec<(u32, ObjectId)> {
        self.document.get_pages().into_iter().collect()
    }

    /// Consume the reader and return the underlying lopdf document.
    pub fn into_document(self) -> Document {
        self.document
    }

    // -- Extraction -----------------------------------------------------------

    /// Extract the text layer of every page, pages separated by newlines.
    ///
    /// A page whose content cannot be decoded is skipped with a warning; the
    /// remaining pages still contribute.
    #[instrument(skip(self), fields(pages = self.page_count()))]
    pub fn extract_text(&self) -> Result<String> {
        let mut text = String::new();
        let mut failed_pages = 0usize;

        for (page_number, _) in self.pages() {
            match self.document.extract_text(&[page_number]) {
                Ok(page_text) => {
                    if !text.is_empty() && !text.ends_with('\n') {
                        text.push('\n');
                    }
                    text.push_str(&page_text);
                }
                Err(err) => {
                    failed_pages += 1;
                    warn!(page_number, %err, "Cannot extract text from page, skipping");
                }
            }
        }

        if failed_pages > 0 && failed_pages == self.page_count() {
            return Err(DocsiftError::PdfError(format!(
                "text extraction failed on all {} pages",
                failed_pages
            )));
        }

        debug!(chars = text.chars().count(), failed_pages, "Text layer extracted");
        Ok(text)
    }

    /// Height of a page in points, read from its (possibly inherited)
    /// /MediaBox.
    pub fn page_height(&self, page_id: ObjectId) -> f64 {
        page_height(&self.document, page_id)
    }
}

/// Resolve the /MediaBox height of a page, walking up /Parent links for
/// inherited boxes.
pub(crate) fn page_height(document: &Document, page_id: ObjectId) -> f64 {
    let mut current = Some(page_id);
    // The page tree is shallow; the bound only guards against cyclic /Parent.
    for _ in 0..32 {
        let Some(id) = current else { break };
        let Ok(dict) = document.get_dictionary(id) else {
            break;
        };
        if let Ok(media_box) = dict.get(b"MediaBox") {
            if let Some(height) = media_box_height(document, media_box) {
                return height;
            }
        }
        current = match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => Some(*parent),
            _ => None,
        };
    }
    DEFAULT_PAGE_HEIGHT_PT
}

fn media_box_height(document: &Document, object: &Object) -> Option<f64> {
    let resolved = match object {
        Object::Reference(id) => document.get_object(*id).ok()?,
        other => other,
    };
    let Object::Array(values) = resolved else {
        return None;
    };
    if values.len() != 4 {
        return None;
    }
    let lower = number(&values[1])?;
    let upper = number(&values[3])?;
    let height = (upper - lower).abs();
    (height > 0.0).then_some(height)
}

/// Numeric value of an integer or real PDF object.
pub(crate) fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

/// Primary text extractor backed by lopdf's text layer.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfTextExtractor;

impl LopdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for LopdfTextExtractor {
    fn extract_text(&self, pdf: &[u8]) -> Result<String> {
        PdfReader::from_bytes(pdf)?.extract_text()
    }

    fn backend_name(&self) -> &str {
        "lopdf"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Stream, dictionary};

    /// Build a PDF whose pages each show the given `(x, y, text)` runs in
    /// Helvetica, with a 612x792 media box inherited from the page tree.
    pub(crate) fn pdf_with_pages(pages: &[Vec<(i64, i64, &str)>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for runs in pages {
            let mut operations = vec![Operation::new("BT", vec![])];
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            for (x, y, text) in runs {
                operations.push(Operation::new(
                    "Tm",
                    vec![1.into(), 0.into(), 0.into(), 1.into(), (*x).into(), (*y).into()],
                ));
                operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
            }
            operations.push(Operation::new("ET", vec![]));
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn from_bytes_rejects_garbage() {
        let result = PdfReader::from_bytes(b"definitely not a pdf");
        assert!(matches!(result, Err(DocsiftError::PdfError(_))));
    }

    #[test]
    fn counts_pages_and_reads_inherited_media_box() {
        let bytes = pdf_with_pages(&[vec![(72, 700, "Hello")], vec![(72, 700, "World")]]);
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert_eq!(reader.page_count(), 2);
        assert!(reader.source_path().is_none());

        let (_, first_page) = reader.pages()[0];
        assert_eq!(reader.page_height(first_page), 792.0);
    }

    #[test]
    fn extracts_text_from_every_page() {
        let bytes = pdf_with_pages(&[vec![(72, 700, "Quarterly")], vec![(72, 700, "Report")]]);
        let text = LopdfTextExtractor::new().extract_text(&bytes).unwrap();
        assert!(text.contains("Quarterly"), "got {text:?}");
        assert!(text.contains("Report"), "got {text:?}");
    }

    #[test]
    fn number_reads_integers_and_reals() {
        assert_eq!(number(&Object::Integer(3)), Some(3.0));
        assert_eq!(number(&Object::Real(1.5)), Some(1.5));
        assert_eq!(number(&Object::Null), None);
    }
}
