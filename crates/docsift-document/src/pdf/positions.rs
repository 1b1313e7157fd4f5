// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Positional text reader. Walks each page's content stream and reports every
// shown string together with the text-matrix origin it was drawn at.
//
// Coordinates are converted to grid units measured from the top-left corner
// of the page: `x = x_pt / grid_unit`, `y = (page_height - y_pt) / grid_unit`.
// The current transformation matrix (`cm`) is not applied, so rotated or
// scaled content lands at its untransformed position.

use std::collections::VecDeque;
use std::path::Path;

use docsift_core::error::{DocsiftError, Result};
use docsift_core::types::PositionedTextItem;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, instrument};

use super::reader::{PdfReader, number, page_height};
use crate::traits::{PositionalReader, PositionedItems};

/// TJ displacement (thousandths of text space) wide enough to count as a
/// word gap.
const TJ_SPACE_THRESHOLD: f64 = 200.0;

/// Positional reader backed by lopdf content-stream decoding.
#[derive(Debug, Clone, Copy)]
pub struct LopdfPositionalReader {
    /// Size of one grid unit in PDF points.
    grid_unit_pt: f64,
}

impl LopdfPositionalReader {
    pub fn new(grid_unit_pt: f64) -> Self {
        Self { grid_unit_pt }
    }
}

impl Default for LopdfPositionalReader {
    fn default() -> Self {
        Self::new(16.0)
    }
}

impl PositionalReader for LopdfPositionalReader {
    #[instrument(skip_all, fields(path = %pdf.display()))]
    fn read_items<'a>(&'a self, pdf: &Path) -> Result<PositionedItems<'a>> {
        let reader = PdfReader::open(pdf).map_err(|err| DocsiftError::ReaderError(err.to_string()))?;
        let pages = reader.pages();
        debug!(pages = pages.len(), "Positional reader opened");
        Ok(Box::new(PageItems {
            document: reader.into_document(),
            pages: pages.into(),
            grid_unit_pt: self.grid_unit_pt,
            pending: VecDeque::new(),
            broken: false,
        }))
    }

    fn backend_name(&self) -> &str {
        "lopdf-positions"
    }
}

/// Lazy iterator that decodes one page at a time.
///
/// A page whose content stream cannot be decoded ends the stream with a
/// single `Err` element.
struct PageItems {
    document: Document,
    pages: VecDeque<(u32, ObjectId)>,
    grid_unit_pt: f64,
    pending: VecDeque<PositionedTextItem>,
    broken: bool,
}

impl Iterator for PageItems {
    type Item = Result<PositionedTextItem>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(Ok(item));
            }
            if self.broken {
                return None;
            }
            let (page_number, page_id) = self.pages.pop_front()?;
            match self.decode_page(page_number, page_id) {
                Ok(items) => self.pending.extend(items),
                Err(err) => {
                    self.broken = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

impl PageItems {
    fn decode_page(&self, page_number: u32, page_id: ObjectId) -> Result<Vec<PositionedTextItem>> {
        let content = page_content(&self.document, page_id).map_err(|reason| {
            DocsiftError::ReaderError(format!(
                "cannot decode content of page {}: {}",
                page_number, reason
            ))
        })?;
        let height = page_height(&self.document, page_id);

        let mut state = TextState::default();
        let mut items = Vec::new();
        for operation in &content.operations {
            if let Some((x_pt, y_pt, text)) = state.apply(operation) {
                items.push(PositionedTextItem::new(
                    page_number,
                    x_pt / self.grid_unit_pt,
                    (height - y_pt) / self.grid_unit_pt,
                    text,
                ));
            }
        }
        debug!(page_number, items = items.len(), "Page positions decoded");
        Ok(items)
    }
}

/// Concatenate and parse every content stream of a page. A /Contents entry
/// that does not resolve to a stream is an error.
fn page_content(document: &Document, page_id: ObjectId) -> std::result::Result<Content, String> {
    let mut data = Vec::new();
    for content_id in document.get_page_contents(page_id) {
        let stream = document
            .get_object(content_id)
            .and_then(Object::as_stream)
            .map_err(|err| format!("/Contents {:?} is not a stream ({})", content_id, err))?;
        if stream.dict.get(b"Filter").is_ok() {
            let decoded = stream
                .decompressed_content()
                .map_err(|err| format!("cannot decompress {:?}: {}", content_id, err))?;
            data.extend_from_slice(&decoded);
        } else {
            data.extend_from_slice(&stream.content);
        }
        data.push(b'\n');
    }
    Content::decode(&data).map_err(|err| err.to_string())
}

/// Text-object state: text matrix, line matrix, and leading.
///
/// Matrices are stored as the six PDF coefficients `[a b c d e f]`.
#[derive(Debug, Clone)]
struct TextState {
    text_matrix: [f64; 6],
    line_matrix: [f64; 6],
    leading: f64,
}

const IDENTITY: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

impl Default for TextState {
    fn default() -> Self {
        Self {
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            leading: 0.0,
        }
    }
}

impl TextState {
    /// Apply one content operator; return the origin and text of any string
    /// it shows.
    fn apply(&mut self, operation: &Operation) -> Option<(f64, f64, String)> {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "BT" => {
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
                None
            }
            "Tm" => {
                let values: Vec<f64> = operands.iter().filter_map(number).collect();
                if let Ok(matrix) = <[f64; 6]>::try_from(values.as_slice()) {
                    self.text_matrix = matrix;
                    self.line_matrix = matrix;
                }
                None
            }
            "Td" => {
                let (tx, ty) = pair(operands)?;
                self.move_line(tx, ty);
                None
            }
            "TD" => {
                let (tx, ty) = pair(operands)?;
                self.leading = -ty;
                self.move_line(tx, ty);
                None
            }
            "TL" => {
                self.leading = operands.first().and_then(number)?;
                None
            }
            "T*" => {
                self.next_line();
                None
            }
            "Tj" => self.show(operands.first().map(string_text)),
            "TJ" => self.show(operands.first().map(array_text)),
            "'" => {
                self.next_line();
                self.show(operands.first().map(string_text))
            }
            "\"" => {
                self.next_line();
                self.show(operands.get(2).map(string_text))
            }
            _ => None,
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        let [a, b, c, d, e, f] = self.line_matrix;
        self.line_matrix = [a, b, c, d, e + tx * a + ty * c, f + tx * b + ty * d];
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn show(&self, text: Option<String>) -> Option<(f64, f64, String)> {
        let text = text?;
        Some((self.text_matrix[4], self.text_matrix[5], text))
    }
}

fn pair(operands: &[Object]) -> Option<(f64, f64)> {
    match operands {
        [x, y, ..] => Some((number(x)?, number(y)?)),
        _ => None,
    }
}

fn string_text(object: &Object) -> String {
    match object {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        _ => String::new(),
    }
}

fn array_text(object: &Object) -> String {
    let Object::Array(parts) = object else {
        return string_text(object);
    };
    let mut text = String::new();
    for part in parts {
        match part {
            Object::String(bytes, _) => text.push_str(&decode_pdf_string(bytes)),
            other => {
                if number(other).is_some_and(|gap| -gap > TJ_SPACE_THRESHOLD)
                    && !text.ends_with(' ')
                {
                    text.push(' ');
                }
            }
        }
    }
    text
}

/// Decode a PDF string: UTF-16BE when it carries a byte-order mark, otherwise
/// one byte per character (Latin-1 superset of PDFDocEncoding's ASCII range).
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::tests::pdf_with_pages;

    fn write_pdf(bytes: &[u8]) -> tempfile::NamedTempFile {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn reports_text_at_grid_positions() {
        // 612x792 page, 16pt grid: (32, 760) -> x=2, y=(792-760)/16=2
        let bytes = pdf_with_pages(&[vec![(32, 760, "Name"), (160, 760, "Qty")]]);
        let file = write_pdf(&bytes);

        let reader = LopdfPositionalReader::new(16.0);
        let items: Vec<_> = reader
            .read_items(file.path())
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0], PositionedTextItem::new(1, 2.0, 2.0, "Name"));
        assert_eq!(items[1], PositionedTextItem::new(1, 10.0, 2.0, "Qty"));
    }

    #[test]
    fn pages_are_reported_in_order() {
        let bytes = pdf_with_pages(&[vec![(0, 792, "one")], vec![(0, 792, "two")]]);
        let file = write_pdf(&bytes);

        let reader = LopdfPositionalReader::default();
        let pages: Vec<Option<u32>> = reader
            .read_items(file.path())
            .unwrap()
            .map(|item| item.unwrap().page)
            .collect();
        assert_eq!(pages, vec![Some(1), Some(2)]);
    }

    #[test]
    fn undecodable_page_ends_the_stream_with_one_error() {
        let bytes = pdf_with_pages(&[
            vec![(0, 792, "one")],
            vec![(0, 792, "two")],
            vec![(0, 792, "three")],
        ]);
        let mut doc = Document::load_mem(&bytes).unwrap();
        let not_a_stream = doc.add_object(Object::Integer(7));
        let page_two = doc.get_pages()[&2];
        doc.get_dictionary_mut(page_two)
            .unwrap()
            .set("Contents", not_a_stream);
        let mut broken = Vec::new();
        doc.save_to(&mut broken).unwrap();
        let file = write_pdf(&broken);

        let reader = LopdfPositionalReader::default();
        let mut items = reader.read_items(file.path()).unwrap();

        let first = items.next().unwrap().unwrap();
        assert_eq!(first.page, Some(1));
        assert_eq!(first.text, "one");
        match items.next() {
            Some(Err(DocsiftError::ReaderError(msg))) => assert!(msg.contains("page 2")),
            other => panic!("expected a reader error, got {other:?}"),
        }
        assert!(items.next().is_none());
        assert!(items.next().is_none());
    }

    #[test]
    fn unreadable_file_is_reader_error() {
        let file = write_pdf(b"%PDF-1.5 but not really");
        let reader = LopdfPositionalReader::default();
        assert!(matches!(
            reader.read_items(file.path()),
            Err(DocsiftError::ReaderError(_))
        ));
    }

    #[test]
    fn td_and_t_star_move_the_line_origin() {
        let mut state = TextState::default();
        state.apply(&Operation::new("BT", vec![]));
        state.apply(&Operation::new("Td", vec![100.into(), 700.into()]));
        state.apply(&Operation::new("TL", vec![14.into()]));
        let first = state.apply(&Operation::new("Tj", vec![Object::string_literal("a")]));
        state.apply(&Operation::new("T*", vec![]));
        let second = state.apply(&Operation::new("Tj", vec![Object::string_literal("b")]));

        assert_eq!(first, Some((100.0, 700.0, "a".to_string())));
        assert_eq!(second, Some((100.0, 686.0, "b".to_string())));
    }

    #[test]
    fn tj_arrays_insert_spaces_for_wide_gaps() {
        let array = Object::Array(vec![
            Object::string_literal("Net"),
            Object::Integer(-250),
            Object::string_literal("income"),
            Object::Integer(-20),
            Object::string_literal("s"),
        ]);
        assert_eq!(array_text(&array), "Net incomes");
    }

    #[test]
    fn utf16_strings_are_decoded() {
        let bytes = [0xFE, 0xFF, 0x00, 0x4F, 0x00, 0x4B];
        assert_eq!(decode_pdf_string(&bytes), "OK");
        assert_eq!(decode_pdf_string(b"caf\xe9"), "café");
    }
}
