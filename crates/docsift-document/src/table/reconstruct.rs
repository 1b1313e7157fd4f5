// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Table reconstruction from positioned text.
//
// Used when the primary table extractor fails. Every text item is snapped to
// an integer (row, column) grid cell on its page; the cells of each page are
// then laid out densely, row by row, with gaps filled by empty strings.
//
// When two items land on the same cell, the one observed later wins.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use docsift_core::error::{DocsiftError, Result};
use docsift_core::types::{PageTable, PositionedTextItem};
use tracing::{debug, info, instrument, warn};

use crate::traits::PositionalReader;

/// Page assumed for items seen before any item names its page.
const FIRST_PAGE: u32 = 1;

/// Cells further out than this are dropped rather than padded to.
pub const MAX_GRID_INDEX: u64 = 4096;

/// Accumulates positioned items for a single reconstruction run.
///
/// Owned by one call and discarded with it; nothing is shared between
/// documents.
#[derive(Debug)]
pub struct TableReconstructor {
    current_page: u32,
    /// Pages in the order they were first seen.
    pages_seen: Vec<u32>,
    /// page -> (row, col) -> last text observed at that cell.
    cells: HashMap<u32, BTreeMap<(u64, u64), String>>,
    skipped: usize,
}

impl Default for TableReconstructor {
    fn default() -> Self {
        Self::new()
    }
}

impl TableReconstructor {
    pub fn new() -> Self {
        Self {
            current_page: FIRST_PAGE,
            pages_seen: Vec::new(),
            cells: HashMap::new(),
            skipped: 0,
        }
    }

    /// Record one item. Items without a page inherit the last page seen.
    pub fn push(&mut self, item: PositionedTextItem) {
        if let Some(page) = item.page {
            self.current_page = page;
        }
        let page = self.current_page;

        let (Some(row), Some(col)) = (quantize(item.y), quantize(item.x)) else {
            self.skipped += 1;
            return;
        };

        let page_cells = self.cells.entry(page).or_insert_with(|| {
            self.pages_seen.push(page);
            BTreeMap::new()
        });
        page_cells.insert((row, col), item.text);
    }

    /// Number of items dropped for falling outside the grid.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Lay out every page that kept at least one non-blank row, in first-seen
    /// page order.
    pub fn finish(mut self) -> Vec<PageTable> {
        let mut tables = Vec::with_capacity(self.pages_seen.len());
        for page in &self.pages_seen {
            let Some(page_cells) = self.cells.remove(page) else {
                continue;
            };
            if let Some(table) = layout_page(*page, page_cells) {
                tables.push(table);
            }
        }
        tables
    }

    /// Consume a whole item stream. The first stream error aborts the run.
    pub fn reconstruct<I>(items: I) -> Result<Vec<PageTable>>
    where
        I: IntoIterator<Item = Result<PositionedTextItem>>,
    {
        let mut reconstructor = Self::new();
        for item in items {
            reconstructor.push(item?);
        }
        if reconstructor.skipped > 0 {
            debug!(skipped = reconstructor.skipped, "Items outside the grid ignored");
        }
        Ok(reconstructor.finish())
    }
}

/// Open `pdf` through `reader` and rebuild its tables.
///
/// Failing to open the reader and a broken item stream are both hard failures,
/// reported as [`DocsiftError::ReaderError`].
#[instrument(skip_all, fields(pdf = %pdf.display(), reader = reader.backend_name()))]
pub fn reconstruct_tables(reader: &dyn PositionalReader, pdf: &Path) -> Result<Vec<PageTable>> {
    let items = reader.read_items(pdf).map_err(|err| {
        warn!(stage = "table_reconstruction", %err, "Positional reader failed to open");
        as_reader_error(err)
    })?;
    let tables = TableReconstructor::reconstruct(items).map_err(|err| {
        warn!(stage = "table_reconstruction", %err, "Positional stream broke");
        as_reader_error(err)
    })?;
    info!(pages = tables.len(), "Tables reconstructed from positions");
    Ok(tables)
}

fn as_reader_error(err: DocsiftError) -> DocsiftError {
    match err {
        DocsiftError::ReaderError(_) => err,
        other => DocsiftError::ReaderError(other.to_string()),
    }
}

/// Floor a coordinate to a grid index. Absent and non-finite values count as
/// 0; negative or oversized indices are rejected.
fn quantize(coord: Option<f64>) -> Option<u64> {
    let value = coord.filter(|v| v.is_finite()).unwrap_or(0.0).floor();
    if value < 0.0 || value > MAX_GRID_INDEX as f64 {
        return None;
    }
    Some(value as u64)
}

fn layout_page(page: u32, cells: BTreeMap<(u64, u64), String>) -> Option<PageTable> {
    let max_col = cells.keys().map(|(_, col)| *col).max()?;
    let width = max_col as usize + 1;

    // Keys iterate in (row, col) order, so each row is filled left to right.
    let mut dense: Vec<(u64, Vec<String>)> = Vec::new();
    for ((row, col), text) in cells {
        if dense.last().map(|(last, _)| *last) != Some(row) {
            dense.push((row, vec![String::new(); width]));
        }
        if let Some((_, row_cells)) = dense.last_mut() {
            row_cells[col as usize] = text;
        }
    }

    let rows: Vec<Vec<String>> = dense
        .into_iter()
        .map(|(_, row_cells)| row_cells)
        .filter(|row_cells| row_cells.iter().any(|cell| !cell.is_empty()))
        .collect();
    if rows.is_empty() {
        return None;
    }
    Some(PageTable::from_rows(page, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(items: Vec<PositionedTextItem>) -> Vec<Result<PositionedTextItem>> {
        items.into_iter().map(Ok).collect()
    }

    fn item(page: u32, x: f64, y: f64, text: &str) -> PositionedTextItem {
        PositionedTextItem::new(page, x, y, text)
    }

    #[test]
    fn sparse_row_is_padded_and_blank_row_dropped() {
        let tables = TableReconstructor::reconstruct(ok(vec![
            item(1, 0.0, 0.0, "A"),
            item(1, 5.0, 0.0, "B"),
            item(1, 0.0, 1.0, ""),
        ]))
        .unwrap();

        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.page, 1);
        assert_eq!(table.rows, vec![vec!["A", "", "", "", "", "B"]]);
        assert_eq!(table.width, 6);
        assert_eq!(table.height, 1);
    }

    #[test]
    fn later_item_wins_on_same_cell() {
        let tables = TableReconstructor::reconstruct(ok(vec![
            item(1, 2.2, 3.7, "first"),
            item(1, 2.9, 3.1, "second"),
        ]))
        .unwrap();

        assert_eq!(tables[0].rows, vec![vec!["", "", "second"]]);
    }

    #[test]
    fn missing_page_inherits_last_seen_and_defaults_to_one() {
        let tables = TableReconstructor::reconstruct(ok(vec![
            PositionedTextItem::on_current_page(0.0, 0.0, "before any page"),
            item(3, 0.0, 0.0, "p3"),
            PositionedTextItem::on_current_page(1.0, 0.0, "still p3"),
        ]))
        .unwrap();

        let pages: Vec<u32> = tables.iter().map(|t| t.page).collect();
        assert_eq!(pages, vec![1, 3]);
        assert_eq!(tables[1].rows, vec![vec!["p3", "still p3"]]);
    }

    #[test]
    fn missing_and_non_finite_coordinates_count_as_zero() {
        let tables = TableReconstructor::reconstruct(ok(vec![
            PositionedTextItem {
                page: Some(1),
                x: None,
                y: Some(f64::NAN),
                text: "origin".into(),
            },
            item(1, 1.0, 0.0, "next"),
        ]))
        .unwrap();

        assert_eq!(tables[0].rows, vec![vec!["origin", "next"]]);
    }

    #[test]
    fn rows_sorted_and_pages_in_first_seen_order() {
        let tables = TableReconstructor::reconstruct(ok(vec![
            item(2, 1.0, 4.0, "p2 r4"),
            item(1, 0.0, 9.0, "p1 r9"),
            item(2, 0.0, 1.0, "p2 r1"),
            item(1, 0.0, 2.0, "p1 r2"),
        ]))
        .unwrap();

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].page, 2);
        assert_eq!(tables[0].rows, vec![vec!["p2 r1", ""], vec!["", "p2 r4"]]);
        assert_eq!(tables[1].page, 1);
        assert_eq!(tables[1].rows, vec![vec!["p1 r2"], vec!["p1 r9"]]);
    }

    #[test]
    fn all_blank_page_is_omitted() {
        let tables = TableReconstructor::reconstruct(ok(vec![
            item(1, 0.0, 0.0, ""),
            item(2, 0.0, 0.0, "kept"),
        ]))
        .unwrap();

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].page, 2);
    }

    #[test]
    fn negative_and_oversized_cells_are_skipped() {
        let mut reconstructor = TableReconstructor::new();
        reconstructor.push(item(1, -0.5, 0.0, "left of page"));
        reconstructor.push(item(1, 0.0, 1e9, "far below"));
        reconstructor.push(item(1, 0.0, 0.0, "ok"));
        assert_eq!(reconstructor.skipped(), 2);

        let tables = reconstructor.finish();
        assert_eq!(tables[0].rows, vec![vec!["ok"]]);
    }

    #[test]
    fn every_row_matches_width_and_is_not_blank() {
        let items: Vec<_> = (0..20u32)
            .map(|i| {
                let text = if i % 3 == 0 { String::new() } else { format!("c{i}") };
                item(1 + i % 2, f64::from(i % 7), f64::from(i % 5), &text)
            })
            .collect();
        let tables = TableReconstructor::reconstruct(ok(items)).unwrap();

        for table in &tables {
            assert_eq!(table.height, table.rows.len());
            for row in &table.rows {
                assert_eq!(row.len(), table.width);
                assert!(row.iter().any(|cell| !cell.is_empty()));
            }
        }
    }

    #[test]
    fn stream_error_aborts_reconstruction() {
        let items = vec![
            Ok(item(1, 0.0, 0.0, "A")),
            Err(DocsiftError::ReaderError("truncated content stream".into())),
            Ok(item(1, 1.0, 0.0, "never reached")),
        ];
        let err = TableReconstructor::reconstruct(items).unwrap_err();
        assert!(matches!(err, DocsiftError::ReaderError(_)));
    }

    struct BrokenReader;

    impl PositionalReader for BrokenReader {
        fn read_items<'a>(&'a self, _pdf: &Path) -> Result<crate::traits::PositionedItems<'a>> {
            Err(DocsiftError::PdfError("not a PDF".into()))
        }

        fn backend_name(&self) -> &str {
            "broken"
        }
    }

    #[test]
    fn reader_open_failure_is_reader_error() {
        let err = reconstruct_tables(&BrokenReader, Path::new("x.pdf")).unwrap_err();
        assert!(matches!(err, DocsiftError::ReaderError(msg) if msg.contains("not a PDF")));
    }
}
