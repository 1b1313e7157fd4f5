// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for table extraction in the docsift-document crate.
// Covers positional reconstruction on a synthetic multi-page grid and
// splitting of `pdftotext -layout` output.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use docsift_core::types::PositionedTextItem;
use docsift_document::table::TableReconstructor;
use docsift_document::table::layout::tables_from_layout;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// 10 pages of a 40x8 grid with every third cell left blank and a few items
/// that carry no page marker.
fn synthetic_items() -> Vec<PositionedTextItem> {
    let mut items = Vec::new();
    for page in 1..=10u32 {
        for row in 0..40u32 {
            for col in 0..8u32 {
                if (row + col) % 3 == 0 {
                    continue;
                }
                let x = f64::from(col) * 2.0 + 0.4;
                let y = f64::from(row) + 0.2;
                let text = format!("p{page}r{row}c{col}");
                if col == 0 {
                    items.push(PositionedTextItem::new(page, x, y, text));
                } else {
                    items.push(PositionedTextItem::on_current_page(x, y, text));
                }
            }
        }
    }
    items
}

fn bench_reconstruction(c: &mut Criterion) {
    let items = synthetic_items();

    c.bench_function("table_reconstruction (10 pages, 40x8)", |b| {
        b.iter(|| {
            let tables =
                TableReconstructor::reconstruct(black_box(items.clone()).into_iter().map(Ok));
            black_box(tables)
        });
    });
}

fn bench_layout_split(c: &mut Criterion) {
    let mut layout = String::new();
    for page in 1..=10 {
        layout.push_str(&format!("Report page {page}\n"));
        for row in 0..40 {
            layout.push_str(&format!("Item {row:<6}     {:>8}     {:>6} kg\n", row * 17, row % 9));
        }
        layout.push('\x0c');
    }

    c.bench_function("layout_tables (10 pages, 40 rows)", |b| {
        b.iter(|| black_box(tables_from_layout(black_box(&layout))));
    });
}

criterion_group!(benches, bench_reconstruction, bench_layout_split);
criterion_main!(benches);
