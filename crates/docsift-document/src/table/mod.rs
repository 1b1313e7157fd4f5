// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Table extraction: the primary layout-based extractor, its single-outcome
// adapter, and positional reconstruction for when it fails.

pub mod adapter;
pub mod layout;
pub mod reconstruct;

pub use adapter::{TableOutcome, attempt};
pub use layout::LayoutTableExtractor;
pub use reconstruct::{TableReconstructor, reconstruct_tables};
