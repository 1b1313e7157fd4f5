// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — text layer extraction and positional text reading.

pub mod positions;
pub mod reader;

pub use positions::LopdfPositionalReader;
pub use reader::{LopdfTextExtractor, PdfReader};
