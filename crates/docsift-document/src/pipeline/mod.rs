// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline module: request scoping and stage orchestration.

pub mod orchestrator;
pub mod request;

pub use orchestrator::{ExtractionPipeline, PipelineBuilder, is_sufficient};
pub use request::{CleanupReport, ExtractionRequest};
