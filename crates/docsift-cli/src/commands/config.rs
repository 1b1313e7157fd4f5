// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use std::path::Path;

use docsift_core::error::Result;

pub fn run(config: Option<&Path>) -> Result<()> {
    let config = super::load_config(config)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
