// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use std::path::{Path, PathBuf};

use docsift_core::error::Result;
use docsift_document::{ExtractionPipeline, ExtractionRequest};
use tracing::info;

pub struct ExtractArgs<'a> {
    pub file: PathBuf,
    pub config: Option<&'a Path>,
    pub lang: Option<String>,
    pub pretty: bool,
    pub out: Option<PathBuf>,
    pub consume: bool,
}

pub async fn run(args: ExtractArgs<'_>) -> Result<()> {
    let mut config = super::load_config(args.config)?;
    if let Some(lang) = args.lang {
        config.ocr_language = lang;
    }
    let pipeline = ExtractionPipeline::with_defaults(config)?;

    let filename = display_name(&args.file);
    let request = if args.consume {
        ExtractionRequest::from_path(&args.file, filename)
    } else {
        ExtractionRequest::borrowed(&args.file, filename)
    };
    info!(request_id = %request.id(), file = %args.file.display(), "Extracting");

    let result = pipeline.extract(request).await?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };

    match args.out {
        Some(path) => {
            std::fs::write(&path, json)?;
            eprintln!(
                "Extracted {} character(s) and {} table(s), written to {}",
                result.text().chars().count(),
                result.tables().len(),
                path.display()
            );
            if let Some(message) = result.message() {
                eprintln!("  note: {message}");
            }
        }
        None => println!("{json}"),
    }

    Ok(())
}

/// File name for logs and the request; the full path if it has none.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_file_name() {
        assert_eq!(display_name(Path::new("/uploads/abc/invoice.pdf")), "invoice.pdf");
        assert_eq!(display_name(Path::new("/")), "/");
    }

    #[tokio::test]
    async fn missing_file_is_fatal() {
        let err = run(ExtractArgs {
            file: PathBuf::from("/nonexistent/docsift/input.pdf"),
            config: None,
            lang: None,
            pretty: false,
            out: None,
            consume: false,
        })
        .await
        .unwrap_err();
        assert!(err.is_fatal());
    }
}
