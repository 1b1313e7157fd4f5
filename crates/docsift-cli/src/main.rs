// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docsift — PDF text and table extraction.
//
// Entry point. Initialises logging on stderr, parses the command line, and
// dispatches to a subcommand. Stdout carries only command output.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "docsift",
    version,
    about = "Extract text and tables from PDFs, with OCR and table reconstruction fallbacks"
)]
struct Cli {
    /// JSON configuration file (missing keys keep their defaults)
    #[arg(short, long, global = true, value_name = "JSON")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text and tables from one PDF and print the result as JSON
    Extract {
        /// Path to the PDF
        file: PathBuf,

        /// OCR language code, e.g. "eng" or "deu"
        #[arg(short, long, value_name = "CODE")]
        lang: Option<String>,

        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,

        /// Write the JSON result to a file instead of stdout
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Treat the file as an upload owned by this run and delete it afterwards
        #[arg(long)]
        consume: bool,
    },
    /// Report which external tools are reachable
    Doctor,
    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Extract {
            file,
            lang,
            pretty,
            out,
            consume,
        } => {
            commands::extract::run(commands::extract::ExtractArgs {
                file,
                config: config_path,
                lang,
                pretty,
                out,
                consume,
            })
            .await
        }
        Commands::Doctor => commands::doctor::run(config_path),
        Commands::Config => commands::config::run(config_path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is_fatal() => {
            eprintln!("{}", commands::error_payload(&err));
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
