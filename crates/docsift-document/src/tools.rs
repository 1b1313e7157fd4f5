// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Thin helpers for running the external command-line backends (pdftoppm,
// pdftotext, tesseract).

use std::ffi::OsStr;
use std::io::Write;
use std::process::{Command, Output, Stdio};

use docsift_core::error::{DocsiftError, Result};
use tracing::debug;

/// Run `bin` with `args` and return its stdout on success.
pub(crate) fn run<I, S>(bin: &str, args: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(bin)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|err| spawn_error(bin, err))?;
    into_stdout(bin, output)
}

/// Run `bin` with `args`, feeding `input` on stdin, and return its stdout.
pub(crate) fn run_with_stdin<I, S>(bin: &str, args: I, input: &[u8]) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut child = Command::new(bin)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| spawn_error(bin, err))?;

    let stdin = child.stdin.take();

    // stdin is fed from its own thread while stdout and stderr drain, so a
    // tool that stops reading early cannot deadlock us or skip the wait.
    let (output, written) = std::thread::scope(|scope| {
        let writer = scope.spawn(move || match stdin {
            Some(mut stdin) => stdin.write_all(input),
            None => Ok(()),
        });
        let output = child.wait_with_output();
        let written = writer.join().unwrap_or_else(|_| {
            Err(std::io::Error::other("stdin writer thread panicked"))
        });
        (output, written)
    });
    let output = output?;

    match written {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => {
            debug!(tool = bin, "tool closed stdin before reading all input");
        }
        Err(err) if output.status.success() => return Err(err.into()),
        Err(err) => debug!(tool = bin, %err, "writing stdin failed"),
    }
    into_stdout(bin, output)
}

/// Check whether `bin` can be launched at all.
///
/// Poppler tools print their version to stderr and some exit non-zero for
/// `-v`, so any launch counts as available.
pub fn is_available(bin: &str, version_flag: &str) -> bool {
    Command::new(bin)
        .arg(version_flag)
        .stdin(Stdio::null())
        .output()
        .map(|o| o.status.success() || !o.stderr.is_empty() || !o.stdout.is_empty())
        .unwrap_or(false)
}

fn spawn_error(bin: &str, err: std::io::Error) -> DocsiftError {
    if err.kind() == std::io::ErrorKind::NotFound {
        DocsiftError::ToolNotFound(bin.to_string())
    } else {
        DocsiftError::ToolFailed {
            tool: bin.to_string(),
            code: -1,
            stderr: err.to_string(),
        }
    }
}

fn into_stdout(bin: &str, output: Output) -> Result<Vec<u8>> {
    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(DocsiftError::ToolFailed {
            tool: bin.to_string(),
            code,
            stderr,
        });
    }
    debug!(tool = bin, stdout_bytes = output.stdout.len(), "tool finished");
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_tool_not_found() {
        let err = run("docsift-no-such-tool-7f3a", ["--help"]).unwrap_err();
        assert!(matches!(err, DocsiftError::ToolNotFound(ref bin) if bin == "docsift-no-such-tool-7f3a"));
    }

    #[cfg(unix)]
    #[test]
    fn tool_exiting_before_reading_stdin_reports_its_stderr() {
        // Far more than a pipe buffer, so the write hits a closed pipe.
        let input = vec![0x5a_u8; 4 * 1024 * 1024];
        let script = "echo \"Failed loading language 'xyz'\" >&2; exit 1";

        let err = run_with_stdin("sh", ["-c", script], &input).unwrap_err();

        match err {
            DocsiftError::ToolFailed { tool, code, stderr } => {
                assert_eq!(tool, "sh");
                assert_eq!(code, 1);
                assert!(stderr.contains("Failed loading language 'xyz'"));
            }
            other => panic!("expected ToolFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn stdin_is_echoed_back_through_stdout() {
        let input = vec![b'x'; 256 * 1024];
        let stdout = run_with_stdin("cat", std::iter::empty::<&str>(), &input).unwrap();
        assert_eq!(stdout, input);
    }

    #[test]
    fn missing_binary_is_unavailable() {
        assert!(!is_available("docsift-no-such-tool-7f3a", "-v"));
    }
}
