//! Human-readable run output.

use std::io::{self, Write};

use jflint_kernel::{FileReport, RunReport};
use owo_colors::OwoColorize;

/// Write per-file results and a summary.
///
/// Failures are always shown with their diagnostic indented below the path.
/// Passing files only show up when `verbose` is set.
pub fn write_report(
    out: &mut impl Write,
    report: &RunReport,
    verbose: bool,
    color: bool,
) -> io::Result<()> {
    for file in &report.files {
        match file.outcome.diagnostic() {
            Some(diagnostic) => write_failure(out, file, diagnostic, color)?,
            None if verbose => {
                let tag = "ok  ";
                if color {
                    writeln!(out, "{} {}", tag.green(), file.path.display())?;
                } else {
                    writeln!(out, "{} {}", tag, file.path.display())?;
                }
            }
            None => {}
        }
    }

    let failed = report.failures().count();
    if failed > 0 {
        let total = report.files.len();
        let summary = format!("{failed} of {total} Jenkinsfile(s) failed validation");
        if color {
            writeln!(out, "{}", summary.red().bold())?;
        } else {
            writeln!(out, "{summary}")?;
        }
    } else if verbose && !report.files.is_empty() {
        writeln!(out, "{} Jenkinsfile(s) passed", report.passed())?;
    }
    Ok(())
}

fn write_failure(
    out: &mut impl Write,
    file: &FileReport,
    diagnostic: &str,
    color: bool,
) -> io::Result<()> {
    if color {
        writeln!(out, "{} {}", "FAIL".red().bold(), file.path.display())?;
    } else {
        writeln!(out, "FAIL {}", file.path.display())?;
    }
    for line in diagnostic.lines() {
        writeln!(out, "    {line}")?;
    }
    Ok(())
}

/// Write a run-fatal error.
pub fn write_error(
    err: &mut impl Write,
    message: &dyn std::fmt::Display,
    color: bool,
) -> io::Result<()> {
    if color {
        writeln!(err, "{} {message}", "error:".red().bold())
    } else {
        writeln!(err, "error: {message}")
    }
}
