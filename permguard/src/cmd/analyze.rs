use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use claude_policy::report::format_summary;
use claude_policy::{AuditRequest, PolicyAuditor, Report};
use tracing::{Level, info, instrument};

use crate::cli::OutputFormat;
use crate::style;

/// Runs an audit and prints the result to `out`.
///
/// With `output`, the full report is also written there as pretty JSON.
#[instrument(level = Level::TRACE, skip(auditor, out))]
pub fn run(
    auditor: &PolicyAuditor,
    request: &AuditRequest,
    format: OutputFormat,
    output: Option<&Path>,
    mut out: impl Write,
) -> Result<Report> {
    let report = auditor
        .audit(request)
        .context("failed to analyze permission usage")?;

    if let Some(path) = output {
        write_report(&report, path)?;
        info!(path = %path.display(), "wrote JSON report");
    }

    if report.metadata.total_tool_calls == 0 {
        eprintln!(
            "{}",
            style::err_yellow(&format!(
                "no tool calls found in the last {} days",
                report.metadata.days_analyzed
            ))
        );
    }

    match format {
        OutputFormat::Summary => {
            let path = output.map(|p| p.to_string_lossy().into_owned());
            write!(out, "{}", format_summary(&report, path.as_deref()))?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &report)?;
            writeln!(out)?;
        }
    }
    Ok(report)
}

fn write_report(report: &Report, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    std::fs::write(path, json + "\n")
        .with_context(|| format!("failed to write report to {}", path.display()))
}
