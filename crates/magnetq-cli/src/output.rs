//! Run summary renderers.

use std::fmt::Write as _;

use anyhow::anyhow;
use clap::ValueEnum;

use crate::error::{CliError, CliResult};
use crate::pipeline::RunSummary;

/// Rendering of the run summary on stdout.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns.
    #[default]
    Table,
    /// Pretty-printed JSON document.
    Json,
}

/// Print `summary` to stdout in `format`.
///
/// # Errors
///
/// Returns [`CliError::Failure`] if the summary cannot be serialised.
pub fn render_summary(summary: &RunSummary, format: OutputFormat) -> CliResult<()> {
    let text = format_summary(summary, format)?;
    print!("{text}");
    Ok(())
}

pub(crate) fn format_summary(summary: &RunSummary, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(summary)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            text.push('\n');
            Ok(text)
        }
        OutputFormat::Table => Ok(format_table(summary)),
    }
}

fn format_table(summary: &RunSummary) -> String {
    let mut text = String::new();
    let _ = writeln!(
        text,
        "{} magnet link(s) found; {} job(s) submitted to {} ({}, run {})",
        summary.links_found,
        summary.jobs.len(),
        summary.save_path,
        summary.mode,
        summary.run_id
    );
    if summary.jobs.is_empty() {
        return text;
    }
    let _ = writeln!(text, "{:<40} STATUS", "HANDLE");
    for job in &summary.jobs {
        let _ = writeln!(text, "{:<40} {}", job.handle.as_str(), job.status.as_str());
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{JobOutcome, JobStatus};
    use magnetq_core::TorrentHandle;

    fn summary() -> RunSummary {
        RunSummary {
            run_id: "run-7".to_string(),
            url: "http://example.test/list".to_string(),
            save_path: "/downloads".to_string(),
            mode: "concurrent",
            links_found: 3,
            jobs: vec![
                JobOutcome {
                    handle: TorrentHandle::new("a".repeat(40)),
                    status: JobStatus::Released,
                },
                JobOutcome {
                    handle: TorrentHandle::new("b".repeat(40)),
                    status: JobStatus::Released,
                },
            ],
        }
    }

    #[test]
    fn table_lists_each_job() {
        let text = format_summary(&summary(), OutputFormat::Table).expect("table renders");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "3 magnet link(s) found; 2 job(s) submitted to /downloads (concurrent, run run-7)");
        assert!(lines[1].starts_with("HANDLE"));
        assert_eq!(lines.len(), 4);
        assert!(lines[2].ends_with(" released"));
    }

    #[test]
    fn json_uses_snake_case_statuses() {
        let text = format_summary(&summary(), OutputFormat::Json).expect("json renders");
        let value: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(value["jobs"][0]["status"], "released");
        assert_eq!(value["jobs"][1]["handle"], "b".repeat(40));
        assert_eq!(value["links_found"], 3);
        assert_eq!(value["run_id"], "run-7");
    }

    #[test]
    fn empty_batch_prints_only_the_headline() {
        let mut empty = summary();
        empty.jobs.clear();
        empty.links_found = 0;
        let text = format_summary(&empty, OutputFormat::Table).expect("table renders");
        assert_eq!(text.lines().count(), 1);
    }
}
