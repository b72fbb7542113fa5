//! Output formatters for test results
//!
//! Provides JSON, Table, CSV and summary output formats.

use anyhow::{Context, Result};

use crate::models::{SuiteSummary, TestResult, TestStatus};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Format a single test result
    pub fn format_result(&self, result: &TestResult) -> Result<String> {
        Ok(match self.format {
            OutputFormat::Table => self.format_result_table(result),
            OutputFormat::Json => serde_json::to_string(result)?,
            OutputFormat::JsonPretty => serde_json::to_string_pretty(result)?,
            OutputFormat::Csv => csv_rows(std::slice::from_ref(result))?,
            OutputFormat::Summary => self.format_result_summary(result),
        })
    }

    fn status_label(&self, status: TestStatus) -> String {
        let label = format!("{} {}", status.symbol(), status);
        if !self.colorize {
            return label;
        }
        let color = match status {
            TestStatus::Pass => "32",
            TestStatus::Fail | TestStatus::Error => "31",
            TestStatus::Skip | TestStatus::Abandoned => "33",
        };
        format!("\x1b[{color}m{label}\x1b[0m")
    }

    fn format_result_table(&self, result: &TestResult) -> String {
        format!(
            "{:3}. {:28} {} [{:>6}ms]",
            result.index + 1,
            result.name,
            self.status_label(result.status),
            result.duration_ms
        )
    }

    fn format_result_summary(&self, result: &TestResult) -> String {
        format!(
            "{} {} ({}ms)",
            result.status.symbol(),
            result.name,
            result.duration_ms
        )
    }

    /// Format a suite run summary
    pub fn format_summary(&self, summary: &SuiteSummary) -> Result<String> {
        Ok(match self.format {
            OutputFormat::Table => self.format_summary_table(summary),
            OutputFormat::Json => serde_json::to_string(summary)?,
            OutputFormat::JsonPretty => serde_json::to_string_pretty(summary)?,
            OutputFormat::Csv => csv_rows(&summary.results)?,
            OutputFormat::Summary => self.format_summary_brief(summary),
        })
    }

    fn format_summary_table(&self, summary: &SuiteSummary) -> String {
        let mut output = String::new();

        output.push_str("\n╔══════════════════════════════════════════════════════════════╗\n");
        output.push_str(&format!(
            "  Round {:3} - {} [{}]\n",
            summary.round, summary.suite, summary.mode
        ));
        output.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        for result in &summary.results {
            output.push_str(&format!("  {}\n", self.format_result_table(result)));
            if let (false, Some(message)) = (result.status.is_success(), &result.message) {
                output.push_str(&format!("         {message}\n"));
            }
        }

        output.push_str("╠══════════════════════════════════════════════════════════════╣\n");
        output.push_str(&format!(
            "  Total: {} | Pass: {} | Fail: {} | Skip: {} | Error: {} | Abandoned: {}\n",
            summary.total,
            summary.passed,
            summary.failed,
            summary.skipped,
            summary.errors,
            summary.abandoned
        ));
        output.push_str(&format!(
            "  Pass Rate: {:5.1}% | Wall clock: {}ms | Test time: {}ms\n",
            summary.pass_rate(),
            summary.wall_clock_ms,
            summary.total_duration_ms
        ));
        if let Some(reason) = &summary.interruption {
            output.push_str(&format!("  Interrupted: {reason}\n"));
        }
        output.push_str("╚══════════════════════════════════════════════════════════════╝\n");

        output
    }

    fn format_summary_brief(&self, summary: &SuiteSummary) -> String {
        let mut line = format!(
            "{} - Round {} ({}): {}/{} passed ({:.1}%) in {}ms",
            summary.suite,
            summary.round,
            summary.mode,
            summary.passed,
            summary.total,
            summary.pass_rate(),
            summary.wall_clock_ms
        );
        if summary.interruption.is_some() {
            line.push_str(&format!(" [interrupted, {} abandoned]", summary.abandoned));
        }
        line
    }
}

fn csv_rows(results: &[TestResult]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["index", "name", "status", "duration_ms", "message"])?;
    for result in results {
        writer.write_record([
            result.index.to_string(),
            result.name.clone(),
            result.status.to_string(),
            result.duration_ms.to_string(),
            result.message.clone().unwrap_or_default(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}
