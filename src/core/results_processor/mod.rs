#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::history_recorder::RunRecord;
use crate::core::types::FlowKind;
use crate::utils::serialization::{JsonSerializer, Serializer};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Turns run records and listings into text or JSON for stdout.
pub struct ResultsProcessor {
    serializer: JsonSerializer,
}

impl Default for ResultsProcessor {
    fn default() -> Self {
        ResultsProcessor::new(JsonSerializer::pretty())
    }
}

#[derive(Serialize)]
struct FlowListing {
    name: &'static str,
    title: &'static str,
    description: &'static str,
}

impl ResultsProcessor {
    pub fn new(serializer: JsonSerializer) -> Self {
        ResultsProcessor { serializer }
    }

    fn json<T: Serialize>(&self, data: &T) -> Result<String, AppError> {
        let bytes = self.serializer.serialize(data)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn render_run(&self, run: &RunRecord, format: OutputFormat) -> Result<String, AppError> {
        match format {
            OutputFormat::Json => self.json(run),
            OutputFormat::Text => Ok(build_run_report(run)),
        }
    }

    pub fn render_history(
        &self,
        runs: &[RunRecord],
        format: OutputFormat,
    ) -> Result<String, AppError> {
        match format {
            OutputFormat::Json => self.json(&runs),
            OutputFormat::Text if runs.is_empty() => Ok("No runs recorded.\n".to_string()),
            OutputFormat::Text => {
                let mut report = String::new();
                for run in runs {
                    report.push_str(&format!(
                        "{}  {:<15} {:<10} {}{}\n",
                        run.started_at.format("%Y-%m-%d %H:%M:%S"),
                        run.flow.slug(),
                        run.status.to_string(),
                        run.run_id,
                        format_duration(run)
                            .map(|d| format!("  ({})", d))
                            .unwrap_or_default(),
                    ));
                }
                Ok(report)
            }
        }
    }

    pub fn render_flows(&self, format: OutputFormat) -> Result<String, AppError> {
        let flows: Vec<FlowListing> = FlowKind::ALL
            .iter()
            .map(|kind| FlowListing {
                name: kind.slug(),
                title: kind.display_name(),
                description: kind.description(),
            })
            .collect();

        match format {
            OutputFormat::Json => self.json(&flows),
            OutputFormat::Text => Ok(flows
                .iter()
                .map(|flow| format!("{:<15} {}\n", flow.name, flow.description))
                .collect()),
        }
    }
}

fn format_duration(run: &RunRecord) -> Option<String> {
    let millis = run.duration()?.num_milliseconds().max(0) as u64;
    let rounded = std::time::Duration::from_secs(millis / 1000);
    if rounded.is_zero() {
        Some(format!("{}ms", millis))
    } else {
        Some(humantime::format_duration(rounded).to_string())
    }
}

fn build_run_report(run: &RunRecord) -> String {
    let mut report = String::new();
    report.push_str(&format!("=== {} ===\n", run.flow.display_name()));
    report.push_str(&format!("Run ID: {}\n", run.run_id));
    report.push_str(&format!("Status: {}\n", run.status));
    if let Some(duration) = format_duration(run) {
        report.push_str(&format!("Duration: {}\n", duration));
    }
    if let Some(error) = &run.error {
        report.push_str(&format!("Error: {}\n", error));
    }
    if let Some(result) = &run.result {
        report.push('\n');
        write_value(&mut report, result, 0);
    }
    report
}

fn write_value(out: &mut String, value: &Value, indent: usize) {
    let pad = "  ".repeat(indent);
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if is_scalar(child) {
                    out.push_str(&format!("{}{}: {}\n", pad, key, scalar_text(child)));
                } else {
                    out.push_str(&format!("{}{}:\n", pad, key));
                    write_value(out, child, indent + 1);
                }
            }
        }
        Value::Array(items) if items.is_empty() => out.push_str(&format!("{}(none)\n", pad)),
        Value::Array(items) => {
            for item in items {
                if is_scalar(item) {
                    out.push_str(&format!("{}- {}\n", pad, scalar_text(item)));
                } else {
                    out.push_str(&format!("{}-\n", pad));
                    write_value(out, item, indent + 1);
                }
            }
        }
        scalar => out.push_str(&format!("{}{}\n", pad, scalar_text(scalar))),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
