use std::fs;
use std::path::{Path, PathBuf};

use cellwise_protocol::ReportData;
use chrono::{DateTime, Local};
use tracing::debug;

use crate::inference::InferenceError;

const TITLE: &str = "Battery Health AI Diagnostics";
const RULE_WIDTH: usize = 60;

/// Turns assembled report data into a document on disk.
pub trait ReportRenderer {
    fn render(&self, data: &ReportData) -> Result<PathBuf, InferenceError>;
}

/// Plain-text report written to a single fixed path, replaced on each run.
pub struct TextReportRenderer {
    path: PathBuf,
}

impl TextReportRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportRenderer for TextReportRenderer {
    fn render(&self, data: &ReportData) -> Result<PathBuf, InferenceError> {
        data.validate()?;

        let unavailable = |e: std::io::Error| {
            InferenceError::RenderingUnavailable(format!("{}: {}", self.path.display(), e))
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(unavailable)?;
        }
        fs::write(&self.path, format_report(data, Local::now())).map_err(unavailable)?;

        debug!(path = %self.path.display(), "Report rendered");
        Ok(self.path.clone())
    }
}

pub fn format_report(data: &ReportData, generated: DateTime<Local>) -> String {
    let inputs = &data.inputs;
    let results = &data.results;
    let heading = |title: &str| format!("{}\n{}", title, "-".repeat(RULE_WIDTH));

    let sections = [
        format!("{:^width$}", TITLE, width = RULE_WIDTH),
        "=".repeat(RULE_WIDTH),
        format!(
            "{:>width$}",
            format!("Generated: {}", generated.format("%Y-%m-%d %H:%M")),
            width = RULE_WIDTH
        ),
        String::new(),
        heading("Input Parameters"),
        format!(
            "{:<30}Current: {} A",
            format!("Voltage: {} V", inputs.voltage),
            inputs.current
        ),
        format!(
            "{:<30}Cycles: {}",
            format!("Temp: {} C", inputs.temperature),
            inputs.cycle
        ),
        String::new(),
        heading("AI Analysis Results"),
        format!("Health Condition: {}", results.condition),
        format!("Health Score: {}%", results.health_score),
        format!("Remaining Useful Life (RUL): {} cycles", results.rul),
        format!("Estimated Repair Cost: ${}", results.cost),
        String::new(),
        format!("Recommendation: {}", results.recommendation),
    ];

    let mut out = sections.join("\n");
    out.push('\n');
    out
}

/// Contents of the last rendered report.
pub fn read_report(path: &Path) -> Result<String, InferenceError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => InferenceError::RenderingUnavailable(
            "Report file not found. Please run the analysis again.".to_string(),
        ),
        _ => InferenceError::RenderingUnavailable(format!("{}: {}", path.display(), e)),
    })
}
