//! Types for run reports.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the batch summary, written in the screenshot root
pub const SUMMARY_FILE_NAME: &str = "intelligent_test_summary.json";

/// How a step ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    /// The target element was not found; nothing was done
    Skipped,
    Failed,
}

/// One executed step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Index of the sequence within the strategy
    pub sequence: usize,
    /// Index of the step within the sequence
    pub step: usize,
    pub action: String,
    pub status: StepStatus,
    /// Skip reason or error message
    pub detail: Option<String>,
}

/// Report for one processed HTML file, written once when its run finishes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyReport {
    /// RFC 3339 time the report was written
    pub timestamp: String,
    pub html_file: String,
    pub strategy_used: String,
    /// FSM description embedded in the page, if any
    pub fsm_config: Option<serde_json::Value>,
    /// PNG files present in the folder
    pub total_screenshots: usize,
    /// Steps that completed or were skipped
    pub total_steps: usize,
    pub failed_steps: usize,
    pub screenshot_folder: PathBuf,
    pub steps: Vec<StepRecord>,
}

impl StrategyReport {
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)
    }

    pub fn read_from(path: &Path) -> std::io::Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Outcome of one file within a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Success,
    Failed,
}

/// Batch summary entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSummary {
    pub html_file: String,
    pub status: FileStatus,
    pub strategy_used: Option<String>,
    pub screenshots: usize,
    pub error: Option<String>,
}

/// Summary of a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub timestamp: String,
    pub html_folder: PathBuf,
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<FileSummary>,
}

impl BatchSummary {
    pub fn from_results(html_folder: &Path, results: Vec<FileSummary>) -> Self {
        let successful = results
            .iter()
            .filter(|r| r.status == FileStatus::Success)
            .count();
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            html_folder: html_folder.to_path_buf(),
            total_files: results.len(),
            successful,
            failed: results.len() - successful,
            results,
        }
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let results = vec![
            FileSummary {
                html_file: "a.html".to_string(),
                status: FileStatus::Success,
                strategy_used: Some("sort".to_string()),
                screenshots: 3,
                error: None,
            },
            FileSummary {
                html_file: "b.html".to_string(),
                status: FileStatus::Failed,
                strategy_used: None,
                screenshots: 0,
                error: Some("navigation failed".to_string()),
            },
        ];
        let summary = BatchSummary::from_results(Path::new("html"), results);
        assert_eq!(summary.total_files, 2);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn test_step_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&StepStatus::Skipped).unwrap(),
            "\"skipped\""
        );
    }
}
