//! Run orchestration: one file at a time, one page per file.
//!
//! Per file the run moves forward through `Idle -> Navigated ->
//! SequenceRunning(n)... -> Finalized` and never goes back. Reaching
//! `Finalized` writes the report, even after failed steps.

use futures::StreamExt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::driver::{BrowserSession, DriverError, PageDriver};
use crate::executor::{ErrorPolicy, StepContext, run_sequence};
use crate::fsm::extract_fsm;
use crate::locator::SelectorTable;
use crate::report::{
    BatchSummary, FileStatus, FileSummary, SUMMARY_FILE_NAME, StepStatus, StrategyReport,
};
use crate::session::{ScreenshotSession, SessionError, unique_folder_ids};
use crate::strategy::{StrategyConfig, detect_application_type};

/// Error types for a file run
#[derive(Debug, Error)]
pub enum RunError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("cannot build a file URL for {}", .0.display())]
    FileUrl(PathBuf),

    #[error("cannot write report: {0}")]
    Report(std::io::Error),
}

/// Result type for runs
pub type RunResult<T> = Result<T, RunError>;

/// Where a file run is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Navigated,
    SequenceRunning(usize),
    Finalized,
}

/// Paths and timeouts for a run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Folder holding the target `*.html` files
    pub html_dir: PathBuf,
    /// Root of the per-file screenshot folders
    pub screenshot_root: PathBuf,
    /// Upper bound for the screenshot taken while a dialog is open
    pub dialog_screenshot_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            html_dir: PathBuf::from(crate::config::DEFAULT_HTML_DIR),
            screenshot_root: PathBuf::from(crate::config::DEFAULT_SCREENSHOT_DIR),
            dialog_screenshot_timeout: Duration::from_millis(
                crate::config::DEFAULT_DIALOG_SCREENSHOT_TIMEOUT,
            ),
        }
    }
}

/// Absolute `file://` URL for a local file
pub fn html_file_url(path: &Path) -> RunResult<String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| RunError::Read {
                path: path.to_path_buf(),
                source,
            })?
            .join(path)
    };
    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|()| RunError::FileUrl(absolute))
}

/// List the `*.html` files of a folder, sorted by name
pub fn list_html_files(dir: &Path) -> RunResult<Vec<String>> {
    let read = |source| RunError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read)? {
        let path = entry.map_err(read)?.path();
        let is_html = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("html"))
            .unwrap_or(false);
        if is_html && path.is_file() {
            if let Some(name) = path.file_name() {
                files.push(name.to_string_lossy().to_string());
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Auto-accept every dialog the page raises, capturing it first
fn spawn_dialog_handler(
    page: Arc<dyn PageDriver>,
    mut dialogs: crate::driver::DialogStream,
    session: ScreenshotSession,
    shot_timeout: Duration,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut handled = 0;
        while let Some(dialog) = dialogs.next().await {
            info!(kind = %dialog.kind, message = %dialog.message, "dialog opened");
            match tokio::time::timeout(shot_timeout, page.screenshot()).await {
                Ok(Ok(png)) => {
                    let name = format!("alert_{}", dialog.kind);
                    if let Err(e) = session.save(&name, &png) {
                        warn!(error = %e, "failed to save dialog screenshot");
                    }
                }
                Ok(Err(e)) => warn!(error = %e, "dialog screenshot failed"),
                Err(_) => warn!("dialog screenshot timed out"),
            }
            if let Err(e) = page.accept_dialog(&dialog).await {
                warn!(error = %e, "failed to accept dialog");
            }
            handled += 1;
        }
        handled
    })
}

struct PhaseTracker {
    file: String,
    phase: Phase,
}

impl PhaseTracker {
    fn advance(&mut self, next: Phase) {
        debug!(file = %self.file, from = ?self.phase, to = ?next, "phase");
        self.phase = next;
    }
}

/// Run the detected strategy against one HTML file and write its report
pub async fn run_file(
    browser: &dyn BrowserSession,
    config: &StrategyConfig,
    options: &RunOptions,
    html_file: &str,
) -> RunResult<StrategyReport> {
    let session = ScreenshotSession::for_file(&options.screenshot_root, html_file);
    run_file_in(browser, config, options, html_file, session).await
}

async fn run_file_in(
    browser: &dyn BrowserSession,
    config: &StrategyConfig,
    options: &RunOptions,
    html_file: &str,
    session: ScreenshotSession,
) -> RunResult<StrategyReport> {
    let html_path = options.html_dir.join(html_file);
    let content = fs::read_to_string(&html_path).map_err(|source| RunError::Read {
        path: html_path.clone(),
        source,
    })?;
    let url = html_file_url(&html_path)?;

    let strategy_name = detect_application_type(config, html_file, Some(&content));
    let strategy = config.strategy_or_fallback(&strategy_name);
    info!(file = %html_file, strategy = %strategy_name, "selected strategy");

    let fsm_config = extract_fsm(&content);
    if let Some(fsm) = &fsm_config {
        info!(file = %html_file, fsm = %fsm, "page embeds an FSM description");
    }

    let selectors = SelectorTable::with_overrides(&config.element_selectors);
    let settings = &config.test_config;
    let policy = ErrorPolicy::from_settings(settings);

    session.reset()?;

    let mut tracker = PhaseTracker {
        file: html_file.to_string(),
        phase: Phase::Idle,
    };

    let page = browser.open_page().await?;
    let dialogs = match page.dialogs().await {
        Ok(dialogs) => dialogs,
        Err(e) => {
            let _ = page.close().await;
            return Err(e.into());
        }
    };
    let handler = spawn_dialog_handler(
        page.clone(),
        dialogs,
        session.clone(),
        options.dialog_screenshot_timeout,
    );

    info!(url = %url, "navigating");
    if let Err(e) = page.navigate(&url).await {
        handler.abort();
        let _ = page.close().await;
        return Err(e.into());
    }
    if settings.page_load_wait_ms > 0 {
        tokio::time::sleep(Duration::from_millis(settings.page_load_wait_ms)).await;
    }
    tracker.advance(Phase::Navigated);

    let ctx = StepContext {
        page: page.as_ref(),
        selectors: &selectors,
        session: &session,
        settings,
    };

    let mut records = Vec::new();
    if let Err(e) = ctx.capture("initial").await {
        warn!(error = %e, "initial screenshot failed");
    }

    for (index, sequence) in strategy.test_sequences.iter().enumerate() {
        tracker.advance(Phase::SequenceRunning(index));
        let run = run_sequence(&ctx, index, sequence, policy).await;
        if run.halted {
            debug!(file = %html_file, sequence = index, "sequence aborted, moving on");
        }
        records.extend(run.records);
    }

    if let Err(e) = ctx.capture("final").await {
        warn!(error = %e, "final screenshot failed");
    }

    if let Err(e) = page.close().await {
        warn!(error = %e, "failed to close page");
    }
    handler.abort();
    // No dialog screenshot may land after the PNGs are counted
    let _ = handler.await;

    tracker.advance(Phase::Finalized);
    let failed_steps = records
        .iter()
        .filter(|r| r.status == StepStatus::Failed)
        .count();
    let report = StrategyReport {
        timestamp: chrono::Utc::now().to_rfc3339(),
        html_file: html_file.to_string(),
        strategy_used: strategy_name,
        fsm_config,
        total_screenshots: session.list_captures()?.len(),
        total_steps: records.len() - failed_steps,
        failed_steps,
        screenshot_folder: session.dir.clone(),
        steps: records,
    };
    report
        .write_to(&session.report_path())
        .map_err(RunError::Report)?;
    info!(
        file = %html_file,
        screenshots = report.total_screenshots,
        steps = report.total_steps,
        failed = report.failed_steps,
        "run finished"
    );
    Ok(report)
}

/// Process every target file in sequence and write the batch summary.
///
/// With `target` set only that file is processed.
pub async fn run_batch(
    browser: &dyn BrowserSession,
    config: &StrategyConfig,
    options: &RunOptions,
    target: Option<&str>,
) -> RunResult<BatchSummary> {
    let files = match target {
        Some(file) => vec![file.to_string()],
        None => list_html_files(&options.html_dir)?,
    };
    info!(count = files.len(), dir = %options.html_dir.display(), "starting batch");

    let folders = unique_folder_ids(&files);
    let mut results = Vec::with_capacity(files.len());
    for (file, folder) in files.iter().zip(&folders) {
        let session = ScreenshotSession::with_id(&options.screenshot_root, folder);
        let summary = match run_file_in(browser, config, options, file, session).await {
            Ok(report) => FileSummary {
                html_file: file.clone(),
                status: FileStatus::Success,
                strategy_used: Some(report.strategy_used),
                screenshots: report.total_screenshots,
                error: None,
            },
            Err(e) => {
                error!(file = %file, error = %e, "file run failed");
                FileSummary {
                    html_file: file.clone(),
                    status: FileStatus::Failed,
                    strategy_used: None,
                    screenshots: 0,
                    error: Some(e.to_string()),
                }
            }
        };
        results.push(summary);
    }

    let summary = BatchSummary::from_results(&options.html_dir, results);
    fs::create_dir_all(&options.screenshot_root).map_err(|source| RunError::Read {
        path: options.screenshot_root.clone(),
        source,
    })?;
    summary
        .write_to(&options.screenshot_root.join(SUMMARY_FILE_NAME))
        .map_err(RunError::Report)?;
    info!(
        total = summary.total_files,
        successful = summary.successful,
        failed = summary.failed,
        "batch finished"
    );
    Ok(summary)
}
