//! Step execution against a live page.
//!
//! `execute_step` runs one step and returns a `Result`; `run_sequence` applies
//! the `ErrorPolicy` to decide whether the remaining steps still run.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::driver::{DriverError, PageDriver};
use crate::locator::{SelectorTable, find_element};
use crate::report::{StepRecord, StepStatus};
use crate::session::{ScreenshotSession, SessionError, expand_name_template};
use crate::strategy::{Literal, Sequence, Step, TestSettings};

/// Default name template for per-value screenshots in an input sequence
const DEFAULT_SEQUENCE_SHOT: &str = "{index}_{value}";

/// Error types for step execution
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// What a failed step means for the rest of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Log and carry on with the next step
    Continue,
    /// Abort the rest of the current sequence
    Halt,
}

impl ErrorPolicy {
    pub fn from_settings(settings: &TestSettings) -> Self {
        if settings.continue_on_interaction_error {
            ErrorPolicy::Continue
        } else {
            ErrorPolicy::Halt
        }
    }
}

/// How a step that did not fail ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed { screenshots: Vec<PathBuf> },
    Skipped { reason: String },
}

/// Everything a step needs
pub struct StepContext<'a> {
    pub page: &'a dyn PageDriver,
    pub selectors: &'a SelectorTable,
    pub session: &'a ScreenshotSession,
    pub settings: &'a TestSettings,
}

impl StepContext<'_> {
    /// Capture the page under the next numbered name
    pub async fn capture(&self, name: &str) -> Result<PathBuf, StepError> {
        let png = self.page.screenshot().await?;
        let path = self.session.save(name, &png)?;
        info!(path = %path.display(), "captured screenshot");
        Ok(path)
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), StepError> {
        self.page.fill(selector, value).await?;
        settle(self.settings.wait_after_input_ms).await;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), StepError> {
        self.page.click(selector).await?;
        settle(self.settings.wait_after_click_ms).await;
        Ok(())
    }
}

async fn settle(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

fn not_found(role: &str) -> StepOutcome {
    warn!(role, "element not found, skipping step");
    StepOutcome::Skipped {
        reason: format!("no visible element for '{}'", role),
    }
}

/// Execute one step
pub async fn execute_step(ctx: &StepContext<'_>, step: &Step) -> Result<StepOutcome, StepError> {
    match step {
        Step::Input { target, value } => {
            let Some(selector) = find_element(ctx.page, ctx.selectors, target).await else {
                return Ok(not_found(target));
            };
            info!(target = %target, selector = %selector, value = %value, "input");
            ctx.fill(&selector, &value.to_string()).await?;
            Ok(StepOutcome::Completed {
                screenshots: Vec::new(),
            })
        }

        Step::Click { target } => {
            let Some(selector) = find_element(ctx.page, ctx.selectors, target).await else {
                return Ok(not_found(target));
            };
            info!(target = %target, selector = %selector, "click");
            ctx.click(&selector).await?;
            Ok(StepOutcome::Completed {
                screenshots: Vec::new(),
            })
        }

        Step::Screenshot { name } => {
            let path = ctx.capture(name).await?;
            Ok(StepOutcome::Completed {
                screenshots: vec![path],
            })
        }

        Step::InputSequence {
            target,
            values,
            click_after_each,
            screenshot_each,
            screenshot_name,
        } => {
            let Some(input) = find_element(ctx.page, ctx.selectors, target).await else {
                return Ok(not_found(target));
            };
            let button = match click_after_each {
                Some(role) => {
                    let found = find_element(ctx.page, ctx.selectors, role).await;
                    if found.is_none() {
                        warn!(role = %role, "click_after_each element not found, filling only");
                    }
                    found
                }
                None => None,
            };
            let template = screenshot_name.as_deref().unwrap_or(DEFAULT_SEQUENCE_SHOT);

            let mut screenshots = Vec::new();
            for (index, value) in values.iter().enumerate() {
                run_sequence_value(ctx, &input, button.as_deref(), value).await?;
                if *screenshot_each {
                    let name = expand_name_template(template, &value.to_string(), index);
                    screenshots.push(ctx.capture(&name).await?);
                }
            }
            Ok(StepOutcome::Completed { screenshots })
        }

        Step::HandleAlert { screenshot_name } => {
            // Dialogs are accepted by the run-wide handler
            let screenshots = match screenshot_name {
                Some(name) => vec![ctx.capture(name).await?],
                None => Vec::new(),
            };
            Ok(StepOutcome::Completed { screenshots })
        }
    }
}

async fn run_sequence_value(
    ctx: &StepContext<'_>,
    input: &str,
    button: Option<&str>,
    value: &Literal,
) -> Result<(), StepError> {
    let text = value.to_string();
    info!(selector = %input, value = %text, "sequence input");
    ctx.fill(input, &text).await?;
    if let Some(button) = button {
        ctx.click(button).await?;
    }
    Ok(())
}

/// Result of running one sequence
#[derive(Debug, Default)]
pub struct SequenceRun {
    pub records: Vec<StepRecord>,
    /// Set when a failure under `ErrorPolicy::Halt` aborted the sequence
    pub halted: bool,
}

/// Run every step of a sequence, applying the error policy to failures
pub async fn run_sequence(
    ctx: &StepContext<'_>,
    sequence_index: usize,
    sequence: &Sequence,
    policy: ErrorPolicy,
) -> SequenceRun {
    let mut run = SequenceRun::default();
    info!(
        sequence = sequence_index,
        description = %sequence.description,
        steps = sequence.steps.len(),
        "running sequence"
    );

    for (step_index, step) in sequence.steps.iter().enumerate() {
        let (status, detail) = match execute_step(ctx, step).await {
            Ok(StepOutcome::Completed { .. }) => (StepStatus::Completed, None),
            Ok(StepOutcome::Skipped { reason }) => (StepStatus::Skipped, Some(reason)),
            Err(e) => {
                warn!(
                    sequence = sequence_index,
                    step = step_index,
                    action = step.action(),
                    error = %e,
                    "step failed"
                );
                if ctx.settings.screenshot_on_error {
                    let name = format!("error_{}_{}", sequence_index, step_index);
                    if let Err(shot) = ctx.capture(&name).await {
                        warn!(error = %shot, "error screenshot failed");
                    }
                }
                (StepStatus::Failed, Some(e.to_string()))
            }
        };

        let failed = status == StepStatus::Failed;
        run.records.push(StepRecord {
            sequence: sequence_index,
            step: step_index,
            action: step.action().to_string(),
            status,
            detail,
        });

        if failed && policy == ErrorPolicy::Halt {
            warn!(sequence = sequence_index, step = step_index, "aborting sequence after failed step");
            run.halted = true;
            break;
        }
    }
    run
}
