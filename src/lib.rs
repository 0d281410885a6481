//! Demo Prober - strategy-driven browser runs over single-page HTML demos.
//!
//! This crate provides:
//! - Strategy documents mapping file name patterns and page keywords to scripted UI sequences
//! - First-match-wins application-type detection
//! - Semantic element roles resolved through ordered CSS selector candidates
//! - A headless Chromium driver (and an in-memory mock page for tests)
//! - Numbered screenshot capture with per-file JSON reports and a batch summary
//!
//! # Example
//!
//! ```rust,no_run
//! use demo_prober::config::Config;
//! use demo_prober::driver::ChromeSession;
//! use demo_prober::runner::run_batch;
//! use demo_prober::strategy::load_strategies;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env();
//! let strategies = load_strategies(&config.paths.strategy_file);
//! let browser = ChromeSession::launch(&config.chrome()).await?;
//! let summary = run_batch(&browser, &strategies, &config.run_options(), None).await?;
//! println!("{} of {} files passed", summary.successful, summary.total_files);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod executor;
pub mod fsm;
pub mod locator;
pub mod report;
pub mod runner;
pub mod session;
pub mod strategy;

// Re-export runner types
pub use runner::{Phase, RunError, RunOptions, RunResult, run_batch, run_file};

// Re-export report types
pub use report::{BatchSummary, FileStatus, FileSummary, StepRecord, StepStatus, StrategyReport};

// Re-export strategy types
pub use strategy::{
    FALLBACK_STRATEGY, Sequence, Step, Strategy, StrategyConfig, TestSettings,
    detect_application_type, load_strategies,
};

// Re-export browser seam
pub use driver::{BrowserSession, ChromeSession, DriverError, MockPage, MockSession, PageDriver};

pub use executor::{ErrorPolicy, StepError, StepOutcome, execute_step};
pub use locator::{SelectorTable, find_element};
pub use session::ScreenshotSession;
