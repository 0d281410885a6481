//! Configuration management with environment variable support.
//!
//! Runtime settings (paths, browser launch options) come from the environment
//! with sensible defaults; the strategy document itself is loaded separately by
//! `strategy::load_strategies` and passed around explicitly.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DEMO_PROBER_HTML_DIR` | Folder of target `*.html` files | `./html` |
//! | `DEMO_PROBER_STRATEGY_FILE` | Strategy JSON document | `./test_strategies.json` |
//! | `DEMO_PROBER_SCREENSHOT_DIR` | Root of screenshot folders and reports | `./screenshots` |
//! | `TARGET_HTML_FILE` | Run only this file | unset |
//! | `DEMO_PROBER_HEADLESS` | Run the browser headless | `true` |
//! | `DEMO_PROBER_CHROME_PATH` | Chromium executable | auto-detect |
//! | `DEMO_PROBER_VIEWPORT` | Viewport as `WxH` | `1280x720` |
//! | `DEMO_PROBER_DIALOG_SCREENSHOT_TIMEOUT` | Dialog capture timeout (ms) | `2000` |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::driver::ChromeConfig;
use crate::runner::RunOptions;

// ============================================================================
// Default Values
// ============================================================================

pub const DEFAULT_HTML_DIR: &str = "./html";

pub const DEFAULT_STRATEGY_FILE: &str = "./test_strategies.json";

pub const DEFAULT_SCREENSHOT_DIR: &str = "./screenshots";

pub const DEFAULT_HEADLESS: bool = true;

pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;

pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 720;

/// Dialog capture timeout (milliseconds)
pub const DEFAULT_DIALOG_SCREENSHOT_TIMEOUT: u64 = 2000;

// ============================================================================
// Environment Variable Names
// ============================================================================

pub const ENV_HTML_DIR: &str = "DEMO_PROBER_HTML_DIR";

pub const ENV_STRATEGY_FILE: &str = "DEMO_PROBER_STRATEGY_FILE";

pub const ENV_SCREENSHOT_DIR: &str = "DEMO_PROBER_SCREENSHOT_DIR";

/// Single-file focus, kept unprefixed for compatibility with existing scripts
pub const ENV_TARGET_HTML_FILE: &str = "TARGET_HTML_FILE";

pub const ENV_HEADLESS: &str = "DEMO_PROBER_HEADLESS";

pub const ENV_CHROME_PATH: &str = "DEMO_PROBER_CHROME_PATH";

pub const ENV_VIEWPORT: &str = "DEMO_PROBER_VIEWPORT";

pub const ENV_DIALOG_SCREENSHOT_TIMEOUT: &str = "DEMO_PROBER_DIALOG_SCREENSHOT_TIMEOUT";

/// Centralized configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub paths: PathSettings,
    pub browser: BrowserSettings,
    /// File to run instead of the whole folder
    pub target_html_file: Option<String>,
}

/// Input and output locations
#[derive(Debug, Clone, PartialEq)]
pub struct PathSettings {
    pub html_dir: PathBuf,
    pub strategy_file: PathBuf,
    pub screenshot_dir: PathBuf,
}

/// Browser launch settings
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserSettings {
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Milliseconds
    pub dialog_screenshot_timeout: u64,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            paths: PathSettings::from_env(),
            browser: BrowserSettings::from_env(),
            target_html_file: env::var(ENV_TARGET_HTML_FILE)
                .ok()
                .filter(|s| !s.trim().is_empty()),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            paths: PathSettings::defaults(),
            browser: BrowserSettings::defaults(),
            target_html_file: None,
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            html_dir: self.paths.html_dir.clone(),
            screenshot_root: self.paths.screenshot_dir.clone(),
            dialog_screenshot_timeout: Duration::from_millis(self.browser.dialog_screenshot_timeout),
        }
    }

    pub fn chrome(&self) -> ChromeConfig {
        ChromeConfig {
            headless: self.browser.headless,
            executable: self.browser.chrome_path.clone(),
            viewport_width: self.browser.viewport_width,
            viewport_height: self.browser.viewport_height,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl PathSettings {
    pub fn from_env() -> Self {
        Self {
            html_dir: env::var(ENV_HTML_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_HTML_DIR)),
            strategy_file: env::var(ENV_STRATEGY_FILE)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STRATEGY_FILE)),
            screenshot_dir: env::var(ENV_SCREENSHOT_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SCREENSHOT_DIR)),
        }
    }

    pub fn defaults() -> Self {
        Self {
            html_dir: PathBuf::from(DEFAULT_HTML_DIR),
            strategy_file: PathBuf::from(DEFAULT_STRATEGY_FILE),
            screenshot_dir: PathBuf::from(DEFAULT_SCREENSHOT_DIR),
        }
    }
}

impl BrowserSettings {
    pub fn from_env() -> Self {
        let (viewport_width, viewport_height) = env::var(ENV_VIEWPORT)
            .ok()
            .and_then(|s| parse_viewport(&s))
            .unwrap_or((DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT));
        Self {
            headless: env::var(ENV_HEADLESS)
                .ok()
                .and_then(|s| parse_bool(&s))
                .unwrap_or(DEFAULT_HEADLESS),
            chrome_path: env::var(ENV_CHROME_PATH).ok().map(PathBuf::from),
            viewport_width,
            viewport_height,
            dialog_screenshot_timeout: env::var(ENV_DIALOG_SCREENSHOT_TIMEOUT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DIALOG_SCREENSHOT_TIMEOUT),
        }
    }

    pub fn defaults() -> Self {
        Self {
            headless: DEFAULT_HEADLESS,
            chrome_path: None,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            dialog_screenshot_timeout: DEFAULT_DIALOG_SCREENSHOT_TIMEOUT,
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse a viewport string `WxH` into (width, height)
pub fn parse_viewport(size: &str) -> Option<(u32, u32)> {
    let lower = size.trim().to_lowercase();
    let (w, h) = lower.split_once('x')?;
    let w: u32 = w.parse().ok()?;
    let h: u32 = h.parse().ok()?;
    if w == 0 || h == 0 {
        return None;
    }
    Some((w, h))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_viewport() {
        assert_eq!(parse_viewport("1280x720"), Some((1280, 720)));
        assert_eq!(parse_viewport("800X600"), Some((800, 600)));
        assert_eq!(parse_viewport("0x600"), None);
        assert_eq!(parse_viewport("wide"), None);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::defaults();
        assert_eq!(config.paths.html_dir, PathBuf::from(DEFAULT_HTML_DIR));
        assert_eq!(config.paths.strategy_file, PathBuf::from(DEFAULT_STRATEGY_FILE));
        assert!(config.browser.headless);
        assert_eq!(config.target_html_file, None);

        let chrome = config.chrome();
        assert_eq!((chrome.viewport_width, chrome.viewport_height), (1280, 720));
        assert_eq!(
            config.run_options().dialog_screenshot_timeout,
            Duration::from_millis(DEFAULT_DIALOG_SCREENSHOT_TIMEOUT)
        );
    }
}
