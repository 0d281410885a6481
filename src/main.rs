use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use demo_prober::config::Config;
use demo_prober::driver::{BrowserSession, ChromeSession};
use demo_prober::locator::SelectorTable;
use demo_prober::runner::run_batch;
use demo_prober::strategy::{detect_application_type, load_strategies};

/// Demo Prober - strategy-driven browser runs over single-page HTML demos
#[derive(Parser, Debug)]
#[command(
    name = "demo-prober",
    about = "Replay scripted UI strategies against HTML demos in headless Chromium",
    after_help = "ENVIRONMENT VARIABLES:\n\
        DEMO_PROBER_HTML_DIR         Folder of target *.html files\n\
        DEMO_PROBER_STRATEGY_FILE    Strategy JSON document\n\
        DEMO_PROBER_SCREENSHOT_DIR   Root of screenshot folders and reports\n\
        TARGET_HTML_FILE             Run only this file\n\
        DEMO_PROBER_HEADLESS         Run the browser headless (true/false)\n\
        DEMO_PROBER_CHROME_PATH      Chromium executable\n\
        DEMO_PROBER_VIEWPORT         Viewport as WxH\n\
        DEMO_PROBER_DIALOG_SCREENSHOT_TIMEOUT  Dialog capture timeout in ms\n\
        RUST_LOG                     Log filter (default: info)"
)]
struct Args {
    /// Strategy JSON document
    #[arg(long, global = true, env = "DEMO_PROBER_STRATEGY_FILE")]
    strategies: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run strategies against every HTML file in the folder (or a single file)
    Run {
        /// Only run this file (name relative to the HTML folder)
        #[arg(short, long, env = "TARGET_HTML_FILE")]
        file: Option<String>,

        /// Folder holding the HTML files
        #[arg(long, env = "DEMO_PROBER_HTML_DIR")]
        html_dir: Option<PathBuf>,

        /// Root folder for screenshots and reports
        #[arg(short, long, env = "DEMO_PROBER_SCREENSHOT_DIR")]
        output: Option<PathBuf>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,

        /// Print the batch summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the strategy detected for each file (no browser)
    Detect {
        /// HTML files to classify
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List the loaded strategies
    Strategies,

    /// Print the effective element selector table
    Selectors,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(path) = args.strategies {
        config.paths.strategy_file = path;
    }
    let strategies = load_strategies(&config.paths.strategy_file);

    match args.command {
        Some(Commands::Run {
            file,
            html_dir,
            output,
            headed,
            json,
        }) => {
            if let Some(dir) = html_dir {
                config.paths.html_dir = dir;
            }
            if let Some(dir) = output {
                config.paths.screenshot_dir = dir;
            }
            if headed {
                config.browser.headless = false;
            }
            let target = file.or(config.target_html_file.clone());

            let browser = ChromeSession::launch(&config.chrome())
                .await
                .context("failed to launch Chromium")?;
            let result = run_batch(&browser, &strategies, &config.run_options(), target.as_deref()).await;
            browser.shutdown().await?;
            let summary = result?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "Run completed: {} files, {} successful, {} failed",
                    summary.total_files, summary.successful, summary.failed
                );
                for entry in &summary.results {
                    let strategy = entry.strategy_used.as_deref().unwrap_or("-");
                    match &entry.error {
                        Some(err) => println!("  {} [{}]: FAILED {}", entry.html_file, strategy, err),
                        None => println!(
                            "  {} [{}]: {} screenshots",
                            entry.html_file, strategy, entry.screenshots
                        ),
                    }
                }
                println!("\nReports: {}", config.paths.screenshot_dir.display());
            }
        }

        Some(Commands::Detect { files }) => {
            for path in files {
                let name = path
                    .file_name()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string());
                let content = std::fs::read_to_string(&path).ok();
                let detected = detect_application_type(&strategies, &name, content.as_deref());
                println!("{}\t{}", path.display(), detected);
            }
        }

        Some(Commands::Strategies) => {
            for (name, strategy) in &strategies.application_types {
                println!("{} - {}", name, strategy.description);
                if !strategy.file_patterns.is_empty() {
                    println!("  patterns: {}", strategy.file_patterns.join(", "));
                }
                if !strategy.content_keywords.is_empty() {
                    println!("  keywords: {}", strategy.content_keywords.join(", "));
                }
                let steps: usize = strategy.test_sequences.iter().map(|s| s.steps.len()).sum();
                println!(
                    "  sequences: {} ({} steps)",
                    strategy.test_sequences.len(),
                    steps
                );
            }
        }

        Some(Commands::Selectors) => {
            let table = SelectorTable::with_overrides(&strategies.element_selectors);
            for (role, selectors) in table.roles() {
                println!("{}: {}", role, selectors.join(" | "));
            }
        }

        None => {
            println!("Demo Prober - strategy-driven browser runs over HTML demos");
            println!();
            println!("Usage: demo-prober <COMMAND>");
            println!();
            println!("Commands:");
            println!("  run         Run strategies against the HTML folder (or one file)");
            println!("  detect      Print the strategy detected for each file");
            println!("  strategies  List the loaded strategies");
            println!("  selectors   Print the element selector table");
            println!();
            println!("Run with --help for more information.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use demo_prober::config::{
        ENV_CHROME_PATH, ENV_DIALOG_SCREENSHOT_TIMEOUT, ENV_HEADLESS, ENV_HTML_DIR,
        ENV_SCREENSHOT_DIR, ENV_STRATEGY_FILE, ENV_TARGET_HTML_FILE, ENV_VIEWPORT,
    };

    #[test]
    fn test_help_lists_every_environment_variable() {
        let help = Args::command().render_long_help().to_string();
        for var in [
            ENV_HTML_DIR,
            ENV_STRATEGY_FILE,
            ENV_SCREENSHOT_DIR,
            ENV_TARGET_HTML_FILE,
            ENV_HEADLESS,
            ENV_CHROME_PATH,
            ENV_VIEWPORT,
            ENV_DIALOG_SCREENSHOT_TIMEOUT,
        ] {
            assert!(help.contains(var), "help is missing {}", var);
        }
    }
}
