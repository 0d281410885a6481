//! Headless Chromium driver over the DevTools protocol.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, DialogType, EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::types::{BrowserSession, Dialog, DialogKind, DialogStream, DriverError, DriverResult, PageDriver};

/// Launch settings for Chromium
#[derive(Debug, Clone)]
pub struct ChromeConfig {
    /// Run without a visible window
    pub headless: bool,
    /// Explicit browser executable (auto-detected when `None`)
    pub executable: Option<PathBuf>,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            viewport_width: 1280,
            viewport_height: 720,
        }
    }
}

/// A running Chromium instance
pub struct ChromeSession {
    browser: Mutex<Browser>,
    event_loop: JoinHandle<()>,
}

impl ChromeSession {
    /// Start the browser and its CDP event loop
    pub async fn launch(config: &ChromeConfig) -> DriverResult<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .viewport(Some(Viewport {
                width: config.viewport_width,
                height: config.viewport_height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: true,
                has_touch: false,
            }))
            // file:// demos load sibling scripts
            .arg("--allow-file-access-from-files");
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.executable {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder.build().map_err(DriverError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        let event_loop = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "chromium handler event error");
                }
            }
        });

        Ok(Self {
            browser: Mutex::new(browser),
            event_loop,
        })
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn open_page(&self) -> DriverResult<Arc<dyn PageDriver>> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(protocol)?;
        Ok(Arc::new(ChromePage { page }))
    }

    async fn shutdown(&self) -> DriverResult<()> {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            warn!(error = %e, "failed to close browser cleanly");
        }
        let _ = browser.wait().await;
        self.event_loop.abort();
        Ok(())
    }
}

/// One Chromium tab
pub struct ChromePage {
    page: Page,
}

fn protocol(err: chromiumoxide::error::CdpError) -> DriverError {
    DriverError::Protocol(err.to_string())
}

/// JSON-quote a selector for embedding in a script
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn visibility_script(selector: &str) -> String {
    format!(
        r#"(() => {{
    const el = document.querySelector({sel});
    if (!el) return false;
    const style = window.getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden') return false;
    const rect = el.getBoundingClientRect();
    return rect.width > 0 || rect.height > 0;
}})()"#,
        sel = js_string(selector)
    )
}

fn fill_script(selector: &str, value: &str) -> String {
    format!(
        r#"(() => {{
    const el = document.querySelector({sel});
    if (!el) return false;
    el.focus();
    el.value = {val};
    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return true;
}})()"#,
        sel = js_string(selector),
        val = js_string(value)
    )
}

impl From<DialogType> for DialogKind {
    fn from(kind: DialogType) -> Self {
        match kind {
            DialogType::Alert => DialogKind::Alert,
            DialogType::Confirm => DialogKind::Confirm,
            DialogType::Prompt => DialogKind::Prompt,
            DialogType::Beforeunload => DialogKind::BeforeUnload,
        }
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| DriverError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> DriverResult<bool> {
        self.page
            .evaluate(visibility_script(selector))
            .await
            .map_err(protocol)?
            .into_value::<bool>()
            .map_err(|e| DriverError::Protocol(e.to_string()))
    }

    async fn fill(&self, selector: &str, value: &str) -> DriverResult<()> {
        let filled = self
            .page
            .evaluate(fill_script(selector, value))
            .await
            .map_err(protocol)?
            .into_value::<bool>()
            .map_err(|e| DriverError::Protocol(e.to_string()))?;
        if !filled {
            return Err(DriverError::ElementNotFound(selector.to_string()));
        }
        Ok(())
    }

    async fn click(&self, selector: &str) -> DriverResult<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| DriverError::ElementNotFound(selector.to_string()))?;
        element.click().await.map_err(protocol)?;
        Ok(())
    }

    async fn screenshot(&self) -> DriverResult<Vec<u8>> {
        self.page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
            )
            .await
            .map_err(protocol)
    }

    async fn dialogs(&self) -> DriverResult<DialogStream> {
        let events = self
            .page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(protocol)?;
        Ok(events
            .map(|event| Dialog {
                kind: event.r#type.clone().into(),
                message: event.message.clone(),
                default_prompt: event.default_prompt.clone(),
            })
            .boxed())
    }

    async fn accept_dialog(&self, dialog: &Dialog) -> DriverResult<()> {
        let params = HandleJavaScriptDialogParams {
            accept: true,
            prompt_text: dialog.default_prompt.clone(),
        };
        self.page.execute(params).await.map_err(protocol)?;
        Ok(())
    }

    async fn close(&self) -> DriverResult<()> {
        self.page.clone().close().await.map_err(protocol)
    }

    fn source_type(&self) -> &str {
        "chrome"
    }
}
