//! In-memory page for exercising strategies without a browser.
//!
//! `MockPage` keeps a set of "visible" selectors, records every interaction in
//! order, can raise a dialog when a given selector is clicked, and renders its
//! screenshots with a small framebuffer so the PNGs written by a run are real
//! images listing the most recent actions.

use async_trait::async_trait;
use font8x8::{BASIC_FONTS, UnicodeFonts};
use futures::StreamExt;
use futures::channel::mpsc;
use image::{ImageBuffer, RgbImage};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;

use super::types::{BrowserSession, Dialog, DialogKind, DialogStream, DriverError, DriverResult, PageDriver};

/// How long a click that raised a dialog waits for it to be accepted
const DIALOG_ACCEPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Interaction recorded by a `MockPage`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockAction {
    Navigate(String),
    Fill { selector: String, value: String },
    Click(String),
    Screenshot,
    DialogAccepted(String),
    DialogDismissed(String),
    Closed,
}

impl MockAction {
    fn label(&self) -> String {
        match self {
            MockAction::Navigate(url) => format!("goto {}", url),
            MockAction::Fill { selector, value } => format!("fill {} = {}", selector, value),
            MockAction::Click(selector) => format!("click {}", selector),
            MockAction::Screenshot => "screenshot".to_string(),
            MockAction::DialogAccepted(msg) => format!("accept '{}'", msg),
            MockAction::DialogDismissed(msg) => format!("dismiss '{}'", msg),
            MockAction::Closed => "close".to_string(),
        }
    }
}

/// Behaviour of a mock page
#[derive(Debug, Clone, Default)]
pub struct MockPageSpec {
    /// Selectors that exist and are visible
    pub visible: HashSet<String>,
    /// Selectors whose visibility probe fails
    pub probe_errors: HashSet<String>,
    /// Selectors on which fill/click fail
    pub failing: HashSet<String>,
    /// Clicking one of these selectors raises the dialog
    pub dialogs_on_click: HashMap<String, Dialog>,
    /// Make navigation fail
    pub navigation_fails: bool,
    /// Make the dialog subscription fail
    pub dialogs_unavailable: bool,
}

#[derive(Default)]
struct MockState {
    actions: Vec<MockAction>,
    values: HashMap<String, String>,
    subscribers: Vec<mpsc::UnboundedSender<Dialog>>,
    pending_accept: Option<oneshot::Sender<()>>,
}

/// A scriptable page
pub struct MockPage {
    spec: MockPageSpec,
    state: Mutex<MockState>,
}

impl MockPage {
    pub fn new() -> Self {
        Self::from_spec(MockPageSpec::default())
    }

    pub fn from_spec(spec: MockPageSpec) -> Self {
        Self {
            spec,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Mark selectors as present and visible
    pub fn visible<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.visible.extend(selectors.into_iter().map(Into::into));
        self
    }

    /// Make the visibility probe of a selector fail
    pub fn probe_error(mut self, selector: impl Into<String>) -> Self {
        self.spec.probe_errors.insert(selector.into());
        self
    }

    /// Make fill/click on a selector fail
    pub fn failing(mut self, selector: impl Into<String>) -> Self {
        self.spec.failing.insert(selector.into());
        self
    }

    /// Raise an alert with `message` whenever `selector` is clicked
    pub fn alert_on_click(mut self, selector: impl Into<String>, message: impl Into<String>) -> Self {
        self.spec.dialogs_on_click.insert(
            selector.into(),
            Dialog {
                kind: DialogKind::Alert,
                message: message.into(),
                default_prompt: None,
            },
        );
        self
    }

    /// Make navigation fail
    pub fn navigation_fails(mut self) -> Self {
        self.spec.navigation_fails = true;
        self
    }

    /// Make the dialog subscription fail
    pub fn dialogs_unavailable(mut self) -> Self {
        self.spec.dialogs_unavailable = true;
        self
    }

    /// Spec this page was built from
    pub fn spec(&self) -> &MockPageSpec {
        &self.spec
    }

    /// All recorded interactions, in order
    pub fn actions(&self) -> Vec<MockAction> {
        self.lock().actions.clone()
    }

    /// Current value of an input
    pub fn value(&self, selector: &str) -> Option<String> {
        self.lock().values.get(selector).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned lock only means a test panicked mid-record
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, action: MockAction) {
        self.lock().actions.push(action);
    }

    fn check_failing(&self, selector: &str) -> DriverResult<()> {
        if self.spec.failing.contains(selector) {
            return Err(DriverError::Protocol(format!(
                "interaction with '{}' failed",
                selector
            )));
        }
        if !self.spec.visible.contains(selector) {
            return Err(DriverError::ElementNotFound(selector.to_string()));
        }
        Ok(())
    }

    /// Render the page: a header bar and the most recent actions
    fn render(&self) -> DriverResult<Vec<u8>> {
        let lines: Vec<String> = {
            let state = self.lock();
            state
                .actions
                .iter()
                .rev()
                .take(24)
                .map(MockAction::label)
                .collect()
        };

        let mut fb = MockFramebuffer::with_color(480, 240, [250, 250, 250]);
        fb.draw_rect(0, 0, 480, 14, [40, 60, 90]);
        fb.draw_text(4, 3, "demo-prober mock page", [255, 255, 255], [40, 60, 90]);
        for (row, line) in lines.iter().rev().enumerate() {
            let y = 20 + row as u32 * 9;
            fb.draw_text(4, y, line, [20, 20, 20], [250, 250, 250]);
        }
        fb.to_png()
    }
}

impl Default for MockPage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        if self.spec.navigation_fails {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_FILE_NOT_FOUND".to_string(),
            });
        }
        self.record(MockAction::Navigate(url.to_string()));
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> DriverResult<bool> {
        if self.spec.probe_errors.contains(selector) {
            return Err(DriverError::Protocol(format!(
                "probe of '{}' failed",
                selector
            )));
        }
        Ok(self.spec.visible.contains(selector))
    }

    async fn fill(&self, selector: &str, value: &str) -> DriverResult<()> {
        self.check_failing(selector)?;
        let mut state = self.lock();
        state.values.insert(selector.to_string(), value.to_string());
        state.actions.push(MockAction::Fill {
            selector: selector.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    async fn click(&self, selector: &str) -> DriverResult<()> {
        self.check_failing(selector)?;
        self.record(MockAction::Click(selector.to_string()));

        let Some(dialog) = self.spec.dialogs_on_click.get(selector).cloned() else {
            return Ok(());
        };

        let accepted = {
            let mut state = self.lock();
            state.subscribers.retain(|tx| !tx.is_closed());
            if state.subscribers.is_empty() {
                state
                    .actions
                    .push(MockAction::DialogDismissed(dialog.message.clone()));
                None
            } else {
                let (tx, rx) = oneshot::channel();
                state.pending_accept = Some(tx);
                for sub in &state.subscribers {
                    let _ = sub.unbounded_send(dialog.clone());
                }
                Some(rx)
            }
        };

        // Like a real browser, the click does not return while the dialog is open
        if let Some(rx) = accepted {
            match tokio::time::timeout(DIALOG_ACCEPT_TIMEOUT, rx).await {
                Ok(_) => {}
                Err(_) => {
                    return Err(DriverError::Timeout(format!(
                        "dialog '{}' was never accepted",
                        dialog.message
                    )));
                }
            }
        }
        Ok(())
    }

    async fn screenshot(&self) -> DriverResult<Vec<u8>> {
        self.record(MockAction::Screenshot);
        self.render()
    }

    async fn dialogs(&self) -> DriverResult<DialogStream> {
        if self.spec.dialogs_unavailable {
            return Err(DriverError::Protocol("dialog events unavailable".to_string()));
        }
        let (tx, rx) = mpsc::unbounded();
        self.lock().subscribers.push(tx);
        Ok(rx.boxed())
    }

    async fn accept_dialog(&self, dialog: &Dialog) -> DriverResult<()> {
        let mut state = self.lock();
        state
            .actions
            .push(MockAction::DialogAccepted(dialog.message.clone()));
        if let Some(tx) = state.pending_accept.take() {
            let _ = tx.send(());
        }
        Ok(())
    }

    async fn close(&self) -> DriverResult<()> {
        let mut state = self.lock();
        state.subscribers.clear();
        state.actions.push(MockAction::Closed);
        Ok(())
    }

    fn source_type(&self) -> &str {
        "mock"
    }
}

/// Session handing out fresh `MockPage`s built from one spec
#[derive(Default)]
pub struct MockSession {
    spec: MockPageSpec,
    pages: Mutex<Vec<Arc<MockPage>>>,
}

impl MockSession {
    pub fn new(template: MockPage) -> Self {
        Self {
            spec: template.spec,
            pages: Mutex::new(Vec::new()),
        }
    }

    /// Pages opened so far, in order
    pub fn pages(&self) -> Vec<Arc<MockPage>> {
        self.pages.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn open_page(&self) -> DriverResult<Arc<dyn PageDriver>> {
        let page = Arc::new(MockPage::from_spec(self.spec.clone()));
        self.pages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(page.clone());
        Ok(page)
    }

    async fn shutdown(&self) -> DriverResult<()> {
        Ok(())
    }
}

/// A virtual framebuffer used to render mock screenshots
///
/// Each character is drawn from font8x8 glyphs; text does not wrap.
#[derive(Debug, Clone)]
pub struct MockFramebuffer {
    width: u32,
    height: u32,
    /// RGB pixel buffer (row-major, 3 bytes per pixel)
    buffer: Vec<u8>,
}

impl MockFramebuffer {
    /// Create a framebuffer filled with a color
    pub fn with_color(width: u32, height: u32, color: [u8; 3]) -> Self {
        let mut fb = Self {
            width,
            height,
            buffer: vec![0u8; (width * height * 3) as usize],
        };
        fb.fill(color);
        fb
    }

    pub fn fill(&mut self, color: [u8; 3]) {
        for chunk in self.buffer.chunks_exact_mut(3) {
            chunk.copy_from_slice(&color);
        }
    }

    pub fn draw_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
        for py in y..(y + h).min(self.height) {
            for px in x..(x + w).min(self.width) {
                self.set_pixel(px, py, color);
            }
        }
    }

    pub fn draw_text(&mut self, x: u32, y: u32, text: &str, fg: [u8; 3], bg: [u8; 3]) {
        let mut cursor_x = x;
        for ch in text.chars() {
            if cursor_x >= self.width {
                break;
            }
            let glyph = BASIC_FONTS.get(ch).unwrap_or([0u8; 8]);
            for (row_idx, row) in glyph.iter().enumerate() {
                for bit in 0..8 {
                    // font8x8 stores LSB as leftmost pixel
                    let color = if (row >> bit) & 1 == 1 { fg } else { bg };
                    self.set_pixel(cursor_x + bit, y + row_idx as u32, color);
                }
            }
            cursor_x += 8;
        }
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0];
        }
        let idx = ((y * self.width + x) * 3) as usize;
        [self.buffer[idx], self.buffer[idx + 1], self.buffer[idx + 2]]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        self.buffer[idx..idx + 3].copy_from_slice(&color);
    }

    /// Encode as PNG bytes
    pub fn to_png(&self) -> DriverResult<Vec<u8>> {
        let img: RgbImage = ImageBuffer::from_raw(self.width, self.height, self.buffer.clone())
            .ok_or_else(|| DriverError::Image("buffer size does not match dimensions".to_string()))?;
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framebuffer_draw_rect() {
        let mut fb = MockFramebuffer::with_color(50, 50, [0, 0, 0]);
        fb.draw_rect(10, 10, 5, 5, [255, 0, 0]);
        assert_eq!(fb.get_pixel(12, 12), [255, 0, 0]);
        assert_eq!(fb.get_pixel(20, 20), [0, 0, 0]);
        assert_eq!(fb.get_pixel(500, 500), [0, 0, 0]);
    }

    #[test]
    fn test_framebuffer_png_decodes() {
        let mut fb = MockFramebuffer::with_color(64, 32, [10, 20, 30]);
        fb.draw_text(0, 0, "Hi", [255, 255, 255], [10, 20, 30]);
        let png = fb.to_png().unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!(img.width(), 64);
        assert_eq!(img.height(), 32);
    }

    #[tokio::test]
    async fn test_mock_records_in_order() {
        let page = MockPage::new().visible(["#a", "#b"]);
        page.fill("#a", "7").await.unwrap();
        page.click("#b").await.unwrap();
        assert_eq!(
            page.actions(),
            vec![
                MockAction::Fill {
                    selector: "#a".to_string(),
                    value: "7".to_string()
                },
                MockAction::Click("#b".to_string()),
            ]
        );
        assert_eq!(page.value("#a").as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn test_mock_visibility_and_errors() {
        let page = MockPage::new().visible(["#a"]).probe_error("#broken").failing("#a");
        assert!(page.is_visible("#a").await.unwrap());
        assert!(!page.is_visible("#zzz").await.unwrap());
        assert!(page.is_visible("#broken").await.is_err());
        assert!(page.click("#a").await.is_err());
        assert!(matches!(
            page.fill("#zzz", "1").await,
            Err(DriverError::ElementNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_dialog_without_subscriber_is_dismissed() {
        let page = MockPage::new().visible(["#go"]).alert_on_click("#go", "hello");
        page.click("#go").await.unwrap();
        assert_eq!(
            page.actions().last(),
            Some(&MockAction::DialogDismissed("hello".to_string()))
        );
    }

    #[tokio::test]
    async fn test_dialog_click_waits_for_accept() {
        let page = Arc::new(MockPage::new().visible(["#go"]).alert_on_click("#go", "hi"));
        let mut dialogs = page.dialogs().await.unwrap();
        let handler_page = page.clone();
        let handler = tokio::spawn(async move {
            let dialog = dialogs.next().await.unwrap();
            handler_page.accept_dialog(&dialog).await.unwrap();
            dialog
        });
        page.click("#go").await.unwrap();
        let dialog = handler.await.unwrap();
        assert_eq!(dialog.kind, DialogKind::Alert);
        assert_eq!(
            page.actions(),
            vec![
                MockAction::Click("#go".to_string()),
                MockAction::DialogAccepted("hi".to_string()),
            ]
        );
    }
}
