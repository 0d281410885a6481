pub mod chrome;
pub mod mock;
pub mod types;

pub use chrome::{ChromeConfig, ChromePage, ChromeSession};
pub use mock::{MockAction, MockFramebuffer, MockPage, MockPageSpec, MockSession};
pub use types::{BrowserSession, Dialog, DialogKind, DialogStream, DriverError, DriverResult, PageDriver};
