//! BrowserHost service: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for exposing the host
//! windows/tabs API (startup enumeration, live tab queries, window removal)
//! and emitting BrowserEvent(s). It MUST NOT contain any closing policy.
//! All close decisions are made exclusively by TabTracker.

mod r#trait;
mod virtual_browser;

pub use self::r#trait::{create_browser_host, BrowserHost};
pub use self::virtual_browser::VirtualBrowser;
