pub mod browser;

pub use browser::{BrowserEvent, BrowserEventKind, TabId, TabInfo, WindowId, WindowSnapshot};
