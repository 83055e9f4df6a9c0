pub mod browser_host;
pub mod browser_listener;
pub mod scenario;
pub mod tracker;

pub use browser_host::{create_browser_host, BrowserHost, VirtualBrowser};
pub use browser_listener::BrowserListener;
pub use scenario::ScenarioPlayer;
pub use tracker::TabTracker;
