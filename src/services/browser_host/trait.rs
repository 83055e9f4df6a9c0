use crate::config::Config;
use crate::error::Result;
use crate::events::{BrowserEvent, TabInfo, WindowId, WindowSnapshot};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Trait for browser hosts that expose the windows/tabs API
#[async_trait::async_trait]
pub trait BrowserHost: Send + Sync {
    /// Перечислить все окна вместе с их вкладками
    async fn enumerate_windows(&self) -> Result<Vec<WindowSnapshot>>;

    /// Живой список вкладок окна; для неизвестного окна — пустой список
    async fn query_tabs(&self, window_id: WindowId) -> Result<Vec<TabInfo>>;

    /// Закрыть окно. Единственная команда, отказ которой наблюдает политика
    async fn remove_window(&self, window_id: WindowId) -> Result<()>;
}

/// Factory function to create the browser host together with its event channel.
///
/// Стартовые окна из конфигурации заводятся без событий: при старте хост
/// уже содержит их, и трекер узнаёт о них через enumerate_windows().
pub fn create_browser_host(
    config: &Config,
    dry_run: bool,
) -> Result<(Arc<super::VirtualBrowser>, UnboundedReceiver<BrowserEvent>)> {
    let (browser, events) = super::VirtualBrowser::new(dry_run);

    for tabs in &config.browser.initial_windows {
        browser.seed_window(*tabs);
    }

    Ok((browser, events))
}
