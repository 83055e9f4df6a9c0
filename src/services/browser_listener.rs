use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{BrowserEvent, BrowserEventKind};
use crate::services::TabTracker;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info};

/// Слушатель событий хоста.
///
/// Единственный потребитель канала: события обрабатываются строго
/// в порядке доставки, очередной обработчик стартует только после
/// завершения предыдущего. Ошибка обработчика логируется и не
/// останавливает цикл.
pub struct BrowserListener {
    tracker: Arc<TabTracker>,
    events: UnboundedReceiver<BrowserEvent>,
}

impl BrowserListener {
    pub fn new(tracker: Arc<TabTracker>, events: UnboundedReceiver<BrowserEvent>) -> Self {
        Self { tracker, events }
    }

    pub async fn run(mut self) -> Result<()> {
        info!("BrowserListener запущен");

        while let Some(event) = self.events.recv().await {
            debug_if_enabled!("Событие хоста: {}", event);

            let result = match event.kind {
                BrowserEventKind::WindowCreated { window_id } => {
                    self.tracker.on_window_created(window_id).await
                }
                BrowserEventKind::TabCreated { tab } => self.tracker.on_tab_created(&tab).await,
                BrowserEventKind::TabRemoved { tab_id, window_id } => {
                    self.tracker.on_tab_removed(tab_id, window_id).await
                }
            };

            if let Err(e) = result {
                error!("Ошибка обработки события хоста: {}", e);
            }
        }

        info!("Канал событий закрыт - BrowserListener завершает работу");
        Ok(())
    }
}
