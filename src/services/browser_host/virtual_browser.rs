use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{BrowserEvent, TabId, TabInfo, WindowId, WindowSnapshot};
use crate::tw_error;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::info;

/// Внутреннее состояние эмулируемого браузера
struct BrowserState {
    windows: BTreeMap<WindowId, Vec<TabInfo>>,
    next_window_id: i32,
    next_tab_id: i32,
}

impl BrowserState {
    fn alloc_window_id(&mut self) -> WindowId {
        let id = WindowId(self.next_window_id);
        self.next_window_id += 1;
        id
    }

    fn alloc_tab_id(&mut self) -> TabId {
        let id = TabId(self.next_tab_id);
        self.next_tab_id += 1;
        id
    }
}

/// Эмулируемый браузер: окна и вкладки в памяти.
///
/// Идентификаторы монотонно растут и никогда не переиспользуются —
/// на это опирается трекер, не удаляющий устаревшие записи счётчиков.
pub struct VirtualBrowser {
    state: Mutex<BrowserState>,
    events: UnboundedSender<BrowserEvent>,
    dry_run: bool,
}

impl VirtualBrowser {
    pub fn new(dry_run: bool) -> (Arc<Self>, UnboundedReceiver<BrowserEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let browser = Arc::new(Self {
            state: Mutex::new(BrowserState {
                windows: BTreeMap::new(),
                next_window_id: 1,
                next_tab_id: 1,
            }),
            events: tx,
            dry_run,
        });

        (browser, rx)
    }

    /// Завести стартовое окно без событий (окно существовало до запуска)
    pub fn seed_window(&self, tabs: usize) -> WindowId {
        let mut state = self.state.lock();
        let window_id = state.alloc_window_id();
        let tab_list: Vec<TabInfo> = (0..tabs)
            .map(|_| TabInfo::new(state.alloc_tab_id(), window_id))
            .collect();
        state.windows.insert(window_id, tab_list);
        window_id
    }

    /// Создать окно с заданным числом вкладок, с событиями
    pub fn create_window(&self, tabs: usize) -> WindowId {
        let (window_id, tab_list) = {
            let mut state = self.state.lock();
            let window_id = state.alloc_window_id();
            let tab_list: Vec<TabInfo> = (0..tabs)
                .map(|_| TabInfo::new(state.alloc_tab_id(), window_id))
                .collect();
            state.windows.insert(window_id, tab_list.clone());
            (window_id, tab_list)
        };

        self.emit(BrowserEvent::window_created(window_id));
        for tab in &tab_list {
            self.emit(BrowserEvent::tab_created(*tab));
        }

        window_id
    }

    /// Открыть вкладку в существующем окне
    pub fn create_tab(&self, window_id: WindowId) -> Result<TabId> {
        let tab = {
            let mut state = self.state.lock();
            let tab_id = state.alloc_tab_id();
            let tabs = state
                .windows
                .get_mut(&window_id)
                .ok_or_else(|| tw_error!(window_not_found, "нет такого окна: {}", window_id))?;
            let tab = TabInfo::new(tab_id, window_id);
            tabs.push(tab);
            tab
        };

        self.emit(BrowserEvent::tab_created(tab));
        Ok(tab.id)
    }

    /// Закрыть вкладку. Опустевшее окно НЕ удаляется —
    /// это решение принадлежит политике закрытия, а не хосту
    pub fn remove_tab(&self, tab_id: TabId) -> Result<()> {
        let window_id = {
            let mut state = self.state.lock();
            let owner = state
                .windows
                .iter()
                .find(|(_, tabs)| tabs.iter().any(|t| t.id == tab_id))
                .map(|(id, _)| *id);

            match owner {
                Some(window_id) => {
                    let tabs = state.windows.get_mut(&window_id).unwrap();
                    tabs.retain(|t| t.id != tab_id);
                    window_id
                }
                None => {
                    return Err(tw_error!(window_not_found, "нет вкладки {}", tab_id));
                }
            }
        };

        self.emit(BrowserEvent::tab_removed(tab_id, window_id));
        Ok(())
    }

    /// Список идентификаторов существующих окон в порядке создания
    pub fn window_ids(&self) -> Vec<WindowId> {
        self.state.lock().windows.keys().copied().collect()
    }

    fn emit(&self, event: BrowserEvent) {
        // Закрытый канал означает остановку слушателя при завершении работы
        if self.events.send(event).is_err() {
            debug_if_enabled!("Канал событий закрыт - событие отброшено");
        }
    }
}

#[async_trait::async_trait]
impl super::BrowserHost for VirtualBrowser {
    async fn enumerate_windows(&self) -> Result<Vec<WindowSnapshot>> {
        let state = self.state.lock();
        Ok(state
            .windows
            .iter()
            .map(|(id, tabs)| WindowSnapshot {
                id: *id,
                tabs: tabs.clone(),
            })
            .collect())
    }

    async fn query_tabs(&self, window_id: WindowId) -> Result<Vec<TabInfo>> {
        let state = self.state.lock();
        // Неизвестное окно — пустой список, а не ошибка (политика best-effort)
        Ok(state.windows.get(&window_id).cloned().unwrap_or_default())
    }

    async fn remove_window(&self, window_id: WindowId) -> Result<()> {
        if self.dry_run {
            info!("Dry-run: окно {} не закрываем, только отмечаем", window_id);
            return Ok(());
        }

        let removed_tabs = {
            let mut state = self.state.lock();
            state
                .windows
                .remove(&window_id)
                .ok_or_else(|| tw_error!(window_not_found, "нет такого окна: {}", window_id))?
        };

        info!(
            "Окно {} закрыто хостом (вкладок было: {})",
            window_id,
            removed_tabs.len()
        );

        // Хост сообщает о каждой вкладке закрытого окна, как настоящий браузер
        for tab in &removed_tabs {
            self.emit(BrowserEvent::tab_removed(tab.id, window_id));
        }

        Ok(())
    }
}
