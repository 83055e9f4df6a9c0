use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{TabId, TabInfo, WindowId};
use crate::services::browser_host::BrowserHost;
use crate::utils::time::{format_clock, now_millis};
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Трекер количества вкладок по окнам.
///
/// Хранит счётчик вкладок на каждое наблюдавшееся окно и закрывает окно,
/// когда удаляется его последняя вкладка. Записи счётчиков не удаляются:
/// хост не переиспользует идентификаторы, устаревшие записи безвредны.
pub struct TabTracker {
    host: Arc<dyn BrowserHost>,
    // Состояние компонента
    tab_counts: DashMap<WindowId, usize>,
    closing_windows: DashSet<WindowId>,
    last_seen_ms: AtomicI64,
}

impl TabTracker {
    pub fn new(host: Arc<dyn BrowserHost>) -> Self {
        info!("Инициализация TabTracker");

        Self {
            host,
            tab_counts: DashMap::new(),
            closing_windows: DashSet::new(),
            last_seen_ms: AtomicI64::new(0),
        }
    }

    /// Стартовое перечисление: завести счётчики для уже открытых окон
    pub async fn initialize(&self) -> Result<()> {
        let windows = self.host.enumerate_windows().await?;

        for win in &windows {
            self.tab_counts.insert(win.id, win.tab_count());
            let ts = self.touch_clock();
            info!(
                "{} - 🗔 Окно {} инициализировано | вкладок: {}",
                format_clock(ts),
                win.id,
                win.tab_count()
            );
        }

        Ok(())
    }

    /// Обработка создания окна: только освежаем счётчик, закрытие не проверяем
    pub async fn on_window_created(&self, window_id: WindowId) -> Result<()> {
        let ts = self.touch_clock();
        let after = self.refresh(window_id).await?;

        info!(
            "{} - 🗔 Окно {} создано | вкладок: {}",
            format_clock(ts),
            window_id,
            after
        );
        Ok(())
    }

    /// Обработка создания вкладки: закрытие не проверяем никогда
    pub async fn on_tab_created(&self, tab: &TabInfo) -> Result<()> {
        let ts = self.touch_clock();
        // Невиданное окно считаем пустым: вкладка могла появиться раньше,
        // чем мы узнали об окне
        let before = self.count_or(tab.window_id, 0);
        let after = self.refresh(tab.window_id).await?;

        info!(
            "{} - ➕ Вкладка {} создана в окне {} | до: {}, после: {}",
            format_clock(ts),
            tab.id,
            tab.window_id,
            before,
            after
        );
        Ok(())
    }

    /// Обработка закрытия вкладки: освежить счётчик и проверить закрытие окна
    pub async fn on_tab_removed(&self, tab_id: TabId, window_id: WindowId) -> Result<()> {
        let ts = self.touch_clock();
        // Для невиданного окна берём 1, чтобы проверка закрытия могла
        // сработать и для окна, которое трекер ни разу не наблюдал
        let before = self.count_or(window_id, 1);
        let after = self.refresh(window_id).await?;

        info!(
            "{} - ❌ Вкладка {} закрыта в окне {} | до: {}, после: {}",
            format_clock(ts),
            tab_id,
            window_id,
            before,
            after
        );

        self.close_if_last_tab(window_id, before, after).await
    }

    /// Закрыть окно, если перед удалением в нём оставалась одна вкладка.
    ///
    /// Триггер — снимок счётчика ДО удаления, а не живой запрос после:
    /// хост в этот момент может ещё не устаканить собственный учёт.
    async fn close_if_last_tab(
        &self,
        window_id: WindowId,
        before: usize,
        _after: usize,
    ) -> Result<()> {
        // insert() — атомарная проверка-и-вставка: пока окно в множестве,
        // повторный запрос на закрытие не уходит
        if before == 1 && self.closing_windows.insert(window_id) {
            info!(
                "{} - ⚠ Осталась одна вкладка — закрываем окно {}",
                format_clock(self.clock_ms()),
                window_id
            );

            if let Err(e) = self.host.remove_window(window_id).await {
                warn!(
                    "{} - ⚠ Не удалось закрыть окно {}: {}",
                    format_clock(self.clock_ms()),
                    window_id,
                    e
                );
            }

            self.closing_windows.remove(&window_id);
        }

        // Счётчик освежается в любом случае
        self.refresh(window_id).await?;
        Ok(())
    }

    /// Перечитать живой список вкладок окна и перезаписать счётчик.
    /// Всегда перезапись свежим значением, никогда read-modify-write
    pub async fn refresh(&self, window_id: WindowId) -> Result<usize> {
        let tabs = self.host.query_tabs(window_id).await?;
        let count = tabs.len();

        self.tab_counts.insert(window_id, count);
        self.touch_clock();

        debug_if_enabled!("Окно {} теперь содержит {} вкладок", window_id, count);
        Ok(count)
    }

    pub fn tab_count(&self, window_id: WindowId) -> Option<usize> {
        self.tab_counts.get(&window_id).map(|c| *c)
    }

    #[allow(dead_code)]
    pub fn is_closing(&self, window_id: WindowId) -> bool {
        self.closing_windows.contains(&window_id)
    }

    fn count_or(&self, window_id: WindowId, default: usize) -> usize {
        self.tab_counts
            .get(&window_id)
            .map(|c| *c)
            .unwrap_or(default)
    }

    fn touch_clock(&self) -> i64 {
        let now = now_millis();
        self.last_seen_ms.store(now, Ordering::Relaxed);
        now
    }

    fn clock_ms(&self) -> i64 {
        self.last_seen_ms.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WindowSnapshot;
    use crate::tw_error;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Управляемый хост для тестов политики закрытия
    struct MockHost {
        tabs: Mutex<HashMap<WindowId, Vec<TabInfo>>>,
        remove_calls: AtomicUsize,
        fail_remove_with: Mutex<Option<String>>,
        hold_remove: Option<Arc<Notify>>,
    }

    impl MockHost {
        fn new(windows: &[(i32, usize)]) -> Arc<Self> {
            let mut tabs = HashMap::new();
            let mut next_tab = 1;
            for (win, count) in windows {
                let window_id = WindowId(*win);
                let list = (0..*count)
                    .map(|_| {
                        let tab = TabInfo::new(TabId(next_tab), window_id);
                        next_tab += 1;
                        tab
                    })
                    .collect();
                tabs.insert(window_id, list);
            }

            Arc::new(Self {
                tabs: Mutex::new(tabs),
                remove_calls: AtomicUsize::new(0),
                fail_remove_with: Mutex::new(None),
                hold_remove: None,
            })
        }

        fn gated(windows: &[(i32, usize)], gate: Arc<Notify>) -> Arc<Self> {
            let host = MockHost::new(windows);
            let mut host = Arc::try_unwrap(host).unwrap_or_else(|_| unreachable!());
            host.hold_remove = Some(gate);
            Arc::new(host)
        }

        fn fail_remove(&self, message: &str) {
            *self.fail_remove_with.lock() = Some(message.to_string());
        }

        fn drop_tab(&self, window_id: WindowId, tab_id: TabId) {
            let mut tabs = self.tabs.lock();
            if let Some(list) = tabs.get_mut(&window_id) {
                list.retain(|t| t.id != tab_id);
            }
        }

        fn remove_calls(&self) -> usize {
            self.remove_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl BrowserHost for MockHost {
        async fn enumerate_windows(&self) -> Result<Vec<WindowSnapshot>> {
            let tabs = self.tabs.lock();
            Ok(tabs
                .iter()
                .map(|(id, list)| WindowSnapshot {
                    id: *id,
                    tabs: list.clone(),
                })
                .collect())
        }

        async fn query_tabs(&self, window_id: WindowId) -> Result<Vec<TabInfo>> {
            Ok(self.tabs.lock().get(&window_id).cloned().unwrap_or_default())
        }

        async fn remove_window(&self, window_id: WindowId) -> Result<()> {
            self.remove_calls.fetch_add(1, Ordering::SeqCst);

            if let Some(gate) = &self.hold_remove {
                gate.notified().await;
            }

            if let Some(message) = self.fail_remove_with.lock().take() {
                return Err(tw_error!(window_not_found, "{}", message));
            }

            self.tabs
                .lock()
                .remove(&window_id)
                .map(|_| ())
                .ok_or_else(|| tw_error!(window_not_found, "нет такого окна: {}", window_id))
        }
    }

    #[tokio::test]
    async fn startup_enumeration_seeds_counts() {
        let host = MockHost::new(&[(1, 2), (2, 0)]);
        let tracker = TabTracker::new(host.clone());

        tracker.initialize().await.unwrap();

        assert_eq!(tracker.tab_count(WindowId(1)), Some(2));
        assert_eq!(tracker.tab_count(WindowId(2)), Some(0));
    }

    #[tokio::test]
    async fn refresh_matches_live_count() {
        let host = MockHost::new(&[(1, 3)]);
        let tracker = TabTracker::new(host.clone());

        assert_eq!(tracker.refresh(WindowId(1)).await.unwrap(), 3);
        assert_eq!(tracker.tab_count(WindowId(1)), Some(3));

        host.drop_tab(WindowId(1), TabId(1));
        assert_eq!(tracker.refresh(WindowId(1)).await.unwrap(), 2);
        assert_eq!(tracker.tab_count(WindowId(1)), Some(2));
    }

    #[tokio::test]
    async fn refresh_is_idempotent() {
        let host = MockHost::new(&[(1, 2)]);
        let tracker = TabTracker::new(host);

        let first = tracker.refresh(WindowId(1)).await.unwrap();
        let second = tracker.refresh(WindowId(1)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(tracker.tab_count(WindowId(1)), Some(2));
    }

    #[tokio::test]
    async fn last_tab_removal_closes_window_once() {
        let host = MockHost::new(&[(1, 1)]);
        let tracker = TabTracker::new(host.clone());
        tracker.initialize().await.unwrap();

        // Хост уже удалил вкладку, уведомление приходит после
        host.drop_tab(WindowId(1), TabId(1));
        tracker.on_tab_removed(TabId(1), WindowId(1)).await.unwrap();

        assert_eq!(host.remove_calls(), 1);
        assert_eq!(tracker.tab_count(WindowId(1)), Some(0));
        assert!(!tracker.is_closing(WindowId(1)));
    }

    #[tokio::test]
    async fn multi_tab_removal_does_not_close() {
        let host = MockHost::new(&[(1, 3)]);
        let tracker = TabTracker::new(host.clone());
        tracker.initialize().await.unwrap();

        host.drop_tab(WindowId(1), TabId(1));
        tracker.on_tab_removed(TabId(1), WindowId(1)).await.unwrap();

        assert_eq!(host.remove_calls(), 0);
        assert_eq!(tracker.tab_count(WindowId(1)), Some(2));
    }

    #[tokio::test]
    async fn tab_creation_never_triggers_close() {
        let host = MockHost::new(&[(1, 1)]);
        let tracker = TabTracker::new(host.clone());
        tracker.initialize().await.unwrap();

        let tab = TabInfo::new(TabId(99), WindowId(1));
        tracker.on_tab_created(&tab).await.unwrap();

        assert_eq!(host.remove_calls(), 0);
    }

    #[tokio::test]
    async fn unseen_window_defaults_to_one_on_removal() {
        // Трекер ни разу не видел окно 7: default 1 позволяет
        // проверке закрытия сработать и здесь
        let host = MockHost::new(&[]);
        let tracker = TabTracker::new(host.clone());

        tracker.on_tab_removed(TabId(1), WindowId(7)).await.unwrap();

        assert_eq!(host.remove_calls(), 1);
        assert!(!tracker.is_closing(WindowId(7)));
    }

    #[tokio::test]
    async fn failed_close_releases_guard_and_allows_retry() {
        let host = MockHost::new(&[(1, 1)]);
        let tracker = TabTracker::new(host.clone());
        tracker.initialize().await.unwrap();

        host.fail_remove("нет такого окна: #1");
        tracker.on_tab_removed(TabId(1), WindowId(1)).await.unwrap();

        assert_eq!(host.remove_calls(), 1);
        assert!(!tracker.is_closing(WindowId(1)));

        // Счётчик снова 1 (вкладка так и не удалилась) — свежая попытка уходит
        tracker.on_tab_removed(TabId(1), WindowId(1)).await.unwrap();
        assert_eq!(host.remove_calls(), 2);
    }

    #[tokio::test]
    async fn no_concurrent_double_close() {
        let gate = Arc::new(Notify::new());
        let host = MockHost::gated(&[(1, 1)], gate.clone());
        let tracker = Arc::new(TabTracker::new(host.clone()));
        tracker.initialize().await.unwrap();

        // Первый обработчик повисает внутри remove_window на шлюзе
        let first = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.on_tab_removed(TabId(1), WindowId(1)).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(tracker.is_closing(WindowId(1)));

        // Второе удаление для того же окна, пока первое закрытие не завершилось
        tracker.on_tab_removed(TabId(1), WindowId(1)).await.unwrap();
        assert_eq!(host.remove_calls(), 1);

        gate.notify_one();
        first.await.unwrap().unwrap();
        assert_eq!(host.remove_calls(), 1);
        assert!(!tracker.is_closing(WindowId(1)));
    }

    // Известный пробел триггера before == 1: окно, потерявшее все вкладки
    // разом (3 -> 0 без промежуточного наблюдения "осталась одна"),
    // не закрывается. Поведение сохранено намеренно
    #[tokio::test]
    async fn batch_removal_gap_is_preserved() {
        let host = MockHost::new(&[(1, 3)]);
        let tracker = TabTracker::new(host.clone());
        tracker.initialize().await.unwrap();

        host.drop_tab(WindowId(1), TabId(1));
        host.drop_tab(WindowId(1), TabId(2));
        host.drop_tab(WindowId(1), TabId(3));

        for tab in [TabId(1), TabId(2), TabId(3)] {
            tracker.on_tab_removed(tab, WindowId(1)).await.unwrap();
        }

        // before наблюдался как 3, затем 0, 0 — окно осталось открытым
        assert_eq!(host.remove_calls(), 0);
        assert_eq!(tracker.tab_count(WindowId(1)), Some(0));
    }
}
