use crate::config::{Config, ScenarioStep};
use crate::error::Result;
use crate::events::WindowId;
use crate::services::browser_host::{BrowserHost, VirtualBrowser};
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{info, warn};

/// Проигрыватель сценария эмуляции.
///
/// Применяет шаги из конфигурации к виртуальному браузеру с заданным
/// интервалом. Без шагов крутит встроенный демонстрационный цикл:
/// окно с одной вкладкой создаётся и тут же теряет её, провоцируя
/// политику закрытия.
pub struct ScenarioPlayer {
    config: Arc<Config>,
    browser: Arc<VirtualBrowser>,
    // Известные окна в порядке появления; шаги адресуют их порядковым номером
    known_windows: Vec<WindowId>,
}

impl ScenarioPlayer {
    pub fn new(config: Arc<Config>, browser: Arc<VirtualBrowser>) -> Self {
        let known_windows = browser.window_ids();
        Self {
            config,
            browser,
            known_windows,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let tick = Duration::from_millis(self.config.simulation.tick_interval_ms);

        if self.config.simulation.steps.is_empty() {
            return self.run_demo_loop(tick).await;
        }

        info!(
            "ScenarioPlayer запущен: {} шагов, интервал {}мс",
            self.config.simulation.steps.len(),
            self.config.simulation.tick_interval_ms
        );

        let mut interval = interval(tick);
        loop {
            let steps = self.config.simulation.steps.clone();
            for step in &steps {
                interval.tick().await;
                self.apply_step(step).await;
            }

            if !self.config.simulation.loop_steps {
                break;
            }
        }

        info!("Сценарий отыгран - ScenarioPlayer завершает работу");
        Ok(())
    }

    /// Бесконечная эмуляция в духе dry-run: свежее окно с единственной
    /// вкладкой, затем её закрытие
    async fn run_demo_loop(&mut self, tick: Duration) -> Result<()> {
        info!("Шаги сценария не заданы - встроенный демонстрационный цикл");

        let mut interval = interval(tick);
        loop {
            interval.tick().await;
            let window_id = self.browser.create_window(1);
            self.known_windows.push(window_id);
            info!("Демо: создано окно {} с одной вкладкой", window_id);

            interval.tick().await;
            if let Some(tab) = self.browser.query_tabs(window_id).await?.last().copied() {
                info!("Демо: закрываем последнюю вкладку окна {}", window_id);
                if let Err(e) = self.browser.remove_tab(tab.id) {
                    warn!("Демо: не удалось закрыть вкладку {}: {}", tab.id, e);
                }
            }
        }
    }

    async fn apply_step(&mut self, step: &ScenarioStep) {
        match step.action.as_str() {
            "create_window" => {
                let tabs = step.tabs.unwrap_or(1);
                let window_id = self.browser.create_window(tabs);
                self.known_windows.push(window_id);
                info!("Шаг: создано окно {} | вкладок: {}", window_id, tabs);
            }
            "create_tab" => {
                if let Some(window_id) = self.resolve(step.window) {
                    match self.browser.create_tab(window_id) {
                        Ok(tab_id) => info!("Шаг: вкладка {} открыта в окне {}", tab_id, window_id),
                        Err(e) => warn!("Шаг create_tab пропущен: {}", e),
                    }
                }
            }
            "remove_tab" => {
                if let Some(window_id) = self.resolve(step.window) {
                    let tabs = self.browser.query_tabs(window_id).await.unwrap_or_default();
                    match tabs.last() {
                        Some(tab) => {
                            if let Err(e) = self.browser.remove_tab(tab.id) {
                                warn!("Шаг remove_tab пропущен: {}", e);
                            } else {
                                info!("Шаг: вкладка {} закрыта в окне {}", tab.id, window_id);
                            }
                        }
                        None => warn!("Шаг remove_tab: в окне {} нет вкладок", window_id),
                    }
                }
            }
            "remove_window" => {
                if let Some(window_id) = self.resolve(step.window) {
                    if let Err(e) = self.browser.remove_window(window_id).await {
                        warn!("Шаг remove_window пропущен: {}", e);
                    } else {
                        info!("Шаг: окно {} закрыто", window_id);
                    }
                }
            }
            // validate() отбрасывает неизвестные действия до запуска
            other => warn!("Неизвестное действие сценария: {}", other),
        }
    }

    fn resolve(&self, ordinal: Option<usize>) -> Option<WindowId> {
        let ordinal = ordinal?;
        let window_id = ordinal
            .checked_sub(1)
            .and_then(|i| self.known_windows.get(i))
            .copied();

        if window_id.is_none() {
            warn!("Шаг ссылается на несуществующее окно #{}", ordinal);
        }
        window_id
    }
}
