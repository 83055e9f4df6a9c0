use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub browser: BrowserConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    /// Стартовые окна эмулируемого браузера: по одному элементу на окно,
    /// значение — количество вкладок в нём
    #[serde(default)]
    pub initial_windows: Vec<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    pub tick_interval_ms: u64,
    /// Повторять шаги сценария по кругу
    #[serde(default)]
    pub loop_steps: bool,
    #[serde(default)]
    pub steps: Vec<ScenarioStep>,
}

/// Один шаг сценария эмуляции.
///
/// Окна адресуются порядковым номером (1-based) в порядке их появления:
/// сначала стартовые окна, затем созданные шагами сценария.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioStep {
    pub action: String,
    #[serde(default)]
    pub window: Option<usize>,
    #[serde(default)]
    pub tabs: Option<usize>,
}

const KNOWN_ACTIONS: &[&str] = &["create_window", "create_tab", "remove_tab", "remove_window"];

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
                filter: "tabwatch_rust=info".to_string(),
            },
            browser: BrowserConfig {
                initial_windows: vec![2, 1],
            },
            simulation: SimulationConfig {
                tick_interval_ms: 1000,
                loop_steps: false,
                steps: Vec::new(),
            },
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("TABWATCH_"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация настроек эмуляции
        if self.simulation.tick_interval_ms < 10 {
            anyhow::bail!("tick_interval_ms должно быть минимум 10");
        }

        for (i, step) in self.simulation.steps.iter().enumerate() {
            if !KNOWN_ACTIONS.contains(&step.action.as_str()) {
                anyhow::bail!("Неизвестное действие '{}' в шаге #{}", step.action, i + 1);
            }

            match step.action.as_str() {
                "create_window" => {
                    if step.tabs == Some(0) {
                        anyhow::bail!("Шаг #{}: окно не может создаваться без вкладок", i + 1);
                    }
                }
                // Остальные действия адресуют уже существующее окно
                _ => {
                    if step.window.is_none() {
                        anyhow::bail!(
                            "Шаг #{}: действие '{}' требует поля 'window'",
                            i + 1,
                            step.action
                        );
                    }
                }
            }
        }

        Ok(())
    }
}
