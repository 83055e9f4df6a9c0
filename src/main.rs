use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

mod config;
mod error;
mod events;
mod services;
mod utils;

use config::Config;
use services::{create_browser_host, BrowserListener, ScenarioPlayer, TabTracker};

#[derive(Parser, Debug)]
#[command(name = "tabwatch-rust")]
#[command(about = "Утилита для автоматического закрытия окна при закрытии последней вкладки")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "tabwatch.toml")]
    config: String,

    /// Режим сухого запуска (окна реально не закрываются)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Инициализация системы логирования
    init_tracing(&args.log_level)?;

    info!("Запуск Tabwatch Rust v{}", env!("CARGO_PKG_VERSION"));

    // Загрузка конфигурации
    let config = Arc::new(Config::load(&args.config)?);
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - окна закрываться не будут");
    }

    // Инициализация компонентов (единый эмулируемый браузер для всех сервисов)
    let (browser, browser_events) = create_browser_host(&config, args.dry_run)?;
    let tracker = Arc::new(TabTracker::new(browser.clone()));

    // Стартовое перечисление уже открытых окон
    tracker.initialize().await?;

    let listener = BrowserListener::new(tracker.clone(), browser_events);
    let scenario = ScenarioPlayer::new(config.clone(), browser.clone());

    info!("Все компоненты инициализированы");

    // Запуск всех сервисов параллельно
    let listener_handle = tokio::spawn(async move {
        if let Err(e) = listener.run().await {
            error!("Ошибка в BrowserListener: {}", e);
        }
    });
    let scenario_handle = tokio::spawn(async move {
        if let Err(e) = scenario.run().await {
            error!("Ошибка в ScenarioPlayer: {}", e);
        }
    });

    info!("Все сервисы запущены");

    // Ожидание сигнала завершения
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Получен сигнал завершения (Ctrl+C)");
        }
        Err(err) => {
            error!("Ошибка при ожидании сигнала завершения: {}", err);
        }
    }

    info!("Завершение работы...");

    // Прерываем задачи; незавершённый запрос на закрытие окна просто
    // оставит его идентификатор в множестве закрываемых (допустимо)
    scenario_handle.abort();
    listener_handle.abort();

    // Ожидаем завершения задач (с таймаутом)
    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        let _ = listener_handle.await;
        let _ = scenario_handle.await;
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    info!("Tabwatch Rust завершил работу");
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}
