use thiserror::Error;

#[derive(Error, Debug)]
pub enum TabwatchError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Окно не найдено: {0}")]
    WindowNotFound(String),

    #[error("Канал событий недоступен: {0}")]
    Channel(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, TabwatchError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! tw_error {
    (window_not_found, $($arg:tt)*) => {
        $crate::error::TabwatchError::WindowNotFound(format!($($arg)*))
    };
    (channel, $($arg:tt)*) => {
        $crate::error::TabwatchError::Channel(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::TabwatchError::Internal(format!($($arg)*))
    };
}
