use chrono::{Local, LocalResult, TimeZone, Utc};

/// Текущее unix-время в миллисекундах
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Форматирует unix-время в миллисекундах как HH:MM:SS для строк журнала
pub fn format_clock(ms: i64) -> String {
    match Local.timestamp_millis_opt(ms) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
            dt.format("%H:%M:%S").to_string()
        }
        LocalResult::None => "??:??:??".to_string(),
    }
}
