use serde::{Deserialize, Serialize};
use std::fmt;

/// Идентификатор окна (выдаётся хостом и никогда не переиспользуется)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub i32);

impl WindowId {
    #[allow(dead_code)]
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Идентификатор вкладки
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TabId(pub i32);

impl TabId {
    #[allow(dead_code)]
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    #[allow(dead_code)]
    pub fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Вкладка внутри окна
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    pub window_id: WindowId,
}

impl TabInfo {
    pub fn new(id: TabId, window_id: WindowId) -> Self {
        Self { id, window_id }
    }
}

impl fmt::Display for TabInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "вкладка {} (окно {})", self.id, self.window_id)
    }
}

/// Снимок окна при стартовом перечислении (окно вместе с его вкладками)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub id: WindowId,
    pub tabs: Vec<TabInfo>,
}

impl WindowSnapshot {
    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }
}

/// Тип события жизненного цикла окон и вкладок
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserEventKind {
    WindowCreated { window_id: WindowId },
    TabCreated { tab: TabInfo },
    TabRemoved { tab_id: TabId, window_id: WindowId },
}

/// Событие от хоста
#[derive(Debug, Clone)]
pub struct BrowserEvent {
    pub kind: BrowserEventKind,
    pub timestamp: std::time::Instant,
}

impl BrowserEvent {
    pub fn new(kind: BrowserEventKind) -> Self {
        Self {
            kind,
            timestamp: std::time::Instant::now(),
        }
    }

    pub fn window_created(window_id: WindowId) -> Self {
        Self::new(BrowserEventKind::WindowCreated { window_id })
    }

    pub fn tab_created(tab: TabInfo) -> Self {
        Self::new(BrowserEventKind::TabCreated { tab })
    }

    pub fn tab_removed(tab_id: TabId, window_id: WindowId) -> Self {
        Self::new(BrowserEventKind::TabRemoved { tab_id, window_id })
    }
}

impl fmt::Display for BrowserEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            BrowserEventKind::WindowCreated { window_id } => {
                write!(f, "окно {} создано", window_id)
            }
            BrowserEventKind::TabCreated { tab } => {
                write!(f, "вкладка {} создана в окне {}", tab.id, tab.window_id)
            }
            BrowserEventKind::TabRemoved { tab_id, window_id } => {
                write!(f, "вкладка {} закрыта в окне {}", tab_id, window_id)
            }
        }?;
        write!(f, " ({}ms ago)", self.timestamp.elapsed().as_millis())
    }
}
