//! User-visible status notifications.

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Progress,
    Success,
    Error,
}

impl NoticeLevel {
    fn icon(&self) -> &'static str {
        match self {
            NoticeLevel::Info => "ℹ️",
            NoticeLevel::Progress => "⏳",
            NoticeLevel::Success => "✅",
            NoticeLevel::Error => "❌",
        }
    }
}

/// An ephemeral status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn progress(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Progress, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    /// Rendered text including the level icon.
    pub fn display_text(&self) -> String {
        format!("{} {}", self.level.icon(), self.message)
    }
}

/// Surface for ephemeral status messages. Delivery is best-effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: Notice);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_text_prefixes_icon() {
        let notice = Notice::error("Please sign in first");
        assert_eq!(notice.display_text(), "❌ Please sign in first");
        assert_eq!(Notice::progress("Processing...").level, NoticeLevel::Progress);
    }
}
