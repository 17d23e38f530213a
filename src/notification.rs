//! Transient notices shown at the bottom of the screen ("Bookmark added!")

use std::time::{Duration, Instant};

/// How long a notice stays up unless told otherwise
pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub expires_at: Instant,
}

impl Notification {
    pub fn new(message: impl Into<String>, level: NotificationLevel, duration: Duration) -> Self {
        Self {
            message: message.into(),
            level,
            expires_at: Instant::now() + duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug)]
pub struct NotificationManager {
    notifications: Vec<Notification>,
    default_duration: Duration,
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::with_default_duration(DEFAULT_NOTICE_DURATION)
    }

    pub fn with_default_duration(default_duration: Duration) -> Self {
        Self {
            notifications: Vec::new(),
            default_duration,
        }
    }

    pub fn notify(&mut self, message: impl Into<String>, level: NotificationLevel) {
        let notification = Notification::new(message, level, self.default_duration);
        // Repeating a notice refreshes it instead of stacking a copy
        self.notifications
            .retain(|n| n.message != notification.message || n.level != notification.level);
        self.notifications.insert(0, notification);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Info);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Warning);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Error);
    }

    /// Remove expired notifications, returns true if any were removed
    pub fn update(&mut self) -> bool {
        let initial_len = self.notifications.len();
        let now = Instant::now();
        self.notifications.retain(|n| !n.is_expired_at(now));
        self.notifications.len() != initial_len
    }

    /// The most recent notification
    pub fn current(&self) -> Option<&Notification> {
        self.notifications.first()
    }

    pub fn dismiss_current(&mut self) -> bool {
        if self.notifications.is_empty() {
            false
        } else {
            self.notifications.remove(0);
            true
        }
    }

    pub fn count(&self) -> usize {
        self.notifications.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn notification_expiration() {
        let notification =
            Notification::new("test", NotificationLevel::Info, Duration::from_millis(50));
        assert!(!notification.is_expired());
        assert!(notification.is_expired_at(Instant::now() + Duration::from_millis(60)));
    }

    #[test]
    fn newest_notice_is_current() {
        let mut manager = NotificationManager::new();

        manager.info("Bookmark added!");
        manager.warn("Second");
        manager.error("Third");

        assert_eq!(manager.count(), 3);

        let current = manager.current().unwrap();
        assert_eq!(current.message, "Third");
        assert_eq!(current.level, NotificationLevel::Error);
    }

    #[test]
    fn manager_removes_expired() {
        let mut manager = NotificationManager::with_default_duration(Duration::from_millis(20));

        manager.info("Short-lived");
        assert_eq!(manager.count(), 1);

        thread::sleep(Duration::from_millis(30));
        assert!(manager.update());
        assert_eq!(manager.count(), 0);
    }

    #[test]
    fn repeated_notice_is_not_stacked() {
        let mut manager = NotificationManager::new();

        manager.info("Share link copied!");
        manager.info("Bookmark added!");
        manager.info("Share link copied!");

        assert_eq!(manager.count(), 2);
        assert_eq!(manager.current().unwrap().message, "Share link copied!");
    }

    #[test]
    fn manager_dismiss_current() {
        let mut manager = NotificationManager::new();

        manager.info("First");
        manager.info("Second");

        assert!(manager.dismiss_current());
        assert_eq!(manager.count(), 1);
        assert_eq!(manager.current().unwrap().message, "First");
    }
}
