// crates/reeldeck-core/src/modules/notifications.rs
//
// §4.7 "Notifications": a bounded ring of non-persistent user-facing items.
// Phase-1 leaf module — every other module can push into it without a
// dependency cycle.

use crate::broadcaster::{Broadcaster, SubscriptionId};
use crate::ids::CommandId;

const MAX_CONCURRENT: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl NotificationLevel {
    /// §4.7 default durations.
    pub fn default_duration_ms(self) -> u64 {
        match self {
            NotificationLevel::Success => 3_000,
            NotificationLevel::Info => 5_000,
            NotificationLevel::Warning => 6_000,
            NotificationLevel::Error => 8_000,
        }
    }

    fn deduplicates(self) -> bool {
        !matches!(self, NotificationLevel::Error)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NotificationId(pub uuid::Uuid);

impl NotificationId {
    fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub level: NotificationLevel,
    pub message: String,
    pub duration_ms: u64,
}

pub struct NotificationsModule {
    items: Vec<Notification>,
    broadcaster: Broadcaster<Vec<Notification>>,
}

impl NotificationsModule {
    pub fn new() -> Self {
        Self { items: Vec::new(), broadcaster: Broadcaster::new() }
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    /// Push a notification, de-duplicating non-error levels on message text
    /// and evicting the oldest entry once the ring is full (§4.7).
    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>) -> NotificationId {
        let message = message.into();
        if level.deduplicates() {
            if let Some(existing) = self.items.iter().find(|n| n.level == level && n.message == message) {
                let id = existing.id;
                self.notify();
                return id;
            }
        }
        let notification = Notification {
            id: NotificationId::new(),
            duration_ms: level.default_duration_ms(),
            level,
            message,
        };
        let id = notification.id;
        if self.items.len() >= MAX_CONCURRENT {
            self.items.remove(0);
        }
        self.items.push(notification);
        self.notify();
        id
    }

    pub fn dismiss(&mut self, id: NotificationId) {
        self.items.retain(|n| n.id != id);
        self.notify();
    }

    /// Convenience used by command-execution failure reporting (§4.3, §7).
    pub fn command_failed(&mut self, command_id: CommandId, message: impl Into<String>) -> NotificationId {
        let message = message.into();
        tracing::warn!(%command_id, %message, "command execution failed");
        self.push(NotificationLevel::Error, message)
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&Vec<Notification>)>) -> SubscriptionId {
        self.broadcaster.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.broadcaster.unsubscribe(id);
    }

    fn notify(&self) {
        self.broadcaster.notify(&self.items);
    }
}

impl Default for NotificationsModule {
    fn default() -> Self {
        Self::new()
    }
}
