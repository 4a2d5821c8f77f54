//! Delivery of user-facing reassignment notifications.

use bedassign_types::Notification;

/// Receives notifications for every successful reassignment.
///
/// Hosts typically forward these to their message log and highlight the
/// listed agents.
pub trait NotificationSink {
    /// Deliver one notification.
    fn notify(&mut self, notification: Notification);
}

impl NotificationSink for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}
