//! Session lifecycle notifications published by the client.

use tokio::sync::broadcast;

/// Capacity of the event channel. Slow subscribers skip older events.
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Events published when the client changes the session on its own.
///
/// Subscribe with [`ApiClient::subscribe`](crate::ApiClient::subscribe). An
/// [`Expired`](SessionEvent::Expired) event means the credential store has
/// been cleared; the application should return the user to its login screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The credential could not be recovered and has been cleared.
    Expired {
        /// Why the session ended.
        reason: String,
    },
}

pub(crate) fn channel() -> broadcast::Sender<SessionEvent> {
    broadcast::channel(EVENT_CHANNEL_CAPACITY).0
}
