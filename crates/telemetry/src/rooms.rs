//! Named broadcast rooms with explicit membership.

use std::collections::HashSet;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::events::TelemetryEvent;

/// Room all dashboard connections join for live telemetry.
pub const MONITOR_ROOM: &str = "livestock-monitor";

/// Identifier of one joined connection.
pub type ConnectionId = Uuid;

/// Buffered events per room before slow receivers start lagging.
const ROOM_BUFFER: usize = 256;

struct Room {
    tx: broadcast::Sender<TelemetryEvent>,
    members: HashSet<ConnectionId>,
}

impl Room {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(ROOM_BUFFER);
        Self {
            tx,
            members: HashSet::new(),
        }
    }
}

/// Named fan-out rooms.
///
/// Membership is an explicit id set, not the channel's receiver count: a
/// receiver handle can outlive its socket for a short window and must not
/// keep the monitor evaluating.
#[derive(Default)]
pub struct Broadcaster {
    rooms: DashMap<String, Room>,
}

impl Broadcaster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Join a room, creating it on first use.
    pub fn join(
        &self,
        room: &str,
        connection: ConnectionId,
    ) -> broadcast::Receiver<TelemetryEvent> {
        let mut entry = self
            .rooms
            .entry(room.to_string())
            .or_insert_with(Room::new);
        entry.members.insert(connection);
        debug!(room, %connection, members = entry.members.len(), "connection joined");
        entry.tx.subscribe()
    }

    /// Leave a room. Unknown rooms and connections are ignored.
    pub fn leave(&self, room: &str, connection: ConnectionId) {
        if let Some(mut entry) = self.rooms.get_mut(room) {
            entry.members.remove(&connection);
            debug!(room, %connection, members = entry.members.len(), "connection left");
        }
    }

    /// Number of currently joined connections.
    #[must_use]
    pub fn member_count(&self, room: &str) -> usize {
        self.rooms.get(room).map_or(0, |r| r.members.len())
    }

    /// Send an event to every member of a room.
    ///
    /// Returns the number of receivers reached; 0 for an unknown or empty
    /// room.
    pub fn broadcast(&self, room: &str, event: TelemetryEvent) -> usize {
        let Some(entry) = self.rooms.get(room) else {
            return 0;
        };
        if entry.members.is_empty() {
            return 0;
        }
        entry.tx.send(event).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ping(room: &str) -> TelemetryEvent {
        TelemetryEvent::Connected {
            room: room.to_string(),
        }
    }

    #[tokio::test]
    async fn joined_connection_receives_broadcast() {
        let broadcaster = Broadcaster::new();
        let mut rx = broadcaster.join(MONITOR_ROOM, Uuid::new_v4());

        let delivered = broadcaster.broadcast(MONITOR_ROOM, ping(MONITOR_ROOM));
        assert_eq!(delivered, 1);
        assert_eq!(rx.recv().await.unwrap(), ping(MONITOR_ROOM));
    }

    #[tokio::test]
    async fn membership_is_reference_counted() {
        let broadcaster = Broadcaster::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let _rx_a = broadcaster.join(MONITOR_ROOM, a);
        let _rx_b = broadcaster.join(MONITOR_ROOM, b);
        assert_eq!(broadcaster.member_count(MONITOR_ROOM), 2);

        broadcaster.leave(MONITOR_ROOM, a);
        assert_eq!(broadcaster.member_count(MONITOR_ROOM), 1);

        broadcaster.leave(MONITOR_ROOM, b);
        assert_eq!(broadcaster.member_count(MONITOR_ROOM), 0);
    }

    #[tokio::test]
    async fn empty_room_broadcast_reaches_nobody() {
        let broadcaster = Broadcaster::new();
        assert_eq!(broadcaster.broadcast(MONITOR_ROOM, ping(MONITOR_ROOM)), 0);

        // A member that joined and left again does not count either, even
        // though its receiver handle may still be alive.
        let id = Uuid::new_v4();
        let _rx = broadcaster.join(MONITOR_ROOM, id);
        broadcaster.leave(MONITOR_ROOM, id);
        assert_eq!(broadcaster.broadcast(MONITOR_ROOM, ping(MONITOR_ROOM)), 0);
    }

    #[tokio::test]
    async fn rooms_are_isolated() {
        let broadcaster = Broadcaster::new();
        let mut rx = broadcaster.join("herd-a", Uuid::new_v4());
        let _other = broadcaster.join("herd-b", Uuid::new_v4());

        broadcaster.broadcast("herd-b", ping("herd-b"));
        broadcaster.broadcast("herd-a", ping("herd-a"));

        assert_eq!(rx.recv().await.unwrap(), ping("herd-a"));
    }

    #[test]
    fn unknown_room_has_no_members() {
        let broadcaster = Broadcaster::new();
        assert_eq!(broadcaster.member_count("nowhere"), 0);
    }
}
