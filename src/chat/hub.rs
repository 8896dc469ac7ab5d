//! Room registry and message fan-out.
//!
//! The [`Hub`] owns every room and its members. It runs as a single task
//! and is only ever reached through a [`HubHandle`], which submits events
//! over a bounded channel. Events are processed one at a time in the order
//! they were received, so membership changes and broadcasts to a room are
//! totally ordered.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::message::{Message, MessageType};

/// Identifier of one live connection.
pub type ClientId = Uuid;

/// Error returned when the hub task is no longer running.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("hub is not running")]
pub struct HubClosed;

/// Everything the hub needs to admit a connection into a room.
#[derive(Debug)]
pub struct Registration {
    /// Connection identifier.
    pub client_id: ClientId,
    /// Authenticated user ID.
    pub user_id: String,
    /// Display name.
    pub username: String,
    /// Room to join.
    pub room_id: String,
    /// Sending half of the connection's outbound queue.
    pub sender: mpsc::Sender<String>,
}

/// Information about an active room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomInfo {
    /// Room ID.
    pub room_id: String,
    /// Number of registered connections.
    pub member_count: usize,
}

enum HubEvent {
    Register(Registration),
    Unregister { client_id: ClientId, room_id: String },
    Broadcast(Message),
    Rooms(oneshot::Sender<Vec<RoomInfo>>),
}

/// A registered connection.
///
/// The hub holds the only sender of the connection's outbound queue, so
/// dropping a member closes that queue.
struct Member {
    user_id: String,
    username: String,
    sender: mpsc::Sender<String>,
}

/// Cloneable handle used to submit events to the hub.
#[derive(Clone)]
pub struct HubHandle {
    events: mpsc::Sender<HubEvent>,
}

impl HubHandle {
    /// Admit a connection into its room.
    pub async fn register(&self, registration: Registration) -> Result<(), HubClosed> {
        self.send(HubEvent::Register(registration)).await
    }

    /// Remove a connection from its room. Unknown connections are ignored.
    pub async fn unregister(
        &self,
        client_id: ClientId,
        room_id: impl Into<String>,
    ) -> Result<(), HubClosed> {
        self.send(HubEvent::Unregister {
            client_id,
            room_id: room_id.into(),
        })
        .await
    }

    /// Fan a message out to every connection in `message.room_id`.
    pub async fn broadcast(&self, message: Message) -> Result<(), HubClosed> {
        self.send(HubEvent::Broadcast(message)).await
    }

    /// Snapshot of the active rooms, sorted by room ID.
    pub async fn rooms(&self) -> Result<Vec<RoomInfo>, HubClosed> {
        let (reply, response) = oneshot::channel();
        self.send(HubEvent::Rooms(reply)).await?;
        response.await.map_err(|_| HubClosed)
    }

    async fn send(&self, event: HubEvent) -> Result<(), HubClosed> {
        self.events.send(event).await.map_err(|_| HubClosed)
    }
}

/// The room registry and its control loop.
pub struct Hub {
    rooms: HashMap<String, HashMap<ClientId, Member>>,
    events: mpsc::Receiver<HubEvent>,
}

impl Hub {
    /// Create a hub and the handle that feeds it.
    pub fn new(event_buffer: usize) -> (Self, HubHandle) {
        let (sender, events) = mpsc::channel(event_buffer);
        let hub = Self {
            rooms: HashMap::new(),
            events,
        };
        (hub, HubHandle { events: sender })
    }

    /// Create a hub and run it on its own task.
    pub fn spawn(event_buffer: usize) -> HubHandle {
        let (hub, handle) = Self::new(event_buffer);
        tokio::spawn(hub.run());
        handle
    }

    /// Process events until every handle has been dropped.
    pub async fn run(mut self) {
        tracing::debug!("Hub started");
        while let Some(event) = self.events.recv().await {
            self.handle(event);
        }
        tracing::info!("Hub stopped: all handles dropped");
    }

    fn handle(&mut self, event: HubEvent) {
        match event {
            HubEvent::Register(registration) => self.register(registration),
            HubEvent::Unregister { client_id, room_id } => self.unregister(client_id, &room_id),
            HubEvent::Broadcast(message) => {
                tracing::debug!(
                    room_id = %message.room_id,
                    kind = %message.kind,
                    members = self.rooms.get(&message.room_id).map_or(0, HashMap::len),
                    "Broadcast"
                );
                self.broadcast(&message);
            }
            HubEvent::Rooms(reply) => {
                let _ = reply.send(self.room_infos());
            }
        }
    }

    fn register(&mut self, registration: Registration) {
        let Registration {
            client_id,
            user_id,
            username,
            room_id,
            sender,
        } = registration;

        let room = self.rooms.entry(room_id.clone()).or_default();

        // Last connection wins: an earlier session of the same user is closed first.
        let stale: Vec<ClientId> = room
            .iter()
            .filter(|(_, member)| member.user_id == user_id)
            .map(|(id, _)| *id)
            .collect();
        for id in stale {
            room.remove(&id);
            tracing::info!(
                "User {} already in room {}, closing old connection {}",
                user_id,
                room_id,
                id
            );
        }

        room.insert(
            client_id,
            Member {
                user_id: user_id.clone(),
                username: username.clone(),
                sender,
            },
        );
        tracing::info!("Client {} ({}) joined room {}", username, user_id, room_id);

        self.broadcast(&Message::user_joined(user_id, username, room_id));
    }

    fn unregister(&mut self, client_id: ClientId, room_id: &str) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        let Some(member) = room.remove(&client_id) else {
            tracing::debug!("Client {} already removed from room {}", client_id, room_id);
            return;
        };

        tracing::info!(
            "Client {} ({}) left room {}",
            member.username,
            member.user_id,
            room_id
        );
        let Member {
            user_id, username, ..
        } = member;

        if room.is_empty() {
            self.rooms.remove(room_id);
            tracing::debug!("Room {} deleted", room_id);
        } else {
            self.broadcast(&Message::user_left(user_id, username, room_id));
        }
    }

    fn broadcast(&mut self, message: &Message) {
        let Some(room) = self.rooms.get_mut(&message.room_id) else {
            tracing::debug!(
                "Dropping {} message for unknown room {}",
                message.kind.as_str(),
                message.room_id
            );
            return;
        };

        match message.kind {
            MessageType::Chat | MessageType::Command => {
                tracing::trace!("Message from {} to room {}", message.user_id, message.room_id);
            }
            MessageType::UserJoined | MessageType::UserLeft => {
                tracing::debug!("Presence update in room {}: {}", message.room_id, message.content);
            }
            MessageType::Bot | MessageType::Invalid | MessageType::Error => {
                tracing::debug!(
                    "Bot {} message to room {}",
                    message.kind.as_str(),
                    message.room_id
                );
            }
        }

        let payload = match serde_json::to_string(message) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Failed to serialize message for {}: {}", message.room_id, e);
                return;
            }
        };

        let mut evicted = Vec::new();
        for (id, member) in room.iter() {
            match member.sender.try_send(payload.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        "Outbound queue full for {} in room {}, disconnecting",
                        member.username,
                        message.room_id
                    );
                    evicted.push(*id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!("Outbound queue closed for client {}", id);
                    evicted.push(*id);
                }
            }
        }

        for id in evicted {
            room.remove(&id);
        }
        if room.is_empty() {
            self.rooms.remove(&message.room_id);
            tracing::debug!("Room {} deleted", message.room_id);
        }
    }

    fn room_infos(&self) -> Vec<RoomInfo> {
        let mut rooms: Vec<RoomInfo> = self
            .rooms
            .iter()
            .map(|(id, members)| RoomInfo {
                room_id: id.clone(),
                member_count: members.len(),
            })
            .collect();
        rooms.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        rooms
    }
}
