//! Room listing handler.

use axum::{extract::State, Json};

use crate::chat::{HubHandle, RoomInfo};
use crate::web::error::ApiError;

/// List active rooms.
///
/// GET /api/rooms
///
/// Only rooms with at least one connected member are returned, sorted by
/// room ID.
pub async fn list_rooms(State(hub): State<HubHandle>) -> Result<Json<Vec<RoomInfo>>, ApiError> {
    let rooms = hub.rooms().await?;
    Ok(Json(rooms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Hub, Registration};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_list_rooms() {
        let hub = Hub::spawn(16);
        let (tx, _rx) = mpsc::channel(4);
        hub.register(Registration {
            client_id: uuid::Uuid::new_v4(),
            user_id: "u1".to_string(),
            username: "alice".to_string(),
            room_id: "general".to_string(),
            sender: tx,
        })
        .await
        .unwrap();

        let Json(rooms) = list_rooms(State(hub)).await.unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].room_id, "general");
        assert_eq!(rooms[0].member_count, 1);
    }

    #[tokio::test]
    async fn test_list_rooms_hub_stopped() {
        let (hub, handle) = Hub::new(4);
        drop(hub);

        let err = list_rooms(State(handle)).await.unwrap_err();
        assert_eq!(err.code(), crate::web::error::ErrorCode::ServiceUnavailable);
    }
}
