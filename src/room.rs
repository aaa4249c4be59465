use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub type RoomId = u64;
pub type HotelId = u64;

/// Room metadata owned by the booking engine. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: RoomId,
    pub room_number: String,
    pub hotel_id: HotelId,
}

/// A room joined with its review summary. Rebuilt whole, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomWithStats {
    pub room_id: RoomId,
    pub room_number: String,
    pub hotel_id: HotelId,
    pub average_rating: Option<f64>,
    pub total_reviews: u64,
}

/// The upstream room list, either the built-in catalog or one read from a JSON file.
#[derive(Debug, Clone)]
pub struct RoomCatalog {
    rooms: Vec<Room>,
}

impl Default for RoomCatalog {
    fn default() -> Self {
        let rooms = [
            (1, "101", 1),
            (2, "102", 1),
            (3, "103", 2),
            (4, "104", 1),
            (5, "105", 1),
            (6, "201", 1),
            (7, "202", 1),
            (8, "203", 1),
            (9, "301", 1),
            (10, "302", 1),
        ]
        .into_iter()
        .map(|(room_id, number, hotel_id)| Room {
            room_id,
            room_number: number.to_string(),
            hotel_id,
        })
        .collect();

        Self { rooms }
    }
}

impl RoomCatalog {
    pub fn new(rooms: Vec<Room>) -> Self {
        Self { rooms }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read room catalog {}: {}", path.display(), e))?;
        let rooms: Vec<Room> = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse room catalog {}: {}", path.display(), e))?;
        Ok(Self { rooms })
    }

    pub fn rooms(&self) -> Vec<Room> {
        self.rooms.clone()
    }

    pub fn find(&self, room_id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|room| room.room_id == room_id)
    }

    /// Hotel owning the room. Unknown rooms fall back to their own id.
    pub fn hotel_for(&self, room_id: RoomId) -> HotelId {
        self.find(room_id).map(|room| room.hotel_id).unwrap_or(room_id)
    }
}
