use futures::future::join_all;
use log::{info, warn};
use std::collections::HashMap;

use crate::api::ReviewClient;
use crate::error::ApiError;
use crate::review::ReviewStats;
use crate::room::{Room, RoomCatalog, RoomId, RoomWithStats};

/// The part of a room's stats shown next to it in the room list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSummary {
    pub average_rating: Option<f64>,
    pub total_reviews: u64,
}

impl StatsSummary {
    pub fn unrated() -> Self {
        Self {
            average_rating: None,
            total_reviews: 0,
        }
    }
}

impl From<&ReviewStats> for StatsSummary {
    fn from(stats: &ReviewStats) -> Self {
        Self {
            average_rating: stats.average_rating,
            total_reviews: stats.total_reviews,
        }
    }
}

/// Join rooms with their stats, in room order. Rooms without stats read as unrated.
pub fn join_rooms_with_stats(
    rooms: &[Room],
    stats: &HashMap<RoomId, StatsSummary>,
) -> Vec<RoomWithStats> {
    rooms
        .iter()
        .map(|room| {
            let summary = stats
                .get(&room.room_id)
                .copied()
                .unwrap_or_else(StatsSummary::unrated);
            RoomWithStats {
                room_id: room.room_id,
                room_number: room.room_number.clone(),
                hotel_id: room.hotel_id,
                average_rating: summary.average_rating,
                total_reviews: summary.total_reviews,
            }
        })
        .collect()
}

/// Room list shared across views, plus the per-room rating summary.
pub struct RoomStore {
    client: ReviewClient,
    catalog: RoomCatalog,
    rooms: Vec<Room>,
    stats: HashMap<RoomId, StatsSummary>,
    rooms_with_stats: Vec<RoomWithStats>,
}

impl RoomStore {
    pub fn new(client: ReviewClient, catalog: RoomCatalog) -> Self {
        Self {
            client,
            catalog,
            rooms: Vec::new(),
            stats: HashMap::new(),
            rooms_with_stats: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &RoomCatalog {
        &self.catalog
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn rooms_with_stats(&self) -> &[RoomWithStats] {
        &self.rooms_with_stats
    }

    /// Replace the room list. The joined list is rebuilt from scratch.
    pub fn set_rooms(&mut self, rooms: Vec<Room>) {
        self.rooms = rooms;
        self.stats.retain(|id, _| self.rooms.iter().any(|room| room.room_id == *id));
        self.publish();
    }

    /// Pull the room list from the booking engine's catalog.
    pub fn load_rooms(&mut self) {
        let rooms = self.catalog.rooms();
        info!("Loaded {} rooms", rooms.len());
        self.set_rooms(rooms);
    }

    /// Record stats for one room, e.g. after a room view refreshed them.
    pub fn update_stats(&mut self, room_id: RoomId, stats: &ReviewStats) {
        self.stats.insert(room_id, StatsSummary::from(stats));
        self.publish();
    }

    /// Fetch stats for every held room concurrently and publish once all settle.
    ///
    /// A room whose request fails is shown as unrated; it never fails the batch.
    pub async fn load_rooms_with_stats(&mut self) -> &[RoomWithStats] {
        let results = fetch_all_stats(&self.client, &self.rooms).await;
        let mut failed = 0;
        let stats: HashMap<RoomId, StatsSummary> = results
            .into_iter()
            .map(|(room_id, result)| {
                let summary = match result {
                    Ok(stats) => StatsSummary::from(&stats),
                    Err(e) => {
                        failed += 1;
                        warn!("Stats for room {} unavailable: {}", room_id, e);
                        StatsSummary::unrated()
                    }
                };
                (room_id, summary)
            })
            .collect();

        if failed > 0 {
            info!("{} of {} rooms fell back to no rating", failed, self.rooms.len());
        }

        self.stats = stats;
        self.publish();
        &self.rooms_with_stats
    }

    fn publish(&mut self) {
        self.rooms_with_stats = join_rooms_with_stats(&self.rooms, &self.stats);
    }
}

async fn fetch_all_stats(
    client: &ReviewClient,
    rooms: &[Room],
) -> Vec<(RoomId, Result<ReviewStats, ApiError>)> {
    let requests = rooms.iter().map(|room| {
        let room_id = room.room_id;
        async move { (room_id, client.get_review_stats(room_id).await) }
    });
    join_all(requests).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(room_id: RoomId, number: &str) -> Room {
        Room {
            room_id,
            room_number: number.to_string(),
            hotel_id: 1,
        }
    }

    #[test]
    fn join_keeps_room_order_and_defaults_missing_stats() {
        let rooms = vec![room(3, "103"), room(1, "101"), room(2, "102")];
        let stats = HashMap::from([
            (1, StatsSummary { average_rating: Some(4.5), total_reviews: 2 }),
            (3, StatsSummary { average_rating: Some(3.0), total_reviews: 1 }),
        ]);

        let joined = join_rooms_with_stats(&rooms, &stats);
        let ids: Vec<RoomId> = joined.iter().map(|r| r.room_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(joined[0].average_rating, Some(3.0));
        assert_eq!(joined[2].average_rating, None);
        assert_eq!(joined[2].total_reviews, 0);
    }

    #[test]
    fn summary_comes_from_full_stats() {
        let summary = StatsSummary::from(&ReviewStats::empty());
        assert_eq!(summary, StatsSummary::unrated());
    }
}
