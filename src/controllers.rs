use log::info;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::api::ReviewClient;
use crate::error::ApiError;
use crate::resource::{RemoteState, Resource};
use crate::review::{PaginatedResponse, Review, ReviewConfig, ReviewQuery, ReviewStats, SortOrder};
use crate::room::{HotelId, RoomId};

/// Review submission settings for one hotel.
#[derive(Clone)]
pub struct ConfigController {
    client: ReviewClient,
    resource: Resource<HotelId, ReviewConfig>,
}

impl ConfigController {
    pub fn new(client: ReviewClient) -> Self {
        Self {
            client,
            resource: Resource::new(),
        }
    }

    pub fn state(&self) -> RemoteState<ReviewConfig> {
        self.resource.state()
    }

    pub async fn load(&self, hotel_id: HotelId) -> RemoteState<ReviewConfig> {
        let client = self.client.clone();
        self.resource
            .load(hotel_id, |id| async move { client.get_config(id).await })
            .await
    }

    /// Load only when the hotel differs from the last one requested.
    pub async fn set_hotel(&self, hotel_id: HotelId) -> RemoteState<ReviewConfig> {
        if self.resource.key() == Some(hotel_id) {
            return self.state();
        }
        self.load(hotel_id).await
    }

    pub async fn refetch(&self) -> RemoteState<ReviewConfig> {
        let client = self.client.clone();
        self.resource
            .refetch(|id| async move { client.get_config(id).await })
            .await
    }
}

/// Aggregate rating statistics for one room.
#[derive(Clone)]
pub struct StatsController {
    client: ReviewClient,
    resource: Resource<RoomId, ReviewStats>,
}

impl StatsController {
    pub fn new(client: ReviewClient) -> Self {
        Self {
            client,
            resource: Resource::new(),
        }
    }

    pub fn state(&self) -> RemoteState<ReviewStats> {
        self.resource.state()
    }

    pub async fn load(&self, room_id: RoomId) -> RemoteState<ReviewStats> {
        let client = self.client.clone();
        self.resource
            .load(room_id, |id| fetch_stats(client, id))
            .await
    }

    pub async fn set_room(&self, room_id: RoomId) -> RemoteState<ReviewStats> {
        if self.resource.key() == Some(room_id) {
            return self.state();
        }
        self.load(room_id).await
    }

    pub async fn refetch(&self) -> RemoteState<ReviewStats> {
        let client = self.client.clone();
        self.resource.refetch(|id| fetch_stats(client, id)).await
    }
}

async fn fetch_stats(client: ReviewClient, room_id: RoomId) -> Result<ReviewStats, ApiError> {
    match client.get_review_stats(room_id).await {
        Err(error) if error.is_not_found() => {
            info!("No stats for room {}, treating as no reviews", room_id);
            Ok(ReviewStats::empty())
        }
        other => other,
    }
}

/// Parameters identifying one page of a room's reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub room_id: RoomId,
    pub page: u32,
    pub sort: SortOrder,
}

impl ListQuery {
    pub fn first_page(room_id: RoomId) -> Self {
        Self {
            room_id,
            page: 0,
            sort: SortOrder::default(),
        }
    }
}

/// Paginated, sortable reviews for one room.
///
/// The current page and sort live behind a shared lock, so a refetch fired
/// from anywhere (for instance after a submission) targets whatever the user
/// is looking at when it runs.
#[derive(Clone)]
pub struct ReviewListController {
    client: ReviewClient,
    resource: Resource<ListQuery, PaginatedResponse<Review>>,
    params: Arc<Mutex<Option<ListQuery>>>,
    page_size: u32,
}

impl ReviewListController {
    pub fn new(client: ReviewClient) -> Self {
        let page_size = client.default_page_size();
        Self {
            client,
            resource: Resource::new(),
            params: Arc::new(Mutex::new(None)),
            page_size,
        }
    }

    pub fn state(&self) -> RemoteState<PaginatedResponse<Review>> {
        self.resource.state()
    }

    pub fn query(&self) -> Option<ListQuery> {
        *self.params.lock()
    }

    pub fn page(&self) -> u32 {
        self.query().map(|q| q.page).unwrap_or(0)
    }

    pub fn sort(&self) -> SortOrder {
        self.query().map(|q| q.sort).unwrap_or_default()
    }

    /// Switch rooms. Page and sort go back to their defaults.
    pub async fn set_room(&self, room_id: RoomId) -> RemoteState<PaginatedResponse<Review>> {
        let changed = {
            let mut params = self.params.lock();
            if (*params).map(|q| q.room_id) == Some(room_id) {
                false
            } else {
                *params = Some(ListQuery::first_page(room_id));
                true
            }
        };
        if !changed {
            return self.state();
        }
        self.refetch().await
    }

    pub async fn set_page(&self, page: u32) -> RemoteState<PaginatedResponse<Review>> {
        if !self.update(|q| q.page = page) {
            return self.state();
        }
        self.refetch().await
    }

    /// Changing the sort always returns to the first page.
    pub async fn set_sort(&self, sort: SortOrder) -> RemoteState<PaginatedResponse<Review>> {
        if !self.update(|q| {
            q.sort = sort;
            q.page = 0;
        }) {
            return self.state();
        }
        self.refetch().await
    }

    pub async fn next_page(&self) -> RemoteState<PaginatedResponse<Review>> {
        match self.state().data() {
            Some(page) if !page.last => self.set_page(page.number.saturating_add(1)).await,
            _ => self.state(),
        }
    }

    pub async fn previous_page(&self) -> RemoteState<PaginatedResponse<Review>> {
        match self.state().data() {
            Some(page) if !page.first && page.number > 0 => self.set_page(page.number - 1).await,
            _ => self.state(),
        }
    }

    /// Load the page and sort in effect at call time.
    pub async fn refetch(&self) -> RemoteState<PaginatedResponse<Review>> {
        let Some(query) = self.query() else {
            return self.state();
        };
        let client = self.client.clone();
        let page_size = self.page_size;
        self.resource
            .load(query, |q| fetch_page(client, q, page_size))
            .await
    }

    fn update(&self, change: impl FnOnce(&mut ListQuery)) -> bool {
        match self.params.lock().as_mut() {
            Some(query) => {
                change(query);
                true
            }
            None => false,
        }
    }
}

async fn fetch_page(
    client: ReviewClient,
    query: ListQuery,
    page_size: u32,
) -> Result<PaginatedResponse<Review>, ApiError> {
    let request = ReviewQuery {
        page: Some(query.page),
        size: Some(page_size),
        sort_by: Some(query.sort),
    };
    match client.get_reviews_by_room(query.room_id, &request).await {
        Err(error) if error.is_not_found() => {
            info!("No reviews for room {}, showing empty page", query.room_id);
            Ok(PaginatedResponse::empty_page(page_size))
        }
        other => other,
    }
}
