use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::config::Config;
use crate::error::ApiError;
use crate::review::{
    CreateReviewRequest, PaginatedResponse, Review, ReviewConfig, ReviewQuery, ReviewStats,
};
use crate::room::{HotelId, RoomId};

const CONFIG_PATH: &str = "/api/config/reviews";
const REVIEWS_PATH: &str = "/api/reviews";
const REVIEWS_BY_ROOM_PATH: &str = "/api/reviews/room";
const REVIEW_STATS_PATH: &str = "/api/reviews/stats";

/// Hook applied to every outgoing request before it is sent.
pub trait RequestSigner: Send + Sync {
    fn sign(&self, request: RequestBuilder) -> RequestBuilder;
}

/// Adds HTTP basic credentials.
pub struct BasicAuthSigner {
    header: String,
}

impl BasicAuthSigner {
    pub fn new(username: &str, password: &str) -> Self {
        let credentials = STANDARD.encode(format!("{}:{}", username, password));
        Self {
            header: format!("Basic {}", credentials),
        }
    }
}

impl RequestSigner for BasicAuthSigner {
    fn sign(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(reqwest::header::AUTHORIZATION, &self.header)
    }
}

/// Typed access to the review service. Every failure comes back as an [`ApiError`].
#[derive(Clone)]
pub struct ReviewClient {
    client: Client,
    base_url: String,
    default_page_size: u32,
    signer: Arc<dyn RequestSigner>,
}

impl ReviewClient {
    pub fn new(config: &Config) -> Self {
        Self::with_signer(
            &config.base_url,
            config.page_size,
            Arc::new(BasicAuthSigner::new(&config.username, &config.password)),
        )
    }

    pub fn with_signer(base_url: &str, default_page_size: u32, signer: Arc<dyn RequestSigner>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            default_page_size,
            signer,
        }
    }

    pub fn default_page_size(&self) -> u32 {
        self.default_page_size
    }

    pub async fn get_config(&self, hotel_id: HotelId) -> Result<ReviewConfig, ApiError> {
        let url = format!("{}{}", self.base_url, CONFIG_PATH);
        let request = self.client.get(&url).query(&[("hotelId", hotel_id)]);
        self.send(request).await
    }

    pub async fn get_reviews_by_room(
        &self,
        room_id: RoomId,
        query: &ReviewQuery,
    ) -> Result<PaginatedResponse<Review>, ApiError> {
        let url = format!("{}{}/{}", self.base_url, REVIEWS_BY_ROOM_PATH, room_id);
        let page = query.page.unwrap_or(0).to_string();
        let size = query.size.unwrap_or(self.default_page_size).to_string();
        let sort_by = query.sort_by.unwrap_or_default();

        let request = self.client.get(&url).query(&[
            ("page", page.as_str()),
            ("size", size.as_str()),
            ("sortBy", sort_by.as_query()),
        ]);

        let page: PaginatedResponse<Review> = self.send(request).await?;
        page.check_consistency().map_err(|e| {
            warn!("Rejecting reviews page for room {}: {}", room_id, e);
            ApiError::malformed()
        })?;
        Ok(page)
    }

    pub async fn get_review_stats(&self, room_id: RoomId) -> Result<ReviewStats, ApiError> {
        let url = format!("{}{}/{}", self.base_url, REVIEW_STATS_PATH, room_id);
        let stats: ReviewStats = self.send(self.client.get(&url)).await?;
        stats.check_consistency().map_err(|e| {
            warn!("Rejecting stats for room {}: {}", room_id, e);
            ApiError::malformed()
        })?;
        Ok(stats)
    }

    pub async fn create_review(&self, review: &CreateReviewRequest) -> Result<Review, ApiError> {
        let url = format!("{}{}", self.base_url, REVIEWS_PATH);
        self.send(self.client.post(&url).json(review)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let request = self.signer.sign(request);

        let response = request.send().await.map_err(|e| {
            warn!("Request to review service failed: {}", e);
            ApiError::network()
        })?;

        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url());

        if !status.is_success() {
            return Err(classify_failure(response).await);
        }

        let body = response.text().await.map_err(|e| {
            warn!("Failed to read response body: {}", e);
            ApiError::network()
        })?;

        serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to parse response: {}. Response was: {}", e, body);
            ApiError::malformed()
        })
    }
}

async fn classify_failure(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let error = ApiError::from_response(status, &body);
    debug!("Classified status {} as {}", status, error.kind);
    error
}
