//! Shared fixtures for tests that run against a mock review service.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;

use room_reviews::api::{BasicAuthSigner, ReviewClient};

pub const USERNAME: &str = "frontdesk";
pub const PASSWORD: &str = "secret";
/// base64("frontdesk:secret")
pub const BASIC_AUTH: &str = "Basic ZnJvbnRkZXNrOnNlY3JldA==";
pub const PAGE_SIZE: u32 = 5;

pub fn client_for(base_url: &str) -> ReviewClient {
    ReviewClient::with_signer(
        base_url,
        PAGE_SIZE,
        Arc::new(BasicAuthSigner::new(USERNAME, PASSWORD)),
    )
}

pub fn review_json(review_id: u64, room_id: u64, rating: u8, name: &str) -> Value {
    json!({
        "reviewId": review_id,
        "roomId": room_id,
        "bookingId": 1000 + review_id,
        "rating": rating,
        "comment": format!("Stay number {}, lovely room.", review_id),
        "reviewerName": name,
        "reviewerEmail": format!("{}@example.com", name.to_lowercase()),
        "createdAt": "2024-03-01T10:15:30"
    })
}

/// A consistent page body: `first`/`last` follow from `number` and `total_pages`.
pub fn page_json(content: Vec<Value>, number: u32, total_pages: u32, total_elements: u64) -> Value {
    json!({
        "numberOfElements": content.len(),
        "empty": content.is_empty(),
        "content": content,
        "totalElements": total_elements,
        "totalPages": total_pages,
        "size": PAGE_SIZE,
        "number": number,
        "first": number == 0,
        "last": total_pages == 0 || number + 1 >= total_pages
    })
}

/// Stats where every review carries the same rating.
pub fn stats_json(total: u64, rating: u8) -> Value {
    let mut distribution = serde_json::Map::new();
    for r in 1..=5u8 {
        let count = if r == rating { total } else { 0 };
        distribution.insert(r.to_string(), json!(count));
    }
    json!({
        "averageRating": if total == 0 { Value::Null } else { json!(rating as f64) },
        "totalReviews": total,
        "ratingDistribution": distribution
    })
}

pub fn config_json(enabled: bool, reason: Option<&str>) -> Value {
    json!({
        "enabled": enabled,
        "scope": "HOTEL",
        "reason": reason
    })
}
