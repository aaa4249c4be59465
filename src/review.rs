use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::room::RoomId;

pub type ReviewId = u64;
pub type BookingId = u64;

pub const RATING_MIN: u8 = 1;
pub const RATING_MAX: u8 = 5;
pub const COMMENT_MAX_LENGTH: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub review_id: ReviewId,
    pub room_id: RoomId,
    pub booking_id: BookingId,
    pub rating: u8,
    pub comment: String,
    pub reviewer_name: String,
    pub reviewer_email: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Accepts RFC 3339 timestamps as well as zone-less ones, which are read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {:?}: {}", raw, e)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub average_rating: Option<f64>,
    pub total_reviews: u64,
    #[serde(default)]
    pub rating_distribution: BTreeMap<u8, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("stats report {total} reviews but average rating is {average}")]
    AverageMismatch { total: u64, average: String },

    #[error("rating distribution sums to {sum}, expected {total}")]
    DistributionMismatch { sum: u64, total: u64 },

    #[error("page reports empty={empty} but holds {len} items")]
    EmptyFlagMismatch { empty: bool, len: usize },

    #[error("page {number} of {total_pages} reports first={first}, last={last}")]
    BoundsMismatch {
        number: u32,
        total_pages: u32,
        first: bool,
        last: bool,
    },
}

impl ReviewStats {
    /// The zero-stats object used when a room has no reviews yet.
    pub fn empty() -> Self {
        Self {
            average_rating: None,
            total_reviews: 0,
            rating_distribution: (RATING_MIN..=RATING_MAX).map(|r| (r, 0)).collect(),
        }
    }

    pub fn is_empty_state(&self) -> bool {
        crate::error::is_empty_state(self.total_reviews, self.average_rating)
    }

    pub fn count_for(&self, rating: u8) -> u64 {
        self.rating_distribution.get(&rating).copied().unwrap_or(0)
    }

    /// Share of reviews with the given rating, in percent.
    pub fn percentage_for(&self, rating: u8) -> f64 {
        if self.total_reviews == 0 {
            return 0.0;
        }
        self.count_for(rating) as f64 / self.total_reviews as f64 * 100.0
    }

    pub fn check_consistency(&self) -> Result<(), ModelError> {
        if (self.total_reviews == 0) != self.average_rating.is_none() {
            return Err(ModelError::AverageMismatch {
                total: self.total_reviews,
                average: format!("{:?}", self.average_rating),
            });
        }
        // An omitted distribution carries no information to contradict the total.
        if !self.rating_distribution.is_empty() {
            let sum: u64 = self.rating_distribution.values().sum();
            if sum != self.total_reviews {
                return Err(ModelError::DistributionMismatch {
                    sum,
                    total: self.total_reviews,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub size: u32,
    /// Zero-based page index.
    pub number: u32,
    pub first: bool,
    pub last: bool,
    #[serde(default)]
    pub number_of_elements: Option<u32>,
    #[serde(default)]
    pub empty: Option<bool>,
}

impl<T> PaginatedResponse<T> {
    /// What a room without reviews looks like.
    pub fn empty_page(size: u32) -> Self {
        Self {
            content: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            size,
            number: 0,
            first: true,
            last: true,
            number_of_elements: Some(0),
            empty: Some(true),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty.unwrap_or(self.content.is_empty())
    }

    pub fn check_consistency(&self) -> Result<(), ModelError> {
        if let Some(empty) = self.empty {
            if empty != self.content.is_empty() {
                return Err(ModelError::EmptyFlagMismatch {
                    empty,
                    len: self.content.len(),
                });
            }
        }

        let expect_first = self.number == 0;
        // Pages requested past the end are reported as last as well.
        let expect_last = self.total_pages == 0 || self.number >= self.total_pages.saturating_sub(1);
        if self.first != expect_first || self.last != expect_last {
            return Err(ModelError::BoundsMismatch {
                number: self.number,
                total_pages: self.total_pages,
                first: self.first,
                last: self.last,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewConfig {
    pub enabled: bool,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub room_id: RoomId,
    pub booking_id: BookingId,
    pub rating: u8,
    pub comment: String,
    pub reviewer_name: String,
    pub reviewer_email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    MostRecent,
    OldestFirst,
    HighestRated,
    LowestRated,
}

impl SortOrder {
    pub const ALL: [SortOrder; 4] = [
        Self::MostRecent,
        Self::OldestFirst,
        Self::HighestRated,
        Self::LowestRated,
    ];

    /// Value of the `sortBy` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::MostRecent => "createdAt,desc",
            Self::OldestFirst => "createdAt,asc",
            Self::HighestRated => "rating,desc",
            Self::LowestRated => "rating,asc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::MostRecent => "Most Recent",
            Self::OldestFirst => "Oldest First",
            Self::HighestRated => "Highest Rated",
            Self::LowestRated => "Lowest Rated",
        }
    }

    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported sort {0:?}, expected one of createdAt|rating followed by ,asc|,desc")]
pub struct ParseSortError(String);

impl FromStr for SortOrder {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = s
            .split_once(',')
            .ok_or_else(|| ParseSortError(s.to_string()))?;
        match (field.trim(), direction.trim().to_ascii_lowercase().as_str()) {
            ("createdAt", "desc") => Ok(Self::MostRecent),
            ("createdAt", "asc") => Ok(Self::OldestFirst),
            ("rating", "desc") => Ok(Self::HighestRated),
            ("rating", "asc") => Ok(Self::LowestRated),
            _ => Err(ParseSortError(s.to_string())),
        }
    }
}

/// Query for one page of a room's reviews. Unset values take the client defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort_by: Option<SortOrder>,
}
