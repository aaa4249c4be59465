use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub const OFFLINE_MESSAGE: &str =
    "You're offline or our service is temporarily unavailable. Please check your connection and try again.";
pub const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable. Please try again later.";
pub const UNEXPECTED_RESPONSE_MESSAGE: &str =
    "Received an unexpected response from the review service. Please try again later.";

/// Status used for a 2xx response whose body could not be understood.
pub const MALFORMED_RESPONSE_STATUS: u16 = 502;

/// Classification tag attached to every [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NetworkError,
    ServerError,
    ResourceNotFound,
    ClientError,
    /// Tag only. No `ApiError` carries it; empty results are detected with
    /// [`is_empty_state`] instead.
    EmptyState,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkError => "NETWORK_ERROR",
            Self::ServerError => "SERVER_ERROR",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::ClientError => "CLIENT_ERROR",
            Self::EmptyState => "EMPTY_STATE",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized failure of a call to the review service.
///
/// Transport errors are converted into this shape inside the client; nothing
/// else crosses component boundaries.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    /// HTTP status, or 0 when no response was received.
    pub status: u16,
    pub errors: Option<BTreeMap<String, Vec<String>>>,
    pub kind: ErrorKind,
    /// True for network and server errors, the ones worth retrying.
    pub network: bool,
}

/// Field error entries arrive either as a list of messages or a single string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldMessages {
    Many(Vec<String>),
    One(String),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    errors: Option<BTreeMap<String, FieldMessages>>,
}

impl ApiError {
    /// No response was received at all.
    pub fn network() -> Self {
        Self {
            message: OFFLINE_MESSAGE.to_string(),
            status: 0,
            errors: None,
            kind: ErrorKind::NetworkError,
            network: true,
        }
    }

    /// A success status whose body was unreadable or inconsistent.
    pub fn malformed() -> Self {
        Self {
            message: UNEXPECTED_RESPONSE_MESSAGE.to_string(),
            status: MALFORMED_RESPONSE_STATUS,
            errors: None,
            kind: ErrorKind::ServerError,
            network: true,
        }
    }

    /// Classify a failed response from its status code and raw body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let body: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let server_message = body.message.filter(|m| !m.trim().is_empty());
        let kind = classify_status(status);

        let message = match status {
            400 => server_message.unwrap_or_else(|| "Validation error. Please check your input.".to_string()),
            401 => "Unauthorized. Please check your credentials.".to_string(),
            403 => server_message.unwrap_or_else(|| "Access forbidden. This feature may be disabled.".to_string()),
            404 => server_message.unwrap_or_else(|| "Resource not found.".to_string()),
            409 => server_message.unwrap_or_else(|| {
                "Duplicate review. You have already submitted a review for this booking.".to_string()
            }),
            s if s >= 500 => UNAVAILABLE_MESSAGE.to_string(),
            s => server_message.unwrap_or_else(|| format!("Request failed with status {}", s)),
        };

        let errors = if status == 400 {
            body.errors.map(|errors| {
                errors
                    .into_iter()
                    .map(|(field, messages)| {
                        let messages = match messages {
                            FieldMessages::Many(list) => list,
                            FieldMessages::One(message) => vec![message],
                        };
                        (field, messages)
                    })
                    .collect()
            })
        } else {
            None
        };

        Self {
            message,
            status,
            errors,
            kind,
            network: matches!(kind, ErrorKind::NetworkError | ErrorKind::ServerError),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    pub fn is_network_or_server_error(&self) -> bool {
        is_network_or_server_error(Some(self))
    }

    pub fn has_field_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }
}

pub fn classify_status(status: u16) -> ErrorKind {
    match status {
        0 => ErrorKind::NetworkError,
        s if s >= 500 => ErrorKind::ServerError,
        404 => ErrorKind::ResourceNotFound,
        _ => ErrorKind::ClientError,
    }
}

/// Decides between the retry affordance and a terminal message.
pub fn is_network_or_server_error(error: Option<&ApiError>) -> bool {
    match error {
        Some(error) => error.status == 0 || error.status >= 500,
        None => false,
    }
}

/// A legitimately empty stats result, as opposed to a failure with no data.
pub fn is_empty_state(total_reviews: u64, average_rating: Option<f64>) -> bool {
    total_reviews == 0 && average_rating.is_none()
}
