use log::{info, warn};
use parking_lot::Mutex;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use crate::api::ReviewClient;
use crate::error::ApiError;
use crate::review::{CreateReviewRequest, Review, COMMENT_MAX_LENGTH, RATING_MAX, RATING_MIN};
use crate::room::RoomId;

/// Validation messages keyed by the field's wire name (`bookingId`, `reviewerEmail`, ...).
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Rating,
    BookingId,
    Comment,
    ReviewerName,
    ReviewerEmail,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        Self::Rating,
        Self::ReviewerName,
        Self::ReviewerEmail,
        Self::BookingId,
        Self::Comment,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rating => "rating",
            Self::BookingId => "bookingId",
            Self::Comment => "comment",
            Self::ReviewerName => "reviewerName",
            Self::ReviewerEmail => "reviewerEmail",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Rating => "Rating",
            Self::BookingId => "Booking ID",
            Self::Comment => "Your Review",
            Self::ReviewerName => "Guest Name",
            Self::ReviewerEmail => "Email",
        }
    }
}

/// Candidate review as typed by the guest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewForm {
    /// 0 until a star is picked.
    pub rating: u8,
    pub booking_id: String,
    pub comment: String,
    pub reviewer_name: String,
    pub reviewer_email: String,
}

impl ReviewForm {
    pub fn text(&self, field: FormField) -> Option<&str> {
        match field {
            FormField::Rating => None,
            FormField::BookingId => Some(&self.booking_id),
            FormField::Comment => Some(&self.comment),
            FormField::ReviewerName => Some(&self.reviewer_name),
            FormField::ReviewerEmail => Some(&self.reviewer_email),
        }
    }

    fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Rating => None,
            FormField::BookingId => Some(&mut self.booking_id),
            FormField::Comment => Some(&mut self.comment),
            FormField::ReviewerName => Some(&mut self.reviewer_name),
            FormField::ReviewerEmail => Some(&mut self.reviewer_email),
        }
    }

    /// Typed, trimmed payload. Only meaningful once validation passed.
    fn to_request(&self, room_id: RoomId) -> Option<CreateReviewRequest> {
        Some(CreateReviewRequest {
            room_id,
            booking_id: self.booking_id.trim().parse().ok()?,
            rating: self.rating,
            comment: self.comment.trim().to_string(),
            reviewer_name: self.reviewer_name.trim().to_string(),
            reviewer_email: self.reviewer_email.trim().to_string(),
        })
    }
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"))
}

pub fn validate_review_form(form: &ReviewForm) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let mut fail = |field: FormField, message: String| {
        errors.insert(field.name().to_string(), message);
    };

    if !(RATING_MIN..=RATING_MAX).contains(&form.rating) {
        fail(
            FormField::Rating,
            format!("Rating must be between {} and {}", RATING_MIN, RATING_MAX),
        );
    }

    let booking_id = form.booking_id.trim();
    if booking_id.is_empty() {
        fail(FormField::BookingId, "Booking ID is required".to_string());
    } else if !matches!(booking_id.parse::<u64>(), Ok(id) if id > 0) {
        fail(FormField::BookingId, "Booking ID must be a positive number".to_string());
    }

    let comment = form.comment.trim();
    if comment.is_empty() {
        fail(FormField::Comment, "Comment is required".to_string());
    } else if comment.chars().count() > COMMENT_MAX_LENGTH {
        fail(
            FormField::Comment,
            format!("Comment must not exceed {} characters", COMMENT_MAX_LENGTH),
        );
    }

    if form.reviewer_name.trim().is_empty() {
        fail(FormField::ReviewerName, "Name is required".to_string());
    }

    let email = form.reviewer_email.trim();
    if email.is_empty() {
        fail(FormField::ReviewerEmail, "Email is required".to_string());
    } else if !email_pattern().is_match(email) {
        fail(FormField::ReviewerEmail, "Please enter a valid email address".to_string());
    }

    errors
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created(Review),
    /// Client-side validation failed; nothing was sent.
    Invalid,
    /// The service refused the review; see the field or global errors.
    Rejected,
    /// Another submission is still in flight.
    Busy,
    /// Reviews are switched off for this hotel.
    Disabled,
}

#[derive(Debug, Clone, Default)]
pub struct SubmissionState {
    pub form: ReviewForm,
    pub field_errors: FieldErrors,
    pub global_error: Option<String>,
    pub submitting: bool,
}

/// Owns the write-review form for one room and submits it.
#[derive(Clone)]
pub struct SubmissionController {
    client: ReviewClient,
    room_id: RoomId,
    state: Arc<Mutex<SubmissionState>>,
}

impl SubmissionController {
    pub fn new(client: ReviewClient, room_id: RoomId) -> Self {
        Self {
            client,
            room_id,
            state: Arc::new(Mutex::new(SubmissionState::default())),
        }
    }

    pub fn snapshot(&self) -> SubmissionState {
        self.state.lock().clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.state.lock().submitting
    }

    pub fn set_rating(&self, rating: u8) {
        let mut state = self.state.lock();
        if state.submitting {
            return;
        }
        state.form.rating = rating;
        state.field_errors.remove(FormField::Rating.name());
    }

    pub fn set_text(&self, field: FormField, value: &str) {
        self.edit(field, |text| *text = value.to_string());
    }

    pub fn push_char(&self, field: FormField, c: char) {
        self.edit(field, |text| text.push(c));
    }

    pub fn pop_char(&self, field: FormField) {
        self.edit(field, |text| {
            text.pop();
        });
    }

    /// Editing a field clears its error and the global one.
    fn edit(&self, field: FormField, change: impl FnOnce(&mut String)) {
        let mut state = self.state.lock();
        if state.submitting {
            return;
        }
        if let Some(text) = state.form.text_mut(field) {
            change(text);
        }
        state.field_errors.remove(field.name());
        state.global_error = None;
    }

    pub fn reset(&self) {
        let mut state = self.state.lock();
        if !state.submitting {
            *state = SubmissionState::default();
        }
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let request = {
            let mut state = self.state.lock();
            if state.submitting {
                return SubmitOutcome::Busy;
            }
            state.global_error = None;

            let errors = validate_review_form(&state.form);
            if !errors.is_empty() {
                state.field_errors = errors;
                return SubmitOutcome::Invalid;
            }
            let Some(request) = state.form.to_request(self.room_id) else {
                return SubmitOutcome::Invalid;
            };
            state.submitting = true;
            request
        };

        let result = self.client.create_review(&request).await;

        let mut state = self.state.lock();
        state.submitting = false;
        match result {
            Ok(review) => {
                info!(
                    "Created review {} for room {} (booking {})",
                    review.review_id, review.room_id, review.booking_id
                );
                *state = SubmissionState::default();
                SubmitOutcome::Created(review)
            }
            Err(error) => {
                warn!("Review submission for room {} failed: {}", self.room_id, error);
                apply_failure(&mut state, &error);
                SubmitOutcome::Rejected
            }
        }
    }
}

fn apply_failure(state: &mut SubmissionState, error: &ApiError) {
    if error.status == 400 && error.has_field_errors() {
        state.field_errors = error
            .errors
            .iter()
            .flatten()
            .map(|(field, messages)| {
                let message = messages
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "Invalid value".to_string());
                (field.clone(), message)
            })
            .collect();
        state.global_error = None;
        return;
    }

    let fallback = match error.status {
        409 => "You have already submitted a review for this booking.",
        404 => "Booking or room not found. Please check your Booking ID.",
        403 => "Review submission is currently disabled.",
        401 => "Unauthorized. Please check your credentials.",
        _ => "Failed to submit review. Please try again.",
    };
    let message = if error.message.trim().is_empty() {
        fallback.to_string()
    } else {
        error.message.clone()
    };
    state.field_errors.clear();
    state.global_error = Some(message);
}
