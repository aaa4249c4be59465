use log::info;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::api::ReviewClient;
use crate::controllers::{ConfigController, ReviewListController, StatsController};
use crate::error::ApiError;
use crate::notice::{Notice, SUCCESS_NOTICE_DURATION};
use crate::resource::RemoteState;
use crate::room::{HotelId, RoomCatalog, RoomId};
use crate::submission::{SubmissionController, SubmitOutcome};

pub const SUCCESS_MESSAGE: &str = "Review submitted successfully! Your review has been added.";

/// Whether the write-review form can be reached for this room.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionGate {
    Loading,
    Enabled,
    Disabled { reason: String },
    Unavailable(ApiError),
}

/// Everything shown on one room's page: stats, reviews, and the write-review form.
#[derive(Clone)]
pub struct RoomReviewsView {
    room_id: RoomId,
    hotel_id: HotelId,
    pub config: ConfigController,
    pub reviews: ReviewListController,
    pub stats: StatsController,
    pub submission: SubmissionController,
    notice: Notice,
    form_open: Arc<Mutex<bool>>,
}

impl RoomReviewsView {
    pub fn new(client: ReviewClient, catalog: &RoomCatalog, room_id: RoomId) -> Self {
        Self {
            room_id,
            hotel_id: catalog.hotel_for(room_id),
            config: ConfigController::new(client.clone()),
            reviews: ReviewListController::new(client.clone()),
            stats: StatsController::new(client.clone()),
            submission: SubmissionController::new(client, room_id),
            notice: Notice::new(),
            form_open: Arc::new(Mutex::new(false)),
        }
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn hotel_id(&self) -> HotelId {
        self.hotel_id
    }

    /// Load config, reviews and stats side by side.
    pub async fn open(&self) {
        info!("Opening reviews for room {} (hotel {})", self.room_id, self.hotel_id);
        tokio::join!(
            self.config.set_hotel(self.hotel_id),
            self.reviews.set_room(self.room_id),
            self.stats.set_room(self.room_id),
        );
    }

    /// Reload everything for this room.
    pub async fn reload(&self) {
        tokio::join!(
            self.config.load(self.hotel_id),
            self.reviews.refetch(),
            self.stats.load(self.room_id),
        );
    }

    pub fn gate(&self) -> SubmissionGate {
        match self.config.state() {
            RemoteState::Idle | RemoteState::Loading => SubmissionGate::Loading,
            RemoteState::Failed(error) => SubmissionGate::Unavailable(error),
            RemoteState::Ready(config) if config.enabled => SubmissionGate::Enabled,
            RemoteState::Ready(config) => SubmissionGate::Disabled {
                reason: config.reason.unwrap_or_default(),
            },
        }
    }

    pub fn is_form_open(&self) -> bool {
        *self.form_open.lock()
    }

    pub fn open_form(&self) -> bool {
        let enabled = self.gate() == SubmissionGate::Enabled;
        if enabled {
            *self.form_open.lock() = true;
        }
        enabled
    }

    pub fn close_form(&self) {
        *self.form_open.lock() = false;
    }

    pub fn notice(&self) -> Option<String> {
        self.notice.current()
    }

    pub fn dismiss_notice(&self) {
        self.notice.dismiss();
    }

    /// Submit the form. On success the form closes, the list returns to its
    /// first page, list and stats reload together, and the success notice shows.
    pub async fn submit(&self) -> SubmitOutcome {
        if self.gate() != SubmissionGate::Enabled {
            return SubmitOutcome::Disabled;
        }

        let outcome = self.submission.submit().await;
        if let SubmitOutcome::Created(_) = &outcome {
            self.close_form();
            tokio::join!(self.reviews.set_page(0), self.stats.refetch());
            self.notice.show(SUCCESS_MESSAGE, SUCCESS_NOTICE_DURATION);
        }
        outcome
    }

    /// Leaving the page: pending timers must not outlive it.
    pub fn close(&self) {
        self.notice.dismiss();
        self.close_form();
    }
}
