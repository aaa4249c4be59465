use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const SUCCESS_NOTICE_DURATION: Duration = Duration::from_secs(5);

#[derive(Default)]
struct NoticeSlot {
    message: Option<String>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// A message that hides itself after a fixed time.
///
/// Showing a new message cancels the previous timer, as does [`Notice::dismiss`].
#[derive(Clone, Default)]
pub struct Notice {
    slot: Arc<Mutex<NoticeSlot>>,
}

impl Notice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<String> {
        self.slot.lock().message.clone()
    }

    /// Must be called from within a tokio runtime.
    pub fn show(&self, message: impl Into<String>, duration: Duration) {
        let mut slot = self.slot.lock();
        if let Some(timer) = slot.timer.take() {
            timer.abort();
        }
        slot.generation += 1;
        slot.message = Some(message.into());

        let generation = slot.generation;
        let shared = Arc::clone(&self.slot);
        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let mut slot = shared.lock();
            if slot.generation == generation {
                slot.message = None;
                slot.timer = None;
            }
        }));
    }

    pub fn dismiss(&self) {
        let mut slot = self.slot.lock();
        if let Some(timer) = slot.timer.take() {
            timer.abort();
        }
        slot.generation += 1;
        slot.message = None;
    }
}
