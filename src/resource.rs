//! A remote resource: one piece of server state, the key it was requested
//! with, and where the latest request for it stands.

use log::debug;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RemoteState<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(ApiError),
}

impl<T> RemoteState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

impl<T> From<Result<T, ApiError>> for RemoteState<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => Self::Ready(data),
            Err(error) => Self::Failed(error),
        }
    }
}

struct Slot<K, T> {
    state: RemoteState<T>,
    key: Option<K>,
    /// Sequence number of the latest dispatched request.
    latest: u64,
}

/// Shared handle to a remote resource. Clones observe the same state.
pub struct Resource<K, T> {
    slot: Arc<Mutex<Slot<K, T>>>,
}

impl<K, T> Clone for Resource<K, T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<K, T> Default for Resource<K, T> {
    fn default() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                state: RemoteState::Idle,
                key: None,
                latest: 0,
            })),
        }
    }
}

impl<K, T> Resource<K, T>
where
    K: Clone + Debug,
    T: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RemoteState<T> {
        self.slot.lock().state.clone()
    }

    /// Key of the most recently dispatched request.
    pub fn key(&self) -> Option<K> {
        self.slot.lock().key.clone()
    }

    /// Fetch the resource for `key`.
    ///
    /// The outcome is only applied while this is still the latest request for
    /// the resource; a superseded response is dropped and the current state is
    /// returned instead.
    pub async fn load<F, Fut>(&self, key: K, fetch: F) -> RemoteState<T>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let ticket = self.begin(key.clone());
        let outcome = fetch(key).await;
        self.settle(ticket, outcome)
    }

    /// Repeat the last load with the key in effect right now.
    pub async fn refetch<F, Fut>(&self, fetch: F) -> RemoteState<T>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match self.key() {
            Some(key) => self.load(key, fetch).await,
            None => self.state(),
        }
    }

    fn begin(&self, key: K) -> u64 {
        let mut slot = self.slot.lock();
        slot.latest += 1;
        slot.key = Some(key);
        slot.state = RemoteState::Loading;
        slot.latest
    }

    fn settle(&self, ticket: u64, outcome: Result<T, ApiError>) -> RemoteState<T> {
        let mut slot = self.slot.lock();
        if ticket != slot.latest {
            debug!(
                "Dropping stale response #{} for {:?}, latest is #{}",
                ticket, slot.key, slot.latest
            );
            return slot.state.clone();
        }
        slot.state = outcome.into();
        slot.state.clone()
    }
}
