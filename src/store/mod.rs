//! Persistence backends for record collections.
//!
//! Two interchangeable strategies implement [`Backend`]: [`local::LocalBackend`] keeps the
//! collection in memory and persists it to SQLite after every mutation, and
//! [`remote::RemoteBackend`] forwards each call to a record service. A deployment picks one of
//! them once; see [`crate::workspace::Workspace::open`].

pub mod http;
pub mod local;
pub mod mapping;
pub mod remote;
pub mod seed;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::database::DatabaseError;
use crate::error::ValidationError;
use crate::models::{Record, RecordId};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Record service rejected {operation} on {table}: {message}")]
    Rejected {
        table: &'static str,
        operation: &'static str,
        message: String,
    },
    #[error("Malformed {table} record: {message}")]
    Malformed { table: &'static str, message: String },
    #[error("Invalid record: {0}")]
    Invalid(#[from] ValidationError),
    #[error("{operation} failed for {table} record: {message}")]
    RecordFailed {
        table: &'static str,
        operation: &'static str,
        message: String,
    },
}

/// Why one record of a multi-record call did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    NotFound,
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// Position of the record in the request.
    pub index: usize,
    /// Target id, when the request addressed an existing record.
    pub id: Option<RecordId>,
    pub reason: FailureReason,
}

impl RecordFailure {
    pub fn message(&self) -> String {
        match &self.reason {
            FailureReason::NotFound => "record not found".to_string(),
            FailureReason::Rejected(message) => message.clone(),
        }
    }
}

/// Per-record result of a multi-record create, update or delete.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<RecordFailure>,
}

impl<T> Default for BatchOutcome<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> BatchOutcome<T> {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Storage contract shared by every backend strategy.
///
/// Not-found is `Ok(None)` / `Ok(false)`; `Err` is reserved for backend failures.
pub trait Backend<R: Record>: Send + Sync {
    fn get_all(&self) -> BoxFuture<'_, StoreResult<Vec<R>>>;

    fn get_by_id(&self, id: RecordId) -> BoxFuture<'_, StoreResult<Option<R>>>;

    fn create(&self, draft: R::Draft, now: DateTime<Utc>) -> BoxFuture<'_, StoreResult<R>>;

    fn update(
        &self,
        id: RecordId,
        patch: R::Patch,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, StoreResult<Option<R>>>;

    fn delete(&self, id: RecordId) -> BoxFuture<'_, StoreResult<bool>>;

    fn create_many(
        &self,
        drafts: Vec<R::Draft>,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, StoreResult<BatchOutcome<R>>>;

    fn update_many(
        &self,
        changes: Vec<(RecordId, R::Patch)>,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, StoreResult<BatchOutcome<R>>>;

    fn delete_many(&self, ids: Vec<RecordId>) -> BoxFuture<'_, StoreResult<BatchOutcome<RecordId>>>;
}

/// Artificial delay applied by the local backend so callers never see synchronous completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    pub get_all: Duration,
    pub get_by_id: Duration,
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Latency {
    pub fn simulated() -> Self {
        Self {
            get_all: Duration::from_millis(300),
            get_by_id: Duration::from_millis(200),
            create: Duration::from_millis(400),
            update: Duration::from_millis(350),
            delete: Duration::from_millis(300),
        }
    }

    pub fn none() -> Self {
        Self {
            get_all: Duration::ZERO,
            get_by_id: Duration::ZERO,
            create: Duration::ZERO,
            update: Duration::ZERO,
            delete: Duration::ZERO,
        }
    }
}

/// Suspends for `delay`, yielding even when the delay is zero.
pub(crate) async fn pause(delay: Duration) {
    if delay.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(delay).await;
    }
}
