use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::models::RecordId;

use super::mapping::{Fields, ID_FIELD, RemoteRecord};
use super::{
    Backend, BatchOutcome, BoxFuture, FailureReason, RecordFailure, StoreError, StoreResult,
};

/// Envelope returned when fetching a table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Vec<Value>,
}

/// Envelope returned when reading one record by id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Envelope returned by create, update and delete; `results` follows request order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Vec<RecordResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Wire access to the record service, one method per endpoint.
pub trait Transport: Send + Sync {
    fn fetch<'a>(
        &'a self,
        table: &'a str,
        fields: &'a [&'static str],
    ) -> BoxFuture<'a, StoreResult<FetchResponse>>;

    fn get<'a>(&'a self, table: &'a str, id: RecordId) -> BoxFuture<'a, StoreResult<GetResponse>>;

    fn create<'a>(
        &'a self,
        table: &'a str,
        records: Vec<Fields>,
    ) -> BoxFuture<'a, StoreResult<MutationResponse>>;

    fn update<'a>(
        &'a self,
        table: &'a str,
        records: Vec<Fields>,
    ) -> BoxFuture<'a, StoreResult<MutationResponse>>;

    fn delete<'a>(
        &'a self,
        table: &'a str,
        ids: Vec<RecordId>,
    ) -> BoxFuture<'a, StoreResult<MutationResponse>>;
}

/// Backend that keeps no local state and forwards every call to the record service.
pub struct RemoteBackend<R: RemoteRecord> {
    transport: Arc<dyn Transport>,
    _record: PhantomData<fn() -> R>,
}

impl<R: RemoteRecord> RemoteBackend<R> {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            _record: PhantomData,
        }
    }

    fn rejected(operation: &'static str, message: Option<String>) -> StoreError {
        StoreError::Rejected {
            table: R::TABLE,
            operation,
            message: message.unwrap_or_else(|| "no message".to_string()),
        }
    }

    /// Splits a mutation envelope into per-record outcomes. Only a failed envelope is an `Err`;
    /// a record that was rejected, or whose echo cannot be read, fails on its own. Failures are
    /// logged once, by the repository.
    fn outcome<T>(
        operation: &'static str,
        response: MutationResponse,
        targets: &[Option<RecordId>],
        mut accept: impl FnMut(usize, Option<Value>) -> StoreResult<T>,
    ) -> StoreResult<BatchOutcome<T>> {
        if !response.success {
            return Err(Self::rejected(operation, response.message));
        }

        let mut outcome = BatchOutcome::default();
        let mut results = response.results.into_iter();
        for (index, id) in targets.iter().copied().enumerate() {
            let result = results.next().unwrap_or_else(|| RecordResult {
                success: false,
                data: None,
                message: Some("no result returned for record".to_string()),
            });
            if !result.success {
                let message = result.message.unwrap_or_else(|| "unknown error".to_string());
                let reason = FailureReason::Rejected(message);
                outcome.failed.push(RecordFailure { index, id, reason });
                continue;
            }
            match accept(index, result.data) {
                Ok(accepted) => outcome.succeeded.push(accepted),
                Err(err) => {
                    let reason = FailureReason::Rejected(err.to_string());
                    outcome.failed.push(RecordFailure { index, id, reason });
                }
            }
        }
        Ok(outcome)
    }

    async fn fetch_one(&self, id: RecordId) -> StoreResult<Option<R>> {
        let response = self.transport.get(R::TABLE, id).await?;
        if !response.success {
            return Err(Self::rejected("get", response.message));
        }
        match response.data {
            None | Some(Value::Null) => Ok(None),
            Some(value) => R::from_fields(&value).map(Some),
        }
    }

    async fn create_records(
        &self,
        drafts: Vec<R::Draft>,
        now: DateTime<Utc>,
    ) -> StoreResult<BatchOutcome<R>> {
        let mut payload = Vec::with_capacity(drafts.len());
        for draft in drafts {
            // The service assigns the id; 0 is a placeholder that never leaves this process.
            payload.push(R::from_draft(0, draft, now)?.to_fields());
        }
        let targets = vec![None; payload.len()];
        let response = self.transport.create(R::TABLE, payload).await?;
        Self::outcome("create", response, &targets, |_, data| {
            let value = data.ok_or_else(|| StoreError::Malformed {
                table: R::TABLE,
                message: "created record missing from response".to_string(),
            })?;
            R::from_fields(&value)
        })
    }

    async fn update_records(
        &self,
        changes: Vec<(RecordId, R::Patch)>,
        now: DateTime<Utc>,
    ) -> StoreResult<BatchOutcome<R>> {
        let targets: Vec<Option<RecordId>> = changes.iter().map(|(id, _)| Some(*id)).collect();
        let payload = changes
            .iter()
            .map(|(id, patch)| {
                let mut fields = R::patch_fields(patch, now);
                fields.insert(ID_FIELD.to_string(), Value::from(*id));
                fields
            })
            .collect();
        let response = self.transport.update(R::TABLE, payload).await?;
        let outcome = Self::outcome("update", response, &targets, |index, data| Ok((index, data)))?;

        let mut failed = outcome.failed;
        let mut updated = Vec::with_capacity(outcome.succeeded.len());
        for (index, data) in outcome.succeeded {
            let id = changes[index].0;
            let record = match data {
                Some(value) => R::from_fields(&value).map(Some),
                // Success without a body: the service did not echo the record back.
                None => self.fetch_one(id).await,
            };
            match record {
                Ok(Some(record)) => updated.push(record),
                Ok(None) => failed.push(RecordFailure {
                    index,
                    id: Some(id),
                    reason: FailureReason::NotFound,
                }),
                Err(err) => failed.push(RecordFailure {
                    index,
                    id: Some(id),
                    reason: FailureReason::Rejected(err.to_string()),
                }),
            }
        }
        failed.sort_by_key(|failure| failure.index);
        Ok(BatchOutcome {
            succeeded: updated,
            failed,
        })
    }

    async fn delete_records(&self, ids: Vec<RecordId>) -> StoreResult<BatchOutcome<RecordId>> {
        let targets: Vec<Option<RecordId>> = ids.iter().copied().map(Some).collect();
        let response = self.transport.delete(R::TABLE, ids.clone()).await?;
        Self::outcome("delete", response, &targets, |index, _| Ok(ids[index]))
    }

    /// Resolves a lone failed mutation: a record that no longer exists is not-found, anything
    /// else is a backend error.
    async fn resolve_single_failure(
        &self,
        operation: &'static str,
        id: RecordId,
        failure: &RecordFailure,
    ) -> StoreResult<()> {
        if failure.reason == FailureReason::NotFound || self.fetch_one(id).await?.is_none() {
            return Ok(());
        }
        Err(StoreError::RecordFailed {
            table: R::TABLE,
            operation,
            message: failure.message(),
        })
    }
}

impl<R: RemoteRecord> Backend<R> for RemoteBackend<R> {
    fn get_all(&self) -> BoxFuture<'_, StoreResult<Vec<R>>> {
        Box::pin(async move {
            let response = self.transport.fetch(R::TABLE, R::FIELDS).await?;
            if !response.success {
                return Err(Self::rejected("fetch", response.message));
            }
            tracing::debug!(table = R::TABLE, count = response.data.len(), "Fetched records.");
            response.data.iter().map(R::from_fields).collect::<StoreResult<Vec<R>>>()
        })
    }

    fn get_by_id(&self, id: RecordId) -> BoxFuture<'_, StoreResult<Option<R>>> {
        Box::pin(self.fetch_one(id))
    }

    fn create(&self, draft: R::Draft, now: DateTime<Utc>) -> BoxFuture<'_, StoreResult<R>> {
        Box::pin(async move {
            let mut outcome = self.create_records(vec![draft], now).await?;
            if let Some(failure) = outcome.failed.first() {
                return Err(StoreError::RecordFailed {
                    table: R::TABLE,
                    operation: "create",
                    message: failure.message(),
                });
            }
            outcome.succeeded.pop().ok_or_else(|| StoreError::Malformed {
                table: R::TABLE,
                message: "create returned no record".to_string(),
            })
        })
    }

    fn update(
        &self,
        id: RecordId,
        patch: R::Patch,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, StoreResult<Option<R>>> {
        Box::pin(async move {
            let mut outcome = self.update_records(vec![(id, patch)], now).await?;
            if let Some(failure) = outcome.failed.first() {
                self.resolve_single_failure("update", id, failure).await?;
                return Ok(None);
            }
            Ok(outcome.succeeded.pop())
        })
    }

    fn delete(&self, id: RecordId) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let outcome = self.delete_records(vec![id]).await?;
            if let Some(failure) = outcome.failed.first() {
                self.resolve_single_failure("delete", id, failure).await?;
                return Ok(false);
            }
            Ok(!outcome.succeeded.is_empty())
        })
    }

    fn create_many(
        &self,
        drafts: Vec<R::Draft>,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, StoreResult<BatchOutcome<R>>> {
        Box::pin(self.create_records(drafts, now))
    }

    fn update_many(
        &self,
        changes: Vec<(RecordId, R::Patch)>,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, StoreResult<BatchOutcome<R>>> {
        Box::pin(self.update_records(changes, now))
    }

    fn delete_many(&self, ids: Vec<RecordId>) -> BoxFuture<'_, StoreResult<BatchOutcome<RecordId>>> {
        Box::pin(self.delete_records(ids))
    }
}
