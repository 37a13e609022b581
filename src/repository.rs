//! Per-kind CRUD over the active backend, plus the derived views each page needs.
//!
//! Validation runs here, before the backend sees anything. Lookups take any
//! [`IntoRecordId`]; a key that does not read as an integer is simply not found.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::error::Result;
use crate::ids::IntoRecordId;
use crate::models::{Meeting, Note, Record, RecordId, Task, TaskPatch, Validate};
use crate::query::{self, PriorityFilter, StatusFilter, TaskFilter};
use crate::store::{Backend, BatchOutcome};
use crate::utils;

pub type TaskRepository = Repository<Task>;
pub type NoteRepository = Repository<Note>;
pub type MeetingRepository = Repository<Meeting>;

pub struct Repository<R: Record> {
    backend: Arc<dyn Backend<R>>,
}

impl<R: Record> Clone for Repository<R> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<R: Record> Repository<R> {
    pub fn new(backend: Arc<dyn Backend<R>>) -> Self {
        Self { backend }
    }

    pub async fn get_all(&self) -> Result<Vec<R>> {
        Ok(self.backend.get_all().await?)
    }

    pub async fn get_by_id(&self, id: impl IntoRecordId) -> Result<Option<R>> {
        let Some(id) = id.into_record_id() else {
            return Ok(None);
        };
        Ok(self.backend.get_by_id(id).await?)
    }

    pub async fn create(&self, draft: R::Draft) -> Result<R> {
        draft.validate()?;
        Ok(self.backend.create(draft, Utc::now()).await?)
    }

    /// Merges `patch` into the record; `Ok(None)` when no record has this id.
    pub async fn update(&self, id: impl IntoRecordId, patch: R::Patch) -> Result<Option<R>> {
        patch.validate()?;
        let Some(id) = id.into_record_id() else {
            return Ok(None);
        };
        Ok(self.backend.update(id, patch, Utc::now()).await?)
    }

    /// Returns whether a record was actually removed.
    pub async fn delete(&self, id: impl IntoRecordId) -> Result<bool> {
        let Some(id) = id.into_record_id() else {
            return Ok(false);
        };
        Ok(self.backend.delete(id).await?)
    }

    /// Creates every draft in one backend call. One invalid draft rejects the whole batch.
    pub async fn create_many(&self, drafts: Vec<R::Draft>) -> Result<BatchOutcome<R>> {
        for draft in &drafts {
            draft.validate()?;
        }
        let outcome = self.backend.create_many(drafts, Utc::now()).await?;
        report::<R, _>("create", &outcome);
        Ok(outcome)
    }

    pub async fn update_many(&self, changes: Vec<(RecordId, R::Patch)>) -> Result<BatchOutcome<R>> {
        for (_, patch) in &changes {
            patch.validate()?;
        }
        let outcome = self.backend.update_many(changes, Utc::now()).await?;
        report::<R, _>("update", &outcome);
        Ok(outcome)
    }

    pub async fn delete_many(&self, ids: Vec<RecordId>) -> Result<BatchOutcome<RecordId>> {
        let outcome = self.backend.delete_many(ids).await?;
        report::<R, _>("delete", &outcome);
        Ok(outcome)
    }
}

fn report<R: Record, T>(operation: &'static str, outcome: &BatchOutcome<T>) {
    if outcome.is_complete() {
        tracing::debug!(kind = R::KIND, operation, count = outcome.succeeded.len(), "Batch completed.");
        return;
    }
    for failure in &outcome.failed {
        tracing::error!(
            kind = R::KIND,
            operation,
            index = failure.index,
            id = ?failure.id,
            error = %failure.message(),
            "Batch record failed."
        );
    }
}

impl Repository<Task> {
    /// Flips `completed`; `Ok(None)` when the task does not exist.
    pub async fn toggle_complete(&self, id: impl IntoRecordId) -> Result<Option<Task>> {
        let Some(id) = id.into_record_id() else {
            return Ok(None);
        };
        let Some(task) = self.backend.get_by_id(id).await? else {
            return Ok(None);
        };
        let patch = TaskPatch {
            completed: Some(!task.completed),
            ..TaskPatch::default()
        };
        self.update(id, patch).await
    }

    pub async fn today_tasks(&self) -> Result<Vec<Task>> {
        self.today_tasks_on(utils::today()).await
    }

    pub async fn today_tasks_on(&self, today: NaiveDate) -> Result<Vec<Task>> {
        Ok(query::tasks_due_on(&self.get_all().await?, today))
    }

    pub async fn by_status(&self, status: &str) -> Result<Vec<Task>> {
        Ok(query::tasks_by_status(&self.get_all().await?, StatusFilter::from(status)))
    }

    pub async fn by_priority(&self, priority: &str) -> Result<Vec<Task>> {
        Ok(query::tasks_by_priority(&self.get_all().await?, PriorityFilter::from(priority)))
    }

    pub async fn search(&self, text: &str) -> Result<Vec<Task>> {
        Ok(query::search(&self.get_all().await?, text))
    }

    /// Task list page view.
    pub async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        Ok(query::filter_tasks(&self.get_all().await?, filter))
    }
}

impl Repository<Note> {
    pub async fn recent(&self, limit: usize) -> Result<Vec<Note>> {
        Ok(query::recent_notes(&self.get_all().await?, limit))
    }

    pub async fn search(&self, text: &str) -> Result<Vec<Note>> {
        Ok(query::search(&self.get_all().await?, text))
    }

    pub async fn list(&self, text: &str) -> Result<Vec<Note>> {
        Ok(query::filter_notes(&self.get_all().await?, text))
    }
}

impl Repository<Meeting> {
    pub async fn today_meetings(&self) -> Result<Vec<Meeting>> {
        self.today_meetings_on(utils::today()).await
    }

    pub async fn today_meetings_on(&self, today: NaiveDate) -> Result<Vec<Meeting>> {
        Ok(query::meetings_on(&self.get_all().await?, today))
    }

    pub async fn upcoming(&self, days: u32) -> Result<Vec<Meeting>> {
        self.upcoming_from(utils::today(), days).await
    }

    pub async fn upcoming_from(&self, today: NaiveDate, days: u32) -> Result<Vec<Meeting>> {
        Ok(query::upcoming_meetings(&self.get_all().await?, today, days))
    }

    pub async fn by_date(&self, date: NaiveDate) -> Result<Vec<Meeting>> {
        Ok(query::meetings_on(&self.get_all().await?, date))
    }

    pub async fn search(&self, text: &str) -> Result<Vec<Meeting>> {
        Ok(query::search(&self.get_all().await?, text))
    }

    pub async fn list(&self, text: &str) -> Result<Vec<Meeting>> {
        Ok(query::filter_meetings(&self.get_all().await?, text))
    }
}
