use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::{BackendKind, Config};
use crate::dashboard::DashboardSource;
use crate::database::{Database, DatabaseError};
use crate::error::Result;
use crate::models::{Meeting, Note, Task};
use crate::repository::{MeetingRepository, NoteRepository, Repository, TaskRepository};
use crate::store::http::HttpTransport;
use crate::store::local::LocalBackend;
use crate::store::remote::{RemoteBackend, Transport};
use crate::store::{Backend, BoxFuture, Latency, StoreResult, seed};

/// The three repositories of one deployment, all served by the same backend strategy.
#[derive(Clone)]
pub struct Workspace {
    pub tasks: TaskRepository,
    pub notes: NoteRepository,
    pub meetings: MeetingRepository,
    kind: BackendKind,
}

impl Workspace {
    /// Builds the workspace for the configured backend. The choice is final for this run.
    pub fn open(config: &Config) -> StoreResult<Self> {
        match config.storage.backend {
            BackendKind::Local => {
                let path = config.get_database_path();
                let path = path.to_str().ok_or_else(|| {
                    DatabaseError::DirectoryError("Database path contains invalid UTF-8".to_string())
                })?;
                let latency = if config.storage.simulate_latency {
                    Latency::simulated()
                } else {
                    Latency::none()
                };
                tracing::info!(path, "Opening local storage.");
                Self::local(Arc::new(Database::new(path)?), latency)
            }
            BackendKind::Remote => {
                let remote = &config.remote;
                tracing::info!(base_url = %remote.base_url, "Using remote record service.");
                let transport = HttpTransport::new(&remote.base_url, &remote.api_key, &remote.project_id)?;
                Ok(Self::remote(Arc::new(transport)))
            }
        }
    }

    pub fn local(db: Arc<Database>, latency: Latency) -> StoreResult<Self> {
        let tasks = LocalBackend::<Task>::open(Arc::clone(&db), seed::tasks()?, latency)?;
        let notes = LocalBackend::<Note>::open(Arc::clone(&db), seed::notes()?, latency)?;
        let meetings = LocalBackend::<Meeting>::open(db, seed::meetings()?, latency)?;
        Ok(Self::from_backends(
            BackendKind::Local,
            Arc::new(tasks),
            Arc::new(notes),
            Arc::new(meetings),
        ))
    }

    pub fn remote(transport: Arc<dyn Transport>) -> Self {
        Self::from_backends(
            BackendKind::Remote,
            Arc::new(RemoteBackend::<Task>::new(Arc::clone(&transport))),
            Arc::new(RemoteBackend::<Note>::new(Arc::clone(&transport))),
            Arc::new(RemoteBackend::<Meeting>::new(transport)),
        )
    }

    pub fn from_backends(
        kind: BackendKind,
        tasks: Arc<dyn Backend<Task>>,
        notes: Arc<dyn Backend<Note>>,
        meetings: Arc<dyn Backend<Meeting>>,
    ) -> Self {
        Self {
            tasks: Repository::new(tasks),
            notes: Repository::new(notes),
            meetings: Repository::new(meetings),
            kind,
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }
}

impl DashboardSource for Workspace {
    fn all_tasks(&self) -> BoxFuture<'_, Result<Vec<Task>>> {
        Box::pin(self.tasks.get_all())
    }

    fn recent_notes(&self, limit: usize) -> BoxFuture<'_, Result<Vec<Note>>> {
        Box::pin(self.notes.recent(limit))
    }

    fn all_meetings(&self) -> BoxFuture<'_, Result<Vec<Meeting>>> {
        Box::pin(self.meetings.get_all())
    }

    fn today_tasks(&self, today: NaiveDate) -> BoxFuture<'_, Result<Vec<Task>>> {
        Box::pin(self.tasks.today_tasks_on(today))
    }

    fn today_meetings(&self, today: NaiveDate) -> BoxFuture<'_, Result<Vec<Meeting>>> {
        Box::pin(self.meetings.today_meetings_on(today))
    }
}
