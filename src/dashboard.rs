use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{Meeting, Note, Task};
use crate::store::BoxFuture;

/// Number of notes shown on the dashboard.
pub const RECENT_NOTES_LIMIT: usize = 3;

/// The queries the dashboard is assembled from.
///
/// [`crate::workspace::Workspace`] answers them from its repositories.
pub trait DashboardSource: Send + Sync {
    fn all_tasks(&self) -> BoxFuture<'_, Result<Vec<Task>>>;

    fn recent_notes(&self, limit: usize) -> BoxFuture<'_, Result<Vec<Note>>>;

    fn all_meetings(&self) -> BoxFuture<'_, Result<Vec<Meeting>>>;

    fn today_tasks(&self, today: NaiveDate) -> BoxFuture<'_, Result<Vec<Task>>>;

    fn today_meetings(&self, today: NaiveDate) -> BoxFuture<'_, Result<Vec<Meeting>>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuickStats {
    pub pending_tasks: usize,
    pub completed_tasks: usize,
    pub notes: usize,
    pub meetings_today: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub today: NaiveDate,
    pub tasks: Vec<Task>,
    pub recent_notes: Vec<Note>,
    pub meetings: Vec<Meeting>,
    pub today_tasks: Vec<Task>,
    pub today_meetings: Vec<Meeting>,
}

impl DashboardSnapshot {
    pub fn stats(&self) -> QuickStats {
        let completed_tasks = self.tasks.iter().filter(|task| task.completed).count();
        QuickStats {
            pending_tasks: self.tasks.len() - completed_tasks,
            completed_tasks,
            notes: self.recent_notes.len(),
            meetings_today: self.today_meetings.len(),
        }
    }
}

/// Runs every dashboard query concurrently. The first failure fails the whole load and no
/// partial snapshot is returned; callers retry by calling again.
pub async fn load_dashboard(source: &dyn DashboardSource, today: NaiveDate) -> Result<DashboardSnapshot> {
    let joined = tokio::try_join!(
        source.all_tasks(),
        source.recent_notes(RECENT_NOTES_LIMIT),
        source.all_meetings(),
        source.today_tasks(today),
        source.today_meetings(today),
    );

    match joined {
        Ok((tasks, recent_notes, meetings, today_tasks, today_meetings)) => {
            tracing::debug!(
                %today,
                tasks = tasks.len(),
                notes = recent_notes.len(),
                meetings = meetings.len(),
                "Dashboard loaded."
            );
            Ok(DashboardSnapshot {
                today,
                tasks,
                recent_notes,
                meetings,
                today_tasks,
                today_meetings,
            })
        }
        Err(err) => {
            tracing::error!(%today, error = %err, "Failed to load dashboard data.");
            Err(err)
        }
    }
}
