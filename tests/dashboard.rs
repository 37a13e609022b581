use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{NaiveDate, NaiveTime};
use dailyflow::dashboard::{DashboardSource, QuickStats, RECENT_NOTES_LIMIT, load_dashboard};
use dailyflow::database::Database;
use dailyflow::models::{Meeting, MeetingDraft, Note, NoteDraft, Task, TaskDraft};
use dailyflow::store::{BoxFuture, Latency, StoreError};
use dailyflow::{Error, Result, Workspace};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
}

async fn empty_workspace() -> Workspace {
    let workspace = Workspace::local(Arc::new(Database::open_in_memory().unwrap()), Latency::none()).unwrap();
    let tasks: Vec<_> = workspace.tasks.get_all().await.unwrap().iter().map(|t| t.id).collect();
    let notes: Vec<_> = workspace.notes.get_all().await.unwrap().iter().map(|n| n.id).collect();
    let meetings: Vec<_> = workspace.meetings.get_all().await.unwrap().iter().map(|m| m.id).collect();
    workspace.tasks.delete_many(tasks).await.unwrap();
    workspace.notes.delete_many(notes).await.unwrap();
    workspace.meetings.delete_many(meetings).await.unwrap();
    workspace
}

/// Delegates to a real workspace but fails today's meetings.
struct FailingMeetings {
    inner: Workspace,
    calls: AtomicUsize,
}

impl DashboardSource for FailingMeetings {
    fn all_tasks(&self) -> BoxFuture<'_, Result<Vec<Task>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.all_tasks()
    }

    fn recent_notes(&self, limit: usize) -> BoxFuture<'_, Result<Vec<Note>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.recent_notes(limit)
    }

    fn all_meetings(&self) -> BoxFuture<'_, Result<Vec<Meeting>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.all_meetings()
    }

    fn today_tasks(&self, today: NaiveDate) -> BoxFuture<'_, Result<Vec<Task>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.today_tasks(today)
    }

    fn today_meetings(&self, _today: NaiveDate) -> BoxFuture<'_, Result<Vec<Meeting>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async {
            Err(Error::Store(StoreError::Rejected {
                table: "meeting_c",
                operation: "fetch",
                message: "timeout".to_string(),
            }))
        })
    }
}

#[tokio::test]
async fn snapshot_combines_every_view() {
    let workspace = empty_workspace().await;
    let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();

    let due_today = workspace.tasks.create(TaskDraft::new("Due today", day(19))).await.unwrap();
    workspace.tasks.create(TaskDraft::new("Due later", day(25))).await.unwrap();
    workspace.tasks.toggle_complete(due_today.id).await.unwrap();
    for title in ["a", "b", "c", "d", "e"] {
        workspace.notes.create(NoteDraft::new(title, "body")).await.unwrap();
    }
    workspace.meetings.create(MeetingDraft::new("Standup", day(19), nine)).await.unwrap();
    workspace.meetings.create(MeetingDraft::new("Review", day(20), nine)).await.unwrap();

    let snapshot = load_dashboard(&workspace, day(19)).await.unwrap();

    assert_eq!(snapshot.today, day(19));
    assert_eq!(snapshot.tasks.len(), 2);
    assert_eq!(snapshot.recent_notes.len(), RECENT_NOTES_LIMIT);
    assert_eq!(snapshot.meetings.len(), 2);
    assert_eq!(snapshot.today_tasks.len(), 1);
    assert_eq!(snapshot.today_meetings[0].title, "Standup");
    assert_eq!(
        snapshot.stats(),
        QuickStats {
            pending_tasks: 1,
            completed_tasks: 1,
            notes: 3,
            meetings_today: 1,
        }
    );
}

#[tokio::test]
async fn one_failed_query_fails_the_whole_load() {
    let source = FailingMeetings {
        inner: empty_workspace().await,
        calls: AtomicUsize::new(0),
    };
    source.inner.tasks.create(TaskDraft::new("Visible?", day(19))).await.unwrap();

    let err = load_dashboard(&source, day(19)).await.unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::Rejected { message, .. }) if message == "timeout"));
    assert_eq!(source.calls.load(Ordering::SeqCst), 5);

    // A retry is just another call; it fails the same way until the source recovers.
    assert!(load_dashboard(&source, day(19)).await.is_err());
}

#[tokio::test]
async fn empty_collections_give_an_empty_snapshot() {
    let workspace = empty_workspace().await;
    let snapshot = load_dashboard(&workspace, day(19)).await.unwrap();
    assert!(snapshot.tasks.is_empty());
    assert!(snapshot.recent_notes.is_empty());
    assert_eq!(snapshot.stats(), QuickStats::default());
}
