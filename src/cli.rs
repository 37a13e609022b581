use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;

use crate::config::{BackendKind, Config};
use crate::dashboard::{self, DashboardSnapshot};
use crate::database::{Database, DatabaseError};
use crate::models::{Meeting, MeetingDraft, Note, NoteDraft, Priority, Record, Task, TaskDraft};
use crate::query::{PriorityFilter, StatusFilter, TaskFilter};
use crate::status::{self, MeetingPhase};
use crate::store::mapping::split_tags;
use crate::utils::{self, parse_date, parse_time};
use crate::workspace::Workspace;

#[derive(Parser)]
#[command(name = "dailyflow")]
#[command(about = "DailyFlow - tasks, notes and meetings with a daily dashboard")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show today's dashboard (default if no subcommand)
    Dashboard,
    /// List tasks, newest first
    Tasks {
        /// completed, pending or all
        #[arg(long, default_value = "all")]
        status: String,
        /// low, medium, high or all
        #[arg(long, default_value = "all")]
        priority: String,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// List notes, most recently updated first
    Notes {
        #[arg(long, default_value = "")]
        search: String,
    },
    /// List meetings in chronological order
    Meetings {
        #[arg(long, default_value = "")]
        search: String,
        /// Only meetings within the next DAYS days
        #[arg(long, value_name = "DAYS")]
        upcoming: Option<u32>,
        /// Only meetings on this date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "upcoming")]
        date: Option<String>,
    },
    /// Quickly add a new task
    AddTask {
        /// Task title
        title: String,
        /// Due date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        due: Option<String>,
        #[arg(long, default_value = "medium")]
        priority: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Quickly add a new note
    AddNote {
        /// Note title
        title: String,
        /// Note content
        #[arg(long)]
        content: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    /// Schedule a meeting
    AddMeeting {
        /// Meeting title
        title: String,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Start time (HH:MM)
        #[arg(long)]
        time: String,
        /// Length in minutes
        #[arg(long, default_value_t = crate::models::DEFAULT_MEETING_MINUTES)]
        duration: u32,
        #[arg(long)]
        description: Option<String>,
    },
    /// Mark a task done, or open again
    ToggleTask { id: String },
    /// Delete a record
    Delete { kind: RecordKind, id: String },
    /// Drop stored local collections so the bundled defaults load next time
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordKind {
    Task,
    Note,
    Meeting,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Workspace(#[from] crate::error::Error),
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("No {kind} with id {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("{0} is only available with the local backend")]
    LocalOnly(&'static str),
}

pub async fn handle_dashboard(workspace: &Workspace) -> Result<(), CliError> {
    let snapshot = dashboard::load_dashboard(workspace, utils::today()).await?;
    print_dashboard(&snapshot, utils::now_local());
    Ok(())
}

fn print_dashboard(snapshot: &DashboardSnapshot, now: chrono::NaiveDateTime) {
    let stats = snapshot.stats();
    println!("DailyFlow - {}", snapshot.today);
    println!(
        "{} pending, {} completed, {} notes, {} meetings today",
        stats.pending_tasks, stats.completed_tasks, stats.notes, stats.meetings_today
    );

    println!("\nToday's tasks:");
    if snapshot.today_tasks.is_empty() {
        println!("  (none)");
    }
    for task in &snapshot.today_tasks {
        println!("  {}", task_line(task, snapshot.today));
    }

    println!("\nToday's meetings:");
    if snapshot.today_meetings.is_empty() {
        println!("  (none)");
    }
    for meeting in &snapshot.today_meetings {
        println!("  {}", meeting_line(meeting, now));
    }

    println!("\nRecent notes:");
    for note in &snapshot.recent_notes {
        println!("  {}", note_line(note));
    }
}

fn task_line(task: &Task, today: chrono::NaiveDate) -> String {
    let mark = if task.completed { "x" } else { " " };
    let overdue = if status::is_overdue(task, today) { " OVERDUE" } else { "" };
    format!(
        "[{}] #{} {} ({}, due {}){}",
        mark, task.id, task.title, task.priority, task.due_date, overdue
    )
}

fn meeting_line(meeting: &Meeting, now: chrono::NaiveDateTime) -> String {
    let phase = status::meeting_phase(meeting, now);
    let marker = match phase {
        MeetingPhase::Ongoing => " <- now",
        _ => "",
    };
    format!(
        "#{} {} {} {} ({} min) [{}]{}",
        meeting.id,
        meeting.date,
        meeting.time.format(crate::models::hhmm::FORMAT),
        meeting.title,
        meeting.duration,
        phase,
        marker
    )
}

fn note_line(note: &Note) -> String {
    if note.tags.is_empty() {
        format!("#{} {}", note.id, note.title)
    } else {
        format!("#{} {} [{}]", note.id, note.title, note.tags.join(", "))
    }
}

pub async fn handle_tasks(
    workspace: &Workspace,
    status: &str,
    priority: &str,
    search: String,
) -> Result<(), CliError> {
    let filter = TaskFilter {
        status: StatusFilter::from(status),
        priority: PriorityFilter::from(priority),
        search,
    };
    let today = utils::today();
    for task in workspace.tasks.list(&filter).await? {
        println!("{}", task_line(&task, today));
    }
    Ok(())
}

pub async fn handle_notes(workspace: &Workspace, search: &str) -> Result<(), CliError> {
    for note in workspace.notes.list(search).await? {
        println!("{}", note_line(&note));
    }
    Ok(())
}

pub async fn handle_meetings(
    workspace: &Workspace,
    search: &str,
    upcoming: Option<u32>,
    date: Option<String>,
) -> Result<(), CliError> {
    let meetings = match (upcoming, date) {
        (Some(days), _) => workspace.meetings.upcoming(days).await?,
        (None, Some(date)) => workspace.meetings.by_date(parse_date_arg(&date)?).await?,
        (None, None) => workspace.meetings.get_all().await?,
    };
    let now = utils::now_local();
    let matching = crate::query::filter_meetings(&meetings, search);
    for meeting in &matching {
        println!("{}", meeting_line(meeting, now));
    }
    Ok(())
}

fn parse_date_arg(raw: &str) -> Result<chrono::NaiveDate, CliError> {
    parse_date(raw).map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", raw, e)))
}

/// Handle the add-task command
pub async fn handle_add_task(
    workspace: &Workspace,
    title: String,
    due: Option<String>,
    priority: &str,
    description: Option<String>,
) -> Result<(), CliError> {
    let due_date = match due {
        Some(due_str) => parse_date_arg(&due_str)?,
        None => utils::today(),
    };
    let priority: Priority = priority.parse().map_err(CliError::InvalidArgument)?;

    let mut draft = TaskDraft::new(title, due_date);
    draft.priority = priority;
    draft.description = description;

    let task = workspace.tasks.create(draft).await?;
    println!("Task created successfully (ID: {})", task.id);
    Ok(())
}

/// Handle the add-note command
pub async fn handle_add_note(
    workspace: &Workspace,
    title: String,
    content: Option<String>,
    tags: Option<String>,
) -> Result<(), CliError> {
    let mut draft = NoteDraft::new(title, content.unwrap_or_default());
    draft.tags = tags.as_deref().map(split_tags).unwrap_or_default();

    let note = workspace.notes.create(draft).await?;
    println!("Note created successfully (ID: {})", note.id);
    Ok(())
}

pub async fn handle_add_meeting(
    workspace: &Workspace,
    title: String,
    date: &str,
    time: &str,
    duration: u32,
    description: Option<String>,
) -> Result<(), CliError> {
    let date = parse_date_arg(date)?;
    let time = parse_time(time)
        .map_err(|e| CliError::InvalidArgument(format!("Invalid time '{}': {}", time, e)))?;

    let mut draft = MeetingDraft::new(title, date, time);
    draft.duration = duration;
    draft.description = description;

    let meeting = workspace.meetings.create(draft).await?;
    println!("Meeting scheduled successfully (ID: {})", meeting.id);
    Ok(())
}

pub async fn handle_toggle_task(workspace: &Workspace, id: String) -> Result<(), CliError> {
    match workspace.tasks.toggle_complete(id.as_str()).await? {
        Some(task) if task.completed => println!("Task {} completed", task.id),
        Some(task) => println!("Task {} reopened", task.id),
        None => return Err(CliError::NotFound { kind: Task::KIND, id }),
    }
    Ok(())
}

pub async fn handle_delete(workspace: &Workspace, kind: RecordKind, id: String) -> Result<(), CliError> {
    let (removed, kind_name) = match kind {
        RecordKind::Task => (workspace.tasks.delete(id.as_str()).await?, Task::KIND),
        RecordKind::Note => (workspace.notes.delete(id.as_str()).await?, Note::KIND),
        RecordKind::Meeting => (workspace.meetings.delete(id.as_str()).await?, Meeting::KIND),
    };
    if !removed {
        return Err(CliError::NotFound { kind: kind_name, id });
    }
    println!("Deleted {} {}", kind_name, id);
    Ok(())
}

/// Handle the reset command. Only the local store is touched, and never for a remote config.
pub fn handle_reset(config: &Config) -> Result<(), CliError> {
    if config.storage.backend == BackendKind::Remote {
        return Err(CliError::LocalOnly("reset"));
    }
    let db_path = config.get_database_path();
    let db_path = db_path
        .to_str()
        .ok_or_else(|| CliError::InvalidArgument("database path contains invalid UTF-8".to_string()))?;
    let db = Database::new(db_path)?;
    for key in [Task::STORAGE_KEY, Note::STORAGE_KEY, Meeting::STORAGE_KEY] {
        if db.remove_collection(key)? {
            tracing::info!(key, "Removed stored collection.");
        }
    }
    println!("Local data reset; bundled defaults will load on next start");
    Ok(())
}
