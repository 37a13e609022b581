//! Derived, read-only views over record collections.
//!
//! Everything here works on borrowed slices and returns fresh vectors; nothing is stored.

use std::cmp::Reverse;

use chrono::{Days, NaiveDate};

use crate::models::{Meeting, Note, Priority, Task};

/// Task completion filter. Unrecognised input means "no filter".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl From<&str> for StatusFilter {
    fn from(value: &str) -> Self {
        match value {
            "completed" => StatusFilter::Completed,
            "pending" => StatusFilter::Pending,
            _ => StatusFilter::All,
        }
    }
}

impl StatusFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => task.completed,
            StatusFilter::Pending => !task.completed,
        }
    }
}

/// Exact priority filter. `"all"` disables it; a value that names no priority matches nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
    Nothing,
}

impl From<&str> for PriorityFilter {
    fn from(value: &str) -> Self {
        if value == "all" {
            return PriorityFilter::All;
        }
        value
            .parse()
            .map_or(PriorityFilter::Nothing, PriorityFilter::Only)
    }
}

impl PriorityFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            PriorityFilter::All => true,
            PriorityFilter::Only(priority) => task.priority == *priority,
            PriorityFilter::Nothing => false,
        }
    }
}

/// Filters of the task list page, combined with logical AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: StatusFilter,
    pub priority: PriorityFilter,
    pub search: String,
}

/// Case-insensitive substring search over a record's text fields.
pub trait Searchable {
    /// `needle` is already lowercased and non-empty.
    fn contains_text(&self, needle: &str) -> bool;
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl Searchable for Task {
    fn contains_text(&self, needle: &str) -> bool {
        contains(&self.title, needle)
            || self.description.as_deref().is_some_and(|d| contains(d, needle))
    }
}

impl Searchable for Note {
    fn contains_text(&self, needle: &str) -> bool {
        contains(&self.title, needle)
            || contains(&self.content, needle)
            || self.tags.iter().any(|tag| contains(tag, needle))
    }
}

impl Searchable for Meeting {
    fn contains_text(&self, needle: &str) -> bool {
        contains(&self.title, needle)
            || self.description.as_deref().is_some_and(|d| contains(d, needle))
    }
}

pub fn matches_search<R: Searchable>(record: &R, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    record.contains_text(&query.to_lowercase())
}

pub fn search<R: Searchable + Clone>(records: &[R], query: &str) -> Vec<R> {
    records
        .iter()
        .filter(|record| matches_search(*record, query))
        .cloned()
        .collect()
}

pub fn tasks_due_on(tasks: &[Task], date: NaiveDate) -> Vec<Task> {
    tasks.iter().filter(|task| task.due_date == date).cloned().collect()
}

pub fn tasks_by_status(tasks: &[Task], status: StatusFilter) -> Vec<Task> {
    tasks.iter().filter(|task| status.matches(task)).cloned().collect()
}

pub fn tasks_by_priority(tasks: &[Task], priority: PriorityFilter) -> Vec<Task> {
    tasks.iter().filter(|task| priority.matches(task)).cloned().collect()
}

pub fn sort_tasks_newest_first(tasks: &mut [Task]) {
    tasks.sort_by_key(|task| Reverse(task.created_at));
}

/// Task list page: status AND priority AND search, newest first.
pub fn filter_tasks(tasks: &[Task], filter: &TaskFilter) -> Vec<Task> {
    let mut filtered: Vec<Task> = tasks
        .iter()
        .filter(|task| filter.status.matches(task))
        .filter(|task| filter.priority.matches(task))
        .filter(|task| matches_search(*task, &filter.search))
        .cloned()
        .collect();
    sort_tasks_newest_first(&mut filtered);
    filtered
}

pub fn sort_notes_recent_first(notes: &mut [Note]) {
    notes.sort_by_key(|note| Reverse(note.updated_at));
}

pub fn recent_notes(notes: &[Note], limit: usize) -> Vec<Note> {
    let mut sorted = notes.to_vec();
    sort_notes_recent_first(&mut sorted);
    sorted.truncate(limit);
    sorted
}

/// Note list page: search, most recently updated first.
pub fn filter_notes(notes: &[Note], query: &str) -> Vec<Note> {
    let mut filtered = search(notes, query);
    sort_notes_recent_first(&mut filtered);
    filtered
}

pub fn sort_meetings_chronological(meetings: &mut [Meeting]) {
    meetings.sort_by_key(|meeting| (meeting.date, meeting.time));
}

pub fn meetings_on(meetings: &[Meeting], date: NaiveDate) -> Vec<Meeting> {
    meetings.iter().filter(|meeting| meeting.date == date).cloned().collect()
}

/// Meetings dated within `[today, today + days]`, earliest first.
pub fn upcoming_meetings(meetings: &[Meeting], today: NaiveDate, days: u32) -> Vec<Meeting> {
    let last = today
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX);
    let mut upcoming: Vec<Meeting> = meetings
        .iter()
        .filter(|meeting| meeting.date >= today && meeting.date <= last)
        .cloned()
        .collect();
    sort_meetings_chronological(&mut upcoming);
    upcoming
}

/// Meeting list page: search, earliest first.
pub fn filter_meetings(meetings: &[Meeting], query: &str) -> Vec<Meeting> {
    let mut filtered = search(meetings, query);
    sort_meetings_chronological(&mut filtered);
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MeetingDraft, NoteDraft, Record, RecordId, TaskDraft};
    use chrono::{DateTime, NaiveTime, TimeZone, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn stamp(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, hour, 0, 0).unwrap()
    }

    fn task(id: RecordId, priority: Priority, completed: bool, created_hour: u32) -> Task {
        let mut draft = TaskDraft::new(format!("Task {id}"), day(20));
        draft.priority = priority;
        let mut task = Task::from_draft(id, draft, stamp(created_hour)).unwrap();
        task.completed = completed;
        task
    }

    fn meeting(id: RecordId, date: NaiveDate, hour: u32) -> Meeting {
        let draft = MeetingDraft::new(format!("Meeting {id}"), date, NaiveTime::from_hms_opt(hour, 0, 0).unwrap());
        Meeting::from_draft(id, draft, stamp(1)).unwrap()
    }

    #[test]
    fn status_filter_parses_known_values_only() {
        assert_eq!(StatusFilter::from("completed"), StatusFilter::Completed);
        assert_eq!(StatusFilter::from("pending"), StatusFilter::Pending);
        assert_eq!(StatusFilter::from("whatever"), StatusFilter::All);
    }

    #[test]
    fn priority_filter_all_and_unknown() {
        assert_eq!(PriorityFilter::from("all"), PriorityFilter::All);
        assert_eq!(PriorityFilter::from("high"), PriorityFilter::Only(Priority::High));
        assert_eq!(PriorityFilter::from("urgent"), PriorityFilter::Nothing);
    }

    #[test]
    fn composed_filters_are_anded() {
        let tasks = vec![
            task(1, Priority::High, false, 1),
            task(2, Priority::High, true, 2),
            task(3, Priority::Low, false, 3),
        ];
        let filter = TaskFilter {
            status: StatusFilter::Pending,
            priority: PriorityFilter::Only(Priority::High),
            search: String::new(),
        };
        let ids: Vec<_> = filter_tasks(&tasks, &filter).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn task_list_sorts_newest_first() {
        let tasks = vec![task(1, Priority::Low, false, 1), task(2, Priority::Low, false, 5), task(3, Priority::Low, false, 3)];
        let ids: Vec<_> = filter_tasks(&tasks, &TaskFilter::default()).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn search_is_case_insensitive_and_covers_tags() {
        let mut draft = NoteDraft::new("Groceries", "milk and eggs");
        draft.tags = vec!["Errands".to_string()];
        let notes = vec![Note::from_draft(1, draft, stamp(1)).unwrap()];

        assert_eq!(search(&notes, "MILK").len(), 1);
        assert_eq!(search(&notes, "errand").len(), 1);
        assert_eq!(search(&notes, "").len(), 1);
        assert!(search(&notes, "bread").is_empty());
    }

    #[test]
    fn task_search_ignores_missing_description() {
        let tasks = vec![task(1, Priority::Low, false, 1)];
        assert!(search(&tasks, "report").is_empty());
        assert_eq!(search(&tasks, "task 1").len(), 1);
    }

    #[test]
    fn recent_notes_orders_by_update_and_truncates() {
        let notes: Vec<Note> = (1..=5)
            .map(|id| {
                let mut note = Note::from_draft(id, NoteDraft::new("n", "c"), stamp(1)).unwrap();
                note.updated_at = stamp(id as u32);
                note
            })
            .collect();
        let ids: Vec<_> = recent_notes(&notes, 3).iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![5, 4, 3]);
        assert_eq!(recent_notes(&notes, 10).len(), 5);
    }

    #[test]
    fn upcoming_window_is_inclusive_and_chronological() {
        let meetings = vec![
            meeting(1, day(26), 9),
            meeting(2, day(19), 15),
            meeting(3, day(18), 9),
            meeting(4, day(19), 9),
            meeting(5, day(27), 9),
        ];
        let ids: Vec<_> = upcoming_meetings(&meetings, day(19), 7).iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![4, 2, 1]);
    }

    #[test]
    fn meetings_on_matches_exact_date() {
        let meetings = vec![meeting(1, day(19), 9), meeting(2, day(20), 9)];
        let ids: Vec<_> = meetings_on(&meetings, day(20)).iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn due_today_uses_calendar_date() {
        let mut other = task(2, Priority::Low, false, 1);
        other.due_date = day(21);
        let tasks = vec![task(1, Priority::Low, false, 1), other];
        let ids: Vec<_> = tasks_due_on(&tasks, day(20)).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1]);
    }
}
