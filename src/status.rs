//! Time-dependent classification of records. Every function takes "now" explicitly.

use std::fmt::{self, Display, Formatter};

use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{Meeting, Task};

/// A task is overdue once its due date is strictly in the past and it is still open.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    task.due_date < today && !task.completed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeetingPhase {
    Upcoming,
    Ongoing,
    Completed,
}

impl MeetingPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingPhase::Upcoming => "upcoming",
            MeetingPhase::Ongoing => "ongoing",
            MeetingPhase::Completed => "completed",
        }
    }
}

impl Display for MeetingPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase of a meeting at local time `now`. Both the start and end instants count as ongoing.
pub fn meeting_phase(meeting: &Meeting, now: NaiveDateTime) -> MeetingPhase {
    if now < meeting.starts_at() {
        MeetingPhase::Upcoming
    } else if now <= meeting.ends_at() {
        MeetingPhase::Ongoing
    } else {
        MeetingPhase::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MeetingDraft, Record, TaskDraft};
    use chrono::{Duration, NaiveTime, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn task_due(due: NaiveDate, completed: bool) -> Task {
        let mut task = Task::from_draft(1, TaskDraft::new("Pay rent", due), Utc::now()).unwrap();
        task.completed = completed;
        task
    }

    fn meeting_at(start: NaiveDateTime, minutes: u32) -> Meeting {
        let mut draft = MeetingDraft::new("Sync", start.date(), start.time());
        draft.duration = minutes;
        Meeting::from_draft(1, draft, Utc::now()).unwrap()
    }

    #[test]
    fn due_today_is_not_overdue() {
        assert!(!is_overdue(&task_due(day(19), false), day(19)));
    }

    #[test]
    fn due_yesterday_is_overdue_unless_completed() {
        assert!(is_overdue(&task_due(day(18), false), day(19)));
        assert!(!is_overdue(&task_due(day(18), true), day(19)));
    }

    #[test]
    fn meeting_phase_boundaries() {
        let start = day(19).and_time(NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        let meeting = meeting_at(start, 30);

        assert_eq!(meeting_phase(&meeting, start - Duration::minutes(1)), MeetingPhase::Upcoming);
        assert_eq!(meeting_phase(&meeting, start), MeetingPhase::Ongoing);
        assert_eq!(meeting_phase(&meeting, start + Duration::minutes(30)), MeetingPhase::Ongoing);
        assert_eq!(meeting_phase(&meeting, start + Duration::minutes(31)), MeetingPhase::Completed);
    }

    #[test]
    fn meeting_crossing_midnight_is_ongoing_next_day() {
        let start = day(19).and_time(NaiveTime::from_hms_opt(23, 30, 0).unwrap());
        let meeting = meeting_at(start, 60);
        let after_midnight = day(20).and_time(NaiveTime::from_hms_opt(0, 15, 0).unwrap());
        assert_eq!(meeting_phase(&meeting, after_midnight), MeetingPhase::Ongoing);
    }
}
