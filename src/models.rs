use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub type RecordId = i64;

/// Shortest meeting the scheduler accepts, in minutes.
pub const MIN_MEETING_MINUTES: u32 = 15;
pub const DEFAULT_MEETING_MINUTES: u32 = 30;

/// Checks performed before a draft or patch is handed to a backend.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// One record kind stored in its own collection.
pub trait Record: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Fields supplied at creation time.
    type Draft: Validate + Clone + Debug + Send + Sync + 'static;
    /// Partial fields merged by `update`; `None` leaves the stored value untouched.
    type Patch: Validate + Clone + Debug + Default + Send + Sync + 'static;

    /// Human-readable kind, used in logs and CLI output.
    const KIND: &'static str;
    /// Key under which the serialized collection is persisted locally.
    const STORAGE_KEY: &'static str;

    fn id(&self) -> RecordId;

    /// Builds a stored record from a draft, stamping the creation time.
    fn from_draft(id: RecordId, draft: Self::Draft, now: DateTime<Utc>) -> Result<Self, ValidationError>;

    /// Merges the provided patch fields into this record.
    fn apply_patch(&mut self, patch: Self::Patch, now: DateTime<Utc>);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("Unknown priority: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "Id")]
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    pub due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "Id")]
    pub id: RecordId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    #[serde(rename = "Id")]
    pub id: RecordId,
    pub title: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub duration: u32,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Meeting {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.starts_at() + Duration::minutes(i64::from(self.duration))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            due_date: Some(due_date),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeetingDraft {
    pub title: String,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub duration: u32,
    pub description: Option<String>,
}

impl Default for MeetingDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            date: None,
            time: None,
            duration: DEFAULT_MEETING_MINUTES,
            description: None,
        }
    }
}

impl MeetingDraft {
    pub fn new(title: impl Into<String>, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            title: title.into(),
            date: Some(date),
            time: Some(time),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeetingPatch {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub duration: Option<u32>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
}

fn require_text(value: &str, missing: ValidationError) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(missing);
    }
    Ok(())
}

fn require_duration(minutes: u32) -> Result<(), ValidationError> {
    if minutes < MIN_MEETING_MINUTES {
        return Err(ValidationError::DurationTooShort(minutes));
    }
    Ok(())
}

impl Validate for TaskDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.title, ValidationError::MissingTitle)?;
        if self.due_date.is_none() {
            return Err(ValidationError::MissingDueDate);
        }
        Ok(())
    }
}

impl Validate for TaskPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require_text(title, ValidationError::MissingTitle)?;
        }
        Ok(())
    }
}

impl Validate for NoteDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.title, ValidationError::MissingTitle)?;
        require_text(&self.content, ValidationError::MissingContent)
    }
}

impl Validate for NotePatch {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require_text(title, ValidationError::MissingTitle)?;
        }
        if let Some(content) = &self.content {
            require_text(content, ValidationError::MissingContent)?;
        }
        Ok(())
    }
}

impl Validate for MeetingDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.title, ValidationError::MissingTitle)?;
        if self.date.is_none() {
            return Err(ValidationError::MissingDate);
        }
        if self.time.is_none() {
            return Err(ValidationError::MissingTime);
        }
        require_duration(self.duration)
    }
}

impl Validate for MeetingPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require_text(title, ValidationError::MissingTitle)?;
        }
        if let Some(duration) = self.duration {
            require_duration(duration)?;
        }
        Ok(())
    }
}

impl Record for Task {
    type Draft = TaskDraft;
    type Patch = TaskPatch;

    const KIND: &'static str = "task";
    const STORAGE_KEY: &'static str = "dailyflow_tasks";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_draft(id: RecordId, draft: TaskDraft, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        draft.validate()?;
        let due_date = draft.due_date.ok_or(ValidationError::MissingDueDate)?;
        Ok(Self {
            id,
            title: draft.title,
            description: draft.description,
            completed: false,
            priority: draft.priority,
            due_date,
            created_at: now,
        })
    }

    fn apply_patch(&mut self, patch: TaskPatch, _now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
    }
}

impl Record for Note {
    type Draft = NoteDraft;
    type Patch = NotePatch;

    const KIND: &'static str = "note";
    const STORAGE_KEY: &'static str = "dailyflow_notes";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_draft(id: RecordId, draft: NoteDraft, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        draft.validate()?;
        Ok(Self {
            id,
            title: draft.title,
            content: draft.content,
            tags: draft.tags,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: NotePatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        self.updated_at = now;
    }
}

impl Record for Meeting {
    type Draft = MeetingDraft;
    type Patch = MeetingPatch;

    const KIND: &'static str = "meeting";
    const STORAGE_KEY: &'static str = "dailyflow_meetings";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_draft(id: RecordId, draft: MeetingDraft, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        draft.validate()?;
        let date = draft.date.ok_or(ValidationError::MissingDate)?;
        let time = draft.time.ok_or(ValidationError::MissingTime)?;
        Ok(Self {
            id,
            title: draft.title,
            date,
            time,
            duration: draft.duration,
            description: draft.description,
            created_at: now,
        })
    }

    fn apply_patch(&mut self, patch: MeetingPatch, _now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(time) = patch.time {
            self.time = time;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
    }
}

/// Meeting times are stored as `HH:MM`; `HH:MM:SS` is accepted on read.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
        NaiveTime::parse_from_str(raw, FORMAT).or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn task_draft_requires_title_and_due_date() {
        let mut draft = TaskDraft::new("   ", date(2026, 3, 2));
        assert_eq!(draft.validate(), Err(ValidationError::MissingTitle));

        draft.title = "Write report".to_string();
        draft.due_date = None;
        assert_eq!(draft.validate(), Err(ValidationError::MissingDueDate));
    }

    #[test]
    fn new_task_starts_incomplete() {
        let task = Task::from_draft(1, TaskDraft::new("Ship", date(2026, 3, 2)), at(9)).unwrap();
        assert!(!task.completed);
        assert_eq!(task.created_at, at(9));
        assert_eq!(task.priority, Priority::Medium);
    }

    #[test]
    fn note_patch_refreshes_updated_at_only() {
        let mut note = Note::from_draft(4, NoteDraft::new("Idea", "Body"), at(8)).unwrap();
        assert_eq!(note.created_at, note.updated_at);

        note.apply_patch(
            NotePatch {
                content: Some("New body".to_string()),
                ..NotePatch::default()
            },
            at(10),
        );
        assert_eq!(note.title, "Idea");
        assert_eq!(note.content, "New body");
        assert_eq!(note.created_at, at(8));
        assert_eq!(note.updated_at, at(10));
    }

    #[test]
    fn meeting_duration_has_a_floor() {
        let mut draft = MeetingDraft::new("Standup", date(2026, 3, 2), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        draft.duration = 10;
        assert_eq!(draft.validate(), Err(ValidationError::DurationTooShort(10)));

        draft.duration = MIN_MEETING_MINUTES;
        assert!(draft.validate().is_ok());

        let patch = MeetingPatch {
            duration: Some(5),
            ..MeetingPatch::default()
        };
        assert_eq!(patch.validate(), Err(ValidationError::DurationTooShort(5)));
    }

    #[test]
    fn meeting_serializes_with_camel_case_field_names() {
        let meeting = Meeting::from_draft(
            7,
            MeetingDraft::new("Review", date(2026, 3, 2), NaiveTime::from_hms_opt(14, 30, 0).unwrap()),
            at(8),
        )
        .unwrap();
        let json = serde_json::to_value(&meeting).unwrap();
        assert_eq!(json["Id"], 7);
        assert_eq!(json["time"], "14:30");
        assert_eq!(json["date"], "2026-03-02");
        assert!(json.get("createdAt").is_some());

        let back: Meeting = serde_json::from_value(json).unwrap();
        assert_eq!(back, meeting);
    }

    #[test]
    fn meeting_end_adds_duration() {
        let meeting = Meeting::from_draft(
            1,
            MeetingDraft::new("Sync", date(2026, 3, 2), NaiveTime::from_hms_opt(23, 45, 0).unwrap()),
            at(8),
        )
        .unwrap();
        assert_eq!(meeting.ends_at(), date(2026, 3, 3).and_hms_opt(0, 15, 0).unwrap());
    }
}
