//! Translation between record fields and the record service's column names.
//!
//! | record    | table       | columns                                                              |
//! |-----------|-------------|----------------------------------------------------------------------|
//! | `Task`    | `task_c`    | `title_c description_c completed_c priority_c due_date_c created_at_c` |
//! | `Note`    | `note_c`    | `title_c content_c tags_c created_at_c updated_at_c`                 |
//! | `Meeting` | `meeting_c` | `title_c date_c time_c duration_c description_c created_at_c`        |
//!
//! Note tags travel as one comma-joined string. The record service assigns `Id`.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::{Map, Value, json};

use crate::models::{
    DEFAULT_MEETING_MINUTES, Meeting, MeetingPatch, Note, NotePatch, Priority, Record, RecordId,
    Task, TaskPatch, hhmm,
};

use super::{StoreError, StoreResult};

pub type Fields = Map<String, Value>;

pub const ID_FIELD: &str = "Id";

/// A record kind that can be stored in the remote record service.
pub trait RemoteRecord: Record {
    const TABLE: &'static str;
    /// Columns requested when fetching.
    const FIELDS: &'static [&'static str];

    /// Every mapped column except `Id`.
    fn to_fields(&self) -> Fields;

    /// Only the columns named by the patch, plus any timestamp the mutation refreshes.
    fn patch_fields(patch: &Self::Patch, now: DateTime<Utc>) -> Fields;

    fn from_fields(value: &Value) -> StoreResult<Self>;
}

/// Splits a comma-joined tag column, trimming entries and dropping empty ones.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}

struct Reader<'a> {
    table: &'static str,
    fields: &'a Map<String, Value>,
}

impl<'a> Reader<'a> {
    fn new(table: &'static str, value: &'a Value) -> StoreResult<Self> {
        let fields = value.as_object().ok_or_else(|| StoreError::Malformed {
            table,
            message: "record is not an object".to_string(),
        })?;
        Ok(Self { table, fields })
    }

    fn malformed(&self, message: String) -> StoreError {
        StoreError::Malformed {
            table: self.table,
            message,
        }
    }

    fn id(&self) -> StoreResult<RecordId> {
        match self.fields.get(ID_FIELD) {
            Some(Value::Number(number)) => number
                .as_i64()
                .ok_or_else(|| self.malformed(format!("non-integer {ID_FIELD} {number}"))),
            Some(Value::String(text)) => text
                .trim()
                .parse()
                .map_err(|_| self.malformed(format!("non-integer {ID_FIELD} `{text}`"))),
            _ => Err(self.malformed(format!("missing {ID_FIELD}"))),
        }
    }

    fn text(&self, name: &str) -> Option<&'a str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    fn required_text(&self, name: &str) -> StoreResult<String> {
        self.text(name)
            .map(str::to_string)
            .ok_or_else(|| self.malformed(format!("missing {name}")))
    }

    fn optional_text(&self, name: &str) -> Option<String> {
        self.text(name)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn flag(&self, name: &str) -> bool {
        match self.fields.get(name) {
            Some(Value::Bool(value)) => *value,
            Some(Value::String(text)) => text.eq_ignore_ascii_case("true"),
            Some(Value::Number(number)) => number.as_i64().is_some_and(|value| value != 0),
            _ => false,
        }
    }

    fn date(&self, name: &str) -> StoreResult<NaiveDate> {
        let raw = self.required_text(name)?;
        // Date columns may carry a time suffix.
        let day = raw.get(..10).unwrap_or(&raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map_err(|err| self.malformed(format!("invalid {name} `{raw}`: {err}")))
    }

    fn time(&self, name: &str) -> StoreResult<NaiveTime> {
        let raw = self.required_text(name)?;
        hhmm::parse(&raw).map_err(|err| self.malformed(format!("invalid {name} `{raw}`: {err}")))
    }

    fn timestamp(&self, name: &str) -> StoreResult<DateTime<Utc>> {
        let raw = self.required_text(name)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|value| value.with_timezone(&Utc))
            .map_err(|err| self.malformed(format!("invalid {name} `{raw}`: {err}")))
    }

    fn priority(&self, name: &str) -> Priority {
        match self.text(name) {
            None | Some("") => Priority::default(),
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(table = self.table, value = raw, "Unknown priority, using medium.");
                Priority::default()
            }),
        }
    }

    /// Integer coercion in the manner of `parseInt`: numbers truncate, text reads its
    /// leading digits, anything unusable becomes `default`.
    fn minutes(&self, name: &str, default: u32) -> u32 {
        let parsed = match self.fields.get(name) {
            Some(Value::Number(number)) => number
                .as_u64()
                .or_else(|| number.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64)),
            Some(Value::String(text)) => {
                let digits: String = text.trim().chars().take_while(char::is_ascii_digit).collect();
                digits.parse().ok()
            }
            _ => None,
        };
        parsed
            .and_then(|value| u32::try_from(value).ok())
            .unwrap_or(default)
    }
}

fn timestamp(value: &DateTime<Utc>) -> Value {
    Value::String(value.to_rfc3339())
}

fn date(value: &NaiveDate) -> Value {
    Value::String(value.format("%Y-%m-%d").to_string())
}

fn time(value: &NaiveTime) -> Value {
    Value::String(value.format(hhmm::FORMAT).to_string())
}

fn optional_text(value: &Option<String>) -> Value {
    Value::String(value.clone().unwrap_or_default())
}

fn into_fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

impl RemoteRecord for Task {
    const TABLE: &'static str = "task_c";
    const FIELDS: &'static [&'static str] = &[
        ID_FIELD,
        "title_c",
        "description_c",
        "completed_c",
        "priority_c",
        "due_date_c",
        "created_at_c",
    ];

    fn to_fields(&self) -> Fields {
        into_fields(json!({
            "title_c": self.title,
            "description_c": optional_text(&self.description),
            "completed_c": self.completed,
            "priority_c": self.priority.as_str(),
            "due_date_c": date(&self.due_date),
            "created_at_c": timestamp(&self.created_at),
        }))
    }

    fn patch_fields(patch: &TaskPatch, _now: DateTime<Utc>) -> Fields {
        let mut fields = Fields::new();
        if let Some(title) = &patch.title {
            fields.insert("title_c".into(), Value::String(title.clone()));
        }
        if let Some(description) = &patch.description {
            fields.insert("description_c".into(), optional_text(description));
        }
        if let Some(completed) = patch.completed {
            fields.insert("completed_c".into(), Value::Bool(completed));
        }
        if let Some(priority) = patch.priority {
            fields.insert("priority_c".into(), Value::String(priority.as_str().into()));
        }
        if let Some(due_date) = &patch.due_date {
            fields.insert("due_date_c".into(), date(due_date));
        }
        fields
    }

    fn from_fields(value: &Value) -> StoreResult<Self> {
        let reader = Reader::new(Self::TABLE, value)?;
        Ok(Self {
            id: reader.id()?,
            title: reader.required_text("title_c")?,
            description: reader.optional_text("description_c"),
            completed: reader.flag("completed_c"),
            priority: reader.priority("priority_c"),
            due_date: reader.date("due_date_c")?,
            created_at: reader.timestamp("created_at_c")?,
        })
    }
}

impl RemoteRecord for Note {
    const TABLE: &'static str = "note_c";
    const FIELDS: &'static [&'static str] = &[
        ID_FIELD,
        "title_c",
        "content_c",
        "tags_c",
        "created_at_c",
        "updated_at_c",
    ];

    fn to_fields(&self) -> Fields {
        into_fields(json!({
            "title_c": self.title,
            "content_c": self.content,
            "tags_c": join_tags(&self.tags),
            "created_at_c": timestamp(&self.created_at),
            "updated_at_c": timestamp(&self.updated_at),
        }))
    }

    fn patch_fields(patch: &NotePatch, now: DateTime<Utc>) -> Fields {
        let mut fields = Fields::new();
        if let Some(title) = &patch.title {
            fields.insert("title_c".into(), Value::String(title.clone()));
        }
        if let Some(content) = &patch.content {
            fields.insert("content_c".into(), Value::String(content.clone()));
        }
        if let Some(tags) = &patch.tags {
            fields.insert("tags_c".into(), Value::String(join_tags(tags)));
        }
        fields.insert("updated_at_c".into(), timestamp(&now));
        fields
    }

    fn from_fields(value: &Value) -> StoreResult<Self> {
        let reader = Reader::new(Self::TABLE, value)?;
        let created_at = reader.timestamp("created_at_c")?;
        Ok(Self {
            id: reader.id()?,
            title: reader.required_text("title_c")?,
            content: reader.text("content_c").unwrap_or_default().to_string(),
            tags: reader.text("tags_c").map(split_tags).unwrap_or_default(),
            created_at,
            updated_at: reader.timestamp("updated_at_c").unwrap_or(created_at),
        })
    }
}

impl RemoteRecord for Meeting {
    const TABLE: &'static str = "meeting_c";
    const FIELDS: &'static [&'static str] = &[
        ID_FIELD,
        "title_c",
        "date_c",
        "time_c",
        "duration_c",
        "description_c",
        "created_at_c",
    ];

    fn to_fields(&self) -> Fields {
        into_fields(json!({
            "title_c": self.title,
            "date_c": date(&self.date),
            "time_c": time(&self.time),
            "duration_c": self.duration,
            "description_c": optional_text(&self.description),
            "created_at_c": timestamp(&self.created_at),
        }))
    }

    fn patch_fields(patch: &MeetingPatch, _now: DateTime<Utc>) -> Fields {
        let mut fields = Fields::new();
        if let Some(title) = &patch.title {
            fields.insert("title_c".into(), Value::String(title.clone()));
        }
        if let Some(day) = &patch.date {
            fields.insert("date_c".into(), date(day));
        }
        if let Some(at) = &patch.time {
            fields.insert("time_c".into(), time(at));
        }
        if let Some(duration) = patch.duration {
            fields.insert("duration_c".into(), Value::from(duration));
        }
        if let Some(description) = &patch.description {
            fields.insert("description_c".into(), optional_text(description));
        }
        fields
    }

    fn from_fields(value: &Value) -> StoreResult<Self> {
        let reader = Reader::new(Self::TABLE, value)?;
        Ok(Self {
            id: reader.id()?,
            title: reader.required_text("title_c")?,
            date: reader.date("date_c")?,
            time: reader.time("time_c")?,
            duration: reader.minutes("duration_c", DEFAULT_MEETING_MINUTES),
            description: reader.optional_text("description_c"),
            created_at: reader.timestamp("created_at_c")?,
        })
    }
}
