use crate::models::{Record, RecordId};

/// Next identifier for a collection: one past the highest id present, or 1 when empty.
///
/// Recomputed from the live records each time, so deleting the highest record frees its id
/// for the next creation. Persisted collections depend on this.
pub fn next_id<R: Record>(records: &[R]) -> RecordId {
    records.iter().map(Record::id).fold(0, RecordId::max) + 1
}

/// Lookup keys accepted by repository operations.
///
/// Text is read like an integer literal with optional leading whitespace and trailing junk
/// (`"7"`, `" 7"` and `"7th"` all resolve to 7). Anything else yields `None`, which callers
/// treat as not-found.
pub trait IntoRecordId {
    fn into_record_id(self) -> Option<RecordId>;
}

impl IntoRecordId for RecordId {
    fn into_record_id(self) -> Option<RecordId> {
        Some(self)
    }
}

impl IntoRecordId for i32 {
    fn into_record_id(self) -> Option<RecordId> {
        Some(RecordId::from(self))
    }
}

impl IntoRecordId for u32 {
    fn into_record_id(self) -> Option<RecordId> {
        Some(RecordId::from(self))
    }
}

impl IntoRecordId for &str {
    fn into_record_id(self) -> Option<RecordId> {
        parse_leading_int(self)
    }
}

impl IntoRecordId for &String {
    fn into_record_id(self) -> Option<RecordId> {
        parse_leading_int(self)
    }
}

impl IntoRecordId for String {
    fn into_record_id(self) -> Option<RecordId> {
        parse_leading_int(&self)
    }
}

fn parse_leading_int(raw: &str) -> Option<RecordId> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(digits.len(), |(idx, _)| idx);
    digits[..end].parse::<RecordId>().ok().map(|value| sign * value)
}
