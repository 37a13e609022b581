//! Default collections shipped with the binary, used when nothing was stored yet.

use serde::de::DeserializeOwned;

use crate::models::{Meeting, Note, Task};

use super::StoreResult;

const TASKS: &str = include_str!("../../data/tasks.json");
const NOTES: &str = include_str!("../../data/notes.json");
const MEETINGS: &str = include_str!("../../data/meetings.json");

fn parse<R: DeserializeOwned>(raw: &str) -> StoreResult<Vec<R>> {
    Ok(serde_json::from_str(raw)?)
}

pub fn tasks() -> StoreResult<Vec<Task>> {
    parse(TASKS)
}

pub fn notes() -> StoreResult<Vec<Note>> {
    parse(NOTES)
}

pub fn meetings() -> StoreResult<Vec<Meeting>> {
    parse(MEETINGS)
}
