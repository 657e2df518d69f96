use chrono::{DateTime, Utc};
use planner_macros::Record;
use serde::{Deserialize, Serialize};

use super::{Entry, User};
use crate::error::PlannerError;

/// Seconds from the Unix epoch to `0001-01-01T00:00:00Z`, the zero time
/// older clients send for an unset timestamp.
const ZERO_TIME_SECS: i64 = -62_135_596_800;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Record)]
#[record(collection = "event")]
pub struct Event {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub color: String,
}

fn is_zero(ts: &Option<DateTime<Utc>>) -> bool {
    match ts {
        None => true,
        Some(t) => t.timestamp() == ZERO_TIME_SECS && t.timestamp_subsec_nanos() == 0,
    }
}

impl Entry for Event {
    const KIND: &'static str = "event";
    const LABEL: &'static str = "Event";
    const EMPTY_MESSAGE: &'static str = "No events found for this user";

    type Patch = Event;

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), PlannerError> {
        if self.title.is_empty() || is_zero(&self.start) || is_zero(&self.end) {
            return Err(PlannerError::Validation(
                "Title, Start, and End are required fields".into(),
            ));
        }
        Ok(())
    }

    fn apply_patch(&mut self, patch: Event) {
        let id = std::mem::take(&mut self.id);
        *self = Event { id, ..patch };
    }

    fn embedded(user: &User) -> &Vec<Self> {
        &user.event
    }

    fn embedded_mut(user: &mut User) -> &mut Vec<Self> {
        &mut user.event
    }
}
