use planner_macros::Record;
use serde::{Deserialize, Serialize};

use super::{Event, List, Sticky, Todo};

/// A planner account, keyed by email, with full copies of everything it owns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Record)]
#[record(collection = "user")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[record(unique)]
    pub email: String,
    #[serde(default)]
    pub picture: String,
    #[serde(default)]
    pub todos: Vec<Todo>,
    #[serde(default)]
    pub sticky: Vec<Sticky>,
    #[serde(default)]
    pub list: Vec<List>,
    #[serde(default)]
    pub event: Vec<Event>,
}

impl User {
    /// A fresh account with empty embedded arrays.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        picture: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            picture: picture.into(),
            ..Self::default()
        }
    }
}
