use planner_macros::Record;
use serde::{Deserialize, Serialize};

use super::{Entry, User};
use crate::error::PlannerError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Record)]
#[record(collection = "todo")]
pub struct Todo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub list: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub sub_task: Vec<String>,
}

impl Entry for Todo {
    const KIND: &'static str = "todo";
    const LABEL: &'static str = "Todo";
    const EMPTY_MESSAGE: &'static str = "No todos found for this user";

    // Full replacement: omitted fields are written as empty values.
    type Patch = Todo;

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), PlannerError> {
        if self.name.is_empty() {
            return Err(PlannerError::Validation("Name is a required field".into()));
        }
        Ok(())
    }

    fn apply_patch(&mut self, patch: Todo) {
        let id = std::mem::take(&mut self.id);
        *self = Todo { id, ..patch };
    }

    fn embedded(user: &User) -> &Vec<Self> {
        &user.todos
    }

    fn embedded_mut(user: &mut User) -> &mut Vec<Self> {
        &mut user.todos
    }
}
