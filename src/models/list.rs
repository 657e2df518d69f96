use planner_macros::Record;
use serde::{Deserialize, Serialize};

use super::{Entry, User};
use crate::error::PlannerError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Record)]
#[record(collection = "list")]
pub struct List {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
}

impl Entry for List {
    const KIND: &'static str = "list";
    const LABEL: &'static str = "List";
    const EMPTY_MESSAGE: &'static str = "No list found for this user";

    type Patch = List;

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), PlannerError> {
        if self.name.is_empty() || self.color.is_empty() {
            return Err(PlannerError::Validation(
                "Color or Name for the list is missing".into(),
            ));
        }
        Ok(())
    }

    fn apply_patch(&mut self, patch: List) {
        self.name = patch.name;
        self.color = patch.color;
    }

    fn embedded(user: &User) -> &Vec<Self> {
        &user.list
    }

    fn embedded_mut(user: &mut User) -> &mut Vec<Self> {
        &mut user.list
    }
}
