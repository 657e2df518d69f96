use planner_macros::Record;
use serde::{Deserialize, Serialize};

use super::{Entry, User};
use crate::error::PlannerError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Record)]
#[record(collection = "sticky")]
pub struct Sticky {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub color: String,
}

/// Partial sticky update. Only the fields present are written.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StickyPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl StickyPatch {
    fn is_empty(&self) -> bool {
        self.topic.is_none() && self.content.is_none() && self.color.is_none()
    }
}

impl Entry for Sticky {
    const KIND: &'static str = "sticky";
    const LABEL: &'static str = "Sticky";
    const EMPTY_MESSAGE: &'static str = "No Sticky found for this user";

    type Patch = StickyPatch;

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), PlannerError> {
        if self.topic.is_empty() || self.content.is_empty() || self.color.is_empty() {
            return Err(PlannerError::Validation(
                "Topic, Content and Color are required fields".into(),
            ));
        }
        Ok(())
    }

    fn validate_patch(patch: &StickyPatch) -> Result<(), PlannerError> {
        if patch.is_empty() {
            return Err(PlannerError::Validation("No fields to update".into()));
        }
        Ok(())
    }

    fn apply_patch(&mut self, patch: StickyPatch) {
        if let Some(topic) = patch.topic {
            self.topic = topic;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
    }

    fn embedded(user: &User) -> &Vec<Self> {
        &user.sticky
    }

    fn embedded_mut(user: &mut User) -> &mut Vec<Self> {
        &mut user.sticky
    }
}
