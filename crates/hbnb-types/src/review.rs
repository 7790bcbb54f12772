//! Review type

use crate::entity::{string, InvalidField, Model};
use crate::{BaseModel, EntityKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A user's review of a place
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(flatten)]
    pub base: BaseModel,
    #[serde(default)]
    pub place_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub text: String,
}

impl Model for Review {
    const KIND: EntityKind = EntityKind::Review;
    const IMMUTABLE: &'static [&'static str] = &["place_id", "user_id"];

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn assign(&mut self, field: &str, value: &Value) -> Result<bool, InvalidField> {
        match field {
            "place_id" => self.place_id = string(field, value)?,
            "user_id" => self.user_id = string(field, value)?,
            "text" => self.text = string(field, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}
