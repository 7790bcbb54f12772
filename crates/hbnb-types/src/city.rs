//! City type

use crate::entity::{string, InvalidField, Model};
use crate::{BaseModel, EntityKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(flatten)]
    pub base: BaseModel,
    #[serde(default)]
    pub state_id: String,
    #[serde(default)]
    pub name: String,
}

impl Model for City {
    const KIND: EntityKind = EntityKind::City;
    const IMMUTABLE: &'static [&'static str] = &["state_id"];

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn assign(&mut self, field: &str, value: &Value) -> Result<bool, InvalidField> {
        match field {
            "state_id" => self.state_id = string(field, value)?,
            "name" => self.name = string(field, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}
