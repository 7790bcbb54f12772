//! State type

use crate::entity::{string, InvalidField, Model};
use crate::{BaseModel, EntityKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A state; owns many cities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(flatten)]
    pub base: BaseModel,
    #[serde(default)]
    pub name: String,
}

impl Model for State {
    const KIND: EntityKind = EntityKind::State;
    const IMMUTABLE: &'static [&'static str] = &[];

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn assign(&mut self, field: &str, value: &Value) -> Result<bool, InvalidField> {
        match field {
            "name" => self.name = string(field, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}
