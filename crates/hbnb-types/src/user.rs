//! User types

use crate::entity::{opt_string, string, InvalidField, Model};
use crate::{BaseModel, EntityKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// User account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub base: BaseModel,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl Model for User {
    const KIND: EntityKind = EntityKind::User;
    const IMMUTABLE: &'static [&'static str] = &["email"];

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn assign(&mut self, field: &str, value: &Value) -> Result<bool, InvalidField> {
        match field {
            "email" => self.email = string(field, value)?,
            "password" => self.password = string(field, value)?,
            "first_name" => self.first_name = opt_string(field, value)?,
            "last_name" => self.last_name = opt_string(field, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}
