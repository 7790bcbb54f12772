//! Place type

use crate::entity::{opt_int, opt_number, opt_string, string, InvalidField, Model};
use crate::{BaseModel, EntityKind};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A rentable place, located in a city and owned by a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(flatten)]
    pub base: BaseModel,
    #[serde(default)]
    pub city_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_rooms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_bathrooms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_guest: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_by_night: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<Number>,
    /// Linked amenities, in link order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub amenity_ids: Vec<String>,
}

impl Place {
    pub fn has_amenity(&self, amenity_id: &str) -> bool {
        self.amenity_ids.iter().any(|id| id == amenity_id)
    }

    /// Returns false if the amenity was already linked.
    pub fn link_amenity(&mut self, amenity_id: &str) -> bool {
        if self.has_amenity(amenity_id) {
            return false;
        }
        self.amenity_ids.push(amenity_id.to_string());
        true
    }

    /// Returns false if the amenity was not linked.
    pub fn unlink_amenity(&mut self, amenity_id: &str) -> bool {
        let before = self.amenity_ids.len();
        self.amenity_ids.retain(|id| id != amenity_id);
        self.amenity_ids.len() != before
    }
}

impl Model for Place {
    const KIND: EntityKind = EntityKind::Place;
    const IMMUTABLE: &'static [&'static str] = &["user_id", "city_id"];

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn assign(&mut self, field: &str, value: &Value) -> Result<bool, InvalidField> {
        match field {
            "city_id" => self.city_id = string(field, value)?,
            "user_id" => self.user_id = string(field, value)?,
            "name" => self.name = string(field, value)?,
            "description" => self.description = opt_string(field, value)?,
            "number_rooms" => self.number_rooms = opt_int(field, value)?,
            "number_bathrooms" => self.number_bathrooms = opt_int(field, value)?,
            "max_guest" => self.max_guest = opt_int(field, value)?,
            "price_by_night" => self.price_by_night = opt_int(field, value)?,
            "latitude" => self.latitude = opt_number(field, value)?,
            "longitude" => self.longitude = opt_number(field, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}
