//! Entity kinds, the tagged entity variant and the `Model` trait

use crate::{Amenity, BaseModel, City, Place, Review, State, User};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::str::FromStr;
use thiserror::Error;

/// A payload value whose type does not match the attribute it targets
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {0}")]
pub struct InvalidField(pub String);

/// Name that does not match any entity kind
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown entity kind: {0}")]
pub struct UnknownKind(pub String);

/// Entity types known to the storage engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Amenity,
    City,
    Place,
    Review,
    State,
    User,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Amenity,
        EntityKind::City,
        EntityKind::Place,
        EntityKind::Review,
        EntityKind::State,
        EntityKind::User,
    ];

    /// Class name, as used in `__class__` and storage keys
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Amenity => "Amenity",
            EntityKind::City => "City",
            EntityKind::Place => "Place",
            EntityKind::Review => "Review",
            EntityKind::State => "State",
            EntityKind::User => "User",
        }
    }

    /// Plural name used for routes, tables and stats
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::Amenity => "amenities",
            EntityKind::City => "cities",
            EntityKind::Place => "places",
            EntityKind::Review => "reviews",
            EntityKind::State => "states",
            EntityKind::User => "users",
        }
    }

    /// Storage key, `"<Class>.<id>"`
    pub fn key(self, id: &str) -> String {
        format!("{}.{}", self.as_str(), id)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// Any persisted record.
///
/// Serializes to the record's dictionary form, tagged with `__class__`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__class__")]
pub enum Entity {
    Amenity(Amenity),
    City(City),
    Place(Place),
    Review(Review),
    State(State),
    User(User),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Amenity(_) => EntityKind::Amenity,
            Entity::City(_) => EntityKind::City,
            Entity::Place(_) => EntityKind::Place,
            Entity::Review(_) => EntityKind::Review,
            Entity::State(_) => EntityKind::State,
            Entity::User(_) => EntityKind::User,
        }
    }

    pub fn base(&self) -> &BaseModel {
        match self {
            Entity::Amenity(m) => &m.base,
            Entity::City(m) => &m.base,
            Entity::Place(m) => &m.base,
            Entity::Review(m) => &m.base,
            Entity::State(m) => &m.base,
            Entity::User(m) => &m.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn key(&self) -> String {
        self.kind().key(self.id())
    }
}

/// Behaviour shared by the six concrete entity types
pub trait Model:
    Clone + Default + Send + Sync + 'static + Into<Entity> + TryFrom<Entity, Error = Entity>
{
    const KIND: EntityKind;

    /// Attributes, besides the base fields, that an update never changes
    const IMMUTABLE: &'static [&'static str];

    fn base(&self) -> &BaseModel;

    fn base_mut(&mut self) -> &mut BaseModel;

    /// Assign one payload value onto the record.
    ///
    /// Returns `Ok(false)` when `field` is not a client-settable attribute.
    fn assign(&mut self, field: &str, value: &Value) -> Result<bool, InvalidField>;

    fn id(&self) -> &str {
        &self.base().id
    }

    /// Build a fresh record from a create payload
    fn from_payload(payload: &Map<String, Value>) -> Result<Self, InvalidField> {
        let mut model = Self::default();
        for (field, value) in payload {
            model.assign(field, value)?;
        }
        Ok(model)
    }

    /// Apply an update payload, skipping ignore-listed fields.
    ///
    /// Either every value is applied or, on the first invalid one, none is.
    fn update_from(&mut self, payload: &Map<String, Value>) -> Result<(), InvalidField> {
        let mut draft = self.clone();
        for (field, value) in payload {
            if Self::IMMUTABLE.contains(&field.as_str()) {
                continue;
            }
            draft.assign(field, value)?;
        }
        *self = draft;
        Ok(())
    }
}

macro_rules! entity_variant {
    ($($model:ident),* $(,)?) => {
        $(
            impl From<$model> for Entity {
                fn from(model: $model) -> Self {
                    Entity::$model(model)
                }
            }

            impl TryFrom<Entity> for $model {
                type Error = Entity;

                fn try_from(entity: Entity) -> Result<Self, Self::Error> {
                    match entity {
                        Entity::$model(model) => Ok(model),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

entity_variant!(Amenity, City, Place, Review, State, User);

// Payload coercions. Each one rejects values of the wrong JSON type.

pub(crate) fn string(field: &str, value: &Value) -> Result<String, InvalidField> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| InvalidField(field.to_string()))
}

pub(crate) fn opt_string(field: &str, value: &Value) -> Result<Option<String>, InvalidField> {
    match value {
        Value::Null => Ok(None),
        other => string(field, other).map(Some),
    }
}

pub(crate) fn opt_int(field: &str, value: &Value) -> Result<Option<i64>, InvalidField> {
    match value {
        Value::Null => Ok(None),
        other => other
            .as_i64()
            .map(Some)
            .ok_or_else(|| InvalidField(field.to_string())),
    }
}

/// Keeps the number as written, so `-122` stays an integer.
pub(crate) fn opt_number(field: &str, value: &Value) -> Result<Option<Number>, InvalidField> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(Some(n.clone())),
        _ => Err(InvalidField(field.to_string())),
    }
}
