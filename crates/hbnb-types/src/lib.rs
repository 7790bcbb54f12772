//! HBNB Types - Pure entity definitions
//!
//! This crate contains only the data model: the common base record, the six
//! entities and the tagged [`Entity`] variant used by the storage engines.
//! It has no async runtime or storage dependencies.

pub mod amenity;
pub mod base;
pub mod city;
pub mod entity;
pub mod place;
pub mod review;
pub mod state;
pub mod user;

pub use amenity::Amenity;
pub use base::{BaseModel, TIME_FORMAT};
pub use city::City;
pub use entity::{Entity, EntityKind, InvalidField, Model, UnknownKind};
pub use place::Place;
pub use review::Review;
pub use state::State;
pub use user::User;
