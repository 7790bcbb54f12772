//! Business logic services

pub mod place_search;

pub use place_search::{search, PlaceFilter};
