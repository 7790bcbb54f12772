//! HBNB Core Library
//!
//! Error type and the storage port shared by the storage engines and the
//! HTTP layer.

// Re-export the entity model from hbnb-types
pub use hbnb_types::*;

pub mod error;
pub mod ports;

pub use error::{HbnbError, Result};
pub use ports::{Storage, StorageExt};
