//! HTTP handlers
//!
//! Every entity follows one template; the generic helpers below carry it and
//! the per-entity modules add path resolution and required fields.

pub mod amenities;
pub mod cities;
pub mod index;
pub mod places;
pub mod places_amenities;
pub mod places_search;
pub mod reviews;
pub mod states;
pub mod users;

pub use index::{not_found, stats, status};

use crate::error::{ApiError, ApiResult};
use crate::extractors::JsonBody;
use axum::{http::StatusCode, Json};
use hbnb_core::{Entity, Model, Storage, StorageExt};
use serde_json::{json, Map, Value};

/// Look up a record by id, or 404
pub(crate) async fn fetch<T: Model>(storage: &dyn Storage, id: &str) -> ApiResult<T> {
    storage.get_as::<T>(id).await?.ok_or(ApiError::NotFound)
}

/// Fail on the first of `fields` missing from `payload`
pub(crate) fn require(payload: &Map<String, Value>, fields: &[&'static str]) -> ApiResult<()> {
    match fields.iter().copied().find(|f| !payload.contains_key(*f)) {
        Some(field) => Err(ApiError::MissingField(field)),
        None => Ok(()),
    }
}

pub(crate) fn to_json<T: Model>(models: Vec<T>) -> Json<Vec<Entity>> {
    Json(models.into_iter().map(Into::into).collect())
}

pub(crate) async fn list<T: Model>(storage: &dyn Storage) -> ApiResult<Json<Vec<Entity>>> {
    Ok(to_json(storage.all_of::<T>().await?))
}

pub(crate) async fn show<T: Model>(storage: &dyn Storage, id: &str) -> ApiResult<Json<Entity>> {
    Ok(Json(fetch::<T>(storage, id).await?.into()))
}

pub(crate) async fn destroy<T: Model>(storage: &dyn Storage, id: &str) -> ApiResult<Json<Value>> {
    let model = fetch::<T>(storage, id).await?;
    storage.delete(T::KIND, model.id()).await?;
    storage.save().await?;
    tracing::info!("Deleted {}", T::KIND.key(id));
    Ok(Json(json!({})))
}

/// Persist a freshly built record and answer 201
pub(crate) async fn insert<T: Model>(
    storage: &dyn Storage,
    model: T,
) -> ApiResult<(StatusCode, Json<Entity>)> {
    storage.put(model.clone()).await?;
    storage.save().await?;
    tracing::info!("Created {}", T::KIND.key(model.id()));
    Ok((StatusCode::CREATED, Json(model.into())))
}

pub(crate) async fn update<T: Model>(
    storage: &dyn Storage,
    id: &str,
    body: JsonBody,
) -> ApiResult<Json<Entity>> {
    let mut model = fetch::<T>(storage, id).await?;
    let payload = body.payload()?;

    model.update_from(&payload)?;
    model.base_mut().touch();
    storage.put(model.clone()).await?;
    storage.save().await?;
    Ok(Json(model.into()))
}
