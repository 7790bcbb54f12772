//! Place handlers, listed and created under their city

use crate::error::ApiResult;
use crate::extractors::JsonBody;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hbnb_core::{City, Entity, InvalidField, Model, Place, StorageExt, User};
use serde_json::{Map, Value};

pub async fn list(
    State(app): State<AppState>,
    Path(city_id): Path<String>,
) -> ApiResult<Json<Vec<Entity>>> {
    let city = super::fetch::<City>(app.storage(), &city_id).await?;
    let places = app.storage().places_of_city(city.id()).await?;
    Ok(super::to_json(places))
}

pub async fn get(
    State(app): State<AppState>,
    Path(place_id): Path<String>,
) -> ApiResult<Json<Entity>> {
    super::show::<Place>(app.storage(), &place_id).await
}

pub async fn delete(
    State(app): State<AppState>,
    Path(place_id): Path<String>,
) -> ApiResult<Json<Value>> {
    super::destroy::<Place>(app.storage(), &place_id).await
}

pub async fn create(
    State(app): State<AppState>,
    Path(city_id): Path<String>,
    body: JsonBody,
) -> ApiResult<(StatusCode, Json<Entity>)> {
    let city = super::fetch::<City>(app.storage(), &city_id).await?;
    let payload = body.payload()?;
    super::require(&payload, &["user_id", "name"])?;

    let user_id = owner_id(&payload)?;
    super::fetch::<User>(app.storage(), user_id).await?;

    let mut place = Place::from_payload(&payload)?;
    place.city_id = city.base.id;
    super::insert(app.storage(), place).await
}

pub async fn update(
    State(app): State<AppState>,
    Path(place_id): Path<String>,
    body: JsonBody,
) -> ApiResult<Json<Entity>> {
    super::update::<Place>(app.storage(), &place_id, body).await
}

/// The payload's `user_id`, which must be a string
pub(crate) fn owner_id(payload: &Map<String, Value>) -> Result<&str, InvalidField> {
    payload
        .get("user_id")
        .and_then(Value::as_str)
        .ok_or_else(|| InvalidField("user_id".to_string()))
}
