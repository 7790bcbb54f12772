//! Amenity handlers

use crate::error::ApiResult;
use crate::extractors::JsonBody;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hbnb_core::{Amenity, Entity, Model};
use serde_json::Value;

pub async fn list(State(app): State<AppState>) -> ApiResult<Json<Vec<Entity>>> {
    super::list::<Amenity>(app.storage()).await
}

pub async fn get(
    State(app): State<AppState>,
    Path(amenity_id): Path<String>,
) -> ApiResult<Json<Entity>> {
    super::show::<Amenity>(app.storage(), &amenity_id).await
}

pub async fn delete(
    State(app): State<AppState>,
    Path(amenity_id): Path<String>,
) -> ApiResult<Json<Value>> {
    super::destroy::<Amenity>(app.storage(), &amenity_id).await
}

pub async fn create(
    State(app): State<AppState>,
    body: JsonBody,
) -> ApiResult<(StatusCode, Json<Entity>)> {
    let payload = body.payload()?;
    super::require(&payload, &["name"])?;

    let amenity = Amenity::from_payload(&payload)?;
    super::insert(app.storage(), amenity).await
}

pub async fn update(
    State(app): State<AppState>,
    Path(amenity_id): Path<String>,
    body: JsonBody,
) -> ApiResult<Json<Entity>> {
    super::update::<Amenity>(app.storage(), &amenity_id, body).await
}
