//! City handlers, listed and created under their state

use crate::error::ApiResult;
use crate::extractors::JsonBody;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hbnb_core::{City, Entity, Model, State as StateModel, StorageExt};
use serde_json::Value;

pub async fn list(
    State(app): State<AppState>,
    Path(state_id): Path<String>,
) -> ApiResult<Json<Vec<Entity>>> {
    let state = super::fetch::<StateModel>(app.storage(), &state_id).await?;
    let cities = app.storage().cities_of_state(state.id()).await?;
    Ok(super::to_json(cities))
}

pub async fn get(
    State(app): State<AppState>,
    Path(city_id): Path<String>,
) -> ApiResult<Json<Entity>> {
    super::show::<City>(app.storage(), &city_id).await
}

pub async fn delete(
    State(app): State<AppState>,
    Path(city_id): Path<String>,
) -> ApiResult<Json<Value>> {
    super::destroy::<City>(app.storage(), &city_id).await
}

pub async fn create(
    State(app): State<AppState>,
    Path(state_id): Path<String>,
    body: JsonBody,
) -> ApiResult<(StatusCode, Json<Entity>)> {
    let state = super::fetch::<StateModel>(app.storage(), &state_id).await?;
    let payload = body.payload()?;
    super::require(&payload, &["name"])?;

    let mut city = City::from_payload(&payload)?;
    city.state_id = state.base.id;
    super::insert(app.storage(), city).await
}

pub async fn update(
    State(app): State<AppState>,
    Path(city_id): Path<String>,
    body: JsonBody,
) -> ApiResult<Json<Entity>> {
    super::update::<City>(app.storage(), &city_id, body).await
}
