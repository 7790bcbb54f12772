//! State handlers

use crate::error::ApiResult;
use crate::extractors::JsonBody;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hbnb_core::{Entity, Model, State as StateModel};
use serde_json::Value;

pub async fn list(State(app): State<AppState>) -> ApiResult<Json<Vec<Entity>>> {
    super::list::<StateModel>(app.storage()).await
}

pub async fn get(
    State(app): State<AppState>,
    Path(state_id): Path<String>,
) -> ApiResult<Json<Entity>> {
    super::show::<StateModel>(app.storage(), &state_id).await
}

pub async fn delete(
    State(app): State<AppState>,
    Path(state_id): Path<String>,
) -> ApiResult<Json<Value>> {
    super::destroy::<StateModel>(app.storage(), &state_id).await
}

pub async fn create(
    State(app): State<AppState>,
    body: JsonBody,
) -> ApiResult<(StatusCode, Json<Entity>)> {
    let payload = body.payload()?;
    super::require(&payload, &["name"])?;

    let state = StateModel::from_payload(&payload)?;
    super::insert(app.storage(), state).await
}

pub async fn update(
    State(app): State<AppState>,
    Path(state_id): Path<String>,
    body: JsonBody,
) -> ApiResult<Json<Entity>> {
    super::update::<StateModel>(app.storage(), &state_id, body).await
}
