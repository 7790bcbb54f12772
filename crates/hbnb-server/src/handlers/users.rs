//! User handlers

use crate::error::ApiResult;
use crate::extractors::JsonBody;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hbnb_core::{Entity, Model, User};
use serde_json::Value;

pub async fn list(State(app): State<AppState>) -> ApiResult<Json<Vec<Entity>>> {
    super::list::<User>(app.storage()).await
}

pub async fn get(
    State(app): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Entity>> {
    super::show::<User>(app.storage(), &user_id).await
}

/// Also removes the user's places and reviews.
pub async fn delete(
    State(app): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Value>> {
    super::destroy::<User>(app.storage(), &user_id).await
}

pub async fn create(
    State(app): State<AppState>,
    body: JsonBody,
) -> ApiResult<(StatusCode, Json<Entity>)> {
    let payload = body.payload()?;
    super::require(&payload, &["email", "password"])?;

    // A taken email surfaces from storage as 409
    let user = User::from_payload(&payload)?;
    super::insert(app.storage(), user).await
}

pub async fn update(
    State(app): State<AppState>,
    Path(user_id): Path<String>,
    body: JsonBody,
) -> ApiResult<Json<Entity>> {
    super::update::<User>(app.storage(), &user_id, body).await
}
