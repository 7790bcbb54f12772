//! Review handlers, listed and created under their place

use super::places::owner_id;
use crate::error::ApiResult;
use crate::extractors::JsonBody;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hbnb_core::{Entity, Model, Place, Review, StorageExt, User};
use serde_json::Value;

pub async fn list(
    State(app): State<AppState>,
    Path(place_id): Path<String>,
) -> ApiResult<Json<Vec<Entity>>> {
    let place = super::fetch::<Place>(app.storage(), &place_id).await?;
    let reviews = app.storage().reviews_of_place(place.id()).await?;
    Ok(super::to_json(reviews))
}

pub async fn get(
    State(app): State<AppState>,
    Path(review_id): Path<String>,
) -> ApiResult<Json<Entity>> {
    super::show::<Review>(app.storage(), &review_id).await
}

pub async fn delete(
    State(app): State<AppState>,
    Path(review_id): Path<String>,
) -> ApiResult<Json<Value>> {
    super::destroy::<Review>(app.storage(), &review_id).await
}

pub async fn create(
    State(app): State<AppState>,
    Path(place_id): Path<String>,
    body: JsonBody,
) -> ApiResult<(StatusCode, Json<Entity>)> {
    let place = super::fetch::<Place>(app.storage(), &place_id).await?;
    let payload = body.payload()?;
    super::require(&payload, &["user_id"])?;

    let user_id = owner_id(&payload)?;
    super::fetch::<User>(app.storage(), user_id).await?;
    super::require(&payload, &["text"])?;

    let mut review = Review::from_payload(&payload)?;
    review.place_id = place.base.id;
    super::insert(app.storage(), review).await
}

pub async fn update(
    State(app): State<AppState>,
    Path(review_id): Path<String>,
    body: JsonBody,
) -> ApiResult<Json<Entity>> {
    super::update::<Review>(app.storage(), &review_id, body).await
}
