//! Links between places and amenities

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hbnb_core::{Amenity, Entity, Place, StorageExt};
use serde_json::{json, Value};

pub async fn list(
    State(app): State<AppState>,
    Path(place_id): Path<String>,
) -> ApiResult<Json<Vec<Entity>>> {
    let place = super::fetch::<Place>(app.storage(), &place_id).await?;
    let amenities = app.storage().amenities_of_place(&place).await?;
    Ok(super::to_json(amenities))
}

/// 201 when the link is new, 200 when it already existed.
pub async fn link(
    State(app): State<AppState>,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<Entity>)> {
    let mut place = super::fetch::<Place>(app.storage(), &place_id).await?;
    let amenity = super::fetch::<Amenity>(app.storage(), &amenity_id).await?;

    if !place.link_amenity(&amenity.base.id) {
        return Ok((StatusCode::OK, Json(amenity.into())));
    }
    app.storage().put(place).await?;
    app.storage().save().await?;

    Ok((StatusCode::CREATED, Json(amenity.into())))
}

pub async fn unlink(
    State(app): State<AppState>,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let mut place = super::fetch::<Place>(app.storage(), &place_id).await?;
    let amenity = super::fetch::<Amenity>(app.storage(), &amenity_id).await?;

    if !place.unlink_amenity(&amenity.base.id) {
        return Err(ApiError::NotFound);
    }
    app.storage().put(place).await?;
    app.storage().save().await?;

    Ok(Json(json!({})))
}
