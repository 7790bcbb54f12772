//! Place search handler

use crate::error::ApiResult;
use crate::extractors::JsonBody;
use crate::services::place_search::{self, PlaceFilter};
use crate::AppState;
use axum::{extract::State, Json};
use hbnb_core::Entity;

pub async fn search(State(app): State<AppState>, body: JsonBody) -> ApiResult<Json<Vec<Entity>>> {
    let filter = PlaceFilter::from_payload(&body.object()?)?;
    let places = place_search::search(app.storage(), &filter).await?;
    Ok(super::to_json(places))
}
