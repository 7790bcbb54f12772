//! Status, stats and the not-found fallback

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::{extract::State, Json};
use hbnb_core::EntityKind;
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub async fn status() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

/// Record count per collection
pub async fn stats(State(app): State<AppState>) -> ApiResult<Json<BTreeMap<&'static str, usize>>> {
    let mut counts = BTreeMap::new();
    for kind in EntityKind::ALL {
        counts.insert(kind.collection(), app.storage.count(Some(kind)).await?);
    }
    Ok(Json(counts))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
