//! JSON body extractor that never rejects
//!
//! Handlers decide when a bad body matters: a PUT on an unknown id is a 404
//! even when its body is garbage.

use crate::error::{ApiError, ApiResult};
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use serde_json::{Map, Value};
use std::convert::Infallible;

/// Parsed request body; `None` when the request is not JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(pub Option<Value>);

impl JsonBody {
    /// Body of a create or update: a non-empty JSON object.
    pub fn payload(self) -> ApiResult<Map<String, Value>> {
        match self.object()? {
            map if map.is_empty() => Err(ApiError::NotAJson),
            map => Ok(map),
        }
    }

    /// Any JSON object, including `{}`.
    pub fn object(self) -> ApiResult<Map<String, Value>> {
        match self.0 {
            Some(Value::Object(map)) => Ok(map),
            _ => Err(ApiError::NotAJson),
        }
    }
}

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .map(|ct| ct.trim_start().to_ascii_lowercase())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_json(&req) {
            return Ok(JsonBody(None));
        }
        let value = match Bytes::from_request(req, state).await {
            Ok(bytes) => serde_json::from_slice(&bytes).ok(),
            Err(_) => None,
        };
        Ok(JsonBody(value))
    }
}
