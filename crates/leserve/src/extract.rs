//! Extractors whose rejections render as [`ApiError`] JSON bodies

use axum::extract::{FromRequest, FromRequestParts};
use std::str::FromStr;

use crate::error::{ApiError, ApiResult};
use lemoteur::EngineError;

/// JSON request body; malformed or invalid bodies yield 422
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string; unparsable parameters yield 422
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters; non-numeric IDs yield 400
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Parse an optional filter value, treating a blank value as absent
pub fn optional_filter<T>(value: Option<&str>) -> ApiResult<Option<T>>
where
    T: FromStr<Err = EngineError>,
{
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(ApiError::from),
    }
}
